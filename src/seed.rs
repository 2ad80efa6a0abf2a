//! Seed sources - records used to populate an empty store once
//!
//! The on-disk format is plain text, one record per line, four fields
//! separated by `:` in the order code, name, latitude, longitude:
//!
//! ```text
//! A1:Tower:10.0:20.0
//! A2:Hall:11.0:21.0
//! ```
//!
//! There is no header and no escaping. Blank lines are ignored.

use crate::{Error, NewRecord, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind, Lines};
use std::path::PathBuf;

/// Field delimiter of the seed format
pub const DELIMITER: char = ':';

/// Number of fields on every seed line
pub const FIELD_COUNT: usize = 4;

/// A finite, single-pass sequence of records.
///
/// Consumed by value: a source is drained at most once and never restarted.
pub trait SeedSource {
    type Records: Iterator<Item = Result<NewRecord>>;

    /// Produce the record sequence
    fn records(self) -> Result<Self::Records>;
}

/// Parse one seed line (1-indexed `line_no`, used only for error reporting)
pub fn parse_line(line_no: usize, line: &str) -> Result<NewRecord> {
    let tokens: Vec<&str> = line.split(DELIMITER).map(str::trim).collect();
    if tokens.len() != FIELD_COUNT {
        return Err(Error::SeedParse {
            line: line_no,
            reason: format!("expected {} fields, found {}", FIELD_COUNT, tokens.len()),
        });
    }
    if let Some(pos) = tokens.iter().position(|t| t.is_empty()) {
        return Err(Error::SeedParse {
            line: line_no,
            reason: format!("field {} is empty", pos + 1),
        });
    }

    Ok(NewRecord::new(tokens[0], tokens[1], tokens[2], tokens[3]))
}

/// Seed records read line by line from any buffered reader
pub struct SeedReader<R> {
    lines: Lines<R>,
    line_no: usize,
}

impl<R: BufRead> SeedReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
        }
    }
}

impl<R: BufRead> Iterator for SeedReader<R> {
    type Item = Result<NewRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.line_no += 1;
            match self.lines.next()? {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => return Some(parse_line(self.line_no, &line)),
                Err(e) if e.kind() == ErrorKind::InvalidData => {
                    return Some(Err(Error::SeedParse {
                        line: self.line_no,
                        reason: "invalid UTF-8".to_string(),
                    }));
                }
                Err(e) => return Some(Err(Error::Io(e))),
            }
        }
    }
}

impl<R: BufRead> SeedSource for SeedReader<R> {
    type Records = Self;

    fn records(self) -> Result<Self> {
        Ok(self)
    }
}

/// The flat seed file on disk.
///
/// A missing file is not an error: it yields no records.
#[derive(Debug, Clone)]
pub struct SeedFile {
    path: PathBuf,
}

impl SeedFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SeedSource for SeedFile {
    type Records = std::iter::Flatten<std::option::IntoIter<SeedReader<BufReader<File>>>>;

    fn records(self) -> Result<Self::Records> {
        let reader = match File::open(&self.path) {
            Ok(file) => Some(SeedReader::new(BufReader::new(file))),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!("No seed file at {}, skipping seeding", self.path.display());
                None
            }
            Err(e) => return Err(Error::Io(e)),
        };
        Ok(reader.into_iter().flatten())
    }
}

/// In-memory seed: the records are inserted in vector order
impl SeedSource for Vec<NewRecord> {
    type Records = std::iter::Map<std::vec::IntoIter<NewRecord>, fn(NewRecord) -> Result<NewRecord>>;

    fn records(self) -> Result<Self::Records> {
        Ok(self
            .into_iter()
            .map(Ok::<NewRecord, Error> as fn(NewRecord) -> Result<NewRecord>))
    }
}

/// A source with no records
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSeed;

impl SeedSource for NoSeed {
    type Records = std::iter::Empty<Result<NewRecord>>;

    fn records(self) -> Result<Self::Records> {
        Ok(std::iter::empty())
    }
}
