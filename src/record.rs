//! Record types - one stored building location per row
//!
//! A record carries four application-supplied text fields plus the
//! store-assigned identifier. Coordinates stay textual: the store never
//! interprets them, it only keeps each value unique.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The uniqueness-constrained columns.
///
/// Each column is unique on its own, not as part of a composite key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UniqueField {
    Code,
    Name,
    Latitude,
    Longitude,
}

impl UniqueField {
    /// Column name in the `notes` table
    pub fn as_str(&self) -> &'static str {
        match self {
            UniqueField::Code => "code",
            UniqueField::Name => "name",
            UniqueField::Latitude => "latitude",
            UniqueField::Longitude => "longitude",
        }
    }

    /// Get all constrained fields, in column order
    pub fn all() -> &'static [UniqueField] {
        &[
            UniqueField::Code,
            UniqueField::Name,
            UniqueField::Latitude,
            UniqueField::Longitude,
        ]
    }
}

impl FromStr for UniqueField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "code" => Ok(UniqueField::Code),
            "name" => Ok(UniqueField::Name),
            "latitude" | "lat" => Ok(UniqueField::Latitude),
            "longitude" | "lon" | "lng" => Ok(UniqueField::Longitude),
            _ => Err(Error::Config(format!("Unknown record field: {}", s))),
        }
    }
}

impl std::fmt::Display for UniqueField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The four fields supplied by the application or the seed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecord {
    pub code: String,
    pub name: String,
    pub latitude: String,
    pub longitude: String,
}

impl NewRecord {
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        latitude: impl Into<String>,
        longitude: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            latitude: latitude.into(),
            longitude: longitude.into(),
        }
    }
}

/// A stored record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Store-assigned identifier, always > 0
    pub id: i64,
    pub code: String,
    pub name: String,
    pub latitude: String,
    pub longitude: String,
}

impl Record {
    /// The application-editable part of this record
    pub fn fields(&self) -> NewRecord {
        NewRecord::new(
            self.code.clone(),
            self.name.clone(),
            self.latitude.clone(),
            self.longitude.clone(),
        )
    }
}

impl std::fmt::Display for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "#{} {} ({}) @ {}, {}",
            self.id, self.code, self.name, self.latitude, self.longitude
        )
    }
}
