//! Terminal presentation for the CLI.
//!
//! This is the view side of the store: it projects records into labeled
//! display fields and never talks to the database itself.

pub mod icons;
pub mod output;
pub mod table;

pub use icons::Icons;
pub use output::{error, header, info, note, palette, section, success, summary_row, warn, Palette};
pub use table::{record_fields, records_table, TableBuilder};
