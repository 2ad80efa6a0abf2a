use tabled::{settings::Style, Table, Tabled};

use crate::record::Record;

#[derive(Tabled)]
pub struct RecordRow {
    #[tabled(rename = "ID")]
    pub id: i64,
    #[tabled(rename = "Code")]
    pub code: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Latitude")]
    pub latitude: String,
    #[tabled(rename = "Longitude")]
    pub longitude: String,
}

impl From<&Record> for RecordRow {
    fn from(record: &Record) -> Self {
        Self {
            id: record.id,
            code: record.code.clone(),
            name: record.name.clone(),
            latitude: record.latitude.clone(),
            longitude: record.longitude.clone(),
        }
    }
}

pub struct TableBuilder {
    rows: Vec<RecordRow>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn add_record(&mut self, record: &Record) {
        self.rows.push(RecordRow::from(record));
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }

        Table::new(&self.rows).with(Style::rounded()).to_string()
    }
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn records_table(records: &[Record]) -> String {
    let mut builder = TableBuilder::new();
    for record in records {
        builder.add_record(record);
    }
    builder.build()
}

/// Labeled display fields for a single record, in edit-form order
pub fn record_fields(record: &Record) -> [(&'static str, &str); 4] {
    [
        ("Code", record.code.as_str()),
        ("Name", record.name.as_str()),
        ("Latitude", record.latitude.as_str()),
        ("Longitude", record.longitude.as_str()),
    ]
}
