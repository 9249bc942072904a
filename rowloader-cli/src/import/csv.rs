//! Delimited text import
//!
//! Parses CSV-style text where the first parsed row carries the column
//! headers. Quoting and qualifier un-escaping follow standard CSV rules.

use anyhow::Result;
use csv::ReaderBuilder;

use super::columns::{SpaceMode, format_column_name};
use super::envelope;
use super::table::Table;
use super::{ImportStatus, Importer, classify};

/// Settings for a delimited text import.
#[derive(Debug, Clone)]
pub struct CsvImportSettings {
    /// Wrapped-file envelope holding the text to parse
    pub file: String,
    pub column_delimiter: char,
    pub text_qualifier: char,
    pub header_spaces: SpaceMode,
}

impl Default for CsvImportSettings {
    fn default() -> Self {
        Self {
            file: String::new(),
            column_delimiter: ',',
            text_qualifier: '"',
            header_spaces: SpaceMode::Remove,
        }
    }
}

/// Imports delimited text into a [`Table`].
pub struct CsvImporter {
    settings: CsvImportSettings,
    status: ImportStatus,
    message: String,
    table: Option<Table>,
}

impl CsvImporter {
    pub fn new(settings: CsvImportSettings) -> Self {
        Self {
            settings,
            status: ImportStatus::Pending,
            message: String::new(),
            table: None,
        }
    }

    fn run(&self) -> Result<Table> {
        let text = envelope::unpack_text(&self.settings.file)?;

        let mut reader = ReaderBuilder::new()
            .delimiter(self.settings.column_delimiter as u8)
            .quote(self.settings.text_qualifier as u8)
            .has_headers(false)
            .flexible(true)
            .from_reader(text.as_bytes());

        let mut table = Table::new();
        let mut records = reader.records();

        if let Some(header) = records.next() {
            for label in header?.iter() {
                table.add_column(format_column_name(label, self.settings.header_spaces))?;
            }
        }

        for record in records {
            let record = record?;
            let row = (0..table.column_count())
                .map(|index| record.get(index).unwrap_or("").to_string())
                .collect();
            table.push_row(row);
        }

        log::debug!(
            "parsed {} rows across {} columns from delimited text",
            table.row_count(),
            table.column_count()
        );

        Ok(table)
    }
}

impl Importer for CsvImporter {
    fn status(&self) -> ImportStatus {
        self.status
    }

    fn message(&self) -> &str {
        &self.message
    }

    fn parse(&mut self) {
        if self.status != ImportStatus::Pending {
            return;
        }

        match self.run() {
            Ok(table) => {
                let (status, message) = classify(&table);
                self.status = status;
                self.message = message;
                self.table = Some(table);
            }
            Err(err) => {
                self.status = ImportStatus::Error;
                self.message = format!("{:#}", err);
            }
        }
    }

    fn results(&mut self) -> Option<&Table> {
        self.parse();

        if self.status == ImportStatus::Complete {
            self.table.as_ref()
        } else {
            None
        }
    }
}
