//! Excel workbook import
//!
//! Reads one worksheet into a [`Table`]. Header labels are normalized and
//! duplicate labels merge into a single logical column whose cell values
//! are joined with a configurable delimiter.

use std::io::Cursor;

use anyhow::Result;
use calamine::{Data, Reader, Xlsx};

use super::columns::{ColumnDefinition, SpaceMode, format_column_name};
use super::envelope;
use super::table::Table;
use super::{ImportStatus, Importer, classify};

/// Settings for an Excel worksheet import.
#[derive(Debug, Clone)]
pub struct ExcelImportSettings {
    /// Wrapped-file envelope holding the workbook bytes
    pub file: String,
    /// Worksheet to read, matched case-insensitively; the first sheet is
    /// used when no sheet carries this name
    pub sheet_name: String,
    /// Zero-based index of the header row; rows above it are skipped
    pub header_row_index: usize,
    pub header_spaces: SpaceMode,
    /// Joins cell values when duplicate header labels merge into one column
    pub duplicate_delimiter: char,
}

impl ExcelImportSettings {
    /// Host-facing header row numbers are 1-based; 0 and 1 both mean the
    /// first row.
    pub fn host_header_row(row: u32) -> usize {
        row.saturating_sub(1) as usize
    }
}

impl Default for ExcelImportSettings {
    fn default() -> Self {
        Self {
            file: String::new(),
            sheet_name: String::new(),
            header_row_index: 0,
            header_spaces: SpaceMode::Remove,
            duplicate_delimiter: ';',
        }
    }
}

enum ParseFailure {
    NoRows(String),
    Unreadable,
    Other(anyhow::Error),
}

/// Imports one worksheet of an Excel workbook into a [`Table`].
pub struct ExcelImporter {
    settings: ExcelImportSettings,
    status: ImportStatus,
    message: String,
    table: Option<Table>,
}

impl ExcelImporter {
    pub fn new(settings: ExcelImportSettings) -> Self {
        Self {
            settings,
            status: ImportStatus::Pending,
            message: String::new(),
            table: None,
        }
    }

    fn run(&self) -> Result<Table, ParseFailure> {
        let bytes = envelope::unpack_bytes(&self.settings.file).map_err(ParseFailure::Other)?;

        let mut workbook =
            Xlsx::new(Cursor::new(bytes)).map_err(|_| ParseFailure::Unreadable)?;

        let names = workbook.sheet_names().to_vec();
        let sheet = first_or_named(&names, &self.settings.sheet_name)
            .ok_or_else(|| ParseFailure::NoRows("No rows found.".to_string()))?;

        log::debug!("reading worksheet '{}'", sheet);

        let range = workbook
            .worksheet_range(&sheet)
            .map_err(|err| ParseFailure::Other(err.into()))?;

        let mut rows = range.rows().skip(self.settings.header_row_index);
        let header = rows
            .next()
            .ok_or_else(|| ParseFailure::NoRows("No rows found.".to_string()))?;

        let mut table = Table::new();
        let definitions = self
            .build_headers(header, &mut table)
            .map_err(ParseFailure::Other)?;

        let delimiter = self.settings.duplicate_delimiter;

        for row in rows {
            let mut values = Vec::with_capacity(definitions.len());
            let mut is_empty_row = true;

            for definition in &definitions {
                let parts: Vec<String> = definition
                    .source_columns
                    .iter()
                    .map(|&column| cell_display(row.get(column)))
                    .collect();

                let mut assembled = parts.join(&delimiter.to_string());

                // Merging duplicate columns can leave nothing but delimiter
                // characters behind; such values count as empty.
                if !assembled.is_empty() && assembled.chars().all(|c| c == delimiter) {
                    assembled.clear();
                }

                if !assembled.trim().is_empty() {
                    is_empty_row = false;
                }

                values.push(assembled);
            }

            if !is_empty_row {
                table.push_row(values);
            }
        }

        Ok(table)
    }

    fn build_headers(&self, header: &[Data], table: &mut Table) -> Result<Vec<ColumnDefinition>> {
        let mut definitions: Vec<ColumnDefinition> = Vec::new();

        for (index, cell) in header.iter().enumerate() {
            if matches!(cell, Data::Empty) {
                continue;
            }

            let name = format_column_name(
                cell_display(Some(cell)).as_str(),
                self.settings.header_spaces,
            );

            match definitions.iter_mut().find(|d| d.name == name) {
                Some(existing) => existing.source_columns.push(index),
                None => {
                    table.add_column(name.clone())?;
                    definitions.push(ColumnDefinition {
                        name,
                        source_columns: vec![index],
                    });
                }
            }
        }

        Ok(definitions)
    }
}

impl Importer for ExcelImporter {
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
            Err(ParseFailure::NoRows(message)) => {
                self.status = ImportStatus::NoRowsFound;
                self.message = message;
            }
            Err(ParseFailure::Unreadable) => {
                self.status = ImportStatus::Error;
                self.message =
                    "Invalid file provided. Cannot read contents as Excel (xlsx) file.".to_string();
            }
            Err(ParseFailure::Other(err)) => {
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

/// The sheet carrying `wanted` (case-insensitive), falling back to the
/// first sheet in the workbook.
fn first_or_named(names: &[String], wanted: &str) -> Option<String> {
    names
        .iter()
        .find(|name| name.eq_ignore_ascii_case(wanted))
        .or_else(|| names.first())
        .cloned()
}

fn cell_display(cell: Option<&Data>) -> String {
    cell.map(|data| data.to_string().trim().to_string())
        .unwrap_or_default()
}
