//! Upload configuration

use crate::import::{SpaceMode, Table};

/// Settings for one upload run.
///
/// Built and owned by the caller; the executor borrows it for the duration
/// of a single call and does not retain it.
#[derive(Debug, Clone)]
pub struct UploadSettings {
    /// Object service host
    pub host: String,
    pub port: u16,
    /// Target object, as the caller names it
    pub object_name: String,
    /// Create / execute method to run per record
    pub create_method: String,
    /// Deliver all rows in one batch call instead of row by row
    pub bulk: bool,
    /// Column stamped on every record for later identification; ignored
    /// unless both name and value are non-blank
    pub transaction_id_name: String,
    pub transaction_id_value: String,
    /// Space handling applied to the transaction column name before it is
    /// matched against the target schema
    pub header_spaces: SpaceMode,
    pub table: Table,
}

impl UploadSettings {
    /// Object name in the form the service stores it under.
    pub fn system_object_name(&self) -> String {
        self.object_name.replace('.', "_").replace(' ', "_")
    }
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 0,
            object_name: String::new(),
            create_method: "Create".to_string(),
            bulk: false,
            transaction_id_name: String::new(),
            transaction_id_value: String::new(),
            header_spaces: SpaceMode::Replace,
            table: Table::new(),
        }
    }
}
