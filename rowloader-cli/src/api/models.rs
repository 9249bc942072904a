//! Remote object service schema models

use serde::{Deserialize, Serialize};

/// What a method does when executed against an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MethodKind {
    Create,
    Read,
    Update,
    Delete,
    List,
    Execute,
}

/// Property data types an object service exposes.
///
/// An unknown type string is rejected when the schema is described, not at
/// upload time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    Text,
    Memo,
    Number,
    Decimal,
    Date,
    DateTime,
    Time,
    Guid,
    AutoGuid,
    AutoNumber,
    Boolean,
    File,
}

impl PropertyType {
    /// Date, DateTime and Time form the temporal family that bulk creates
    /// are known to mishandle.
    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            PropertyType::Date | PropertyType::DateTime | PropertyType::Time
        )
    }
}

/// A method exposed by a remote object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodDescriptor {
    pub name: String,
    pub kind: MethodKind,
}

/// A property exposed by a remote object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub property_type: PropertyType,
}
