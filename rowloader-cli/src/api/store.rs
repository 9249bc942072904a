//! Port to the remote object store

use serde_json::{Map, Value};

use super::models::{MethodDescriptor, PropertyDescriptor};

/// One record shaped for the target object.
pub type Record = Map<String, Value>;

/// Faults surfaced by an object store implementation.
#[derive(Debug, Clone)]
pub enum StoreError {
    /// The service endpoint could not be reached
    Connection { host: String, port: u16 },
    /// The target object does not exist on the service
    ObjectNotFound(String),
    /// A record collides with an existing key on the target
    DuplicateKey(String),
    /// The store rejected a value for a typed property
    TypeMismatch(String),
    /// Anything else, message preserved verbatim
    Other(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Connection { host, port } => {
                write!(f, "could not reach {}:{}", host, port)
            }
            StoreError::ObjectNotFound(object) => write!(f, "object '{}' not found", object),
            StoreError::DuplicateKey(message) => write!(f, "duplicate key: {}", message),
            StoreError::TypeMismatch(message) => write!(f, "type mismatch: {}", message),
            StoreError::Other(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for StoreError {}

/// Operations the upload pipeline needs from the remote store.
///
/// Implemented by [`ObjectServiceClient`](super::ObjectServiceClient) for
/// the real service and by in-memory fakes in tests.
pub trait ObjectStore {
    /// Methods exposed by `object`.
    async fn list_methods(&self, object: &str) -> Result<Vec<MethodDescriptor>, StoreError>;

    /// Properties exposed by `object`, in schema order.
    async fn list_properties(&self, object: &str) -> Result<Vec<PropertyDescriptor>, StoreError>;

    /// Create a single record via `method`.
    async fn create_record(
        &self,
        object: &str,
        method: &str,
        record: &Record,
    ) -> Result<(), StoreError>;

    /// Create every record in one batch call via `method`.
    async fn create_records_bulk(
        &self,
        object: &str,
        method: &str,
        records: &[Record],
    ) -> Result<(), StoreError>;
}
