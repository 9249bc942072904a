//! Remote object service: schema models, the store port and the HTTP client

pub mod client;
pub mod models;
pub mod store;

pub use client::ObjectServiceClient;
pub use models::{MethodDescriptor, MethodKind, PropertyDescriptor, PropertyType};
pub use store::{ObjectStore, Record, StoreError};
