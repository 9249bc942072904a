//! Upload of parsed tables into the remote object store

pub mod executor;
pub mod matching;
pub mod settings;
pub mod values;

pub use executor::{UploadStatus, Uploader};
pub use settings::UploadSettings;
