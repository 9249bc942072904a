//! Delivery of imported rows to the remote object store

use serde_json::Value;

use crate::api::{MethodKind, ObjectStore, PropertyDescriptor, Record, StoreError};
use crate::import::format_column_name;

use super::matching::matched_columns;
use super::settings::UploadSettings;
use super::values::render_value;

/// Terminal classification of one upload attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStatus {
    Pending,
    Partial,
    Complete,
    Error,
}

impl std::fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UploadStatus::Pending => write!(f, "Pending"),
            UploadStatus::Partial => write!(f, "Partial"),
            UploadStatus::Complete => write!(f, "Complete"),
            UploadStatus::Error => write!(f, "Error"),
        }
    }
}

const ROW_BY_ROW_DUPLICATE_HINT: &str = "Error uploading data - Cannot upload row by row if \
    data has a duplicate key value, try bulk methods or add an auto number / auto guid column \
    to the target object. ";

/// Faults that abort an upload, resolved to a message rather than raised.
#[derive(Debug)]
enum UploadFault {
    MethodNotFound { method: String },
    MethodWrongKind { method: String },
    NoMatchingColumns,
    TransactionColumnNotFound { column: String },
    TypeMismatch(String),
    Store(StoreError),
}

impl UploadFault {
    fn render(&self, settings: &UploadSettings) -> String {
        let object = &settings.object_name;

        match self {
            UploadFault::MethodNotFound { method } => {
                format!("Could not find method '{}' on object '{}'.", method, object)
            }
            UploadFault::MethodWrongKind { method } => format!(
                "Method '{}' on object '{}' is not of type 'Create' or 'Execute'.",
                method, object
            ),
            UploadFault::NoMatchingColumns => format!(
                "No matching columns found on object '{}' and the imported data.",
                object
            ),
            UploadFault::TransactionColumnNotFound { column } => format!(
                "Unable to insert data into object: Transaction id column '{}' cannot be found on the object '{}'.",
                column, object
            ),
            UploadFault::TypeMismatch(detail)
            | UploadFault::Store(StoreError::TypeMismatch(detail)) => format!(
                "Unable to insert data into object due to data type mismatch: {}",
                detail
            ),
            UploadFault::Store(StoreError::Connection { host, port }) => {
                format!("Could not connect to '{}' on port '{}'", host, port)
            }
            UploadFault::Store(StoreError::ObjectNotFound(_)) => {
                format!("Could not find object '{}'", object)
            }
            UploadFault::Store(StoreError::DuplicateKey(detail)) => {
                if settings.bulk {
                    detail.clone()
                } else {
                    ROW_BY_ROW_DUPLICATE_HINT.to_string()
                }
            }
            UploadFault::Store(StoreError::Other(detail)) => {
                format!("Unknown error: {}", detail)
            }
        }
    }
}

/// Uploads a parsed table to one target object.
///
/// The state machine runs `Pending` to one of `Complete`, `Partial` or
/// `Error` exactly once; the outcome is cached for the lifetime of the
/// uploader.
pub struct Uploader<'a, S> {
    settings: &'a UploadSettings,
    store: &'a S,
    status: UploadStatus,
    message: String,
}

impl<'a, S: ObjectStore> Uploader<'a, S> {
    pub fn new(settings: &'a UploadSettings, store: &'a S) -> Self {
        Self {
            settings,
            store,
            status: UploadStatus::Pending,
            message: String::new(),
        }
    }

    pub fn status(&self) -> UploadStatus {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Deliver every table row to the target object. A no-op after the
    /// first call.
    pub async fn upload(&mut self) {
        if self.status != UploadStatus::Pending {
            return;
        }

        if let Err(fault) = self.run().await {
            self.status = UploadStatus::Error;
            self.message = fault.render(self.settings);
        }
    }

    async fn run(&mut self) -> Result<(), UploadFault> {
        let settings = self.settings;
        let object = settings.system_object_name();

        let create_method = if settings.create_method.is_empty() {
            "Create".to_string()
        } else {
            settings.create_method.clone()
        };

        let transaction_id_name =
            format_column_name(&settings.transaction_id_name, settings.header_spaces);
        let transaction_id_value = settings.transaction_id_value.clone();
        let is_transaction = !transaction_id_name.trim().is_empty()
            && !transaction_id_value.trim().is_empty();

        let methods = self
            .store
            .list_methods(&object)
            .await
            .map_err(UploadFault::Store)?;

        let method = methods
            .iter()
            .find(|m| m.name == create_method)
            .ok_or_else(|| UploadFault::MethodNotFound {
                method: create_method.clone(),
            })?;

        if method.kind != MethodKind::Create && method.kind != MethodKind::Execute {
            return Err(UploadFault::MethodWrongKind {
                method: create_method.clone(),
            });
        }

        let properties = self
            .store
            .list_properties(&object)
            .await
            .map_err(UploadFault::Store)?;

        let property_names: Vec<String> = properties.iter().map(|p| p.name.clone()).collect();
        let matches = matched_columns(settings.table.columns(), &property_names);
        if matches.is_empty() {
            return Err(UploadFault::NoMatchingColumns);
        }

        if is_transaction && !property_names.contains(&transaction_id_name) {
            return Err(UploadFault::TransactionColumnNotFound {
                column: transaction_id_name.clone(),
            });
        }

        log::info!(
            "uploading {} rows to '{}' with {} matching columns",
            settings.table.row_count(),
            settings.object_name,
            matches.len()
        );

        let records = self.build_records(
            &matches,
            &properties,
            &transaction_id_name,
            &transaction_id_value,
            is_transaction,
        )?;

        if settings.bulk {
            self.store
                .create_records_bulk(&object, &create_method, &records)
                .await
                .map_err(UploadFault::Store)?;

            self.status = UploadStatus::Complete;
            self.message = format!(
                "Uploaded {} rows with {} matching columns to '{}'. ",
                settings.table.row_count(),
                matches.len(),
                settings.object_name
            );

            // Bulk create is known to misbehave against temporal properties
            // in the remote store.
            let has_temporal_match = properties
                .iter()
                .any(|p| matches.contains(&p.name) && p.property_type.is_temporal());
            if has_temporal_match {
                self.message.push_str(
                    "WARNING: Bulk upload completed with Date / Time property present on object. ",
                );
            }
        } else {
            let mut uploaded = 0usize;

            for record in &records {
                match self.store.create_record(&object, &create_method, record).await {
                    Ok(()) => uploaded += 1,
                    Err(err) => log::warn!("row not uploaded: {}", err),
                }
            }

            self.status = UploadStatus::Partial;
            self.message = format!(
                "Uploaded {} of {} rows with {} matching columns to {}. ",
                uploaded,
                settings.table.row_count(),
                matches.len(),
                settings.object_name
            );
        }

        if is_transaction {
            self.message.push_str(&format!(
                "Transaction '{}' added with value '{}'. ",
                transaction_id_name, transaction_id_value
            ));
        }

        Ok(())
    }

    fn build_records(
        &self,
        matches: &[String],
        properties: &[PropertyDescriptor],
        transaction_id_name: &str,
        transaction_id_value: &str,
        is_transaction: bool,
    ) -> Result<Vec<Record>, UploadFault> {
        let table = &self.settings.table;
        let matched_properties: Vec<&PropertyDescriptor> = matches
            .iter()
            .filter_map(|column| properties.iter().find(|p| &p.name == column))
            .collect();

        let mut records = Vec::with_capacity(table.row_count());

        for row in 0..table.row_count() {
            let mut record = Record::new();

            for property in &matched_properties {
                let raw = table.value(row, &property.name).unwrap_or("");
                let rendered = render_value(property.property_type, raw)
                    .map_err(UploadFault::TypeMismatch)?;
                record.insert(property.name.clone(), Value::String(rendered));
            }

            if is_transaction {
                record.insert(
                    transaction_id_name.to_string(),
                    Value::String(transaction_id_value.to_string()),
                );
            }

            records.push(record);
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::api::{MethodDescriptor, PropertyType};
    use crate::import::{SpaceMode, Table};

    #[derive(Default)]
    struct Calls {
        records: Vec<Record>,
        bulk_calls: usize,
        row_attempts: usize,
    }

    #[derive(Default)]
    struct FakeStore {
        methods: Vec<MethodDescriptor>,
        properties: Vec<PropertyDescriptor>,
        fail_rows: Vec<usize>,
        bulk_error: Option<StoreError>,
        calls: Mutex<Calls>,
    }

    impl ObjectStore for FakeStore {
        async fn list_methods(&self, _object: &str) -> Result<Vec<MethodDescriptor>, StoreError> {
            Ok(self.methods.clone())
        }

        async fn list_properties(
            &self,
            _object: &str,
        ) -> Result<Vec<PropertyDescriptor>, StoreError> {
            Ok(self.properties.clone())
        }

        async fn create_record(
            &self,
            _object: &str,
            _method: &str,
            record: &Record,
        ) -> Result<(), StoreError> {
            let mut calls = self.calls.lock().unwrap();
            let index = calls.row_attempts;
            calls.row_attempts += 1;
            if self.fail_rows.contains(&index) {
                return Err(StoreError::Other("record rejected".to_string()));
            }
            calls.records.push(record.clone());
            Ok(())
        }

        async fn create_records_bulk(
            &self,
            _object: &str,
            _method: &str,
            records: &[Record],
        ) -> Result<(), StoreError> {
            if let Some(err) = &self.bulk_error {
                return Err(err.clone());
            }
            let mut calls = self.calls.lock().unwrap();
            calls.bulk_calls += 1;
            calls.records.extend(records.iter().cloned());
            Ok(())
        }
    }

    fn property(name: &str, property_type: PropertyType) -> PropertyDescriptor {
        PropertyDescriptor {
            name: name.to_string(),
            property_type,
        }
    }

    fn create_method() -> MethodDescriptor {
        MethodDescriptor {
            name: "Create".to_string(),
            kind: MethodKind::Create,
        }
    }

    fn store_with(properties: Vec<PropertyDescriptor>) -> FakeStore {
        FakeStore {
            methods: vec![create_method()],
            properties,
            ..Default::default()
        }
    }

    fn people_table(rows: &[(&str, &str)]) -> Table {
        let mut table = Table::new();
        table.add_column("Name").unwrap();
        table.add_column("Age").unwrap();
        for (name, age) in rows {
            table.push_row(vec![name.to_string(), age.to_string()]);
        }
        table
    }

    fn settings_for(table: Table, bulk: bool) -> UploadSettings {
        UploadSettings {
            object_name: "People".to_string(),
            bulk,
            table,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn bulk_upload_completes() {
        let store = store_with(vec![
            property("Name", PropertyType::Text),
            property("Age", PropertyType::Number),
        ]);
        let settings = settings_for(people_table(&[("John", "30"), ("Jane", "28")]), true);

        let mut uploader = Uploader::new(&settings, &store);
        uploader.upload().await;

        assert_eq!(uploader.status(), UploadStatus::Complete);
        assert_eq!(
            uploader.message(),
            "Uploaded 2 rows with 2 matching columns to 'People'. "
        );

        let calls = store.calls.lock().unwrap();
        assert_eq!(calls.bulk_calls, 1);
        assert_eq!(calls.records.len(), 2);
        assert_eq!(calls.records[0]["Name"], Value::String("John".to_string()));
    }

    #[tokio::test]
    async fn bulk_upload_warns_on_matched_temporal_property() {
        let store = store_with(vec![
            property("Name", PropertyType::Text),
            property("Age", PropertyType::Date),
        ]);
        let settings = settings_for(people_table(&[("John", "2024-01-05")]), true);

        let mut uploader = Uploader::new(&settings, &store);
        uploader.upload().await;

        assert_eq!(uploader.status(), UploadStatus::Complete);
        assert!(uploader.message().contains("WARNING: Bulk upload completed"));
    }

    #[tokio::test]
    async fn bulk_warning_ignores_unmatched_temporal_properties() {
        let store = store_with(vec![
            property("Name", PropertyType::Text),
            property("Age", PropertyType::Number),
            property("Created", PropertyType::DateTime),
        ]);
        let settings = settings_for(people_table(&[("John", "30")]), true);

        let mut uploader = Uploader::new(&settings, &store);
        uploader.upload().await;

        assert_eq!(uploader.status(), UploadStatus::Complete);
        assert!(!uploader.message().contains("WARNING"));
    }

    #[tokio::test]
    async fn per_row_failures_are_absorbed() {
        let store = FakeStore {
            fail_rows: vec![1],
            ..store_with(vec![
                property("Name", PropertyType::Text),
                property("Age", PropertyType::Number),
            ])
        };
        let settings = settings_for(
            people_table(&[("John", "30"), ("Jane", "28"), ("Jim", "44")]),
            false,
        );

        let mut uploader = Uploader::new(&settings, &store);
        uploader.upload().await;

        assert_eq!(uploader.status(), UploadStatus::Partial);
        assert!(uploader.message().contains("Uploaded 2 of 3 rows"));
        assert_eq!(store.calls.lock().unwrap().records.len(), 2);
    }

    #[tokio::test]
    async fn per_row_success_is_still_partial() {
        let store = store_with(vec![
            property("Name", PropertyType::Text),
            property("Age", PropertyType::Number),
        ]);
        let settings = settings_for(people_table(&[("John", "30")]), false);

        let mut uploader = Uploader::new(&settings, &store);
        uploader.upload().await;

        assert_eq!(uploader.status(), UploadStatus::Partial);
        assert!(uploader.message().contains("Uploaded 1 of 1 rows"));
    }

    #[tokio::test]
    async fn missing_method_is_an_error() {
        let store = FakeStore {
            methods: vec![],
            properties: vec![property("Name", PropertyType::Text)],
            ..Default::default()
        };
        let settings = settings_for(people_table(&[("John", "30")]), true);

        let mut uploader = Uploader::new(&settings, &store);
        uploader.upload().await;

        assert_eq!(uploader.status(), UploadStatus::Error);
        assert_eq!(
            uploader.message(),
            "Could not find method 'Create' on object 'People'."
        );
    }

    #[tokio::test]
    async fn non_create_method_is_an_error() {
        let store = FakeStore {
            methods: vec![MethodDescriptor {
                name: "Create".to_string(),
                kind: MethodKind::Read,
            }],
            properties: vec![property("Name", PropertyType::Text)],
            ..Default::default()
        };
        let settings = settings_for(people_table(&[("John", "30")]), true);

        let mut uploader = Uploader::new(&settings, &store);
        uploader.upload().await;

        assert_eq!(uploader.status(), UploadStatus::Error);
        assert!(uploader.message().contains("not of type 'Create' or 'Execute'"));
    }

    #[tokio::test]
    async fn execute_methods_are_accepted() {
        let store = FakeStore {
            methods: vec![MethodDescriptor {
                name: "BulkLoad".to_string(),
                kind: MethodKind::Execute,
            }],
            properties: vec![property("Name", PropertyType::Text)],
            ..Default::default()
        };
        let mut settings = settings_for(people_table(&[("John", "30")]), true);
        settings.create_method = "BulkLoad".to_string();

        let mut uploader = Uploader::new(&settings, &store);
        uploader.upload().await;

        assert_eq!(uploader.status(), UploadStatus::Complete);
    }

    #[tokio::test]
    async fn no_matching_columns_is_an_error() {
        let store = store_with(vec![property("Unrelated", PropertyType::Text)]);
        let settings = settings_for(people_table(&[("John", "30")]), true);

        let mut uploader = Uploader::new(&settings, &store);
        uploader.upload().await;

        assert_eq!(uploader.status(), UploadStatus::Error);
        assert_eq!(
            uploader.message(),
            "No matching columns found on object 'People' and the imported data."
        );
    }

    #[tokio::test]
    async fn missing_transaction_column_is_an_error() {
        let store = store_with(vec![property("Name", PropertyType::Text)]);
        let mut settings = settings_for(people_table(&[("John", "30")]), true);
        settings.transaction_id_name = "BatchId".to_string();
        settings.transaction_id_value = "42".to_string();

        let mut uploader = Uploader::new(&settings, &store);
        uploader.upload().await;

        assert_eq!(uploader.status(), UploadStatus::Error);
        assert!(uploader.message().contains("Transaction id column 'BatchId'"));
    }

    #[tokio::test]
    async fn transaction_column_is_stamped_and_reported() {
        let store = store_with(vec![
            property("Name", PropertyType::Text),
            property("Batch_Id", PropertyType::Text),
        ]);
        let mut settings = settings_for(people_table(&[("John", "30")]), true);
        // normalized with the upload-side Replace default before lookup
        settings.transaction_id_name = "Batch Id".to_string();
        settings.transaction_id_value = "run-7".to_string();
        settings.header_spaces = SpaceMode::Replace;

        let mut uploader = Uploader::new(&settings, &store);
        uploader.upload().await;

        assert_eq!(uploader.status(), UploadStatus::Complete);
        assert!(
            uploader
                .message()
                .ends_with("Transaction 'Batch_Id' added with value 'run-7'. ")
        );

        let calls = store.calls.lock().unwrap();
        assert_eq!(
            calls.records[0]["Batch_Id"],
            Value::String("run-7".to_string())
        );
    }

    #[tokio::test]
    async fn values_render_for_property_types() {
        let store = store_with(vec![
            property("Name", PropertyType::Text),
            property("Age", PropertyType::Date),
        ]);
        let settings = settings_for(people_table(&[("John", "45000")]), true);

        let mut uploader = Uploader::new(&settings, &store);
        uploader.upload().await;

        let calls = store.calls.lock().unwrap();
        assert_eq!(
            calls.records[0]["Age"],
            Value::String("2023-03-15".to_string())
        );
    }

    #[tokio::test]
    async fn bad_temporal_values_are_a_type_mismatch() {
        let store = store_with(vec![
            property("Name", PropertyType::Text),
            property("Age", PropertyType::Date),
        ]);
        let settings = settings_for(people_table(&[("John", "not a date")]), true);

        let mut uploader = Uploader::new(&settings, &store);
        uploader.upload().await;

        assert_eq!(uploader.status(), UploadStatus::Error);
        assert!(uploader.message().starts_with(
            "Unable to insert data into object due to data type mismatch:"
        ));
        assert_eq!(store.calls.lock().unwrap().bulk_calls, 0);
    }

    #[tokio::test]
    async fn connection_failures_name_the_endpoint() {
        let store = FakeStore {
            methods: vec![create_method()],
            properties: vec![property("Name", PropertyType::Text)],
            bulk_error: Some(StoreError::Connection {
                host: "svc-host".to_string(),
                port: 5555,
            }),
            ..Default::default()
        };
        let mut settings = settings_for(people_table(&[("John", "30")]), true);
        settings.host = "svc-host".to_string();
        settings.port = 5555;

        let mut uploader = Uploader::new(&settings, &store);
        uploader.upload().await;

        assert_eq!(uploader.status(), UploadStatus::Error);
        assert_eq!(
            uploader.message(),
            "Could not connect to 'svc-host' on port '5555'"
        );
    }

    #[tokio::test]
    async fn bulk_duplicate_key_keeps_the_store_message() {
        let store = FakeStore {
            methods: vec![create_method()],
            properties: vec![property("Name", PropertyType::Text)],
            bulk_error: Some(StoreError::DuplicateKey(
                "An object with the specified key property(s) already exist.".to_string(),
            )),
            ..Default::default()
        };
        let settings = settings_for(people_table(&[("John", "30")]), true);

        let mut uploader = Uploader::new(&settings, &store);
        uploader.upload().await;

        assert_eq!(uploader.status(), UploadStatus::Error);
        assert_eq!(
            uploader.message(),
            "An object with the specified key property(s) already exist."
        );
    }

    #[tokio::test]
    async fn unknown_store_faults_keep_their_message() {
        let store = FakeStore {
            methods: vec![create_method()],
            properties: vec![property("Name", PropertyType::Text)],
            bulk_error: Some(StoreError::Other("broker offline".to_string())),
            ..Default::default()
        };
        let settings = settings_for(people_table(&[("John", "30")]), true);

        let mut uploader = Uploader::new(&settings, &store);
        uploader.upload().await;

        assert_eq!(uploader.status(), UploadStatus::Error);
        assert_eq!(uploader.message(), "Unknown error: broker offline");
    }

    #[tokio::test]
    async fn upload_runs_only_once() {
        let store = store_with(vec![
            property("Name", PropertyType::Text),
            property("Age", PropertyType::Number),
        ]);
        let settings = settings_for(people_table(&[("John", "30")]), true);

        let mut uploader = Uploader::new(&settings, &store);
        uploader.upload().await;
        uploader.upload().await;

        assert_eq!(store.calls.lock().unwrap().bulk_calls, 1);
    }
}
