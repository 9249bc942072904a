//! HTTP client for the remote object service

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;

use super::models::{MethodDescriptor, PropertyDescriptor};
use super::store::{ObjectStore, Record, StoreError};

/// JSON-over-HTTP implementation of [`ObjectStore`].
///
/// A client is built for the duration of one upload and dropped on every
/// exit path; no connection state outlives the call.
pub struct ObjectServiceClient {
    http: reqwest::Client,
    host: String,
    port: u16,
}

/// Fault body returned by the service on non-success responses.
#[derive(Debug, Deserialize)]
struct ServiceFault {
    code: String,
    message: String,
}

#[derive(Debug, Deserialize)]
struct FaultEnvelope {
    error: ServiceFault,
}

impl ObjectServiceClient {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            http: reqwest::Client::new(),
            host: host.into(),
            port,
        }
    }

    fn url(&self, object: &str, tail: &str) -> String {
        format!(
            "http://{}:{}/api/objects/{}{}",
            self.host,
            self.port,
            urlencoding::encode(object),
            tail
        )
    }

    fn transport_error(&self, err: reqwest::Error) -> StoreError {
        if err.is_connect() || err.is_timeout() {
            StoreError::Connection {
                host: self.host.clone(),
                port: self.port,
            }
        } else {
            StoreError::Other(err.to_string())
        }
    }

    async fn fault_from_response(object: &str, response: reqwest::Response) -> StoreError {
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return StoreError::ObjectNotFound(object.to_string());
        }

        match response.json::<FaultEnvelope>().await {
            Ok(envelope) => match envelope.error.code.as_str() {
                "duplicate_key" => StoreError::DuplicateKey(envelope.error.message),
                "type_mismatch" => StoreError::TypeMismatch(envelope.error.message),
                _ => StoreError::Other(envelope.error.message),
            },
            Err(_) => StoreError::Other(format!("service returned HTTP {}", status)),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        object: &str,
        tail: &str,
    ) -> Result<T, StoreError> {
        let response = self
            .http
            .get(self.url(object, tail))
            .send()
            .await
            .map_err(|err| self.transport_error(err))?;

        if !response.status().is_success() {
            return Err(Self::fault_from_response(object, response).await);
        }

        response
            .json()
            .await
            .map_err(|err| StoreError::Other(format!("invalid schema description: {}", err)))
    }

    async fn post_json(
        &self,
        object: &str,
        tail: &str,
        method: &str,
        body: &Value,
    ) -> Result<(), StoreError> {
        let response = self
            .http
            .post(self.url(object, tail))
            .query(&[("method", method)])
            .json(body)
            .send()
            .await
            .map_err(|err| self.transport_error(err))?;

        if !response.status().is_success() {
            return Err(Self::fault_from_response(object, response).await);
        }

        Ok(())
    }
}

impl ObjectStore for ObjectServiceClient {
    async fn list_methods(&self, object: &str) -> Result<Vec<MethodDescriptor>, StoreError> {
        log::debug!("listing methods on '{}'", object);
        self.get_json(object, "/methods").await
    }

    async fn list_properties(&self, object: &str) -> Result<Vec<PropertyDescriptor>, StoreError> {
        log::debug!("listing properties on '{}'", object);
        self.get_json(object, "/properties").await
    }

    async fn create_record(
        &self,
        object: &str,
        method: &str,
        record: &Record,
    ) -> Result<(), StoreError> {
        self.post_json(object, "/records", method, &Value::Object(record.clone()))
            .await
    }

    async fn create_records_bulk(
        &self,
        object: &str,
        method: &str,
        records: &[Record],
    ) -> Result<(), StoreError> {
        log::info!("bulk create of {} records on '{}'", records.len(), object);
        let body = Value::Array(records.iter().cloned().map(Value::Object).collect());
        self.post_json(object, "/records/bulk", method, &body).await
    }
}
