use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;
use std::{collections::HashMap, fmt, str::FromStr};
use thiserror::Error;

use crate::config::{ConfigError, Scheme};
use crate::credentials::Credential;
use crate::record::{RecordDescriptor, ResourceType};

pub mod client;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Delete,
    #[default]
    List,
}

impl FromStr for Operation {
    type Err = ConfigError;

    fn from_str(action: &str) -> Result<Self, Self::Err> {
        match action.to_ascii_uppercase().as_str() {
            "ADD" | "CREATE" => Ok(Operation::Create),
            "DELETE" => Ok(Operation::Delete),
            "GET" | "LIST" => Ok(Operation::List),
            _ => Err(ConfigError::UnsupportedAction(action.to_string())),
        }
    }
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Error while sending request: {0}")]
    Request(#[from] reqwest::Error),
    #[error("API returned {status} - {body}")]
    Status { status: StatusCode, body: String },
    #[error("Unable to decode the API response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("API returned error {code} - {message}")]
    Nitro { code: i64, message: String },
    #[error("No {resource} record found for {key}")]
    NoRecordFound { resource: ResourceType, key: String },
    #[error("The {0} record returned by the API has no recordid")]
    MissingRecordId(ResourceType),
    #[error("Invalid appliance address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },
}

/// The opaque handle NITRO needs to address a single record instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordId(pub String);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of looking up an existing record by its visible key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    NotFound,
    Found(RecordId),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Created { body: String },
    Listed { response: Value },
    Deleted { record_id: RecordId, body: String },
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Created { body } => write!(f, "created, {}", body),
            Outcome::Listed { response } => write!(f, "{}", response),
            Outcome::Deleted { record_id, body } => {
                write!(f, "deleted recordid {}, {}", record_id, body)
            }
        }
    }
}

pub(crate) struct NitroEndpoint<'t> {
    pub(crate) scheme: Scheme,
    pub(crate) address: &'t str,
    pub(crate) resource: ResourceType,
    pub(crate) key: Option<&'t str>,
    pub(crate) record_id: Option<&'t RecordId>,
}

impl<'t> NitroEndpoint<'t> {
    /// The lookup key and record id are percent-encoded, so they can never change the path.
    pub(crate) fn url(&self) -> Result<Url, ApiError> {
        let invalid = |reason: String| ApiError::InvalidAddress {
            address: self.address.to_string(),
            reason,
        };
        let mut url = Url::parse(&format!("{}://{}", self.scheme.as_str(), self.address))
            .map_err(|err| invalid(err.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| invalid("not a base URL".to_string()))?
            .clear()
            .extend(["nitro", "v1", "config", self.resource.api_name()])
            .extend(self.key);
        if let Some(record_id) = self.record_id {
            url.query_pairs_mut()
                .append_pair("args", &format!("recordid:{}", record_id));
        }
        Ok(url)
    }
}

/// Fields NITRO puts around every JSON reply, next to the resource arrays.
#[derive(Deserialize, Debug)]
struct Envelope {
    #[serde(default)]
    errorcode: i64,
    #[serde(default)]
    message: String,
    #[serde(flatten)]
    resources: HashMap<String, Value>,
}

#[derive(Deserialize, Debug)]
struct RecordHandle {
    recordid: Option<RawRecordId>,
}

#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum RawRecordId {
    Text(String),
    Number(u64),
}

impl From<RawRecordId> for RecordId {
    fn from(raw: RawRecordId) -> Self {
        match raw {
            RawRecordId::Text(text) => RecordId(text),
            RawRecordId::Number(number) => RecordId(number.to_string()),
        }
    }
}

fn nitro_error(envelope: &Envelope) -> Option<ApiError> {
    (envelope.errorcode != 0).then(|| ApiError::Nitro {
        code: envelope.errorcode,
        message: envelope.message.clone(),
    })
}

/// Decodes a reply, turning a non-zero NITRO `errorcode` into an error.
pub(crate) fn decode_response(body: &str) -> Result<Value, ApiError> {
    let value: Value = serde_json::from_str(body)?;
    let envelope = Envelope::deserialize(&value)?;
    match nitro_error(&envelope) {
        Some(err) => Err(err),
        None => Ok(value),
    }
}

/// Picks the record id out of a lookup reply. With several matches the first one wins.
pub(crate) fn decode_lookup(body: &str, resource: ResourceType) -> Result<Lookup, ApiError> {
    let mut envelope: Envelope = serde_json::from_str(body)?;
    if let Some(err) = nitro_error(&envelope) {
        return Err(err);
    }

    let records: Vec<RecordHandle> = match envelope.resources.remove(resource.api_name()) {
        Some(records) => serde_json::from_value(records)?,
        None => Vec::new(),
    };
    if records.len() > 1 {
        tracing::warn!(
            resource = %resource,
            matches = records.len(),
            "Lookup matched more than one record, using the first one"
        );
    }

    match records.into_iter().next() {
        None => Ok(Lookup::NotFound),
        Some(RecordHandle { recordid: None }) => Err(ApiError::MissingRecordId(resource)),
        Some(RecordHandle {
            recordid: Some(raw),
        }) => Ok(Lookup::Found(raw.into())),
    }
}

/// The operations the appliance API offers for a single target.
#[async_trait]
pub trait RecordApi: Send + Sync {
    async fn create(
        &self,
        credential: &Credential,
        descriptor: &RecordDescriptor,
    ) -> Result<Outcome, ApiError>;

    async fn list(
        &self,
        credential: &Credential,
        resource: ResourceType,
    ) -> Result<Outcome, ApiError>;

    async fn lookup_record_id(
        &self,
        credential: &Credential,
        descriptor: &RecordDescriptor,
    ) -> Result<Lookup, ApiError>;

    async fn delete_record(
        &self,
        credential: &Credential,
        descriptor: &RecordDescriptor,
        record_id: &RecordId,
    ) -> Result<Outcome, ApiError>;

    /// Deleting needs the record id, which only the appliance knows, so look it up first.
    async fn delete(
        &self,
        credential: &Credential,
        descriptor: &RecordDescriptor,
    ) -> Result<Outcome, ApiError> {
        match self.lookup_record_id(credential, descriptor).await? {
            Lookup::NotFound => Err(ApiError::NoRecordFound {
                resource: descriptor.resource_type(),
                key: descriptor.lookup_key.clone(),
            }),
            Lookup::Found(record_id) => {
                self.delete_record(credential, descriptor, &record_id).await
            }
        }
    }

    async fn apply(
        &self,
        credential: &Credential,
        descriptor: &RecordDescriptor,
        operation: Operation,
    ) -> Result<Outcome, ApiError> {
        match operation {
            Operation::Create => self.create(credential, descriptor).await,
            Operation::List => self.list(credential, descriptor.resource_type()).await,
            Operation::Delete => self.delete(credential, descriptor).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use std::sync::Mutex;

    use super::{
        decode_lookup, decode_response, ApiError, Lookup, NitroEndpoint, Operation, Outcome,
        RecordApi, RecordId,
    };
    use crate::config::Scheme;
    use crate::credentials::Credential;
    use crate::opts::RecordFields;
    use crate::record::{build_descriptor, RecordDescriptor, ResourceType};

    #[test]
    fn endpoint_urls() {
        let endpoint = NitroEndpoint {
            scheme: Scheme::Http,
            address: "10.0.0.1",
            resource: ResourceType::Address,
            key: None,
            record_id: None,
        };
        assert_eq!(
            endpoint.url().unwrap().as_str(),
            "http://10.0.0.1/nitro/v1/config/dnsaddrec"
        );

        let endpoint = NitroEndpoint {
            scheme: Scheme::Https,
            address: "10.0.0.1:8443",
            resource: ResourceType::Text,
            key: Some("example.com"),
            record_id: None,
        };
        assert_eq!(
            endpoint.url().unwrap().as_str(),
            "https://10.0.0.1:8443/nitro/v1/config/dnstxtrec/example.com"
        );
    }

    #[test]
    fn endpoint_escapes_key_and_record_id() {
        let record_id = RecordId("7&args=recordid:8".to_string());
        let endpoint = NitroEndpoint {
            scheme: Scheme::Http,
            address: "10.0.0.1",
            resource: ResourceType::Address,
            key: Some("a/b?c#d"),
            record_id: Some(&record_id),
        };
        let url = endpoint.url().unwrap();
        assert_eq!(url.path(), "/nitro/v1/config/dnsaddrec/a%2Fb%3Fc%23d");
        assert_eq!(url.fragment(), None);
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![("args".to_string(), "recordid:7&args=recordid:8".to_string())]
        );
    }

    #[test]
    fn endpoint_rejects_bad_address() {
        let endpoint = NitroEndpoint {
            scheme: Scheme::Http,
            address: "",
            resource: ResourceType::Address,
            key: None,
            record_id: None,
        };
        assert!(matches!(
            endpoint.url(),
            Err(ApiError::InvalidAddress { .. })
        ));
    }

    #[test]
    fn outcome_carries_the_response() {
        let created = Outcome::Created {
            body: "{ \"errorcode\": 0 }".to_string(),
        };
        assert_eq!(created.to_string(), "created, { \"errorcode\": 0 }");

        let listed = Outcome::Listed {
            response: serde_json::json!({ "dnsnsrec": [] }),
        };
        assert_eq!(listed.to_string(), r#"{"dnsnsrec":[]}"#);

        let deleted = Outcome::Deleted {
            record_id: RecordId("41".to_string()),
            body: "{ \"errorcode\": 0 }".to_string(),
        };
        assert_eq!(
            deleted.to_string(),
            "deleted recordid 41, { \"errorcode\": 0 }"
        );
    }

    #[test]
    fn parse_operation() {
        assert_eq!("ADD".parse::<Operation>().unwrap(), Operation::Create);
        assert_eq!("delete".parse::<Operation>().unwrap(), Operation::Delete);
        assert_eq!("Get".parse::<Operation>().unwrap(), Operation::List);
        assert!("PATCH".parse::<Operation>().is_err());
    }

    #[test]
    fn lookup_without_records() {
        let body = r#"{ "errorcode": 0, "message": "Done", "severity": "NONE", "dnsaddrec": [] }"#;
        assert_eq!(
            decode_lookup(body, ResourceType::Address).unwrap(),
            Lookup::NotFound
        );
        let body = r#"{ "errorcode": 0, "message": "Done", "severity": "NONE" }"#;
        assert_eq!(
            decode_lookup(body, ResourceType::Address).unwrap(),
            Lookup::NotFound
        );
    }

    #[test]
    fn lookup_takes_first_record() {
        let body = r#"{
            "errorcode": 0,
            "dnsmxrec": [
                { "domain": "example.com", "mx": "a.example.com", "recordid": "41" },
                { "domain": "example.com", "mx": "b.example.com", "recordid": "42" }
            ]
        }"#;
        assert_eq!(
            decode_lookup(body, ResourceType::MailExchange).unwrap(),
            Lookup::Found(RecordId("41".to_string()))
        );
    }

    #[test]
    fn lookup_accepts_numeric_record_id() {
        let body = r#"{ "dnstxtrec": [ { "domain": "example.com", "recordid": 7 } ] }"#;
        assert_eq!(
            decode_lookup(body, ResourceType::Text).unwrap(),
            Lookup::Found(RecordId("7".to_string()))
        );
    }

    #[test]
    fn lookup_failures() {
        let body = r#"{ "dnsaddrec": [ { "hostname": "example.com" } ] }"#;
        assert!(matches!(
            decode_lookup(body, ResourceType::Address),
            Err(ApiError::MissingRecordId(ResourceType::Address))
        ));

        let body = r#"{ "errorcode": 258, "message": "No such resource", "severity": "ERROR" }"#;
        match decode_lookup(body, ResourceType::Address) {
            Err(ApiError::Nitro { code, message }) => {
                assert_eq!(code, 258);
                assert_eq!(message, "No such resource");
            }
            other => panic!("Expected a NITRO error, got {other:?}"),
        }

        assert!(matches!(
            decode_lookup("<html>", ResourceType::Address),
            Err(ApiError::Decode(_))
        ));
        assert!(matches!(
            decode_lookup(r#"{ "dnsaddrec": "nope" }"#, ResourceType::Address),
            Err(ApiError::Decode(_))
        ));
    }

    #[test]
    fn response_with_error_code() {
        assert!(decode_response(r#"{ "errorcode": 0, "dnsnsrec": [] }"#).is_ok());
        assert!(matches!(
            decode_response(r#"{ "errorcode": 354, "message": "Invalid username or password" }"#),
            Err(ApiError::Nitro { code: 354, .. })
        ));
        assert!(matches!(decode_response(""), Err(ApiError::Decode(_))));
    }

    /// Answers lookups with a fixed result and records every delete.
    struct FakeApi {
        lookup: Lookup,
        deleted: Mutex<Vec<RecordId>>,
    }

    #[async_trait]
    impl RecordApi for FakeApi {
        async fn create(&self, _: &Credential, _: &RecordDescriptor) -> Result<Outcome, ApiError> {
            unreachable!("create is not used in these tests")
        }
        async fn list(&self, _: &Credential, _: ResourceType) -> Result<Outcome, ApiError> {
            unreachable!("list is not used in these tests")
        }
        async fn lookup_record_id(
            &self,
            _: &Credential,
            _: &RecordDescriptor,
        ) -> Result<Lookup, ApiError> {
            Ok(self.lookup.clone())
        }
        async fn delete_record(
            &self,
            _: &Credential,
            _: &RecordDescriptor,
            record_id: &RecordId,
        ) -> Result<Outcome, ApiError> {
            self.deleted.lock().unwrap().push(record_id.clone());
            Ok(Outcome::Deleted {
                record_id: record_id.clone(),
                body: String::new(),
            })
        }
    }

    fn fixture() -> (Credential, RecordDescriptor) {
        let credential = Credential {
            address: "10.0.0.1".to_string(),
            account: "nsroot".to_string(),
            secret: "nspass".to_string(),
        };
        let fields = RecordFields {
            hostname: Some("example.com".to_string()),
            ..RecordFields::default()
        };
        (credential, build_descriptor("a", &fields, 0).unwrap())
    }

    #[tokio::test]
    async fn delete_not_found_sends_no_delete() {
        let api = FakeApi {
            lookup: Lookup::NotFound,
            deleted: Mutex::new(Vec::new()),
        };
        let (credential, descriptor) = fixture();
        match api.apply(&credential, &descriptor, Operation::Delete).await {
            Err(ApiError::NoRecordFound { resource, key }) => {
                assert_eq!(resource, ResourceType::Address);
                assert_eq!(key, "example.com");
            }
            other => panic!("Expected no record found, got {other:?}"),
        }
        assert!(api.deleted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_found_sends_one_delete() {
        let api = FakeApi {
            lookup: Lookup::Found(RecordId("41".to_string())),
            deleted: Mutex::new(Vec::new()),
        };
        let (credential, descriptor) = fixture();
        api.apply(&credential, &descriptor, Operation::Delete)
            .await
            .expect("Failed to delete");
        assert_eq!(
            *api.deleted.lock().unwrap(),
            vec![RecordId("41".to_string())]
        );
    }
}
