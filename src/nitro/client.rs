use async_trait::async_trait;
use reqwest::{header, Client, ClientBuilder, RequestBuilder, Url};
use std::collections::BTreeMap;
use tracing::debug;

use super::{
    decode_lookup, decode_response, ApiError, Lookup, NitroEndpoint, Outcome, RecordApi,
    RecordId,
};
use crate::config::Scheme;
use crate::credentials::Credential;
use crate::record::{RecordDescriptor, ResourceType};

fn api_client() -> Result<Client, ApiError> {
    let client_builder = ClientBuilder::new();

    let mut headers = header::HeaderMap::new();
    let json_value = header::HeaderValue::from_static("application/json");
    headers.insert(header::CONTENT_TYPE, json_value.clone());
    headers.insert(header::ACCEPT, json_value);
    let client = client_builder.default_headers(headers).build()?;
    Ok(client)
}

/// Talks to the NITRO API of each appliance over HTTP.
///
/// Nothing is shared between requests: every call builds its own client and authenticates
/// with the credential it was given.
#[derive(Debug, Default, Clone, Copy)]
pub struct NitroClient {
    scheme: Scheme,
}

impl NitroClient {
    pub fn new(scheme: Scheme) -> Self {
        NitroClient { scheme }
    }

    fn url(
        &self,
        credential: &Credential,
        resource: ResourceType,
        key: Option<&str>,
        record_id: Option<&RecordId>,
    ) -> Result<Url, ApiError> {
        NitroEndpoint {
            scheme: self.scheme,
            address: &credential.address,
            resource,
            key,
            record_id,
        }
        .url()
    }

    /// Sends the request and returns the body of a successful response.
    async fn send(&self, credential: &Credential, req: RequestBuilder) -> Result<String, ApiError> {
        let response = req
            .basic_auth(&credential.account, Some(&credential.secret))
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(address = %credential.address, %status, "Received response");
        if !status.is_success() {
            return Err(ApiError::Status { status, body });
        }
        Ok(body)
    }
}

#[async_trait]
impl RecordApi for NitroClient {
    async fn create(
        &self,
        credential: &Credential,
        descriptor: &RecordDescriptor,
    ) -> Result<Outcome, ApiError> {
        let resource = descriptor.resource_type();
        let url = self.url(credential, resource, None, None)?;
        debug!(address = %credential.address, "POST {}", url);

        let payload = BTreeMap::from([(resource.api_name(), &descriptor.record)]);
        let req = api_client()?.post(url).json(&payload);
        let body = self.send(credential, req).await?;
        Ok(Outcome::Created { body })
    }

    async fn list(
        &self,
        credential: &Credential,
        resource: ResourceType,
    ) -> Result<Outcome, ApiError> {
        let url = self.url(credential, resource, None, None)?;
        debug!(address = %credential.address, "GET {}", url);

        let req = api_client()?.get(url);
        let body = self.send(credential, req).await?;
        let response = decode_response(&body)?;
        Ok(Outcome::Listed { response })
    }

    async fn lookup_record_id(
        &self,
        credential: &Credential,
        descriptor: &RecordDescriptor,
    ) -> Result<Lookup, ApiError> {
        let resource = descriptor.resource_type();
        let url = self.url(credential, resource, Some(&descriptor.lookup_key), None)?;
        debug!(address = %credential.address, "GET {}", url);

        let req = api_client()?.get(url);
        let body = self.send(credential, req).await?;
        decode_lookup(&body, resource)
    }

    async fn delete_record(
        &self,
        credential: &Credential,
        descriptor: &RecordDescriptor,
        record_id: &RecordId,
    ) -> Result<Outcome, ApiError> {
        let resource = descriptor.resource_type();
        let url = self.url(
            credential,
            resource,
            Some(&descriptor.lookup_key),
            Some(record_id),
        )?;
        debug!(address = %credential.address, "DELETE {}", url);

        let req = api_client()?.delete(url);
        let body = self.send(credential, req).await?;
        Ok(Outcome::Deleted {
            record_id: record_id.clone(),
            body,
        })
    }
}
