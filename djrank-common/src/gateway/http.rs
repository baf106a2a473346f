//! HTTP gateway backend
//!
//! Talks to a djrank-server over its JSON API. Mutations carry the admin
//! token in the `X-Admin-Token` header when one is configured.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use tracing::debug;

use super::Gateway;
use crate::api::{ErrorResponse, ADMIN_TOKEN_HEADER};
use crate::performer::{NewPerformer, Performer, PerformerPatch};
use crate::{Error, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: Url,
    admin_token: Option<String>,
}

impl HttpGateway {
    pub fn new(base_url: impl AsRef<str>, admin_token: Option<String>) -> Result<Self> {
        let raw = base_url.as_ref().trim();
        let base_url = Url::parse(raw)
            .map_err(|e| Error::Config(format!("Invalid server URL {:?}: {}", raw, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Config(format!("Server URL {:?} cannot be a base", raw)));
        }
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url,
            admin_token: admin_token.filter(|t| !t.is_empty()),
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// Base URL with `segments` appended; each segment is percent-encoded
    fn url<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::Config(format!("Server URL {} cannot be a base", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn collection_url(&self) -> Result<Url> {
        self.url(["api", "performers"])
    }

    fn performer_url(&self, id: &str) -> Result<Url> {
        self.url(["api", "performers", id])
    }

    fn with_token(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.admin_token {
            Some(token) => request.header(ADMIN_TOKEN_HEADER, token),
            None => request,
        }
    }

    /// Turn a non-success response into a typed error
    async fn failure(response: Response) -> Error {
        let status = response.status();
        let message = match response.json::<ErrorResponse>().await {
            Ok(body) => body.error,
            Err(_) => status.canonical_reason().unwrap_or("request failed").to_string(),
        };

        match status {
            StatusCode::NOT_FOUND => Error::NotFound(message),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                Error::InvalidInput(message)
            }
            StatusCode::CONFLICT => Error::Conflict(message),
            StatusCode::FORBIDDEN | StatusCode::UNAUTHORIZED => Error::Forbidden(message),
            _ => Error::Gateway(format!("{}: {}", status, message)),
        }
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn list(&self) -> Result<Vec<Performer>> {
        let response = self.client.get(self.collection_url()?).send().await?;
        if !response.status().is_success() {
            return Err(Self::failure(response).await);
        }
        Ok(response.json().await?)
    }

    async fn get(&self, id: &str) -> Result<Option<Performer>> {
        let response = self.client.get(self.performer_url(id)?).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response.json().await?)),
            _ => Err(Self::failure(response).await),
        }
    }

    async fn create(&self, new: NewPerformer) -> Result<Performer> {
        let request = self.client.post(self.collection_url()?).json(&new);
        let response = self.with_token(request).send().await?;
        if !response.status().is_success() {
            return Err(Self::failure(response).await);
        }
        let performer: Performer = response.json().await?;
        debug!(id = %performer.id, "http gateway: created");
        Ok(performer)
    }

    async fn update(&self, id: &str, patch: PerformerPatch) -> Result<Option<Performer>> {
        let request = self.client.put(self.performer_url(id)?).json(&patch);
        let response = self.with_token(request).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response.json().await?)),
            _ => Err(Self::failure(response).await),
        }
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let request = self.client.delete(self.performer_url(id)?);
        let response = self.with_token(request).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            _ => Err(Self::failure(response).await),
        }
    }

    fn backend_name(&self) -> &'static str {
        "http"
    }
}
