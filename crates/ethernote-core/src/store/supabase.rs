//! PostgREST client for a Supabase project.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Deserialize;

use super::{OrderBy, Record, RemoteStore, StoreError, StoreResult};
use crate::config::{StoreConfig, DEFAULT_TIMEOUT_SECS};
use crate::util::error_excerpt;

#[derive(Clone)]
pub struct SupabaseStore {
    rest_url: String,
    anon_key: String,
    access_token: Option<String>,
    client: Client,
}

impl fmt::Debug for SupabaseStore {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SupabaseStore")
            .field("rest_url", &self.rest_url)
            .field("anon_key", &"[REDACTED]")
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish_non_exhaustive()
    }
}

impl SupabaseStore {
    pub fn new(url: impl AsRef<str>, anon_key: impl Into<String>) -> StoreResult<Self> {
        Self::build(
            url.as_ref(),
            anon_key.into(),
            None,
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        )
    }

    pub fn from_config(config: &StoreConfig) -> StoreResult<Self> {
        Self::build(
            &config.supabase_url,
            config.supabase_anon_key.clone(),
            config.access_token.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Authenticate row access as a signed-in user instead of the anon role
    #[must_use]
    pub fn with_access_token(mut self, access_token: impl Into<String>) -> Self {
        let token = access_token.into().trim().to_string();
        self.access_token = (!token.is_empty()).then_some(token);
        self
    }

    fn build(
        url: &str,
        anon_key: String,
        access_token: Option<String>,
        timeout: Duration,
    ) -> StoreResult<Self> {
        let rest_url = normalize_rest_url(url)?;
        let anon_key = anon_key.trim().to_string();
        if anon_key.is_empty() {
            return Err(StoreError::Unavailable(
                "Supabase anon key must not be empty".to_string(),
            ));
        }

        Ok(Self {
            rest_url,
            anon_key,
            access_token,
            client: Client::builder().timeout(timeout).build()?,
        })
    }

    fn request(&self, method: Method, collection: &str) -> RequestBuilder {
        let bearer = self.access_token.as_deref().unwrap_or(&self.anon_key);
        self.client
            .request(method, format!("{}/{}", self.rest_url, collection))
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer)
            .header("Accept", "application/json")
    }

    async fn send(request: RequestBuilder) -> StoreResult<Response> {
        let response = request.send().await?;
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(StoreError::Api {
            status,
            message: parse_api_message(&body, status),
        })
    }

    async fn rows(response: Response) -> StoreResult<Vec<Record>> {
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|error| StoreError::Decode(error.to_string()))
    }
}

#[async_trait]
impl RemoteStore for SupabaseStore {
    async fn list(&self, collection: &str, order: &OrderBy) -> StoreResult<Vec<Record>> {
        let order = format!("{}.{}", order.field, order.direction.as_str());
        let request = self
            .request(Method::GET, collection)
            .query(&[("select", "*"), ("order", order.as_str())]);
        Self::rows(Self::send(request).await?).await
    }

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Record> {
        let filter = format!("eq.{id}");
        let request = self
            .request(Method::GET, collection)
            .query(&[("select", "*"), ("id", filter.as_str())]);
        Self::rows(Self::send(request).await?)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn insert(&self, collection: &str, fields: Record) -> StoreResult<Record> {
        let request = self
            .request(Method::POST, collection)
            .header("Prefer", "return=representation")
            .json(&fields);
        Self::rows(Self::send(request).await?)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Decode("insert returned no rows".to_string()))
    }

    async fn update(&self, collection: &str, id: &str, fields: Record) -> StoreResult<()> {
        let filter = format!("eq.{id}");
        let request = self
            .request(Method::PATCH, collection)
            .query(&[("id", filter.as_str())])
            .header("Prefer", "return=representation")
            .json(&fields);
        let updated = Self::rows(Self::send(request).await?).await?;
        if updated.is_empty() {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        let filter = format!("eq.{id}");
        let request = self
            .request(Method::DELETE, collection)
            .query(&[("id", filter.as_str())]);
        Self::send(request).await?;
        Ok(())
    }
}

/// Turn a project URL into its REST endpoint base.
fn normalize_rest_url(url: &str) -> StoreResult<String> {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(StoreError::Unavailable(
            "Supabase URL must not be empty".to_string(),
        ));
    }
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(StoreError::Unavailable(
            "Supabase URL must include http:// or https://".to_string(),
        ));
    }
    if trimmed.ends_with("/rest/v1") {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("{trimmed}/rest/v1"))
    }
}

#[derive(Debug, Deserialize)]
struct PostgrestErrorResponse {
    message: Option<String>,
    msg: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
    details: Option<String>,
}

fn parse_api_message(body: &str, status: u16) -> String {
    if let Ok(payload) = serde_json::from_str::<PostgrestErrorResponse>(body) {
        if let Some(message) = payload
            .message
            .or(payload.msg)
            .or(payload.error_description)
            .or(payload.error)
            .or(payload.details)
        {
            return message.trim().to_string();
        }
    }

    let trimmed = error_excerpt(body);
    if trimmed.is_empty() {
        format!("HTTP {status}")
    } else {
        trimmed
    }
}
