//! Hosted Backend
//!
//! PostgREST tables, object storage and auth over `reqwest`. Realtime is
//! delegated to an injected `ChangeSource` because the socket lives in
//! the browser.

use std::rc::Rc;
use std::sync::RwLock;

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::Value;

use super::feed::{ChangeFeed, ChangeSource};
use super::query::{filter_params, Filter, Query};
use super::traits::{Backend, Upload};
use crate::config::ClientConfig;
use crate::domain::Table;
use crate::error::{BackendError, BackendResult};

/// Seconds a stored object may be cached by the CDN
pub const STORAGE_CACHE_SECS: u32 = 3600;

const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Percent-encode each `/`-separated segment of an object path
pub fn encode_object_path(path: &str) -> String {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| utf8_percent_encode(segment, PATH_SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

/// Account returned by `/auth/v1/user`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: Value,
}

impl AuthUser {
    /// Display name from the sign-up metadata, falling back to the email's local part
    pub fn display_name(&self) -> String {
        self.user_metadata
            .get("name")
            .or_else(|| self.user_metadata.get("full_name"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| {
                self.email
                    .as_deref()
                    .and_then(|email| email.split('@').next())
                    .map(str::to_string)
            })
            .unwrap_or_default()
    }
}

pub struct SupabaseBackend {
    client: Client,
    base_url: String,
    anon_key: String,
    access_token: RwLock<Option<String>>,
    realtime: Option<Rc<dyn ChangeSource>>,
}

impl SupabaseBackend {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
            access_token: RwLock::new(None),
            realtime: None,
        }
    }

    pub fn with_change_source(mut self, source: Rc<dyn ChangeSource>) -> Self {
        self.realtime = Some(source);
        self
    }

    pub fn set_access_token(&self, token: Option<String>) {
        *self
            .access_token
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = token;
    }

    pub fn access_token(&self) -> Option<String> {
        self.access_token
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn rest_url(&self, table: Table) -> String {
        format!("{}/rest/v1/{}", self.base_url, table.name())
    }

    pub fn object_url(&self, bucket: &str, path: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url,
            encode_object_path(bucket),
            encode_object_path(path)
        )
    }

    pub fn public_url(&self, bucket: &str, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url,
            encode_object_path(bucket),
            encode_object_path(path)
        )
    }

    /// WebSocket endpoint for the realtime channel
    pub fn realtime_url(&self) -> String {
        let ws_base = if let Some(rest) = self.base_url.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = self.base_url.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            self.base_url.clone()
        };
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("apikey", &self.anon_key)
            .append_pair("vsn", "1.0.0")
            .finish();
        format!("{}/realtime/v1/websocket?{}", ws_base, query)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let bearer = self.access_token().unwrap_or_else(|| self.anon_key.clone());
        request
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", bearer))
    }

    async fn checked(response: Response) -> BackendResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = error_message(&body).unwrap_or_else(|| status.to_string());
        tracing::warn!(status = status.as_u16(), %message, "hosted backend rejected request");
        Err(BackendError::from_status(status.as_u16(), message))
    }

    async fn send_json(&self, request: RequestBuilder) -> BackendResult<Value> {
        let response = Self::checked(self.authorized(request).send().await?).await?;
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    fn rows(value: Value) -> BackendResult<Vec<Value>> {
        match value {
            Value::Array(rows) => Ok(rows),
            Value::Null => Ok(Vec::new()),
            other => Err(BackendError::Decode(format!("expected a row array, got {}", other))),
        }
    }

    /// The signed-in account for the current access token
    pub async fn fetch_auth_user(&self) -> BackendResult<AuthUser> {
        if self.access_token().is_none() {
            return Err(BackendError::PermissionDenied("no access token".into()));
        }
        tracing::debug!("fetching auth user");
        let url = format!("{}/auth/v1/user", self.base_url);
        let value = self.send_json(self.client.get(url)).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Revoke the current access token and forget it locally
    pub async fn sign_out(&self) -> BackendResult<()> {
        if self.access_token().is_some() {
            let url = format!("{}/auth/v1/logout", self.base_url);
            self.send_json(self.client.post(url)).await?;
        }
        self.set_access_token(None);
        Ok(())
    }
}

/// Pull a human-readable message out of a PostgREST / storage / auth error body
fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["message", "error_description", "msg", "error"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

#[async_trait(?Send)]
impl Backend for SupabaseBackend {
    async fn select(&self, query: Query) -> BackendResult<Vec<Value>> {
        tracing::debug!(table = %query.table, "select");
        let request = self.client.get(self.rest_url(query.table)).query(&query.to_params());
        Self::rows(self.send_json(request).await?)
    }

    async fn insert(&self, table: Table, row: Value) -> BackendResult<Value> {
        tracing::debug!(%table, "insert");
        let request = self
            .client
            .post(self.rest_url(table))
            .header("Prefer", "return=representation")
            .json(&row);
        Self::rows(self.send_json(request).await?)?
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::Decode(format!("insert into {} returned no row", table)))
    }

    async fn update(&self, table: Table, filters: Vec<Filter>, patch: Value) -> BackendResult<Vec<Value>> {
        tracing::debug!(%table, "update");
        let request = self
            .client
            .patch(self.rest_url(table))
            .query(&filter_params(&filters))
            .header("Prefer", "return=representation")
            .json(&patch);
        Self::rows(self.send_json(request).await?)
    }

    async fn delete(&self, table: Table, filters: Vec<Filter>) -> BackendResult<()> {
        tracing::debug!(%table, "delete");
        let request = self
            .client
            .delete(self.rest_url(table))
            .query(&filter_params(&filters));
        self.send_json(request).await.map(|_| ())
    }

    async fn upload(&self, upload: Upload) -> BackendResult<String> {
        tracing::debug!(bucket = %upload.bucket, path = %upload.path, "upload");
        let request = self
            .client
            .post(self.object_url(&upload.bucket, &upload.path))
            .header("Content-Type", &upload.content_type)
            .header("cache-control", format!("max-age={}", STORAGE_CACHE_SECS))
            .header("x-upsert", "false")
            .body(upload.bytes);
        self.send_json(request).await?;
        Ok(self.public_url(&upload.bucket, &upload.path))
    }

    fn changes(&self, table: Table, filter: Filter) -> BackendResult<ChangeFeed> {
        match &self.realtime {
            Some(source) => source.subscribe(table, &filter, self.access_token()),
            None => Err(BackendError::Unavailable("realtime transport not configured".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn backend() -> SupabaseBackend {
        SupabaseBackend::new(&ClientConfig {
            supabase_url: "https://abc.supabase.co/".into(),
            anon_key: "anon".into(),
            ..ClientConfig::default()
        })
    }

    #[test]
    fn test_urls() {
        let backend = backend();
        assert_eq!(backend.rest_url(Table::Memories), "https://abc.supabase.co/rest/v1/memories");
        assert_eq!(
            backend.public_url("photos", "v1/17-my pic.png"),
            "https://abc.supabase.co/storage/v1/object/public/photos/v1/17-my%20pic.png"
        );
        assert_eq!(
            backend.realtime_url(),
            "wss://abc.supabase.co/realtime/v1/websocket?apikey=anon&vsn=1.0.0"
        );
    }

    #[test]
    fn test_realtime_url_encodes_key() {
        let backend = SupabaseBackend::new(&ClientConfig {
            supabase_url: "https://abc.supabase.co".into(),
            anon_key: "a+b/c=&d".into(),
            ..ClientConfig::default()
        });
        assert_eq!(
            backend.realtime_url(),
            "wss://abc.supabase.co/realtime/v1/websocket?apikey=a%2Bb%2Fc%3D%26d&vsn=1.0.0"
        );
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(
            error_message(r#"{"code":"42501","message":"new row violates row-level security policy"}"#),
            Some("new row violates row-level security policy".to_string())
        );
        assert_eq!(error_message("<html>"), None);
    }

    #[test]
    fn test_changes_without_transport() {
        let err = backend()
            .changes(Table::Threads, Filter::eq("memory_id", "m1"))
            .unwrap_err();
        assert!(matches!(err, BackendError::Unavailable(_)));
    }

    #[test]
    fn test_auth_user_display_name() {
        let user: AuthUser = serde_json::from_value(json!({
            "id": "u1",
            "email": "ada@example.com",
            "user_metadata": {}
        }))
        .unwrap();
        assert_eq!(user.display_name(), "ada");
    }
}
