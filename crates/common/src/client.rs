//! HTTP client wrapper for the API under test
//!
//! Every call returns the raw status plus a leniently parsed JSON body;
//! deciding whether a status is acceptable belongs to the test case, not
//! to the transport layer.

use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::config::HarnessConfig;
use crate::error::{Error, Result};
use crate::types::CreatedId;

/// Response from one API call
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Parsed JSON body, `Value::Null` when the body is not JSON
    pub body: Value,
    /// Raw body text, for failure details
    pub text: String,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Deserialize the body into a typed shape
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.body.clone())?)
    }

    /// Extract the numeric `id` a successful creation must carry
    pub fn created_id(&self) -> Result<u64> {
        let created: CreatedId = self
            .json()
            .map_err(|_| Error::MissingField("id".to_string()))?;
        Ok(created.id)
    }

    /// Short "Status: NNN, Body: ..." string for failure details
    pub fn describe(&self) -> String {
        let mut body = self.text.clone();
        if body.len() > 200 {
            // Backend bodies carry multibyte text; cut on a char boundary
            let mut cut = 200;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body.truncate(cut);
            body.push_str("...");
        }
        format!("Status: {}, Body: {}", self.status.as_u16(), body)
    }
}

/// Client for the ThesisTrack REST API
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Build a client from harness configuration
    pub fn new(config: &HarnessConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(
        &self,
        req: reqwest::RequestBuilder,
        bearer: Option<&str>,
    ) -> reqwest::RequestBuilder {
        match bearer {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn execute(&self, req: reqwest::RequestBuilder) -> Result<ApiResponse> {
        let resp = req.send().await?;
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Ok(ApiResponse { status, body, text })
    }

    /// `GET` a path
    pub async fn get(&self, path: &str, bearer: Option<&str>) -> Result<ApiResponse> {
        let req = self.authorize(self.http.get(self.url(path)), bearer);
        self.execute(req).await
    }

    /// `GET` a path with query parameters
    pub async fn get_query(
        &self,
        path: &str,
        query: &[(&str, String)],
        bearer: Option<&str>,
    ) -> Result<ApiResponse> {
        let req = self.authorize(self.http.get(self.url(path)).query(query), bearer);
        self.execute(req).await
    }

    /// `POST` a JSON body
    pub async fn post_json<T: Serialize>(
        &self,
        path: &str,
        body: &T,
        bearer: Option<&str>,
    ) -> Result<ApiResponse> {
        let req = self.authorize(self.http.post(self.url(path)).json(body), bearer);
        self.execute(req).await
    }

    /// `PUT` a JSON body
    pub async fn put_json<T: Serialize>(
        &self,
        path: &str,
        body: &T,
        bearer: Option<&str>,
    ) -> Result<ApiResponse> {
        let req = self.authorize(self.http.put(self.url(path)).json(body), bearer);
        self.execute(req).await
    }

    /// `PUT` without a body (state-flip sub-resources like mark-read)
    pub async fn put_empty(&self, path: &str, bearer: Option<&str>) -> Result<ApiResponse> {
        let req = self.authorize(self.http.put(self.url(path)), bearer);
        self.execute(req).await
    }

    /// `DELETE` a path
    pub async fn delete(&self, path: &str, bearer: Option<&str>) -> Result<ApiResponse> {
        let req = self.authorize(self.http.delete(self.url(path)), bearer);
        self.execute(req).await
    }

    /// `POST` a single file as a multipart form
    pub async fn upload(
        &self,
        path: &str,
        field: &str,
        file_name: &str,
        mime: &str,
        bytes: Vec<u8>,
        bearer: Option<&str>,
    ) -> Result<ApiResponse> {
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime)?;
        let form = Form::new().part(field.to_string(), part);
        let req = self.authorize(self.http.post(self.url(path)).multipart(form), bearer);
        self.execute(req).await
    }

    /// `GET` raw bytes (file download endpoints)
    pub async fn download(
        &self,
        path: &str,
        bearer: Option<&str>,
    ) -> Result<(StatusCode, Option<String>, Vec<u8>)> {
        let req = self.authorize(self.http.get(self.url(path)), bearer);
        let resp = req.send().await?;
        let status = resp.status();
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());
        let bytes = resp.bytes().await?.to_vec();
        Ok((status, content_type, bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, text: &str) -> ApiResponse {
        ApiResponse {
            status: StatusCode::from_u16(status).unwrap(),
            body: serde_json::from_str(text).unwrap_or(Value::Null),
            text: text.to_string(),
        }
    }

    #[test]
    fn test_created_id_present() {
        let resp = response(201, r#"{"id": 42, "title": "x"}"#);
        assert_eq!(resp.created_id().unwrap(), 42);
    }

    #[test]
    fn test_created_id_missing() {
        let resp = response(201, r#"{"title": "x"}"#);
        assert!(resp.created_id().is_err());
    }

    #[test]
    fn test_non_json_body_is_null() {
        let resp = response(500, "Internal Server Error");
        assert_eq!(resp.body, Value::Null);
        assert_eq!(resp.text, "Internal Server Error");
    }

    #[test]
    fn test_describe_truncates_long_bodies() {
        let long = "x".repeat(500);
        let resp = response(400, &long);
        let desc = resp.describe();
        assert!(desc.starts_with("Status: 400"));
        assert!(desc.len() < 250);
    }

    #[test]
    fn test_describe_truncates_multibyte_bodies() {
        // first 'á' occupies bytes 199..201, straddling the 200-byte cut
        let body = format!("{}árbitro: credenciales inválidas", "x".repeat(199));
        let resp = response(401, &body);
        let desc = resp.describe();
        assert!(desc.starts_with("Status: 401"));
        assert!(desc.ends_with("..."));
    }
}
