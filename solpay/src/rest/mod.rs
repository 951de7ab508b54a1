pub mod endpoints;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{PayError, Result};

/// HTTP client wrapper for the backend REST API.
///
/// Holds a persistent cookie store so the server-set HTTP-only session
/// cookie rides along on every call, the way a browser's
/// `credentials: "include"` would.
#[derive(Debug, Clone)]
pub struct ApiHttpClient {
    client: Client,
    base_url: String,
}

impl ApiHttpClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder().cookie_store(true).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// GET a JSON resource. Non-2xx responses are errors.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self.client.get(&url).send().await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(PayError::Http {
                status,
                message: body,
            });
        }

        resp.json::<T>().await.map_err(PayError::Request)
    }

    /// POST a JSON body and decode the response envelope even on non-2xx
    /// status: the backend reports failures as `{success: false, error}`
    /// with an error status code attached.
    pub async fn post_envelope<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self.client.post(&url).json(body).send().await?;

        let status = resp.status();
        let text = resp.text().await?;
        match serde_json::from_str::<T>(&text) {
            Ok(value) => Ok(value),
            Err(_) if !status.is_success() => Err(PayError::Http {
                status: status.as_u16(),
                message: text,
            }),
            Err(e) => Err(PayError::Json(e)),
        }
    }

    /// POST a JSON body. Non-2xx responses are errors carrying the body
    /// text, without attempting to decode an envelope first.
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self.client.post(&url).json(body).send().await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(PayError::Http {
                status,
                message: body,
            });
        }

        resp.json::<T>().await.map_err(PayError::Request)
    }

    /// POST with an empty body.
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self.client.post(&url).send().await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(PayError::Http {
                status,
                message: body,
            });
        }

        resp.json::<T>().await.map_err(PayError::Request)
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}
