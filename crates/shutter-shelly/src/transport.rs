//! HTTP transport to one device
//!
//! Owns a single reusable `reqwest::Client` for one address. After any failed
//! call the client is dropped and a fresh one is built lazily before the next
//! call, so no request is ever retried on a broken session.
//!
//! The session lock is held for the whole request, which also serializes the
//! poll task and direct command callers of the same device.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde::de::DeserializeOwned;
use shutter_core::{Error, Result};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// HTTP session bound to one device address
pub struct Transport {
    address: String,
    timeout: Duration,
    session: Mutex<Option<reqwest::Client>>,
    renewals: AtomicUsize,
}

impl Transport {
    /// Create a transport for `address` (no connection is opened yet)
    pub fn new(address: impl Into<String>, timeout: Duration) -> Self {
        Self {
            address: address.into(),
            timeout,
            session: Mutex::new(None),
            renewals: AtomicUsize::new(0),
        }
    }

    /// Device base URI
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Number of times the session was discarded after a failure
    pub fn session_renewals(&self) -> usize {
        self.renewals.load(Ordering::SeqCst)
    }

    /// GET `path` and decode the JSON body
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let uri = self.uri(path);
        let mut session = self.session.lock().await;
        let client = self.client(&mut session)?;

        let result = fetch_json(&client, &uri).await;
        self.finish(&mut session, &uri, result)
    }

    /// GET `path`, accepting any 2xx status and ignoring the body
    pub async fn get(&self, path: &str) -> Result<()> {
        let uri = self.uri(path);
        let mut session = self.session.lock().await;
        let client = self.client(&mut session)?;

        let result = fetch(&client, &uri).await.map(|_| ());
        self.finish(&mut session, &uri, result)
    }

    fn uri(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// Current client, building a new one if the last was discarded
    fn client(&self, session: &mut Option<reqwest::Client>) -> Result<reqwest::Client> {
        if let Some(client) = session.as_ref() {
            return Ok(client.clone());
        }

        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| Error::transport(&self.address, format!("cannot build client: {}", e)))?;

        debug!("Opened session for {}", self.address);
        *session = Some(client.clone());
        Ok(client)
    }

    /// Map the outcome, discarding the session on failure
    fn finish<T>(
        &self,
        session: &mut Option<reqwest::Client>,
        uri: &str,
        result: std::result::Result<T, String>,
    ) -> Result<T> {
        result.map_err(|message| {
            info!("Renew session for {}", self.address);
            *session = None;
            self.renewals.fetch_add(1, Ordering::SeqCst);
            Error::transport(&self.address, format!("called {} got {}", uri, message))
        })
    }
}

async fn fetch(client: &reqwest::Client, uri: &str) -> std::result::Result<reqwest::Response, String> {
    let response = client.get(uri).send().await.map_err(|e| e.to_string())?;

    let status = response.status();
    if !status.is_success() {
        return Err(format!("HTTP error: {}", status));
    }

    Ok(response)
}

async fn fetch_json<T: DeserializeOwned>(
    client: &reqwest::Client,
    uri: &str,
) -> std::result::Result<T, String> {
    let response = fetch(client, uri).await?;
    let body = response
        .text()
        .await
        .map_err(|e| format!("Failed to read response: {}", e))?;

    serde_json::from_str(&body).map_err(|e| format!("{} {}", body.trim(), e))
}
