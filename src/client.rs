use crate::state::{RamStats, Snapshot, VramStats};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use thiserror::Error;

pub const SYSINFO_PATH: &str = "/inteliweb_sysinfo";
pub const SYSTEM_INFO_PATH: &str = "/inteliweb/system_info";
pub const TELEMETRY_PATH: &str = "/inteliweb/telemetry";
pub const FREE_VRAM_PATH: &str = "/inteliweb/free_vram";
pub const FREE_RAM_PATH: &str = "/inteliweb/free_ram";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        source: reqwest::Error,
    },
    #[error("{url} -> {status}")]
    Status { url: String, status: u16 },
    #[error("invalid JSON from {url}: {source}")]
    Decode {
        url: String,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ResourceReport {
    #[serde(default)]
    pub vram: Option<VramStats>,
    #[serde(default)]
    pub ram: Option<RamStats>,
}

#[derive(Clone, Debug)]
pub struct TelemetryClient {
    http: Client,
    base_url: String,
}

impl TelemetryClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = Client::builder()
            .user_agent(concat!("sysdash/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self::with_client(http, base_url)
    }

    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, FetchError> {
        let url = self.endpoint(path);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| FetchError::Request {
                url: url.clone(),
                source,
            })?;
        serde_json::from_slice(&body).map_err(|source| FetchError::Decode { url, source })
    }

    // Non-string JSON values are kept in their JSON text form; nulls are dropped.
    pub async fn sysinfo(&self) -> Result<Snapshot, FetchError> {
        let raw: HashMap<String, serde_json::Value> = self.get_json(SYSINFO_PATH).await?;
        Ok(snapshot_from_json(raw))
    }

    pub async fn system_info(&self) -> Result<ResourceReport, FetchError> {
        self.get_json(SYSTEM_INFO_PATH).await
    }

    pub async fn telemetry(&self) -> Result<ResourceReport, FetchError> {
        self.get_json(TELEMETRY_PATH).await
    }

    pub async fn free_vram(&self) -> Result<ResourceReport, FetchError> {
        self.get_json(&format!("{FREE_VRAM_PATH}?mode=aggressive"))
            .await
    }

    pub async fn free_ram(&self) -> Result<ResourceReport, FetchError> {
        self.get_json(FREE_RAM_PATH).await
    }
}

fn snapshot_from_json(raw: HashMap<String, serde_json::Value>) -> Snapshot {
    let facts = raw
        .into_iter()
        .filter_map(|(key, value)| match value {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some((key, s)),
            other => Some((key, other.to_string())),
        })
        .collect();
    Snapshot::new(facts)
}
