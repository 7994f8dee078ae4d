//! Update-channel client: metadata check and streamed archive download.

use crate::config::UpdateConfig;
use crate::error::UpdateError;
use reqwest::Client;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;

const USER_AGENT: &str = concat!("hearth/", env!("CARGO_PKG_VERSION"));

/// Remote answer to "is `installed` current on this channel?".
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateCheck {
    #[serde(rename = "upToDate")]
    pub up_to_date: bool,
    #[serde(default)]
    pub current_version: String,
    #[serde(default)]
    pub download_url: String,
}

pub struct UpdateClient {
    check: Client,
    download: Client,
    endpoint: String,
}

impl UpdateClient {
    /// Two clients with distinct bounds: a short one for the metadata check,
    /// a longer one for the archive stream. A slow or absent network must
    /// never block startup indefinitely.
    pub fn new(config: &UpdateConfig) -> Self {
        Self {
            check: build_client(config.check_timeout_secs),
            download: build_client(config.download_timeout_secs),
            endpoint: config.endpoint.trim_end_matches('/').to_owned(),
        }
    }

    /// `GET <endpoint>/apps/<channel>/ota?installed=<version>`.
    pub async fn check(&self, channel: &str, installed: &str) -> Result<UpdateCheck, UpdateError> {
        let url = format!("{}/apps/{channel}/ota", self.endpoint);
        let response = self
            .check
            .get(&url)
            .query(&[("installed", installed)])
            .header("Accept", "application/json")
            .header("User-Agent", USER_AGENT)
            .send()
            .await
            .map_err(|e| UpdateError::Check(e.to_string()))?;

        if !response.status().is_success() {
            return Err(UpdateError::Check(format!(
                "endpoint returned {}",
                response.status()
            )));
        }

        response
            .json::<UpdateCheck>()
            .await
            .map_err(|e| UpdateError::Check(format!("malformed response: {e}")))
    }

    /// Stream an archive to `dest` without buffering it in memory; returns
    /// the byte count.
    pub async fn download_to(&self, url: &str, dest: &Path) -> Result<u64, UpdateError> {
        let mut response = self
            .download
            .get(url)
            .header("User-Agent", USER_AGENT)
            .send()
            .await
            .map_err(|e| UpdateError::Download(e.to_string()))?;

        if !response.status().is_success() {
            return Err(UpdateError::Download(format!(
                "archive endpoint returned {}",
                response.status()
            )));
        }

        let mut file = tokio::fs::File::create(dest).await?;
        let mut total: u64 = 0;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| UpdateError::Download(e.to_string()))?
        {
            file.write_all(&chunk).await?;
            total += chunk.len() as u64;
        }
        file.flush().await?;

        tracing::info!(bytes = total, "📥 download complete");
        Ok(total)
    }
}

fn build_client(timeout_secs: u64) -> Client {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(timeout_secs))
        .build()
        .unwrap_or_else(|_| Client::new())
}
