// HTTP stream fetcher

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use super::config::DownloaderConfig;
use super::errors::DownloadError;
use super::models::StreamDescriptor;
use super::traits::StreamFetcher;

/// Streams the media body straight to disk, no retries
pub struct HttpStreamFetcher {
    client: Client,
}

impl HttpStreamFetcher {
    pub fn new(config: &DownloaderConfig) -> Result<Self, DownloadError> {
        let mut builder = Client::builder()
            .connect_timeout(Duration::from_secs(config.socket_timeout_secs as u64))
            .user_agent(config.user_agent.clone());

        if let Some(proxy_url) = config.proxy.as_deref() {
            let proxy = reqwest::Proxy::all(proxy_url)
                .map_err(|e| DownloadError::Fetch(format!("Invalid proxy URL {}: {}", proxy_url, e)))?;
            builder = builder.proxy(proxy);
        }

        Ok(Self {
            client: builder.build()?,
        })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    async fn write_body(&self, url: &str, output_path: &Path) -> Result<u64, DownloadError> {
        let response = self.client.get(url).send().await?.error_for_status()?;

        let mut file = File::create(output_path).await?;
        let mut stream = response.bytes_stream();
        let mut total_size = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            total_size += chunk.len() as u64;
            file.write_all(&chunk).await?;
        }

        file.flush().await?;
        Ok(total_size)
    }
}

#[async_trait]
impl StreamFetcher for HttpStreamFetcher {
    async fn fetch(
        &self,
        stream: &StreamDescriptor,
        directory: &Path,
    ) -> Result<PathBuf, DownloadError> {
        let output_path = directory.join(&stream.default_filename);
        tracing::info!(
            format_id = %stream.format_id,
            path = %output_path.display(),
            "fetching stream"
        );

        match self.write_body(&stream.url, &output_path).await {
            Ok(bytes) => {
                tracing::debug!(bytes, path = %output_path.display(), "stream fetched");
                Ok(output_path)
            }
            Err(e) => {
                // Don't leave a truncated file behind
                let _ = tokio::fs::remove_file(&output_path).await;
                Err(match e {
                    DownloadError::Io(io) => DownloadError::Fetch(io.to_string()),
                    other => other,
                })
            }
        }
    }
}
