use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{info, warn};

use super::StorageError;
use crate::config::VirusScanConfig;

const CHUNK_SIZE: usize = 64 * 1024;
const SCAN_TIMEOUT: Duration = Duration::from_secs(30);

/// ClamAV client speaking the `INSTREAM` command over TCP.
#[derive(Debug, Clone)]
pub struct VirusScanner {
    enabled: bool,
    address: String,
}

impl VirusScanner {
    pub fn from_config(config: &VirusScanConfig) -> Self {
        Self {
            enabled: config.enabled,
            address: format!("{}:{}", config.host, config.port),
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            address: String::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Scan `body`; `Err(Infected)` names the detected signature.
    pub async fn scan(&self, body: &[u8]) -> Result<(), StorageError> {
        if !self.enabled {
            return Ok(());
        }

        let reply = tokio::time::timeout(SCAN_TIMEOUT, self.instream(body))
            .await
            .map_err(|_| StorageError::ScannerUnavailable("scan timed out".to_string()))??;

        match parse_reply(&reply) {
            ScanVerdict::Clean => Ok(()),
            ScanVerdict::Infected(signature) => {
                warn!(%signature, "Upload rejected by virus scan");
                Err(StorageError::Infected(signature))
            }
            ScanVerdict::Error(message) => Err(StorageError::ScannerUnavailable(message)),
        }
    }

    async fn instream(&self, body: &[u8]) -> Result<String, StorageError> {
        let mut stream = TcpStream::connect(&self.address)
            .await
            .map_err(|e| StorageError::ScannerUnavailable(e.to_string()))?;

        stream.write_all(b"zINSTREAM\0").await?;
        for chunk in body.chunks(CHUNK_SIZE) {
            stream.write_all(&(chunk.len() as u32).to_be_bytes()).await?;
            stream.write_all(chunk).await?;
        }
        stream.write_all(&0u32.to_be_bytes()).await?;
        stream.flush().await?;

        let mut reply = Vec::new();
        stream.read_to_end(&mut reply).await?;
        let reply = String::from_utf8_lossy(&reply).trim_end_matches(['\0', '\n']).to_string();
        info!(bytes = body.len(), %reply, "Virus scan complete");
        Ok(reply)
    }
}

#[derive(Debug, PartialEq)]
enum ScanVerdict {
    Clean,
    Infected(String),
    Error(String),
}

/// Replies look like `stream: OK` or `stream: Eicar-Signature FOUND`.
fn parse_reply(reply: &str) -> ScanVerdict {
    let body = reply.split_once(": ").map_or(reply, |(_, rest)| rest).trim();
    if body == "OK" {
        ScanVerdict::Clean
    } else if let Some(signature) = body.strip_suffix(" FOUND") {
        ScanVerdict::Infected(signature.to_string())
    } else {
        ScanVerdict::Error(body.to_string())
    }
}
