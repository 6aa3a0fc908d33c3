//! Content Provider Client
//!
//! Command-line producer talking to one storage node of the cluster. An
//! upload follows the producer contract: ask the node for the cluster-wide
//! lock (retrying denials with backoff), upload while the lock is held, and
//! always give the lock back, whatever the upload said. Downloads need no
//! lock and just print what the node returns.

use anyhow::Result;
use filestore_cluster::node::protocol::{
    AcquireRequest, AcquireResponse, DownloadResponse, ReleaseRequest, ReleaseResponse,
    UploadRequest, UploadResponse, ENDPOINT_DOWNLOAD, ENDPOINT_MUTEX_ACQUIRE,
    ENDPOINT_MUTEX_RELEASE, ENDPOINT_UPLOAD,
};
use std::time::Duration;

/// Lock denials are retried this many times before the upload is given up.
const ACQUIRE_ATTEMPTS: usize = 10;
/// Base delay between lock retries; a random jitter is added on top.
const RETRY_DELAY: Duration = Duration::from_millis(300);

struct ProviderClient {
    node_url: String,
    /// Session tag identifying this producer to the node for the duration of
    /// one lock cycle.
    session_id: u64,
    http_client: reqwest::Client,
}

impl ProviderClient {
    fn new(node_url: String) -> Self {
        Self {
            node_url,
            session_id: rand::random::<u64>(),
            http_client: reqwest::Client::new(),
        }
    }

    async fn request_mutex(&self) -> Result<AcquireResponse> {
        let response = self
            .http_client
            .post(format!("{}{}", self.node_url, ENDPOINT_MUTEX_ACQUIRE))
            .json(&AcquireRequest {
                requester_id: self.session_id,
            })
            .send()
            .await?;
        Ok(response.json().await?)
    }

    /// Asks for the lock until it is granted or the attempts run out.
    async fn acquire_with_retry(&self) -> Result<bool> {
        for attempt in 1..=ACQUIRE_ATTEMPTS {
            let grant = self.request_mutex().await?;
            if grant.granted {
                tracing::info!("Lock granted to session {}", self.session_id);
                return Ok(true);
            }

            let reason = grant.error.unwrap_or_else(|| "denied".to_string());
            tracing::info!(
                "Lock denied ({}), attempt {}/{}",
                reason,
                attempt,
                ACQUIRE_ATTEMPTS
            );

            if attempt < ACQUIRE_ATTEMPTS {
                let jitter = rand::random::<u64>() % 150;
                tokio::time::sleep(RETRY_DELAY + Duration::from_millis(jitter)).await;
            }
        }

        Ok(false)
    }

    async fn release_mutex(&self) -> Result<ReleaseResponse> {
        let response = self
            .http_client
            .post(format!("{}{}", self.node_url, ENDPOINT_MUTEX_RELEASE))
            .json(&ReleaseRequest {
                requester_id: self.session_id,
            })
            .send()
            .await?;
        Ok(response.json().await?)
    }

    async fn upload_file(&self, filename: &str, payload: Vec<u8>) -> Result<UploadResponse> {
        let response = self
            .http_client
            .post(format!("{}{}", self.node_url, ENDPOINT_UPLOAD))
            .json(&UploadRequest {
                filename: filename.to_string(),
                payload,
            })
            .send()
            .await?;
        Ok(response.json().await?)
    }

    async fn download_file(&self, filename: &str) -> Result<DownloadResponse> {
        let response = self
            .http_client
            .get(format!(
                "{}{}/{}",
                self.node_url,
                ENDPOINT_DOWNLOAD,
                urlencoding::encode(filename)
            ))
            .send()
            .await?;
        Ok(response.json().await?)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args: Vec<String> = std::env::args().collect();

    let mut node_url =
        std::env::var("NODE_URL").unwrap_or_else(|_| "http://127.0.0.1:6000".to_string());
    let mut command: Vec<String> = Vec::new();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--node" => {
                node_url = args[i + 1].clone();
                i += 2;
            }
            _ => {
                command.push(args[i].clone());
                i += 1;
            }
        }
    }

    let client = ProviderClient::new(normalize_node_url(&node_url));
    tracing::info!(
        "Session {} talking to node at {}",
        client.session_id,
        client.node_url
    );

    match command.first().map(String::as_str) {
        Some("upload") if command.len() == 3 => run_upload(&client, &command[1], &command[2]).await,
        Some("download") if command.len() == 2 => run_download(&client, &command[1]).await,
        _ => {
            eprintln!("Usage: {} [--node <url>] upload <filename> <content>", args[0]);
            eprintln!("       {} [--node <url>] download <filename>", args[0]);
            std::process::exit(1);
        }
    }
}

async fn run_upload(client: &ProviderClient, filename: &str, content: &str) -> Result<()> {
    if !client.acquire_with_retry().await? {
        anyhow::bail!(
            "could not acquire the cluster lock after {} attempts",
            ACQUIRE_ATTEMPTS
        );
    }

    // The lock is given back whatever the upload said, including a transport
    // failure on the upload itself.
    let upload_result = client.upload_file(filename, content.as_bytes().to_vec()).await;

    match client.release_mutex().await {
        Ok(ReleaseResponse { ack: true }) => {}
        Ok(ReleaseResponse { ack: false }) => {
            tracing::warn!("Node refused the release for session {}", client.session_id)
        }
        Err(err) => tracing::warn!("Failed to release the lock: {}", err),
    }

    let response = upload_result?;
    if response.success {
        println!("File '{}' uploaded successfully", filename);
    } else {
        let reason = response.error.unwrap_or_else(|| "unknown reason".to_string());
        println!("Failed to upload file '{}': {}", filename, reason);
    }

    Ok(())
}

async fn run_download(client: &ProviderClient, filename: &str) -> Result<()> {
    let response = client.download_file(filename).await?;

    if response.found {
        println!("Contents of file '{}':", filename);
        println!("{}", String::from_utf8_lossy(&response.payload));
    } else {
        println!("File '{}' does not exist", filename);
    }

    Ok(())
}

fn normalize_node_url(raw: &str) -> String {
    let trimmed = raw.trim();

    let with_scheme = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    };

    with_scheme.trim_end_matches('/').to_string()
}
