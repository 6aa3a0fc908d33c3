use axum::{
    extract::Extension,
    routing::{get, post},
    Router,
};
use filestore_cluster::cluster::types::{ClusterConfig, NodeId};
use filestore_cluster::mutex::coordinator::DistributedMutex;
use filestore_cluster::mutex::handlers::{handle_mutex_reply, handle_mutex_request};
use filestore_cluster::mutex::messenger::HttpPeerMessenger;
use filestore_cluster::node::handlers::{
    handle_acquire_mutex, handle_download, handle_release_mutex, handle_upload,
};
use filestore_cluster::node::service::NodeService;
use filestore_cluster::store::content::ContentStore;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 5 {
        eprintln!(
            "Usage: {} --id <node-id> --peer <addr:port> [--peer <addr:port> ...] \
             [--storage-dir <dir>] [--manifest <path>] [--acquire-timeout-ms <ms>]",
            args[0]
        );
        eprintln!(
            "The --peer list names every node in id order; entry <node-id> is this node's bind address."
        );
        eprintln!(
            "Example: {} --id 0 --peer 127.0.0.1:6000 --peer 127.0.0.1:6001",
            args[0]
        );

        std::process::exit(1);
    }

    let mut node_id: Option<u32> = None;
    let mut node_addrs: Vec<SocketAddr> = vec![];
    let mut storage_dir: Option<String> = None;
    let mut manifest_path: Option<String> = None;
    let mut acquire_timeout = Duration::from_secs(10);

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--id" => {
                node_id = Some(args[i + 1].parse()?);
                i += 2;
            }
            "--peer" => {
                node_addrs.push(args[i + 1].parse()?);
                i += 2;
            }
            "--storage-dir" => {
                storage_dir = Some(args[i + 1].clone());
                i += 2;
            }
            "--manifest" => {
                manifest_path = Some(args[i + 1].clone());
                i += 2;
            }
            "--acquire-timeout-ms" => {
                acquire_timeout = Duration::from_millis(args[i + 1].parse()?);
                i += 2;
            }
            _ => {
                i += 1;
            }
        }
    }

    let node_id = NodeId(node_id.expect("--id is required"));
    let cluster = Arc::new(ClusterConfig::new(node_id, node_addrs)?);

    let storage_dir = storage_dir.unwrap_or_else(|| format!("node-{}-files", node_id));
    let manifest_path = manifest_path.unwrap_or_else(|| format!("node-{}-manifest.json", node_id));

    tracing::info!(
        "Starting storage node {} on {}",
        node_id,
        cluster.local_addr()
    );
    tracing::info!("Cluster of {} node(s): {:?}", cluster.len(), cluster.addrs);

    // 1. Content store (reloads the manifest left by a previous run):
    let store = ContentStore::open(&storage_dir, &manifest_path)?;
    tracing::info!(
        "Content store open with {} file(s) under {}",
        store.len(),
        storage_dir
    );

    // 2. Distributed lock over the peer mesh:
    let messenger = Arc::new(HttpPeerMessenger::new(cluster.clone()));
    let mutex = DistributedMutex::new(cluster.clone(), messenger);

    // 3. Node service composing lock + store:
    let service = NodeService::new(mutex.clone(), store, acquire_timeout);

    // 4. HTTP Router:
    let app = Router::new()
        .route("/mutex/acquire", post(handle_acquire_mutex))
        .route("/mutex/release", post(handle_release_mutex))
        .route("/upload", post(handle_upload))
        .route("/download/:filename", get(handle_download))
        .route("/internal/mutex/request", post(handle_mutex_request))
        .route("/internal/mutex/reply", post(handle_mutex_reply))
        .layer(Extension(mutex))
        .layer(Extension(service));

    // 5. Start HTTP server:
    let listener = tokio::net::TcpListener::bind(cluster.local_addr()).await?;
    tracing::info!("Listening on {}", cluster.local_addr());
    tracing::info!("Press Ctrl+C to shutdown");

    axum::serve(listener, app).await?;

    Ok(())
}
