//! Shared utilities for integration testing.

use std::fs;
use std::net::SocketAddr;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use fs_router::config::{ReloadEvent, RouterConfig};
use fs_router::lifecycle::startup::build_router;
use fs_router::{FsRouter, HttpServer, ManifestLoader, Shutdown};

/// A running server and the handles needed to drive it.
pub struct TestServer {
    pub addr: SocketAddr,
    pub router: Arc<FsRouter>,
    pub reloads: mpsc::UnboundedSender<ReloadEvent>,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<Result<(), std::io::Error>>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Write `files` (relative path, contents) under a fresh temporary directory.
pub fn route_tree(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    write_files(&dir, files);
    dir
}

pub fn write_files(dir: &TempDir, files: &[(&str, &str)]) {
    for (relative, contents) in files {
        let path = dir.path().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }
}

/// Start a server for `config` on an ephemeral port using manifest route files.
pub async fn start_server(config: RouterConfig) -> TestServer {
    let router = Arc::new(
        build_router(&config, Arc::new(ManifestLoader::new()))
            .await
            .unwrap(),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let (reloads, reload_rx) = mpsc::unbounded_channel();
    let shutdown = Shutdown::new();
    let server = HttpServer::new(Arc::clone(&router), &config);
    let handle = tokio::spawn(server.run(listener, reload_rx, shutdown.subscribe()));

    TestServer {
        addr,
        router,
        reloads,
        shutdown,
        handle,
    }
}

/// A client that reports redirects instead of following them.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}
