//! Integration tests for Dulce Arte.
//!
//! Each test spawns the real API router on an ephemeral port, backed by the
//! in-memory store and a temporary upload directory, and talks to it over
//! HTTP. No database or running server is needed.
//!
//! ```bash
//! cargo test -p dulce-arte-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use dulce_arte_api::config::ApiConfig;
use dulce_arte_storefront::{AdminSession, ApiClient};
use secrecy::SecretString;
use tempfile::TempDir;
use tokio::task::JoinHandle;

/// Password of the seeded `admin` user.
pub const ADMIN_PASSWORD: &str = "horno-caliente-42";

const JWT_SECRET: &str = "t7#Qm2!vR9$kLp4&Wz8^Nc1*Hs6@Jd3%";

/// A running API instance.
pub struct TestApp {
    pub addr: SocketAddr,
    pub http: reqwest::Client,
    upload_dir: TempDir,
    server: JoinHandle<()>,
}

impl TestApp {
    /// Spawn with the default test configuration.
    pub async fn spawn() -> Self {
        Self::spawn_with(|_| {}).await
    }

    /// Spawn after adjusting the configuration.
    pub async fn spawn_with(configure: impl FnOnce(&mut ApiConfig)) -> Self {
        let upload_dir = tempfile::tempdir().expect("Failed to create upload dir");

        let mut config = ApiConfig::in_memory(
            upload_dir.path().to_path_buf(),
            SecretString::from(JWT_SECRET),
        );
        config.seed_admin_password = Some(SecretString::from(ADMIN_PASSWORD));
        config.login_burst = 1000;
        configure(&mut config);

        let state = dulce_arte_api::build_state(config)
            .await
            .expect("Failed to build state");
        let app = dulce_arte_api::app(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("No local address");

        let server = tokio::spawn(async move {
            serve(listener, app).await;
        });

        Self {
            addr,
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .expect("Failed to create HTTP client"),
            upload_dir,
            server,
        }
    }

    /// Base URL, e.g. `http://127.0.0.1:41234`.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url())
    }

    /// Storefront client pointed at this instance.
    #[must_use]
    pub fn client(&self) -> ApiClient {
        ApiClient::new(&self.base_url()).expect("Failed to create API client")
    }

    /// Log in as the seeded admin.
    pub async fn admin_session(&self) -> AdminSession {
        self.client()
            .login("admin", ADMIN_PASSWORD)
            .await
            .expect("Admin login failed")
    }

    /// Files currently in the upload directory.
    #[must_use]
    pub fn uploaded_files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(self.upload_dir.path())
            .expect("Failed to read upload dir")
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file())
            .collect();
        files.sort();
        files
    }

    /// On-disk path of an `/uploads/...` URL.
    #[must_use]
    pub fn upload_path(&self, url: &str) -> PathBuf {
        let name = url.rsplit('/').next().unwrap_or(url);
        self.upload_dir.path().join(name)
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.server.abort();
    }
}

async fn serve(listener: tokio::net::TcpListener, app: axum::Router) {
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Server error");
}

/// A tiny PNG (header only; the API checks names and MIME types).
#[must_use]
pub fn png_bytes() -> Vec<u8> {
    let mut bytes = b"\x89PNG\r\n\x1a\n".to_vec();
    bytes.extend_from_slice(&[0u8; 64]);
    bytes
}
