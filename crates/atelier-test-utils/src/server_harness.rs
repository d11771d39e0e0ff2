//! Test server harness for E2E testing
//!
//! Provides `TestAtelierServer` for spawning real Atelier server instances in
//! tests. Each server gets its own mock JWKS endpoint serving the fixture
//! keys, so tokens signed with `TestRsaKey` / `TestEd25519Key` verify.

use crate::crypto_fixtures::{TEST_AUDIENCE, TEST_DOMAIN, TEST_ISSUER};
use crate::jwks_mock::JwksMock;
use atelier_service::config::Config;
use atelier_service::observability::metrics::init_metrics_recorder;
use atelier_service::routes::{self, AppState};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use sqlx::PgPool;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};
use tokio::task::JoinHandle;

static TEST_METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Process-wide metrics handle for test servers.
///
/// The global recorder can only be installed once per process; later callers
/// share it. If installation fails a standalone recorder is used instead.
pub fn test_metrics_handle() -> PrometheusHandle {
    TEST_METRICS_HANDLE
        .get_or_init(|| {
            init_metrics_recorder()
                .unwrap_or_else(|_| PrometheusBuilder::new().build_recorder().handle())
        })
        .clone()
}

/// Environment the harness configures the service with.
pub fn test_config_vars(jwks_url: &str) -> HashMap<String, String> {
    HashMap::from([
        (
            "DATABASE_URL".to_string(),
            "postgresql://test/test".to_string(),
        ),
        ("BIND_ADDRESS".to_string(), "127.0.0.1:0".to_string()),
        ("AUTH0_DOMAIN".to_string(), TEST_DOMAIN.to_string()),
        ("API_AUDIENCE".to_string(), TEST_AUDIENCE.to_string()),
        ("AUTH_ISSUER".to_string(), TEST_ISSUER.to_string()),
        ("JWKS_URL".to_string(), jwks_url.to_string()),
        ("JWT_ALGORITHMS".to_string(), "RS256,EdDSA".to_string()),
    ])
}

/// Test harness for spawning the Atelier server in E2E tests.
///
/// # Example
/// ```rust,ignore
/// #[sqlx::test(migrations = "../../migrations")]
/// async fn test_create_artist(pool: PgPool) -> Result<()> {
///     let server = TestAtelierServer::spawn(pool).await?;
///
///     let response = reqwest::Client::new()
///         .post(format!("{}/artists", server.url()))
///         .header("Authorization", bearer_with_permissions(&["post:artist"]))
///         .json(&json!({"name": "Ada", "age": 30, "style": "Jazz"}))
///         .send()
///         .await?;
///
///     assert_eq!(response.status(), 200);
///     Ok(())
/// }
/// ```
pub struct TestAtelierServer {
    addr: SocketAddr,
    pool: PgPool,
    config: Config,
    jwks: JwksMock,
    _handle: JoinHandle<()>,
}

impl TestAtelierServer {
    /// Spawn a server backed by the default fixture key set.
    ///
    /// The server will:
    /// - Bind to a random available port (127.0.0.1:0)
    /// - Fetch signing keys from a fresh mock JWKS endpoint
    /// - Start the HTTP server in the background
    pub async fn spawn(pool: PgPool) -> Result<Self, anyhow::Error> {
        let jwks = JwksMock::start()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to start JWKS mock: {}", e))?;
        Self::spawn_with_jwks(pool, jwks, HashMap::new()).await
    }

    /// Spawn a server against a caller-provided JWKS mock, with extra
    /// environment overrides applied on top of [`test_config_vars`].
    pub async fn spawn_with_jwks(
        pool: PgPool,
        jwks: JwksMock,
        overrides: HashMap<String, String>,
    ) -> Result<Self, anyhow::Error> {
        let mut vars = test_config_vars(&jwks.url());
        vars.extend(overrides);

        let config = Config::from_vars(&vars)
            .map_err(|e| anyhow::anyhow!("Failed to create config: {}", e))?;

        let state = Arc::new(AppState::new(pool.clone(), config.clone()));

        // Build routes using atelier-service's real route builder
        let app = routes::build_routes(state, test_metrics_handle());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            pool,
            config,
            jwks,
            _handle: handle,
        })
    }

    /// Get reference to the database pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Get the base URL of the test server.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get the socket address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Get reference to the server configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The mock JWKS endpoint this server fetches keys from.
    pub fn jwks(&self) -> &JwksMock {
        &self.jwks
    }
}

impl Drop for TestAtelierServer {
    fn drop(&mut self) {
        // Abort the HTTP server task so it does not outlive the test.
        self._handle.abort();
    }
}
