use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::fixtures::ExecutionFixture;
use crate::handlers::{execute, health_check, list_runtimes, MockState, RecordedRequest};

/// Path prefix the live service mounts its API under
pub const API_PREFIX: &str = "/api/v2/piston";

pub struct MockPistonServer {
    addr: SocketAddr,
    shutdown_tx: tokio::sync::oneshot::Sender<()>,
    state: Arc<MockState>,
}

impl MockPistonServer {
    pub fn router(state: Arc<MockState>) -> Router {
        let api = Router::new()
            .route("/runtimes", get(list_runtimes))
            .route("/execute", post(execute))
            .with_state(state);

        Router::new()
            .route("/health", get(health_check))
            .nest(API_PREFIX, api)
            .layer(TraceLayer::new_for_http())
    }

    /// Serve on an ephemeral local port in the background
    pub async fn start(fixture: ExecutionFixture) -> anyhow::Result<Self> {
        let state = Arc::new(MockState::new(fixture));
        let app = Self::router(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tracing::info!("Piston mock server listening on {}", addr);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        tokio::spawn(async move {
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                    tracing::info!("Piston mock server shutting down");
                })
                .await;
            if let Err(e) = result {
                tracing::error!("Piston mock server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            shutdown_tx,
            state,
        })
    }

    /// Serve in the foreground until the process exits
    pub async fn serve(fixture: ExecutionFixture, addr: &str) -> anyhow::Result<()> {
        let app = Self::router(Arc::new(MockState::new(fixture)));
        let addr: SocketAddr = addr.parse()?;
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Starting Piston Mock Server on {}", addr);
        axum::serve(listener, app)
            .await
            .map_err(|e| anyhow::anyhow!("Piston mock server error: {}", e))
    }

    /// Base URL to configure a client with
    pub fn address(&self) -> String {
        format!("http://{}{}", self.addr, API_PREFIX)
    }

    pub fn health_url(&self) -> String {
        format!("http://{}/health", self.addr)
    }

    pub fn rate_limit_next(&self, count: u32) {
        self.state.rate_limit_next(count);
    }

    pub fn respond_raw_next(&self, body: &str) {
        self.state.respond_raw_next(body);
    }

    /// API requests received so far, rate-limited ones included
    pub fn request_count(&self) -> usize {
        self.state.requests().len()
    }

    pub fn recorded_requests(&self) -> Vec<RecordedRequest> {
        self.state.requests()
    }

    pub async fn shutdown(self) {
        if self.shutdown_tx.send(()).is_err() {
            tracing::warn!("Piston mock server already stopped");
        }
    }
}
