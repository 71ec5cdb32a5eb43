use piston_mock::{ExecutionFixture, MockPistonServer};
use std::env;
use std::fs;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let fixtures_path = env::var("FIXTURES_PATH").unwrap_or_else(|_| "/app/fixtures".to_string());
    let addr = env::var("MOCK_ADDR").unwrap_or_else(|_| "0.0.0.0:2000".to_string());

    let fixture_file = format!("{}/piston-fixture.yaml", fixtures_path);
    let fixture = if let Ok(content) = fs::read_to_string(&fixture_file) {
        tracing::info!("Loading fixtures from {}", fixture_file);
        ExecutionFixture::from_yaml(&content)?
    } else {
        tracing::info!("No fixture file found, using default test fixture");
        ExecutionFixture::create_test_fixture()
    };

    MockPistonServer::serve(fixture, &addr).await
}
