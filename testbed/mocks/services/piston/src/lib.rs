//! Mock Piston execution service for testing
//!
//! Serves the runtime listing and execute endpoints from fixtures instead of a
//! sandbox: programs are looked up by source text and answered with canned output.
//! Request validation mirrors the live service closely enough that error bodies
//! match byte for byte, and rate limiting can be switched on per test.

pub mod fixtures;
pub mod handlers;
pub mod server;

pub use fixtures::{ExecutionFixture, ProgramOutcome, RuntimeFixture};
pub use handlers::RecordedRequest;
pub use server::{MockPistonServer, API_PREFIX};
