//! # camrest - core of a client for a REST workflow engine
//!
//! camrest talks to a workflow engine's REST API (tasks, process instances,
//! variables) on top of `reqwest`. It covers the pieces every endpoint needs:
//!
//! - **Case conversion** between the engine's camelCase and Rust's snake_case ([`case`])
//! - **Outbound serialization** of typed parameters and bodies, skipping absent fields ([`wire`])
//! - **Tolerant decoding** of records that keeps unknown keys for round-trips ([`record`])
//! - **Paginated listings** in every envelope shape the engine uses ([`Page`])
//! - **A circuit breaker** shared by all calls of a client ([`breaker`])
//! - **Rich errors** carrying the status, structured engine error and raw body ([`Error`])
//!
//! ## Quick Start
//!
//! ```no_run
//! use camrest::Client;
//! use camrest::models::{Task, TaskCompletionRequest, TaskQuery};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), camrest::Error> {
//!     let client = Client::builder()
//!         .base_url("http://localhost:8080/engine-rest")?
//!         .timeout(Duration::from_secs(30))
//!         .build()?;
//!
//!     // Query parameters are sent as `assignee=demo&maxResults=10`
//!     let query = TaskQuery {
//!         assignee: Some("demo".to_string()),
//!         max_results: Some(10),
//!         ..Default::default()
//!     };
//!     let tasks = client.get_page::<Task>("task", Some(&query)).await?;
//!     println!("{} tasks in {:?}", tasks.data.len(), tasks.latency);
//!
//!     if let Some(id) = tasks.data.items.first().and_then(|t| t.id.clone()) {
//!         let done = TaskCompletionRequest::default();
//!         client.post(format!("task/{}/complete", id), &done).await?;
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Defining records
//!
//! Records are declared with [`record!`], which generates the struct and the
//! field table used for decoding and encoding. Every field is optional and any
//! key the declaration doesn't name is kept in `raw`.
//!
//! ```
//! use camrest::Record;
//! use serde_json::json;
//!
//! camrest::record! {
//!     pub struct Deployment {
//!         id: String,
//!         deployment_time: String,
//!     }
//! }
//!
//! let deployment = Deployment::decode(&json!({
//!     "id": "d1",
//!     "deploymentTime": "2024-01-01T00:00:00.000+0000",
//!     "source": "cli",
//! }))?;
//! assert_eq!(deployment.id.as_deref(), Some("d1"));
//! assert!(deployment.deployment_time.is_some());
//! assert_eq!(deployment.raw["source"], "cli");
//! # Ok::<(), camrest::DecodeError>(())
//! ```
//!
//! ## Error Handling
//!
//! ```no_run
//! use camrest::{Client, Error};
//!
//! # async fn example() -> Result<(), Error> {
//! # let client = Client::builder().base_url("http://localhost:8080/engine-rest")?.build()?;
//! match client.get("process-instance/unknown").await {
//!     Ok(response) => println!("Found: {}", response.data),
//!     Err(Error::Api { status, error, .. }) => {
//!         eprintln!("HTTP {}: {:?}", status, error.and_then(|e| e.message));
//!     }
//!     Err(Error::CircuitOpen { retry_after }) => {
//!         eprintln!("Engine unavailable, retry in {:?}", retry_after);
//!     }
//!     Err(e) if e.is_transport() => eprintln!("Transport failure: {}", e),
//!     Err(e) => eprintln!("Other error: {}", e),
//! }
//! # Ok(())
//! # }
//! ```

pub mod breaker;
pub mod case;
mod client;
mod error;
pub mod metadata;
pub mod models;
pub mod page;
pub mod record;
mod response;
pub mod wire;

#[doc(hidden)]
pub mod __private {
    pub use serde_json::{Map, Value};
}

pub use breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use client::{Client, ClientBuilder, ClientConfig, WireArg};
pub use error::{DecodeError, Error, Result};
pub use page::Page;
pub use record::Record;
pub use response::Response;
