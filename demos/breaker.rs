//! Shows the circuit breaker opening against an unreachable engine.
//!
//! Run with: `cargo run --example breaker`

use camrest::{CircuitBreakerConfig, Client, Error};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("camrest=info,breaker=info")),
        )
        .init();

    // Nothing listens on port 1, so every call is a transport failure.
    let client = Client::builder()
        .base_url("http://127.0.0.1:1/engine-rest")?
        .timeout(Duration::from_secs(2))
        .circuit_breaker(
            CircuitBreakerConfig::default()
                .with_failure_threshold(3)
                .with_recovery_timeout(Duration::from_secs(2)),
        )
        .build()?;

    for attempt in 1..=5 {
        match client.get("engine").await {
            Ok(response) => println!("#{} ok: {}", attempt, response.data),
            Err(Error::CircuitOpen { retry_after }) => {
                println!("#{} rejected, retry after {:.2}s", attempt, retry_after.as_secs_f64())
            }
            Err(e) => println!("#{} failed: {}", attempt, e),
        }
        if let Some(breaker) = client.circuit_breaker() {
            println!("   breaker: {}", breaker.state());
        }
    }

    println!("\nWaiting out the recovery timeout...");
    tokio::time::sleep(Duration::from_secs(2)).await;

    // The trial call goes through half-open; it fails again and reopens the circuit.
    let result = client.get("engine").await;
    println!("trial call: {:?}", result.map(|r| r.status));
    if let Some(breaker) = client.circuit_breaker() {
        println!("   breaker: {}", breaker.state());
    }

    Ok(())
}
