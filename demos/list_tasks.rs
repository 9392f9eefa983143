//! Lists a user's open tasks and completes the first one.
//!
//! Expects an engine at `ENGINE_URL` (default `http://localhost:8080/engine-rest`).
//!
//! Run with: `cargo run --example list_tasks -- demo`

use camrest::models::{Task, TaskCompletionRequest, TaskQuery, Variable};
use camrest::{Client, Error};
use serde_json::{json, Map};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("camrest=debug,list_tasks=info")),
        )
        .init();

    let base_url = std::env::var("ENGINE_URL")
        .unwrap_or_else(|_| "http://localhost:8080/engine-rest".to_string());
    let assignee = std::env::args().nth(1).unwrap_or_else(|| "demo".to_string());

    let client = Client::builder()
        .base_url(&base_url)?
        .timeout(Duration::from_secs(10))
        .build()?;

    let query = TaskQuery {
        assignee: Some(assignee.clone()),
        sort_by: Some("created".to_string()),
        sort_order: Some("desc".to_string()),
        max_results: Some(20),
        ..Default::default()
    };
    let tasks = client.get_page::<Task>("task", Some(&query)).await?;

    println!("=== {} task(s) for {} ({:?}) ===", tasks.data.len(), assignee, tasks.latency);
    for task in &tasks.data {
        println!(
            "{:<38} {:<30} priority={}",
            task.id.as_deref().unwrap_or("-"),
            task.name.as_deref().unwrap_or("(unnamed)"),
            task.priority.unwrap_or_default()
        );
    }

    let Some(task_id) = tasks.data.items.first().and_then(|task| task.id.clone()) else {
        println!("Nothing to complete");
        return Ok(());
    };

    let variables: BTreeMap<String, Variable> = client
        .get_map(format!("task/{}/variables", task_id), None)
        .await?
        .data;
    println!();
    println!("=== Variables of {} ===", task_id);
    for (name, variable) in &variables {
        println!(
            "{} ({}) = {}",
            name,
            variable.kind.as_deref().unwrap_or("?"),
            variable.value.clone().unwrap_or_default()
        );
    }

    let mut completion = Map::new();
    completion.insert("approved".to_string(), json!({"value": true, "type": "Boolean"}));
    let request = TaskCompletionRequest {
        variables: Some(completion),
        with_variables_in_return: Some(true),
    };

    match client
        .post(format!("task/{}/complete", task_id), &request)
        .await
    {
        Ok(response) => println!("\nCompleted {}: {}", task_id, response.data),
        Err(Error::Api { status, error, .. }) => {
            let message = error.and_then(|e| e.message).unwrap_or_default();
            println!("\nEngine refused completion ({}): {}", status, message);
        }
        Err(e) => return Err(e),
    }

    Ok(())
}
