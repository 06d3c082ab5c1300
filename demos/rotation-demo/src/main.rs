//! # Rotation Demo
//!
//! Simulates a UI owner being destroyed and recreated ("screen rotation")
//! while a background run stays alive, then exercises every delivery path:
//! direct notification, re-issued start on reattach, and buffered delivery to
//! an owner that attaches after completion.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use retained_task::prelude::*;

/// Stand-in for a UI owner instance: logs where a real screen would show or
/// dismiss a progress indicator.
struct Screen {
    name: &'static str,
}

#[async_trait]
impl TaskListener for Screen {
    async fn on_task_started(&self) {
        info!(screen = self.name, "showing progress indicator");
    }

    async fn on_task_finished(&self, result: String) {
        info!(screen = self.name, %result, "dismissing progress indicator");
    }
}

#[tokio::main]
async fn main() -> Result<(), TaskError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,retained_task=debug")),
        )
        .init();

    let registry = TaskRegistry::new();
    let (task_id, supervisor) = registry.register().await?;
    info!(task_id = %task_id, "task registered");

    // First owner instance comes up and kicks off the work.
    supervisor.attach(Arc::new(Screen { name: "screen-1" })).await;
    supervisor
        .start(simulated_work(10, Duration::from_millis(300)))
        .await?;

    // "Rotation": the first owner is torn down mid-run and a new one attaches.
    // The work never notices.
    tokio::time::sleep(Duration::from_millis(800)).await;
    supervisor.detach().await;
    info!("owner destroyed, background work keeps running");
    let supervisor = registry
        .get(&task_id)
        .await
        .expect("task survives owner teardown");
    supervisor.attach(Arc::new(Screen { name: "screen-2" })).await;

    // Second teardown — this time nobody is attached when the work completes,
    // so the result lands in the buffer.
    tokio::time::sleep(Duration::from_millis(800)).await;
    supervisor.detach().await;
    supervisor.await_finished().await;
    info!(
        buffered = supervisor.has_buffered_result().await,
        "run finished with no owner attached"
    );

    // The next owner instance receives the buffered result on attach.
    supervisor.attach(Arc::new(Screen { name: "screen-3" })).await;

    registry.remove(&task_id).await;
    Ok(())
}
