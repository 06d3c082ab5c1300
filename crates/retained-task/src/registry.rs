//! Task identity independent of any owner instance.
//!
//! Owners are transient; the registry is not. A task is registered once under
//! a stable ID, and a recreated owner looks its supervisor back up by that ID
//! instead of relying on any framework-specific retention mechanism. Removing
//! a task drops the last strong reference to its supervisor, which is the
//! final-teardown path: an in-flight worker is left with a dead weak
//! reference and its completion is silently discarded.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::error::TaskError;
use crate::supervisor::TaskSupervisor;

/// Configuration for the in-memory task registry.
#[derive(Debug, Clone)]
pub struct TaskRegistryConfig {
    /// Maximum number of live tasks (0 = unlimited)
    pub max_tasks: usize,
}

impl Default for TaskRegistryConfig {
    fn default() -> Self {
        Self { max_tasks: 1_000 }
    }
}

/// In-memory registry of live task supervisors, keyed by stable task ID.
///
/// Uses `Arc<RwLock<HashMap>>` for concurrent access. Task IDs are UUID v7
/// for temporal ordering.
#[derive(Clone)]
pub struct TaskRegistry {
    tasks: Arc<RwLock<HashMap<String, Arc<TaskSupervisor>>>>,
    config: TaskRegistryConfig,
}

impl TaskRegistry {
    /// Create a registry with default configuration.
    pub fn new() -> Self {
        Self {
            tasks: Arc::new(RwLock::new(HashMap::new())),
            config: TaskRegistryConfig::default(),
        }
    }

    /// Create a registry with custom configuration.
    pub fn with_config(config: TaskRegistryConfig) -> Self {
        Self {
            tasks: Arc::new(RwLock::new(HashMap::new())),
            config,
        }
    }

    /// Generate a new task ID using UUID v7 (temporal ordering).
    pub fn generate_task_id() -> String {
        Uuid::now_v7().to_string()
    }

    /// Mint a task ID and register a fresh supervisor under it.
    pub async fn register(&self) -> Result<(String, Arc<TaskSupervisor>), TaskError> {
        let mut tasks = self.tasks.write().await;

        if self.config.max_tasks > 0 && tasks.len() >= self.config.max_tasks {
            return Err(TaskError::MaxTasksReached(self.config.max_tasks));
        }

        let task_id = Self::generate_task_id();
        let supervisor = Arc::new(TaskSupervisor::new());
        tasks.insert(task_id.clone(), Arc::clone(&supervisor));

        debug!(task_id = %task_id, "registered task");
        Ok((task_id, supervisor))
    }

    /// Look up a supervisor by task ID. Returns `None` if not registered.
    pub async fn get(&self, task_id: &str) -> Option<Arc<TaskSupervisor>> {
        self.tasks.read().await.get(task_id).cloned()
    }

    /// Request cooperative cancellation of a registered task's run.
    pub async fn cancel(&self, task_id: &str) -> Result<(), TaskError> {
        let supervisor = self
            .get(task_id)
            .await
            .ok_or_else(|| TaskError::TaskNotFound(task_id.to_string()))?;
        supervisor.cancel().await;
        Ok(())
    }

    /// Remove a task for good. Returns `true` if it was registered.
    pub async fn remove(&self, task_id: &str) -> bool {
        let removed = self.tasks.write().await.remove(task_id).is_some();
        if removed {
            debug!(task_id = %task_id, "removed task");
        }
        removed
    }

    /// Number of registered tasks.
    pub async fn count(&self) -> usize {
        self.tasks.read().await.len()
    }
}

impl Default for TaskRegistry {
    fn default() -> Self {
        Self::new()
    }
}
