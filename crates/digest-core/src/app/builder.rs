//! AppBuilder - アプリケーションの構築とワイヤリング
//!
//! Handlers are registered up front; `build()` fails fast when a job the
//! process is expected to run has no handler.

use std::sync::Arc;

use crate::ports::{Clock, JobScheduler};
use crate::typed::{Handler, RegistryError, Task, TypedRegistry};

use super::runtime::Runtime;

/// ```ignore
/// let app = AppBuilder::new()
///     .register::<SendDigest, _>(dispatcher)?
///     .expect_tasks(&[SendDigest::TYPE])
///     .build()?;
/// let runtime = app.runtime(scheduler, clock);
/// ```
pub struct AppBuilder {
    registry: TypedRegistry,
    expected_tasks: Option<Vec<String>>,
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Missing job types: {0:?}. These jobs were expected but not registered.")]
    MissingTaskTypes(Vec<String>),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl AppBuilder {
    pub fn new() -> Self {
        Self {
            registry: TypedRegistry::new(),
            expected_tasks: None,
        }
    }

    pub fn register<T: Task, H: Handler<T> + 'static>(
        mut self,
        handler: H,
    ) -> Result<Self, RegistryError> {
        self.registry.register::<T, H>(handler)?;
        Ok(self)
    }

    pub fn expect_tasks(mut self, task_types: &[&str]) -> Self {
        self.expected_tasks = Some(task_types.iter().map(|t| t.to_string()).collect());
        self
    }

    /// 期待集合 ⊆ 登録済み集合 をチェック
    pub fn build(self) -> Result<App, BuildError> {
        if let Some(expected_tasks) = &self.expected_tasks {
            let registered_types = self.registry.registered_types();
            let missing_tasks: Vec<String> = expected_tasks
                .iter()
                .filter(|x| !registered_types.contains(x))
                .cloned()
                .collect();
            if !missing_tasks.is_empty() {
                return Err(BuildError::MissingTaskTypes(missing_tasks));
            }
        }
        Ok(App {
            registry: Arc::new(self.registry),
        })
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A validated set of handlers, ready to be driven by a scheduler.
pub struct App {
    pub registry: Arc<TypedRegistry>,
}

impl App {
    pub fn runtime(&self, scheduler: Arc<dyn JobScheduler>, clock: Arc<dyn Clock>) -> Runtime {
        Runtime::new(Arc::clone(&self.registry), scheduler, clock)
    }
}
