//! Handler trait - Task を実行する Handler の定義
//!
//! - `Handler<T>`: typed surface, one implementation per task type
//! - `DynHandler`: object-safe form stored in the registry
//! - `TypedHandler<T, H>`: erases `T` by decoding the JSON payload first

use super::task::Task;
use crate::domain::{JobError, Outcome};
use async_trait::async_trait;
use std::marker::PhantomData;
use std::sync::Arc;

#[async_trait]
pub trait Handler<T: Task>: Send + Sync {
    async fn handle(&self, task: T) -> Result<Outcome, JobError>;
}

#[async_trait]
pub trait DynHandler: Send + Sync {
    async fn handle_dyn(&self, payload: serde_json::Value) -> Result<Outcome, JobError>;
    fn task_type(&self) -> &str;
}

/// Shared handlers: the registry can own one clone while the caller keeps another.
#[async_trait]
impl<T: Task, H: Handler<T> + ?Sized> Handler<T> for Arc<H> {
    async fn handle(&self, task: T) -> Result<Outcome, JobError> {
        (**self).handle(task).await
    }
}

pub struct TypedHandler<T: Task, H: Handler<T>> {
    handler: H,
    _marker: PhantomData<T>,
}

impl<T: Task, H: Handler<T>> TypedHandler<T, H> {
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<T: Task, H: Handler<T>> DynHandler for TypedHandler<T, H> {
    async fn handle_dyn(&self, payload: serde_json::Value) -> Result<Outcome, JobError> {
        let task: T =
            serde_json::from_value(payload).map_err(|e| JobError::Payload(format!("{}: {e}", T::TYPE)))?;
        self.handler.handle(task).await
    }

    fn task_type(&self) -> &str {
        T::TYPE
    }
}
