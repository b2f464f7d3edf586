//! Asynchronous task queue of the engine session
//!
//! Work is submitted with a caller-generated correlation id and observed by
//! polling. The queue never blocks; a task that is no longer wanted is simply
//! removed and its eventual result ignored.

use houdini_core::{AssetId, AssetPath, ComponentId, CorrelationId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of work submitted to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskKind {
    /// Instantiate and cook
    Instantiate,
    /// Instantiate only; used for components restored from storage
    InstantiateWithoutCooking,
    /// Re-cook an instantiated asset
    Cook,
    /// Delete an instantiated asset
    Delete,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TaskKind::Instantiate => "instantiate",
            TaskKind::InstantiateWithoutCooking => "instantiate-without-cooking",
            TaskKind::Cook => "cook",
            TaskKind::Delete => "delete",
        };
        write!(f, "{}", name)
    }
}

/// State of a submitted task as reported by the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskState {
    /// Accepted, not started
    None,
    Processing,
    FinishedInstantiation,
    FinishedInstantiationWithoutCooking,
    FinishedCooking,
    Aborted,
    FinishedInstantiationWithErrors,
    FinishedCookingWithErrors,
    FinishedInstantiationWithoutCookingWithErrors,
}

impl TaskState {
    /// Finished with geometry available
    pub fn is_cooked(&self) -> bool {
        matches!(self, TaskState::FinishedInstantiation | TaskState::FinishedCooking)
    }

    /// Finished unsuccessfully
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            TaskState::Aborted
                | TaskState::FinishedInstantiationWithErrors
                | TaskState::FinishedCookingWithErrors
                | TaskState::FinishedInstantiationWithoutCookingWithErrors
        )
    }

    pub fn is_terminal(&self) -> bool {
        self.is_cooked() || self.is_error() || *self == TaskState::FinishedInstantiationWithoutCooking
    }
}

/// A unit of work for the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CookRequest {
    pub kind: TaskKind,
    pub correlation_id: CorrelationId,
    /// Target asset for cook and delete requests
    pub asset_id: Option<AssetId>,
    /// Label of the owning actor, used to name the instantiated node
    pub actor_label: Option<String>,
    /// Asset definition to instantiate
    pub asset: Option<AssetPath>,
    /// Component that submitted the request
    pub component: Option<ComponentId>,
}

impl CookRequest {
    /// Create a request with no optional fields set
    pub fn new(kind: TaskKind, correlation_id: CorrelationId) -> Self {
        Self {
            kind,
            correlation_id,
            asset_id: None,
            actor_label: None,
            asset: None,
            component: None,
        }
    }

    pub fn with_asset_id(mut self, asset_id: AssetId) -> Self {
        self.asset_id = Some(asset_id);
        self
    }

    pub fn with_actor_label(mut self, label: impl Into<String>) -> Self {
        self.actor_label = Some(label.into());
        self
    }

    pub fn with_asset(mut self, asset: AssetPath) -> Self {
        self.asset = Some(asset);
        self
    }

    pub fn with_component(mut self, component: ComponentId) -> Self {
        self.component = Some(component);
        self
    }
}

/// Polled progress of a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskInfo {
    pub state: TaskState,
    /// Human readable progress text
    pub status_text: String,
    /// Asset handle produced by instantiation; invalid until then
    pub asset_id: AssetId,
}

/// Asynchronous job queue
pub trait TaskQueue {
    fn submit(&self, request: CookRequest);

    /// Current info for a request; `None` once the queue no longer knows it
    fn poll(&self, id: CorrelationId) -> Option<TaskInfo>;

    /// Evict a request and its info
    fn remove(&self, id: CorrelationId);
}
