//! Houdini Session - The boundary between the asset component and its collaborators
//!
//! The component never talks to the procedural engine or the host editor
//! directly. Everything it needs is expressed as traits here:
//!
//! - [`ParameterApi`] / [`GeometryApi`]: the engine's parameter and geometry calls
//! - [`TaskQueue`]: asynchronous instantiate/cook/delete jobs observed by polling
//! - [`EditorHost`], [`AssetResolver`], [`ReferenceCollector`]: host services
//!
//! Enable the `mock` feature for an in-memory engine and host.

mod error;
mod hapi;
mod host;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
mod task;

pub use error::{HapiError, HapiResult};
pub use hapi::{
    fetch_string, AssetInfo, EngineString, GeometryApi, NodeInfo, ParameterApi, ParmChoiceInfo, ParmInfo,
    ParmType,
};
pub use host::{AssetDefinition, AssetResolver, EditorHost, ObjectRef, ReferenceCollector};
pub use task::{CookRequest, TaskInfo, TaskKind, TaskQueue, TaskState};

/// Everything the component needs from a running engine session
pub trait EngineSession: ParameterApi + GeometryApi + TaskQueue {}

impl<T: ParameterApi + GeometryApi + TaskQueue + ?Sized> EngineSession for T {}

/// Everything the component needs from the host editor
pub trait Host: EditorHost + AssetResolver {}

impl<T: EditorHost + AssetResolver + ?Sized> Host for T {}
