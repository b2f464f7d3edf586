//! Houdini Component - A procedural asset instance with engine-driven fields
//!
//! This crate turns a Houdini Engine asset into an editable component:
//!
//! ```text
//! ComponentWorld (frame clock, preview propagation, save + GC hooks)
//!  │
//!  └── AssetComponent
//!       ├── reflect()          engine parameter table -> descriptors
//!       ├── GeneratedSchema    per-instance fields over the static BaseSchema
//!       ├── ScratchBuffer      fixed-capacity field storage
//!       ├── ChangeSet          fields edited since the last push
//!       ├── push_changes()     changed fields -> engine set calls
//!       └── PollTimer          drives instantiate / cook / delete requests
//! ```
//!
//! ## Key Components
//!
//! - [`AssetComponent`]: owns one asset instance and its cook lifecycle
//! - [`ComponentWorld`]: owns the components of one world
//! - [`GeneratedSchema`]: fields synthesized from the asset's parameters
//! - [`ComponentConfig`]: scratch capacity, poll cadence and naming
//!
//! The engine and the editor are reached only through the traits in
//! `houdini-session`; enable its `mock` feature to run a component in memory.

mod component;
mod config;
mod error;
pub mod lifecycle;
pub mod marshal;
pub mod reflector;
pub mod schema;
mod tracker;
mod world;

pub use component::{AssetComponent, RestoredComponent};
pub use config::ComponentConfig;
pub use error::{Error, Result};
pub use lifecycle::{ComponentState, CookState, PollTimer, TickOutcome, TickReport};
pub use reflector::{reflect, ReflectedParameter};
pub use schema::{
    BaseSchema, ChoiceEnum, EnumEntry, FieldDef, GeneratedSchema, RestoredField, SchemaEntry, StaticField,
    FIELD_FLAGS,
};
pub use tracker::{ChangeSet, ChangeType, EditEvent};
pub use world::{ComponentWorld, WorldTick};
