//! ComponentWorld - Owns every asset component of one editor world
//!
//! The world drives all component poll timers from the host's frame clock
//! and handles what crosses component boundaries:
//! - preview propagation: the first cook of an asset whose preview is still
//!   the logo placeholder updates one other component showing that asset
//! - save notifications and reference collection for all components

use crate::component::AssetComponent;
use crate::config::ComponentConfig;
use crate::error::{Error, Result};
use houdini_core::{ComponentId, MeshData};
use houdini_session::{AssetDefinition, EngineSession, Host, ObjectRef, ReferenceCollector};
use indexmap::IndexMap;
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, error};

/// Result of advancing the world clock
#[derive(Debug, Default)]
pub struct WorldTick {
    /// Components whose poll timer fired
    pub ticked: usize,
    /// Components that received a propagated preview
    pub previews: Vec<ComponentId>,
    /// Tick failures, per component
    pub errors: Vec<(ComponentId, Error)>,
}

/// Container for the asset components of one world
pub struct ComponentWorld {
    config: ComponentConfig,
    engine: Rc<dyn EngineSession>,
    host: Rc<dyn Host>,
    components: IndexMap<ComponentId, AssetComponent>,
    next_id: u64,
}

impl ComponentWorld {
    pub fn new(config: ComponentConfig, engine: Rc<dyn EngineSession>, host: Rc<dyn Host>) -> Self {
        Self {
            config,
            engine,
            host,
            components: IndexMap::new(),
            next_id: 1,
        }
    }

    pub fn config(&self) -> &ComponentConfig {
        &self.config
    }

    /// Create a component with no asset attached
    pub fn create(&mut self) -> ComponentId {
        let id = ComponentId::new(self.next_id);
        self.next_id += 1;
        let component = AssetComponent::new(
            id,
            self.config.clone(),
            Rc::clone(&self.engine),
            Rc::clone(&self.host),
        );
        self.components.insert(id, component);
        id
    }

    /// Create a component and attach `asset`, starting its instantiation
    pub fn spawn(&mut self, asset: Rc<AssetDefinition>) -> Result<ComponentId> {
        let id = self.create();
        if let Some(component) = self.components.get_mut(&id) {
            component.set_asset(asset)?;
        }
        Ok(id)
    }

    /// Create a preview component; it shows `asset` without instantiating it
    pub fn spawn_preview(&mut self, asset: Rc<AssetDefinition>) -> Result<ComponentId> {
        let id = self.create();
        if let Some(component) = self.components.get_mut(&id) {
            component.set_preview_mode(true);
            component.set_asset(asset)?;
        }
        Ok(id)
    }

    pub fn component(&self, id: ComponentId) -> Option<&AssetComponent> {
        self.components.get(&id)
    }

    pub fn component_mut(&mut self, id: ComponentId) -> Option<&mut AssetComponent> {
        self.components.get_mut(&id)
    }

    pub fn ids(&self) -> impl Iterator<Item = ComponentId> + '_ {
        self.components.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Tear down and remove a component
    pub fn destroy(&mut self, id: ComponentId) -> Option<AssetComponent> {
        let mut component = self.components.shift_remove(&id)?;
        component.on_destroyed();
        Some(component)
    }

    /// Advance every component's poll timer by `delta`
    pub fn advance(&mut self, delta: Duration) -> WorldTick {
        let mut result = WorldTick::default();
        let mut previews: Vec<(ComponentId, MeshData)> = Vec::new();

        for (id, component) in &mut self.components {
            match component.advance(delta) {
                Ok(Some(report)) => {
                    result.ticked += 1;
                    if let Some(mesh) = report.preview {
                        previews.push((*id, mesh));
                    }
                }
                Ok(None) => {}
                Err(err) => {
                    result.ticked += 1;
                    error!(component = %id, error = %err, "component tick failed");
                    result.errors.push((*id, err));
                }
            }
        }

        for (source, mesh) in previews {
            if let Some(target) = self.propagate_preview(source, &mesh) {
                result.previews.push(target);
            }
        }
        result
    }

    /// Show `mesh` on the first other component using the same asset
    fn propagate_preview(&mut self, source: ComponentId, mesh: &MeshData) -> Option<ComponentId> {
        let asset = Rc::clone(self.components.get(&source)?.asset()?);
        let (target, component) = self.components.iter_mut().find(|(id, c)| {
            **id != source && c.asset().is_some_and(|a| Rc::ptr_eq(a, &asset))
        })?;
        debug!(source = %source, target = %target, "propagating preview geometry");
        component.apply_preview(mesh);
        Some(*target)
    }

    /// Begin a save; returns the generated schemas to pin for its duration
    pub fn pre_save(&mut self) -> Vec<ObjectRef> {
        self.components.values_mut().filter_map(AssetComponent::pre_save).collect()
    }

    pub fn post_save(&mut self) {
        for component in self.components.values_mut() {
            component.post_save();
        }
    }

    /// Report every component's references to a collector pass
    pub fn collect_references(&self, collector: &mut dyn ReferenceCollector) {
        for component in self.components.values() {
            component.add_referenced_objects(collector);
        }
    }
}

impl std::fmt::Debug for ComponentWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentWorld")
            .field("components", &self.components.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}
