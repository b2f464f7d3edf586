//! Services the host editor provides to the component

use houdini_core::{AssetPath, ComponentId, MeshData};
use std::cell::{Ref, RefCell};
use std::rc::Rc;

/// Editor-side services: actors, notifications and render resources
pub trait EditorHost {
    /// Current label of the actor owning `component`
    fn actor_label(&self, component: ComponentId) -> String;

    /// Rename the owning actor, made unique within its world
    fn set_actor_label_unique(&self, component: ComponentId, label: &str);

    /// Open a status notification for `component`
    fn show_notification(&self, component: ComponentId, text: &str);

    fn update_notification(&self, component: ComponentId, text: &str);

    /// Set the final text and let the notification fade out
    fn expire_notification(&self, component: ComponentId, text: &str);

    /// Release render resources, waiting on the render fence
    fn release_render_resources(&self, component: ComponentId);

    fn create_render_resources(&self, component: ComponentId, mesh: &MeshData);

    /// Push new mesh data to existing render resources
    fn update_rendering(&self, component: ComponentId, mesh: &MeshData);
}

/// Locates asset definitions in host storage
pub trait AssetResolver {
    /// Find a loaded package or load it; false if it does not exist
    fn find_or_load_package(&self, package: &str) -> bool;

    fn find_asset(&self, path: &AssetPath) -> Option<Rc<AssetDefinition>>;
}

/// Objects a component keeps alive on behalf of the garbage collector
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ObjectRef {
    /// Generated schema, by name
    Schema(String),
    /// Referenced asset definition
    Asset(AssetPath),
}

/// Receives references during a collector pass
pub trait ReferenceCollector {
    fn add_referenced_object(&mut self, object: ObjectRef, referencer: ComponentId);
}

impl ReferenceCollector for Vec<(ObjectRef, ComponentId)> {
    fn add_referenced_object(&mut self, object: ObjectRef, referencer: ComponentId) {
        self.push((object, referencer));
    }
}

/// A procedural asset definition shared by every component using it
#[derive(Debug)]
pub struct AssetDefinition {
    path: AssetPath,
    preview: RefCell<MeshData>,
}

impl AssetDefinition {
    /// Create a definition whose preview is the logo placeholder
    pub fn new(path: AssetPath) -> Self {
        Self {
            path,
            preview: RefCell::new(MeshData::logo()),
        }
    }

    pub fn path(&self) -> &AssetPath {
        &self.path
    }

    pub fn preview(&self) -> Ref<'_, MeshData> {
        self.preview.borrow()
    }

    pub fn set_preview(&self, mesh: MeshData) {
        *self.preview.borrow_mut() = mesh;
    }

    /// True until a cooked mesh has replaced the placeholder
    pub fn has_logo_preview(&self) -> bool {
        self.preview.borrow().is_logo
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_definition_preview() {
        let asset = AssetDefinition::new(AssetPath::new("/Game", "rock"));
        assert!(asset.has_logo_preview());
        asset.set_preview(MeshData::new(vec![[0.0; 3]; 3]));
        assert!(!asset.has_logo_preview());
        assert_eq!(asset.preview().triangle_count(), 1);
    }

    #[test]
    fn test_vec_collector() {
        let mut refs: Vec<(ObjectRef, ComponentId)> = Vec::new();
        refs.add_referenced_object(ObjectRef::Schema("S".into()), ComponentId::new(1));
        assert_eq!(refs, vec![(ObjectRef::Schema("S".into()), ComponentId::new(1))]);
    }
}
