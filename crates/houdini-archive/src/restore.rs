//! Loading an archive back into a component

use crate::archive::{ComponentArchive, SerializedProperty, ARCHIVE_VERSION};
use crate::error::{Error, Result};
use houdini_component::{AssetComponent, ComponentState, ComponentWorld, RestoredComponent, RestoredField};
use houdini_core::{meta, ComponentId};
use houdini_session::AssetResolver;
use tracing::{debug, info};

impl From<SerializedProperty> for RestoredField {
    fn from(property: SerializedProperty) -> Self {
        let mut meta = property.meta;
        // Re-added by the changed flag
        meta.shift_remove(meta::PROPERTY_CHANGED);
        RestoredField {
            kind: property.kind,
            parm_name: property.name,
            flags: property.flags,
            arity: property.arity,
            element_size: property.element_size,
            offset: property.offset,
            meta,
            changed: property.changed,
            choices: property.choices,
        }
    }
}

/// Restore `archive` into a freshly created component
///
/// The referenced asset is resolved through `resolver`; a missing package
/// or asset fails the load. An `Invalid` archive leaves the component as is.
pub fn restore<R: AssetResolver + ?Sized>(
    archive: ComponentArchive,
    component: &mut AssetComponent,
    resolver: &R,
) -> Result<()> {
    if archive.version != ARCHIVE_VERSION {
        return Err(Error::UnsupportedVersion(archive.version));
    }
    if archive.state == ComponentState::Invalid {
        debug!(component = %component.id(), "archive holds no asset");
        return Ok(());
    }

    let capacity = component.config().scratch_capacity;
    let stored = archive.scratch_capacity.max(archive.scratch.len());
    if stored > capacity {
        return Err(Error::ScratchTooLarge { stored, capacity });
    }

    let path = archive.asset.ok_or(Error::MissingAssetPath)?;
    if !resolver.find_or_load_package(&path.package) {
        return Err(Error::MissingPackage(path.package));
    }
    let asset = resolver.find_asset(&path).ok_or_else(|| Error::MissingAsset(path.clone()))?;

    let fields: Vec<RestoredField> = archive.properties.into_iter().map(RestoredField::from).collect();
    info!(
        component = %component.id(),
        asset = %path,
        state = ?archive.state,
        fields = fields.len(),
        "loading component"
    );
    component.install_restored(RestoredComponent {
        state: archive.state,
        asset: Some(asset),
        fields,
        scratch: archive.scratch,
        strings: archive.strings,
        mesh: archive.mesh,
    })?;
    Ok(())
}

/// Create a component in `world` and restore `archive` into it
///
/// The component is destroyed again if the restore fails.
pub fn restore_into_world<R: AssetResolver + ?Sized>(
    world: &mut ComponentWorld,
    archive: ComponentArchive,
    resolver: &R,
) -> Result<ComponentId> {
    let id = world.create();
    let result = match world.component_mut(id) {
        Some(component) => restore(archive, component, resolver),
        None => Ok(()),
    };
    if let Err(err) = result {
        world.destroy(id);
        return Err(err);
    }
    Ok(id)
}
