//! Cook Cycle Example
//!
//! Runs one asset component through its whole life against the in-memory
//! engine: instantiate, edit two fields, re-cook, save, reload into a new
//! component, push the reloaded edits and finally delete both instances.
//!
//! Set `RUST_LOG=debug` to follow every request.

use houdini_archive::{restore_into_world, ComponentArchive};
use houdini_component::{ComponentConfig, ComponentWorld};
use houdini_core::{AssetPath, ComponentId, ParameterValue};
use houdini_session::mock::{MockAsset, MockEngine, MockHost};
use houdini_session::AssetResolver;
use std::error::Error;
use std::rc::Rc;
use std::time::Duration;
use tracing::warn;
use tracing_subscriber::EnvFilter;

const FRAME: Duration = Duration::from_millis(100);

/// Advance the world until `id` stops polling
fn run_until_idle(world: &mut ComponentWorld, id: ComponentId) -> usize {
    let mut frames = 0;
    while world.component(id).is_some_and(|c| c.is_polling()) && frames < 100 {
        let tick = world.advance(FRAME);
        for (component, err) in tick.errors {
            warn!(component = %component, error = %err, "tick failed");
        }
        frames += 1;
    }
    frames
}

fn print_fields(world: &ComponentWorld, id: ComponentId) -> Result<(), Box<dyn Error>> {
    let Some(component) = world.component(id) else {
        return Ok(());
    };
    let Some(schema) = component.schema() else {
        println!("  (no generated schema)");
        return Ok(());
    };
    println!("  schema {}", schema.name());
    for field in schema.fields() {
        let marker = if field.is_changed() { "*" } else { " " };
        println!(
            "  {} {:<10} {:?}",
            marker,
            field.parm_name(),
            component.field_value(field.id)?
        );
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== Houdini Asset Component Cook Cycle ===\n");

    let engine = Rc::new(MockEngine::with_asset(
        MockAsset::new("rock")
            .float("size", "Size", &[1.0])
            .int("seed", "Seed", &[7])
            .color("tint", "Tint", &[1.0, 0.5, 0.25])
            .string_choice("detail", "Detail", &[("Low", "low"), ("High", "high")], "low"),
    ));
    let host = Rc::new(MockHost::new());
    let path = AssetPath::new("/Game/Assets", "rock");
    let asset = host.add_asset(path.clone());
    let mut world = ComponentWorld::new(ComponentConfig::default(), engine.clone(), host.clone());

    // Instantiate
    let id = world.spawn(Rc::clone(&asset))?;
    let frames = run_until_idle(&mut world, id);
    let asset_id = world.component(id).map(|c| c.asset_id()).unwrap_or_default();
    println!("Instantiated {} as {} after {} frames", path, asset_id, frames);
    print_fields(&world, id)?;

    // Edit and re-cook
    if let Some(component) = world.component_mut(id) {
        let field = |parm: &str| component.schema().and_then(|s| s.field_by_parm(parm)).map(|f| f.id);
        if let (Some(size), Some(seed)) = (field("size"), field("seed")) {
            component.set_field_value(size, ParameterValue::from(2.5f32))?;
            component.set_field_value(seed, ParameterValue::from(42))?;
        }
    }
    println!("\nEdited size and seed:");
    print_fields(&world, id)?;
    let frames = run_until_idle(&mut world, id);
    println!(
        "Re-cooked after {} frames; engine now has size={:?} seed={:?}",
        frames,
        engine.float_values(asset_id, "size").unwrap_or_default(),
        engine.int_values(asset_id, "seed").unwrap_or_default()
    );

    // Edit once more, then save before the edit is pushed
    if let Some(component) = world.component_mut(id) {
        if let Some(detail) = component.schema().and_then(|s| s.field_by_parm("detail")).map(|f| f.id) {
            component.set_field_value(detail, ParameterValue::Enum(1))?;
        }
    }
    let pinned = world.pre_save();
    let archive = world.component(id).map(ComponentArchive::save).unwrap_or_else(ComponentArchive::invalid);
    world.post_save();
    println!("\nSaved with {} pinned schema(s):", pinned.len());
    println!("{}", archive.to_ron()?);
    let bytes = archive.to_bytes()?;
    println!("Binary archive is {} bytes", bytes.len());

    // Reload into a fresh component
    let restored = restore_into_world(&mut world, ComponentArchive::from_bytes(&bytes)?, &*host)?;
    println!("\nRestored as component {}:", restored);
    print_fields(&world, restored)?;
    let frames = run_until_idle(&mut world, restored);
    let restored_asset = world.component(restored).map(|c| c.asset_id()).unwrap_or_default();
    println!(
        "Restored component instantiated as {} after {} frames; detail={:?}",
        restored_asset,
        frames,
        engine.string_values(restored_asset, "detail").unwrap_or_default()
    );

    // Tear down
    run_until_idle(&mut world, id);
    for component in world.ids().collect::<Vec<_>>() {
        world.destroy(component);
    }
    println!(
        "\nDestroyed all components; {} asset(s) still known to the engine",
        [asset_id, restored_asset]
            .iter()
            .filter(|a| engine.asset_exists(**a))
            .count()
    );
    println!("Asset {} preview cooked: {}", path, !asset.has_logo_preview());
    println!("Resolver still knows the asset: {}", host.find_asset(&path).is_some());

    Ok(())
}
