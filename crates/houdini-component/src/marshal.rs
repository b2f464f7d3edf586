//! Value marshalling between the scratch buffer and the engine
//!
//! `store_value` / `load_value` / `write_value` move `ParameterValue`s in and
//! out of field storage. `push_changes` sends the values of every changed
//! field to the engine's per-parameter set calls.

use crate::error::{Error, Result};
use crate::schema::{FieldDef, GeneratedSchema};
use crate::tracker::ChangeSet;
use houdini_core::encoding::encode_engine_string;
use houdini_core::{
    AssetId, Color, NodeId, ParameterKind, ParameterValue, ScratchAllocator, ScratchBuffer, StringHandle,
};
use houdini_session::{ParameterApi, ParmInfo};
use tracing::{debug, warn};

/// Allocate storage for `value` and write it, returning (offset, arity)
pub fn store_value(
    alloc: &mut ScratchAllocator,
    buffer: &mut ScratchBuffer,
    value: &ParameterValue,
) -> Result<(usize, usize)> {
    let placed = match value {
        ParameterValue::Int(values) => {
            let slot = alloc.allocate::<i32>(values.len())?;
            for (i, v) in values.iter().enumerate() {
                buffer.write(&slot, i, *v)?;
            }
            (slot.offset(), slot.len())
        }
        ParameterValue::Float(values) => {
            let slot = alloc.allocate::<f32>(values.len())?;
            for (i, v) in values.iter().enumerate() {
                buffer.write(&slot, i, *v)?;
            }
            (slot.offset(), slot.len())
        }
        ParameterValue::Bool(values) => {
            let slot = alloc.allocate::<bool>(values.len())?;
            for (i, v) in values.iter().enumerate() {
                buffer.write(&slot, i, *v)?;
            }
            (slot.offset(), slot.len())
        }
        ParameterValue::String(values) => {
            let slot = alloc.allocate::<StringHandle>(values.len())?;
            for (i, v) in values.iter().enumerate() {
                buffer.write_string(&slot, i, v)?;
            }
            (slot.offset(), slot.len())
        }
        ParameterValue::Color(color) => {
            let slot = alloc.allocate::<Color>(1)?;
            buffer.write(&slot, 0, *color)?;
            (slot.offset(), 1)
        }
        ParameterValue::Enum(index) => {
            let slot = alloc.allocate::<u8>(1)?;
            buffer.write(&slot, 0, *index)?;
            (slot.offset(), 1)
        }
    };
    Ok(placed)
}

/// Read the current value of `field`
pub fn load_value(field: &FieldDef, buffer: &ScratchBuffer) -> Result<ParameterValue> {
    let value = match field.kind {
        ParameterKind::Integer => ParameterValue::Int(buffer.read_all(&field.slot::<i32>())?),
        ParameterKind::Float => ParameterValue::Float(buffer.read_all(&field.slot::<f32>())?),
        ParameterKind::Boolean => ParameterValue::Bool(buffer.read_all(&field.slot::<bool>())?),
        ParameterKind::String => {
            let slot = field.slot::<StringHandle>();
            let values = (0..slot.len())
                .map(|i| buffer.read_string(&slot, i))
                .collect::<houdini_core::Result<Vec<_>>>()?;
            ParameterValue::String(values)
        }
        ParameterKind::Color => ParameterValue::Color(buffer.read(&field.slot::<Color>(), 0)?),
        ParameterKind::Enumeration => ParameterValue::Enum(buffer.read(&field.slot::<u8>(), 0)?),
    };
    Ok(value)
}

/// Overwrite the value of `field` in place
pub fn write_value(field: &FieldDef, buffer: &mut ScratchBuffer, value: &ParameterValue) -> Result<()> {
    if value.kind() != field.kind {
        return Err(Error::KindMismatch {
            field: field.name.clone(),
            expected: field.kind,
            got: value.kind(),
        });
    }
    if value.arity() != field.arity {
        return Err(Error::ArityMismatch {
            name: field.parm_name().to_string(),
            engine: value.arity(),
            field: field.arity,
        });
    }

    match value {
        ParameterValue::Int(values) => {
            let slot = field.slot::<i32>();
            for (i, v) in values.iter().enumerate() {
                buffer.write(&slot, i, *v)?;
            }
        }
        ParameterValue::Float(values) => {
            let slot = field.slot::<f32>();
            for (i, v) in values.iter().enumerate() {
                buffer.write(&slot, i, *v)?;
            }
        }
        ParameterValue::Bool(values) => {
            let slot = field.slot::<bool>();
            for (i, v) in values.iter().enumerate() {
                buffer.write(&slot, i, *v)?;
            }
        }
        ParameterValue::String(values) => {
            let slot = field.slot::<StringHandle>();
            for (i, v) in values.iter().enumerate() {
                buffer.write_string(&slot, i, v)?;
            }
        }
        ParameterValue::Color(color) => buffer.write(&field.slot::<Color>(), 0, *color)?,
        ParameterValue::Enum(index) => buffer.write(&field.slot::<u8>(), 0, *index)?,
    }
    Ok(())
}

fn check_arity(field: &FieldDef, parm: &ParmInfo, stored: usize) -> Result<usize> {
    let engine = usize::try_from(parm.size).unwrap_or(0);
    if engine != stored {
        return Err(Error::ArityMismatch {
            name: field.parm_name().to_string(),
            engine,
            field: stored,
        });
    }
    Ok(engine)
}

/// Push one field; false when the engine has no parameter of that name
fn push_field<A: ParameterApi + ?Sized>(
    api: &A,
    node: NodeId,
    schema: &GeneratedSchema,
    field: &FieldDef,
    buffer: &ScratchBuffer,
) -> Result<bool> {
    let name = encode_engine_string(field.parm_name())?;
    let parm_id = api
        .get_parm_id_from_name(node, &name)
        .map_err(Error::hapi("get_parm_id_from_name"))?;
    if !parm_id.is_valid() {
        debug!(parm = field.parm_name(), "no engine parameter for changed field");
        return Ok(false);
    }
    let parm = api
        .get_parameters(node, parm_id.0, 1)
        .map_err(Error::hapi("get_parameters"))?
        .into_iter()
        .next()
        .ok_or_else(|| Error::UnknownParameter(field.parm_name().to_string()))?;

    match field.kind {
        ParameterKind::Integer | ParameterKind::Boolean => {
            let values: Vec<i32> = match load_value(field, buffer)? {
                ParameterValue::Bool(values) => values.into_iter().map(i32::from).collect(),
                ParameterValue::Int(values) => values,
                _ => Vec::new(),
            };
            check_arity(field, &parm, values.len())?;
            api.set_parm_int_values(node, &values, parm.int_values_index, parm.size)
                .map_err(Error::hapi("set_parm_int_values"))?;
        }
        ParameterKind::Float => {
            let values = buffer.read_all(&field.slot::<f32>())?;
            check_arity(field, &parm, values.len())?;
            api.set_parm_float_values(node, &values, parm.float_values_index, parm.size)
                .map_err(Error::hapi("set_parm_float_values"))?;
        }
        ParameterKind::String => {
            let slot = field.slot::<StringHandle>();
            check_arity(field, &parm, slot.len())?;
            for index in 0..slot.len() {
                let value = encode_engine_string(&buffer.read_string(&slot, index)?)?;
                api.set_parm_string_value(node, &value, parm_id, index as i32)
                    .map_err(Error::hapi("set_parm_string_value"))?;
            }
        }
        ParameterKind::Color => {
            let color = buffer.read(&field.slot::<Color>(), 0)?;
            let rgba = color.to_linear_rgba();
            let channels = if field.hides_alpha() { 3 } else { 4 };
            check_arity(field, &parm, channels)?;
            api.set_parm_float_values(node, &rgba[..channels], parm.float_values_index, parm.size)
                .map_err(Error::hapi("set_parm_float_values"))?;
        }
        ParameterKind::Enumeration => {
            let index = buffer.read(&field.slot::<u8>(), 0)?;
            if field.is_string_choice() {
                let choices = schema.enum_of(field);
                let value = choices.and_then(|e| e.houdini_name(index as usize)).ok_or(
                    houdini_core::Error::SlotIndex {
                        index: index as usize,
                        len: choices.map_or(0, |e| e.entries.len()),
                    },
                )?;
                let value = encode_engine_string(value)?;
                api.set_parm_string_value(node, &value, parm_id, 0)
                    .map_err(Error::hapi("set_parm_string_value"))?;
            } else {
                api.set_parm_int_values(node, &[i32::from(index)], parm.int_values_index, 1)
                    .map_err(Error::hapi("set_parm_int_values"))?;
            }
        }
    }
    Ok(true)
}

/// Push every changed field to the engine, returning how many were sent
///
/// Only the asset lookup is fatal. A field that cannot be resolved or sent
/// is logged and skipped.
pub fn push_changes<A: ParameterApi + ?Sized>(
    api: &A,
    asset: AssetId,
    schema: &GeneratedSchema,
    buffer: &ScratchBuffer,
    changes: &ChangeSet,
) -> Result<usize> {
    let info = api.get_asset_info(asset).map_err(Error::hapi("get_asset_info"))?;
    let mut pushed = 0;
    for id in changes.iter() {
        let Some(field) = schema.field(id) else {
            warn!(field = %id, "changed field no longer in schema");
            continue;
        };
        match push_field(api, info.node_id, schema, field, buffer) {
            Ok(true) => pushed += 1,
            Ok(false) => {}
            Err(err) => warn!(parm = field.parm_name(), error = %err, "failed to push parameter"),
        }
    }
    debug!(asset_id = %asset, pushed, pending = changes.len(), "pushed changed parameters");
    Ok(pushed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflector::reflect;
    use crate::schema::BaseSchema;
    use houdini_session::mock::{MockAsset, MockEngine, SetCall};
    use std::rc::Rc;

    fn template() -> MockAsset {
        MockAsset::new("rock")
            .int("count", "Count", &[1, 2])
            .float("size", "Size", &[1.0])
            .toggle("enabled", "", &[false])
            .string("path", "Path", &["a.bgeo"])
            .color("tint", "Tint", &[1.0, 0.0, 0.0])
            .color("glow", "Glow", &[0.0, 0.0, 0.0, 1.0])
            .int_choice("shape", "Shape", &[("Box", "0"), ("Sphere", "1")], 0)
            .string_choice("mode", "Mode", &[("Fast", "fast"), ("Slow", "slow")], "fast")
    }

    fn setup(engine: &MockEngine) -> (AssetId, GeneratedSchema, ScratchBuffer) {
        let asset = engine.instantiate_now().unwrap();
        let params = reflect(engine, asset).unwrap();
        let base = Rc::new(BaseSchema::component("HoudiniAssetComponent"));
        let mut schema = GeneratedSchema::new("S".to_string(), base);
        let mut scratch = ScratchBuffer::new(256);
        schema
            .rebuild(&params, &mut scratch, "HoudiniProperties", &ChangeSet::new())
            .unwrap();
        (asset, schema, scratch)
    }

    fn edit(schema: &GeneratedSchema, scratch: &mut ScratchBuffer, changes: &mut ChangeSet, parm: &str, value: ParameterValue) {
        let field = schema.field_by_parm(parm).unwrap();
        write_value(field, scratch, &value).unwrap();
        changes.insert(field.id);
    }

    #[test]
    fn test_store_and_load() {
        let mut buffer = ScratchBuffer::new(32);
        let mut alloc = ScratchAllocator::new(32);
        let (offset, arity) = store_value(&mut alloc, &mut buffer, &ParameterValue::from("x")).unwrap();
        assert_eq!((offset, arity), (0, 1));
        let (offset, arity) =
            store_value(&mut alloc, &mut buffer, &ParameterValue::Float(vec![1.0, 2.0, 3.0])).unwrap();
        assert_eq!((offset, arity), (4, 3));
        assert!(store_value(&mut alloc, &mut buffer, &ParameterValue::Int(vec![0; 6])).is_err());
    }

    #[test]
    fn test_write_value_checks_shape() {
        let engine = MockEngine::with_asset(template());
        let (_, schema, mut scratch) = setup(&engine);
        let count = schema.field_by_parm("count").unwrap();

        let err = write_value(count, &mut scratch, &ParameterValue::from(1.0f32)).unwrap_err();
        assert!(matches!(err, Error::KindMismatch { .. }));
        let err = write_value(count, &mut scratch, &ParameterValue::from(1)).unwrap_err();
        assert!(matches!(err, Error::ArityMismatch { engine: 1, field: 2, .. }));
    }

    #[test]
    fn test_push_every_kind() {
        let engine = MockEngine::with_asset(template());
        let (asset, schema, mut scratch) = setup(&engine);
        let mut changes = ChangeSet::new();

        edit(&schema, &mut scratch, &mut changes, "count", ParameterValue::Int(vec![5, 6]));
        edit(&schema, &mut scratch, &mut changes, "size", ParameterValue::from(2.5f32));
        edit(&schema, &mut scratch, &mut changes, "enabled", ParameterValue::from(true));
        edit(&schema, &mut scratch, &mut changes, "path", ParameterValue::from("b.bgeo"));
        edit(&schema, &mut scratch, &mut changes, "tint", ParameterValue::Color(Color::rgba(0, 255, 0, 255)));
        edit(&schema, &mut scratch, &mut changes, "glow", ParameterValue::Color(Color::rgba(255, 0, 0, 0)));
        edit(&schema, &mut scratch, &mut changes, "shape", ParameterValue::Enum(1));
        edit(&schema, &mut scratch, &mut changes, "mode", ParameterValue::Enum(1));

        let pushed = push_changes(&engine, asset, &schema, &scratch, &changes).unwrap();
        assert_eq!(pushed, 8);

        assert_eq!(engine.int_values(asset, "count").unwrap(), vec![5, 6]);
        assert_eq!(engine.float_values(asset, "size").unwrap(), vec![2.5]);
        assert_eq!(engine.int_values(asset, "enabled").unwrap(), vec![1]);
        assert_eq!(engine.string_values(asset, "path").unwrap(), vec!["b.bgeo".to_string()]);
        assert_eq!(engine.float_values(asset, "tint").unwrap(), vec![0.0, 1.0, 0.0]);
        assert_eq!(engine.float_values(asset, "glow").unwrap(), vec![1.0, 0.0, 0.0, 0.0]);
        assert_eq!(engine.int_values(asset, "shape").unwrap(), vec![1]);
        assert_eq!(engine.string_values(asset, "mode").unwrap(), vec!["slow".to_string()]);
    }

    #[test]
    fn test_push_then_reflect_round_trip() {
        let engine = MockEngine::with_asset(template());
        let (asset, schema, mut scratch) = setup(&engine);
        let mut changes = ChangeSet::new();
        edit(&schema, &mut scratch, &mut changes, "count", ParameterValue::Int(vec![-3, 9]));
        edit(&schema, &mut scratch, &mut changes, "size", ParameterValue::from(0.125f32));
        edit(&schema, &mut scratch, &mut changes, "enabled", ParameterValue::from(true));
        edit(&schema, &mut scratch, &mut changes, "path", ParameterValue::from("c.bgeo"));
        edit(&schema, &mut scratch, &mut changes, "mode", ParameterValue::Enum(1));
        push_changes(&engine, asset, &schema, &scratch, &changes).unwrap();

        let pulled = reflect(&engine, asset).unwrap();
        for id in changes.iter() {
            let field = schema.field(id).unwrap();
            let reflected = pulled
                .iter()
                .find(|p| p.descriptor.name == field.parm_name())
                .unwrap();
            assert_eq!(reflected.value, load_value(field, &scratch).unwrap());
        }
    }

    #[test]
    fn test_unknown_parameter_skipped() {
        let engine = MockEngine::with_asset(template());
        let (_, schema, mut scratch) = setup(&engine);
        let mut changes = ChangeSet::new();
        edit(&schema, &mut scratch, &mut changes, "count", ParameterValue::Int(vec![5, 6]));
        edit(&schema, &mut scratch, &mut changes, "size", ParameterValue::from(4.0f32));

        let other = MockEngine::with_asset(MockAsset::new("other").float("size", "Size", &[1.0]));
        let asset = other.instantiate_now().unwrap();
        let pushed = push_changes(&other, asset, &schema, &scratch, &changes).unwrap();
        assert_eq!(pushed, 1);
        assert_eq!(
            other.set_calls(),
            vec![SetCall::Float {
                start: 0,
                values: vec![4.0]
            }]
        );
    }

    #[test]
    fn test_failed_set_is_not_fatal() {
        let engine = MockEngine::with_asset(template());
        let (asset, schema, mut scratch) = setup(&engine);
        let mut changes = ChangeSet::new();
        edit(&schema, &mut scratch, &mut changes, "count", ParameterValue::Int(vec![5, 6]));
        edit(&schema, &mut scratch, &mut changes, "size", ParameterValue::from(4.0f32));

        engine.fail_call("set_parm_int_values");
        let pushed = push_changes(&engine, asset, &schema, &scratch, &changes).unwrap();
        assert_eq!(pushed, 1);
        assert_eq!(engine.float_values(asset, "size").unwrap(), vec![4.0]);
    }

    #[test]
    fn test_invalid_asset_is_fatal() {
        let engine = MockEngine::with_asset(template());
        let (_, schema, scratch) = setup(&engine);
        let err = push_changes(&engine, AssetId::new(99), &schema, &scratch, &ChangeSet::new()).unwrap_err();
        assert!(matches!(err, Error::Hapi { call: "get_asset_info", .. }));
    }
}
