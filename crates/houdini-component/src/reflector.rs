//! Parameter schema reflection
//!
//! Reads an asset's live parameter table and turns every visible, supported
//! parameter into a `ParameterDescriptor` plus its current value.
//!
//! Only the asset/node queries and bulk value fetches at the top of a pass
//! are fatal. Anything that goes wrong while reading a single parameter
//! (its name, label, choice list or menu value) skips that parameter and the
//! pass continues.

use crate::error::{Error, Result};
use houdini_core::meta::sanitize_object_name;
use houdini_core::{
    AssetId, Choice, ChoiceBacking, Color, NodeId, ParameterDescriptor, ParameterKind, ParameterValue,
    RangeHints,
};
use houdini_session::{fetch_string, EngineString, HapiError, HapiResult, ParameterApi, ParmInfo, ParmType};
use tracing::{debug, warn};

/// Stored in place of a string value whose handle cannot be resolved
pub const INVALID_STRING: &str = "Invalid";

/// Largest menu an enumeration field can select from
pub const MAX_CHOICES: usize = u8::MAX as usize + 1;

/// A reflected parameter and its value at reflection time
#[derive(Debug, Clone, PartialEq)]
pub struct ReflectedParameter {
    pub descriptor: ParameterDescriptor,
    pub value: ParameterValue,
}

/// Bulk value arrays of one node
struct ValueTable {
    ints: Vec<i32>,
    floats: Vec<f32>,
    strings: Vec<EngineString>,
}

fn is_supported(parm_type: ParmType) -> bool {
    matches!(
        parm_type,
        ParmType::Int | ParmType::Float | ParmType::Toggle | ParmType::Color | ParmType::String
    )
}

fn range_of<T: Clone>(values: &[T], start: i32, length: i32) -> HapiResult<Vec<T>> {
    let start = usize::try_from(start).map_err(|_| HapiError::InvalidArgument(format!("start {}", start)))?;
    let length = usize::try_from(length).map_err(|_| HapiError::InvalidArgument(format!("length {}", length)))?;
    values
        .get(start..start + length)
        .map(<[T]>::to_vec)
        .ok_or_else(|| HapiError::InvalidArgument(format!("values {}..{} out of range", start, start + length)))
}

/// Index of the entry a string menu currently selects
///
/// An empty value selects the first entry; otherwise the entry whose raw
/// value matches case-insensitively, falling back to the first entry.
pub fn resolve_string_choice(choices: &[Choice], value: &str) -> u8 {
    if value.is_empty() {
        return 0;
    }
    let sanitized = sanitize_object_name(value);
    choices
        .iter()
        .position(|c| c.value.eq_ignore_ascii_case(value) || c.value.eq_ignore_ascii_case(&sanitized))
        .and_then(|i| u8::try_from(i).ok())
        .unwrap_or(0)
}

/// Reflect every visible, supported parameter of `asset`
///
/// An invalid handle yields an empty list: nothing has been instantiated
/// yet, so there is nothing to reflect.
pub fn reflect<A: ParameterApi + ?Sized>(api: &A, asset: AssetId) -> Result<Vec<ReflectedParameter>> {
    if !asset.is_valid() {
        return Ok(Vec::new());
    }

    let asset_info = api.get_asset_info(asset).map_err(Error::hapi("get_asset_info"))?;
    let node = api
        .get_node_info(asset_info.node_id)
        .map_err(Error::hapi("get_node_info"))?;

    let parms = if node.parm_count > 0 {
        api.get_parameters(node.id, 0, node.parm_count)
            .map_err(Error::hapi("get_parameters"))?
    } else {
        Vec::new()
    };

    let table = ValueTable {
        ints: if node.parm_int_value_count > 0 {
            api.get_parm_int_values(node.id, 0, node.parm_int_value_count)
                .map_err(Error::hapi("get_parm_int_values"))?
        } else {
            Vec::new()
        },
        floats: if node.parm_float_value_count > 0 {
            api.get_parm_float_values(node.id, 0, node.parm_float_value_count)
                .map_err(Error::hapi("get_parm_float_values"))?
        } else {
            Vec::new()
        },
        strings: if node.parm_string_value_count > 0 {
            api.get_parm_string_values(node.id, true, 0, node.parm_string_value_count)
                .map_err(Error::hapi("get_parm_string_values"))?
        } else {
            Vec::new()
        },
    };

    let mut reflected = Vec::with_capacity(parms.len());
    for info in &parms {
        if info.invisible || !is_supported(info.parm_type) {
            continue;
        }
        match reflect_parameter(api, node.id, info, &table) {
            Ok(Some(parameter)) => reflected.push(parameter),
            Ok(None) => {}
            Err(e) => warn!(asset_id = asset.raw(), parm = info.id.0, error = %e, "skipping parameter"),
        }
    }

    debug!(asset_id = asset.raw(), count = reflected.len(), "reflected parameters");
    Ok(reflected)
}

fn fetch_choices<A: ParameterApi + ?Sized>(api: &A, node: NodeId, info: &ParmInfo) -> HapiResult<Vec<Choice>> {
    api.get_parm_choice_lists(node, info.choice_index, info.choice_count)?
        .iter()
        .map(|choice| {
            let label = fetch_string(api, choice.label_sh)?;
            let value = fetch_string(api, choice.value_sh)?;
            Ok(Choice::new(label, value))
        })
        .collect()
}

fn reflect_parameter<A: ParameterApi + ?Sized>(
    api: &A,
    node: NodeId,
    info: &ParmInfo,
    table: &ValueTable,
) -> HapiResult<Option<ReflectedParameter>> {
    let name = fetch_string(api, info.name_sh)?;
    if name.is_empty() {
        return Ok(None);
    }
    let label = fetch_string(api, info.label_sh)?;

    if info.size <= 0 {
        return Ok(None);
    }
    let size = info.size;
    let has_choices = info.choice_count > 0;
    if has_choices && info.choice_index < 0 {
        return Ok(None);
    }
    if has_choices && info.choice_count as usize > MAX_CHOICES {
        warn!(parm = %name, choices = info.choice_count, "menu too large for an enumeration field");
        return Ok(None);
    }

    let mut choices = Vec::new();
    let mut choice_backing = None;

    let (kind, value) = match info.parm_type {
        ParmType::Int if has_choices => {
            choices = fetch_choices(api, node, info)?;
            choice_backing = Some(ChoiceBacking::Integer);
            let selected = api.get_parm_int_values(node, info.int_values_index, 1)?;
            let index = selected.first().copied().unwrap_or(0);
            let index = match usize::try_from(index) {
                Ok(i) if i < choices.len() => i as u8,
                _ => {
                    warn!(parm = %name, index, "menu selection out of range");
                    0
                }
            };
            (ParameterKind::Enumeration, ParameterValue::Enum(index))
        }
        ParmType::Int => {
            let values = range_of(&table.ints, info.int_values_index, size)?;
            (ParameterKind::Integer, ParameterValue::Int(values))
        }
        ParmType::String if has_choices => {
            choices = fetch_choices(api, node, info)?;
            choice_backing = Some(ChoiceBacking::String);
            let handles = api.get_parm_string_values(node, false, info.string_values_index, 1)?;
            let handle = handles
                .first()
                .copied()
                .ok_or_else(|| HapiError::InvalidArgument("empty string value".into()))?;
            let current = fetch_string(api, handle)?;
            let index = resolve_string_choice(&choices, &current);
            (ParameterKind::Enumeration, ParameterValue::Enum(index))
        }
        ParmType::String => {
            let handles = range_of(&table.strings, info.string_values_index, size)?;
            let values = handles
                .iter()
                .map(|&h| fetch_string(api, h).unwrap_or_else(|_| INVALID_STRING.to_string()))
                .collect();
            (ParameterKind::String, ParameterValue::String(values))
        }
        ParmType::Float => {
            let values = range_of(&table.floats, info.float_values_index, size)?;
            (ParameterKind::Float, ParameterValue::Float(values))
        }
        ParmType::Toggle => {
            let values = range_of(&table.ints, info.int_values_index, size)?;
            let values = values.into_iter().map(|v| v != 0).collect();
            (ParameterKind::Boolean, ParameterValue::Bool(values))
        }
        ParmType::Color => {
            if size < 3 {
                return Ok(None);
            }
            let values = range_of(&table.floats, info.float_values_index, size)?;
            let color = if size == 3 {
                Color::from_linear_rgb(&values)
            } else {
                Color::from_linear_rgba(&values)
            };
            (ParameterKind::Color, ParameterValue::Color(color))
        }
        _ => return Ok(None),
    };

    let arity = if has_choices { 1 } else { size as usize };
    Ok(Some(ReflectedParameter {
        descriptor: ParameterDescriptor {
            parm_id: info.id,
            name,
            label,
            kind,
            arity,
            choices,
            choice_backing,
            range: RangeHints {
                ui_min: info.ui_min,
                ui_max: info.ui_max,
                min: info.min,
                max: info.max,
            },
        },
        value,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use houdini_session::mock::{MockAsset, MockEngine};

    fn reflect_template(template: MockAsset) -> (MockEngine, Vec<ReflectedParameter>) {
        let engine = MockEngine::with_asset(template);
        let asset = engine.instantiate_now().unwrap();
        let reflected = reflect(&engine, asset).unwrap();
        (engine, reflected)
    }

    #[test]
    fn test_invisible_skipped_and_string_choice_resolved() {
        let template = MockAsset::new("menu")
            .int("hidden", "Hidden", &[3])
            .invisible()
            .string_choice("mode", "Mode", &[("A", "A"), ("B", "B")], "B");
        let (_, reflected) = reflect_template(template);

        assert_eq!(reflected.len(), 1);
        let descriptor = &reflected[0].descriptor;
        assert_eq!(descriptor.kind, ParameterKind::Enumeration);
        assert!(descriptor.is_string_choice());
        assert_eq!(descriptor.arity, 1);
        assert_eq!(descriptor.choices.len(), 2);
        assert_eq!(reflected[0].value, ParameterValue::Enum(1));
        assert_eq!(descriptor.choices[1].value, "B");
    }

    #[test]
    fn test_supported_kinds() {
        let template = MockAsset::new("all")
            .int("count", "Count", &[1, 2])
            .float("size", "Size", &[1.5])
            .toggle("enabled", "", &[true])
            .string("path", "Path", &["a", "b"])
            .color("tint", "Tint", &[1.0, 0.0, 0.0])
            .color("fill", "Fill", &[0.0, 1.0, 0.0, 0.5])
            .int_choice("shape", "Shape", &[("Box", "0"), ("Sphere", "1")], 1)
            .button("go", "Go");
        let (_, reflected) = reflect_template(template);

        let kinds: Vec<_> = reflected.iter().map(|p| p.descriptor.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ParameterKind::Integer,
                ParameterKind::Float,
                ParameterKind::Boolean,
                ParameterKind::String,
                ParameterKind::Color,
                ParameterKind::Color,
                ParameterKind::Enumeration,
            ]
        );
        assert_eq!(reflected[0].value, ParameterValue::Int(vec![1, 2]));
        assert_eq!(reflected[2].descriptor.display_name(), "enabled");
        assert_eq!(reflected[2].value, ParameterValue::Bool(vec![true]));
        assert_eq!(
            reflected[3].value,
            ParameterValue::String(vec!["a".to_string(), "b".to_string()])
        );
        assert_eq!(reflected[4].value, ParameterValue::Color(Color::rgba(255, 0, 0, 255)));
        assert_eq!(reflected[4].descriptor.arity, 3);
        assert_eq!(reflected[5].value, ParameterValue::Color(Color::rgba(0, 255, 0, 128)));
        assert_eq!(reflected[6].value, ParameterValue::Enum(1));
        assert_eq!(reflected[6].descriptor.choice_backing, Some(ChoiceBacking::Integer));
    }

    #[test]
    fn test_oversized_menu_skipped() {
        let owned: Vec<(String, String)> = (0..300).map(|i| (format!("Item {}", i), i.to_string())).collect();
        let entries: Vec<(&str, &str)> = owned.iter().map(|(l, v)| (l.as_str(), v.as_str())).collect();
        let template = MockAsset::new("menu")
            .int_choice("big", "Big", &entries, 280)
            .int_choice("full", "Full", &entries[..MAX_CHOICES], 255)
            .float("size", "Size", &[1.0]);
        let (_, reflected) = reflect_template(template);

        let names: Vec<_> = reflected.iter().map(|p| p.descriptor.name.as_str()).collect();
        assert_eq!(names, vec!["full", "size"]);
        assert_eq!(reflected[0].value, ParameterValue::Enum(255));
        assert_eq!(reflected[0].descriptor.choices.len(), MAX_CHOICES);
    }

    #[test]
    fn test_short_color_skipped() {
        let template = MockAsset::new("c").color("uv", "UV", &[0.5, 0.5]);
        let (_, reflected) = reflect_template(template);
        assert!(reflected.is_empty());
    }

    #[test]
    fn test_label_failure_skips_only_that_parameter() {
        let template = MockAsset::new("p")
            .float("size", "Broken Label", &[1.0])
            .float("seed", "Seed", &[4.0]);
        let engine = MockEngine::with_asset(template);
        engine.fail_string("Broken Label");
        let asset = engine.instantiate_now().unwrap();

        let reflected = reflect(&engine, asset).unwrap();
        assert_eq!(reflected.len(), 1);
        assert_eq!(reflected[0].descriptor.name, "seed");
    }

    #[test]
    fn test_choice_list_failure_skips_parameter() {
        let template = MockAsset::new("p")
            .int_choice("shape", "Shape", &[("Box", "0")], 0)
            .float("size", "Size", &[1.0]);
        let engine = MockEngine::with_asset(template);
        engine.fail_call("get_parm_choice_lists");
        let asset = engine.instantiate_now().unwrap();

        let reflected = reflect(&engine, asset).unwrap();
        assert_eq!(reflected.len(), 1);
        assert_eq!(reflected[0].descriptor.name, "size");
    }

    #[test]
    fn test_top_level_failure_is_fatal() {
        let engine = MockEngine::with_asset(MockAsset::new("p").float("size", "Size", &[1.0]));
        let asset = engine.instantiate_now().unwrap();
        engine.fail_call("get_node_info");
        assert!(matches!(
            reflect(&engine, asset),
            Err(Error::Hapi {
                call: "get_node_info",
                ..
            })
        ));
    }

    #[test]
    fn test_invalid_asset_reflects_nothing() {
        let engine = MockEngine::new();
        assert!(reflect(&engine, AssetId::INVALID).unwrap().is_empty());
    }

    #[test]
    fn test_range_hints_carried() {
        let range = RangeHints {
            ui_min: Some(0.0),
            ui_max: Some(10.0),
            min: None,
            max: Some(100.0),
        };
        let template = MockAsset::new("r").float("size", "Size", &[1.0]).range(range);
        let (_, reflected) = reflect_template(template);
        assert_eq!(reflected[0].descriptor.range, range);
    }

    #[test]
    fn test_resolve_string_choice() {
        let choices = vec![Choice::new("First", "first"), Choice::new("Second", "second")];
        assert_eq!(resolve_string_choice(&choices, ""), 0);
        assert_eq!(resolve_string_choice(&choices, "SECOND"), 1);
        assert_eq!(resolve_string_choice(&choices, "third"), 0);
    }
}
