//! Generated schema: per-instance fields layered over the component's static schema
//!
//! A component starts out with only its `BaseSchema`. The first successful
//! cook creates a `GeneratedSchema` named `{ClassName}_{ActorLabel}_{Counter}`
//! and every later cook rebuilds its field list from a fresh reflection pass.
//!
//! Field iteration yields the generated fields first and then the base
//! schema's own fields. The base is shared and never modified.
//!
//! A rebuild lays out all fields in a new scratch buffer and only installs
//! the result (fields, enums and buffer) once every field has been placed, so
//! an overflow leaves the previous schema intact.

use crate::error::Result;
use crate::marshal;
use crate::reflector::ReflectedParameter;
use crate::tracker::ChangeSet;
use houdini_core::meta::{self, format_float, sanitize_object_name};
use houdini_core::{
    Choice, FieldId, MetaData, ParameterDescriptor, ParameterKind, ParameterValue, ScratchAllocator,
    ScratchBuffer, ScratchValue, Slot,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::rc::Rc;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::{debug, info};

/// Flags stamped on every synthesized field (editable, visible, transient)
pub const FIELD_FLAGS: u64 = 69_793_219_077;

static SCHEMA_COUNTER: AtomicU32 = AtomicU32::new(0);

/// Allocate a process-unique generated schema name
pub fn next_schema_name(class_name: &str, actor_label: &str) -> String {
    let counter = SCHEMA_COUNTER.fetch_add(1, Ordering::Relaxed);
    sanitize_object_name(&format!("{}_{}_{}", class_name, actor_label, counter))
}

/// Name of the field backing `parm_name` in schema `schema_name`
pub fn field_name(schema_name: &str, parm_name: &str) -> String {
    sanitize_object_name(&format!("{}_{}", schema_name, parm_name))
}

/// Name of the choice enum of a field
pub fn enum_name(field_name: &str) -> String {
    sanitize_object_name(&format!("enum_{}", field_name))
}

// ============================================================================
// Fields
// ============================================================================

/// A synthesized field bound to an offset in the scratch buffer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Stable across rebuilds for the same parameter name
    pub id: FieldId,
    pub name: String,
    pub kind: ParameterKind,
    pub flags: u64,
    /// Number of stored elements (colors and enumerations are scalar)
    pub arity: usize,
    pub element_size: usize,
    /// Byte offset of the first element
    pub offset: usize,
    pub meta: MetaData,
    /// Name of the choice enum, for enumerations
    pub enum_name: Option<String>,
}

impl FieldDef {
    /// Raw engine parameter name
    pub fn parm_name(&self) -> &str {
        self.meta.get(meta::PARM_NAME).map(String::as_str).unwrap_or(&self.name)
    }

    pub fn display_name(&self) -> &str {
        self.meta
            .get(meta::DISPLAY_NAME)
            .map(String::as_str)
            .unwrap_or_else(|| self.parm_name())
    }

    pub fn category(&self) -> Option<&str> {
        self.meta.get(meta::CATEGORY).map(String::as_str)
    }

    /// Edited since the last push
    pub fn is_changed(&self) -> bool {
        self.meta.contains_key(meta::PROPERTY_CHANGED)
    }

    pub fn set_changed(&mut self, changed: bool) {
        if changed {
            self.meta.insert(meta::PROPERTY_CHANGED.to_string(), "1".to_string());
        } else {
            self.meta.shift_remove(meta::PROPERTY_CHANGED);
        }
    }

    pub fn hides_alpha(&self) -> bool {
        self.meta.contains_key(meta::HIDE_ALPHA_CHANNEL)
    }

    pub fn is_string_choice(&self) -> bool {
        self.meta.contains_key(meta::STRING_CHOICE_LIST)
    }

    /// Typed view of this field's storage
    pub fn slot<T: ScratchValue>(&self) -> Slot<T> {
        Slot::from_raw(self.offset, self.arity)
    }

    /// First byte past this field's storage
    pub fn end(&self) -> usize {
        self.offset + self.arity * self.element_size
    }
}

/// A field of the static component schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticField {
    pub name: String,
    pub meta: MetaData,
}

/// The component's static schema, shared by all instances
#[derive(Debug, Clone, PartialEq)]
pub struct BaseSchema {
    pub name: String,
    pub fields: Vec<StaticField>,
}

impl BaseSchema {
    /// The static schema of the asset component: just its asset reference
    pub fn component(class_name: &str) -> Self {
        let mut meta = MetaData::new();
        meta.insert(meta::CATEGORY.to_string(), "HoudiniAsset".to_string());
        Self {
            name: class_name.to_string(),
            fields: vec![StaticField {
                name: "HoudiniAsset".to_string(),
                meta,
            }],
        }
    }
}

/// A field seen through the layered schema
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SchemaEntry<'a> {
    Generated(&'a FieldDef),
    Static(&'a StaticField),
}

impl SchemaEntry<'_> {
    pub fn name(&self) -> &str {
        match self {
            SchemaEntry::Generated(f) => &f.name,
            SchemaEntry::Static(f) => &f.name,
        }
    }
}

// ============================================================================
// Choice enums
// ============================================================================

/// One entry of a choice enum
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumEntry {
    /// `{EnumName}_value_{Label}`
    pub name: String,
    /// `DisplayName` and `HoudiniName`
    pub meta: MetaData,
}

/// Named enum backing an enumeration field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceEnum {
    pub name: String,
    pub entries: Vec<EnumEntry>,
}

impl ChoiceEnum {
    /// Build the enum for a field from its choice list
    pub fn from_choices(name: String, choices: &[Choice]) -> Self {
        let entries = choices
            .iter()
            .map(|choice| {
                let mut meta = MetaData::new();
                meta.insert(meta::DISPLAY_NAME.to_string(), choice.label.clone());
                meta.insert(meta::HOUDINI_NAME.to_string(), choice.value.clone());
                EnumEntry {
                    name: sanitize_object_name(&format!("{}_value_{}", name, choice.label)),
                    meta,
                }
            })
            .collect();
        Self { name, entries }
    }

    /// Engine value of entry `index`
    pub fn houdini_name(&self, index: usize) -> Option<&str> {
        self.entries
            .get(index)
            .and_then(|e| e.meta.get(meta::HOUDINI_NAME))
            .map(String::as_str)
    }

    pub fn display_name(&self, index: usize) -> Option<&str> {
        self.entries
            .get(index)
            .and_then(|e| e.meta.get(meta::DISPLAY_NAME))
            .map(String::as_str)
    }

    /// Choice list recovered from entry metadata
    pub fn choices(&self) -> Vec<Choice> {
        (0..self.entries.len())
            .map(|i| {
                Choice::new(
                    self.display_name(i).unwrap_or_default(),
                    self.houdini_name(i).unwrap_or_default(),
                )
            })
            .collect()
    }
}

// ============================================================================
// Generated schema
// ============================================================================

/// A persisted field, as handed back by the serializer
#[derive(Debug, Clone, PartialEq)]
pub struct RestoredField {
    pub kind: ParameterKind,
    /// Raw engine parameter name
    pub parm_name: String,
    pub flags: u64,
    pub arity: usize,
    pub element_size: usize,
    pub offset: usize,
    pub meta: MetaData,
    pub changed: bool,
    /// Choice list, for enumerations
    pub choices: Option<Vec<Choice>>,
}

/// Per-instance schema holding one field per reflected parameter
#[derive(Debug, Clone)]
pub struct GeneratedSchema {
    name: String,
    base: Rc<BaseSchema>,
    fields: Vec<FieldDef>,
    enums: IndexMap<String, ChoiceEnum>,
    next_field_id: u32,
}

impl GeneratedSchema {
    /// Create an empty schema layered over `base`
    pub fn new(name: String, base: Rc<BaseSchema>) -> Self {
        Self {
            name,
            base,
            fields: Vec::new(),
            enums: IndexMap::new(),
            next_field_id: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base(&self) -> &BaseSchema {
        &self.base
    }

    /// Generated fields in layout order
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Generated fields followed by the base schema's fields
    pub fn entries(&self) -> impl Iterator<Item = SchemaEntry<'_>> {
        self.fields
            .iter()
            .map(SchemaEntry::Generated)
            .chain(self.base.fields.iter().map(SchemaEntry::Static))
    }

    pub fn field(&self, id: FieldId) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.id == id)
    }

    pub fn field_mut(&mut self, id: FieldId) -> Option<&mut FieldDef> {
        self.fields.iter_mut().find(|f| f.id == id)
    }

    /// Field backing the named engine parameter
    pub fn field_by_parm(&self, parm_name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.parm_name() == parm_name)
    }

    pub fn enums(&self) -> impl Iterator<Item = &ChoiceEnum> {
        self.enums.values()
    }

    pub fn choice_enum(&self, name: &str) -> Option<&ChoiceEnum> {
        self.enums.get(name)
    }

    /// Enum of an enumeration field
    pub fn enum_of(&self, field: &FieldDef) -> Option<&ChoiceEnum> {
        field.enum_name.as_deref().and_then(|n| self.enums.get(n))
    }

    /// Clear the changed marker on every field
    pub fn clear_changed(&mut self) {
        for field in &mut self.fields {
            field.set_changed(false);
        }
    }

    fn id_for(&self, name: &str, next_id: &mut u32) -> FieldId {
        if let Some(existing) = self.fields.iter().find(|f| f.name == name) {
            return existing.id;
        }
        let id = FieldId(*next_id);
        *next_id += 1;
        id
    }

    fn field_meta(descriptor: &ParameterDescriptor, category: &str) -> MetaData {
        let mut meta = MetaData::new();
        meta.insert(meta::CATEGORY.to_string(), category.to_string());
        meta.insert(meta::PARM_NAME.to_string(), descriptor.name.clone());
        meta.insert(meta::DISPLAY_NAME.to_string(), descriptor.display_name().to_string());

        let range = &descriptor.range;
        let hints = [
            (meta::UI_MIN, range.ui_min),
            (meta::UI_MAX, range.ui_max),
            (meta::CLAMP_MIN, range.min),
            (meta::CLAMP_MAX, range.max),
        ];
        for (key, value) in hints {
            if let Some(value) = value {
                meta.insert(key.to_string(), format_float(value));
            }
        }

        if descriptor.is_string_choice() {
            meta.insert(meta::STRING_CHOICE_LIST.to_string(), "1".to_string());
        }
        if descriptor.kind == ParameterKind::Color && descriptor.arity == 3 {
            meta.insert(meta::HIDE_ALPHA_CHANNEL.to_string(), "1".to_string());
        }
        meta
    }

    /// Replace the field list with one field per reflected parameter
    ///
    /// Values are written into a new buffer of the same capacity as
    /// `scratch`, which replaces it on success. Fields in `pending` keep their
    /// current (edited, not yet pushed) value instead of the engine's.
    pub fn rebuild(
        &mut self,
        parameters: &[ReflectedParameter],
        scratch: &mut ScratchBuffer,
        category: &str,
        pending: &ChangeSet,
    ) -> Result<()> {
        let mut buffer = ScratchBuffer::new(scratch.capacity());
        let mut alloc = ScratchAllocator::new(buffer.capacity());
        let mut fields = Vec::with_capacity(parameters.len());
        let mut enums = IndexMap::new();
        let mut next_id = self.next_field_id;

        for parameter in parameters {
            let descriptor = &parameter.descriptor;
            let name = field_name(&self.name, &descriptor.name);
            let id = self.id_for(&name, &mut next_id);

            let mut value = parameter.value.clone();
            let mut changed = false;
            if pending.contains(id) {
                if let Some(previous) = self.field(id) {
                    let kept = marshal::load_value(previous, scratch)?;
                    if kept.kind() == value.kind() && kept.arity() == value.arity() {
                        value = kept;
                        changed = true;
                    }
                }
            }

            let (offset, arity) = marshal::store_value(&mut alloc, &mut buffer, &value)?;

            let enum_name = if descriptor.kind == ParameterKind::Enumeration {
                let enum_name = enum_name(&name);
                enums.insert(
                    enum_name.clone(),
                    ChoiceEnum::from_choices(enum_name.clone(), &descriptor.choices),
                );
                Some(enum_name)
            } else {
                None
            };

            let mut field = FieldDef {
                id,
                name,
                kind: descriptor.kind,
                flags: FIELD_FLAGS,
                arity,
                element_size: descriptor.kind.element_size(),
                offset,
                meta: Self::field_meta(descriptor, category),
                enum_name,
            };
            field.set_changed(changed);
            fields.push(field);
        }

        debug!(
            schema = %self.name,
            fields = fields.len(),
            used = alloc.used(),
            capacity = alloc.capacity(),
            "rebuilt generated schema"
        );

        self.fields = fields;
        self.enums = enums;
        self.next_field_id = next_id;
        *scratch = buffer;
        Ok(())
    }

    /// Recreate a schema from persisted fields
    ///
    /// Field and enum names are derived from this schema's name, so a
    /// restored component gets fresh names just like a newly cooked one.
    /// Every field must lie inside a buffer of `capacity` bytes.
    pub fn restore(
        name: String,
        base: Rc<BaseSchema>,
        restored: Vec<RestoredField>,
        capacity: usize,
    ) -> Result<Self> {
        let mut schema = Self::new(name, base);
        for (index, record) in restored.into_iter().enumerate() {
            let name = field_name(&schema.name, &record.parm_name);
            let enum_name = match (&record.kind, &record.choices) {
                (ParameterKind::Enumeration, Some(choices)) => {
                    let enum_name = enum_name(&name);
                    schema
                        .enums
                        .insert(enum_name.clone(), ChoiceEnum::from_choices(enum_name.clone(), choices));
                    Some(enum_name)
                }
                _ => None,
            };

            let mut meta = record.meta;
            meta.entry(meta::PARM_NAME.to_string())
                .or_insert_with(|| record.parm_name.clone());
            let mut field = FieldDef {
                id: FieldId(index as u32),
                name,
                kind: record.kind,
                flags: record.flags,
                arity: record.arity,
                element_size: record.element_size,
                offset: record.offset,
                meta,
                enum_name,
            };
            if field.end() > capacity {
                return Err(houdini_core::Error::OutOfBounds {
                    offset: field.offset,
                    size: field.arity * field.element_size,
                    capacity,
                }
                .into());
            }
            field.set_changed(record.changed);
            schema.fields.push(field);
        }
        schema.next_field_id = schema.fields.len() as u32;
        info!(schema = %schema.name, fields = schema.fields.len(), "restored generated schema");
        Ok(schema)
    }

    /// Current value of a field
    pub fn value(&self, id: FieldId, scratch: &ScratchBuffer) -> Result<ParameterValue> {
        let field = self.field(id).ok_or(crate::error::Error::UnknownField(id))?;
        marshal::load_value(field, scratch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use houdini_core::{ChoiceBacking, Color, ParmId, RangeHints};

    fn parameter(name: &str, kind: ParameterKind, value: ParameterValue) -> ReflectedParameter {
        ReflectedParameter {
            descriptor: ParameterDescriptor {
                parm_id: ParmId(0),
                name: name.to_string(),
                label: String::new(),
                kind,
                arity: value.arity(),
                choices: Vec::new(),
                choice_backing: None,
                range: RangeHints::default(),
            },
            value,
        }
    }

    fn schema() -> GeneratedSchema {
        let base = Rc::new(BaseSchema::component("HoudiniAssetComponent"));
        GeneratedSchema::new("HoudiniAssetComponent_Rock_0".to_string(), base)
    }

    #[test]
    fn test_schema_names() {
        let first = next_schema_name("HoudiniAssetComponent", "My Rock");
        let second = next_schema_name("HoudiniAssetComponent", "My Rock");
        assert!(first.starts_with("HoudiniAssetComponent_My_Rock_"));
        assert_ne!(first, second);
        assert_eq!(field_name("S", "size"), "S_size");
        assert_eq!(enum_name("S_mode"), "enum_S_mode");
    }

    #[test]
    fn test_rebuild_lays_out_fields() {
        let mut schema = schema();
        let mut scratch = ScratchBuffer::new(64);
        let params = vec![
            parameter("flag", ParameterKind::Boolean, ParameterValue::Bool(vec![true])),
            parameter("size", ParameterKind::Float, ParameterValue::Float(vec![1.0, 2.0])),
            parameter("name", ParameterKind::String, ParameterValue::from("rock")),
        ];
        schema
            .rebuild(&params, &mut scratch, "HoudiniProperties", &ChangeSet::new())
            .unwrap();

        let fields = schema.fields();
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0].offset, 0);
        assert_eq!(fields[1].offset, 4);
        assert_eq!(fields[1].arity, 2);
        assert_eq!(fields[2].offset, 12);
        assert_eq!(fields[1].name, "HoudiniAssetComponent_Rock_0_size");
        assert_eq!(fields[1].category(), Some("HoudiniProperties"));
        assert_eq!(fields[1].flags, FIELD_FLAGS);
        assert_eq!(
            schema.value(fields[2].id, &scratch).unwrap(),
            ParameterValue::from("rock")
        );
    }

    #[test]
    fn test_base_fields_follow_generated() {
        let mut schema = schema();
        let mut scratch = ScratchBuffer::new(16);
        let params = vec![parameter("size", ParameterKind::Float, ParameterValue::from(1.0f32))];
        schema
            .rebuild(&params, &mut scratch, "HoudiniProperties", &ChangeSet::new())
            .unwrap();

        let names: Vec<_> = schema.entries().map(|e| e.name().to_string()).collect();
        assert_eq!(names, vec!["HoudiniAssetComponent_Rock_0_size", "HoudiniAsset"]);
        assert_eq!(schema.base().fields.len(), 1);
    }

    #[test]
    fn test_field_ids_stable_across_rebuilds() {
        let mut schema = schema();
        let mut scratch = ScratchBuffer::new(32);
        let first = vec![
            parameter("a", ParameterKind::Integer, ParameterValue::from(1)),
            parameter("b", ParameterKind::Integer, ParameterValue::from(2)),
        ];
        schema
            .rebuild(&first, &mut scratch, "HoudiniProperties", &ChangeSet::new())
            .unwrap();
        let b = schema.field_by_parm("b").unwrap().id;

        let second = vec![
            parameter("b", ParameterKind::Integer, ParameterValue::from(5)),
            parameter("c", ParameterKind::Integer, ParameterValue::from(3)),
        ];
        schema
            .rebuild(&second, &mut scratch, "HoudiniProperties", &ChangeSet::new())
            .unwrap();

        assert_eq!(schema.field_by_parm("b").unwrap().id, b);
        assert_eq!(schema.field_by_parm("b").unwrap().offset, 0);
        assert!(schema.field_by_parm("a").is_none());
        assert_ne!(schema.field_by_parm("c").unwrap().id, b);
    }

    #[test]
    fn test_overflow_keeps_previous_schema() {
        let mut schema = schema();
        let mut scratch = ScratchBuffer::new(8);
        let small = vec![parameter("a", ParameterKind::Integer, ParameterValue::from(7))];
        schema
            .rebuild(&small, &mut scratch, "HoudiniProperties", &ChangeSet::new())
            .unwrap();

        let big = vec![parameter(
            "a",
            ParameterKind::Integer,
            ParameterValue::Int(vec![1, 2, 3]),
        )];
        let err = schema
            .rebuild(&big, &mut scratch, "HoudiniProperties", &ChangeSet::new())
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::Core(houdini_core::Error::ScratchOverflow { .. })
        ));
        assert_eq!(schema.fields().len(), 1);
        let id = schema.fields()[0].id;
        assert_eq!(schema.value(id, &scratch).unwrap(), ParameterValue::from(7));
    }

    #[test]
    fn test_pending_edits_survive_rebuild() {
        let mut schema = schema();
        let mut scratch = ScratchBuffer::new(16);
        let params = vec![parameter("size", ParameterKind::Float, ParameterValue::from(1.0f32))];
        schema
            .rebuild(&params, &mut scratch, "HoudiniProperties", &ChangeSet::new())
            .unwrap();
        let id = schema.fields()[0].id;
        marshal::write_value(schema.field(id).unwrap(), &mut scratch, &ParameterValue::from(3.0f32)).unwrap();

        let mut pending = ChangeSet::new();
        pending.insert(id);
        schema
            .rebuild(&params, &mut scratch, "HoudiniProperties", &pending)
            .unwrap();
        assert_eq!(schema.value(id, &scratch).unwrap(), ParameterValue::from(3.0f32));
        assert!(schema.field(id).unwrap().is_changed());
    }

    #[test]
    fn test_enum_and_color_metadata() {
        let mut schema = schema();
        let mut scratch = ScratchBuffer::new(16);
        let mut mode = parameter("mode", ParameterKind::Enumeration, ParameterValue::Enum(1));
        mode.descriptor.choices = vec![Choice::new("Fast Mode", "fast"), Choice::new("Slow", "slow")];
        mode.descriptor.choice_backing = Some(ChoiceBacking::String);
        let mut tint = parameter("tint", ParameterKind::Color, ParameterValue::Color(Color::WHITE));
        tint.descriptor.arity = 3;
        tint.descriptor.label = "Tint".to_string();
        tint.descriptor.range.ui_max = Some(1.0);

        schema
            .rebuild(&[mode, tint], &mut scratch, "HoudiniProperties", &ChangeSet::new())
            .unwrap();

        let mode = schema.field_by_parm("mode").unwrap();
        assert!(mode.is_string_choice());
        let choice_enum = schema.enum_of(mode).unwrap();
        assert_eq!(choice_enum.name, "enum_HoudiniAssetComponent_Rock_0_mode");
        assert_eq!(
            choice_enum.entries[0].name,
            "enum_HoudiniAssetComponent_Rock_0_mode_value_Fast_Mode"
        );
        assert_eq!(choice_enum.houdini_name(1), Some("slow"));
        assert_eq!(choice_enum.display_name(0), Some("Fast Mode"));

        let tint = schema.field_by_parm("tint").unwrap();
        assert!(tint.hides_alpha());
        assert_eq!(tint.arity, 1);
        assert_eq!(tint.display_name(), "Tint");
        assert_eq!(tint.meta.get(meta::UI_MAX).map(String::as_str), Some("1.0"));
    }

    #[test]
    fn test_restore_renames_and_checks_bounds() {
        let base = Rc::new(BaseSchema::component("HoudiniAssetComponent"));
        let record = RestoredField {
            kind: ParameterKind::Enumeration,
            parm_name: "mode".to_string(),
            flags: FIELD_FLAGS,
            arity: 1,
            element_size: 1,
            offset: 3,
            meta: MetaData::new(),
            changed: true,
            choices: Some(vec![Choice::new("A", "a")]),
        };
        let schema =
            GeneratedSchema::restore("Restored_1".to_string(), Rc::clone(&base), vec![record.clone()], 8).unwrap();
        let field = &schema.fields()[0];
        assert_eq!(field.name, "Restored_1_mode");
        assert_eq!(field.parm_name(), "mode");
        assert!(field.is_changed());
        assert_eq!(schema.enum_of(field).unwrap().houdini_name(0), Some("a"));

        let mut outside = record;
        outside.offset = 8;
        assert!(GeneratedSchema::restore("Restored_2".to_string(), base, vec![outside], 8).is_err());
    }
}
