//! Parameter descriptors: the schema-level view of one editable asset parameter

use crate::identity::ParmId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Semantic kind of a reflected parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParameterKind {
    Integer,
    Float,
    Boolean,
    String,
    Color,
    Enumeration,
}

impl ParameterKind {
    /// Size in bytes of one stored element of this kind
    pub fn element_size(&self) -> usize {
        match self {
            ParameterKind::Integer | ParameterKind::Float => 4,
            ParameterKind::Boolean | ParameterKind::Enumeration => 1,
            ParameterKind::Color => 4,
            // Strings are stored as a handle into the buffer's string pool
            ParameterKind::String => 4,
        }
    }
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParameterKind::Integer => "integer",
            ParameterKind::Float => "float",
            ParameterKind::Boolean => "boolean",
            ParameterKind::String => "string",
            ParameterKind::Color => "color",
            ParameterKind::Enumeration => "enumeration",
        };
        write!(f, "{}", name)
    }
}

/// What an enumeration's choices map back to in the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChoiceBacking {
    /// Integer parameter; the selected index is pushed back
    Integer,
    /// String parameter; the selected entry's raw value is pushed back
    String,
}

/// One entry of a choice list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    /// Label shown to the user
    pub label: String,
    /// Raw value understood by the engine
    pub value: String,
}

impl Choice {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Optional numeric range hints supplied by the engine
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RangeHints {
    pub ui_min: Option<f32>,
    pub ui_max: Option<f32>,
    pub min: Option<f32>,
    pub max: Option<f32>,
}

/// Schema description of one visible, supported parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDescriptor {
    /// Engine parameter id at reflection time
    pub parm_id: ParmId,
    /// Raw engine parameter name
    pub name: String,
    /// Display label; empty when the engine supplied none
    pub label: String,
    pub kind: ParameterKind,
    /// Number of components (1 for scalars)
    pub arity: usize,
    /// Choice entries; non-empty only for enumerations
    pub choices: Vec<Choice>,
    /// Backing type of an enumeration
    pub choice_backing: Option<ChoiceBacking>,
    pub range: RangeHints,
}

impl ParameterDescriptor {
    /// Label if present, raw name otherwise
    pub fn display_name(&self) -> &str {
        if self.label.is_empty() {
            &self.name
        } else {
            &self.label
        }
    }

    pub fn is_string_choice(&self) -> bool {
        self.choice_backing == Some(ChoiceBacking::String)
    }
}
