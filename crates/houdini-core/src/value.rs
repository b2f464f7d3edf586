//! Dynamic parameter values exchanged with the external engine

use crate::descriptor::ParameterKind;
use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 8-bit RGBA color, the storage form of color fields
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Pod, Zeroable, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

fn unit_to_byte(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn byte_to_unit(v: u8) -> f32 {
    v as f32 / 255.0
}

impl Color {
    pub const WHITE: Color = Color::rgba(255, 255, 255, 255);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Convert an engine float RGB triple; alpha becomes opaque
    pub fn from_linear_rgb(values: &[f32]) -> Self {
        let c = |i: usize| values.get(i).copied().map(unit_to_byte).unwrap_or(0);
        Self::rgba(c(0), c(1), c(2), 255)
    }

    /// Convert an engine float RGBA quadruple
    pub fn from_linear_rgba(values: &[f32]) -> Self {
        let mut color = Self::from_linear_rgb(values);
        color.a = values.get(3).copied().map(unit_to_byte).unwrap_or(255);
        color
    }

    pub fn to_linear_rgb(&self) -> [f32; 3] {
        [byte_to_unit(self.r), byte_to_unit(self.g), byte_to_unit(self.b)]
    }

    pub fn to_linear_rgba(&self) -> [f32; 4] {
        [
            byte_to_unit(self.r),
            byte_to_unit(self.g),
            byte_to_unit(self.b),
            byte_to_unit(self.a),
        ]
    }
}

/// The current value of one asset parameter
///
/// Array parameters carry one element per component; colors and
/// enumerations are always scalar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParameterValue {
    Int(Vec<i32>),
    Float(Vec<f32>),
    Bool(Vec<bool>),
    String(Vec<String>),
    Color(Color),
    /// Index into the parameter's choice list
    Enum(u8),
}

impl ParameterValue {
    /// The semantic kind this value belongs to
    pub fn kind(&self) -> ParameterKind {
        match self {
            ParameterValue::Int(_) => ParameterKind::Integer,
            ParameterValue::Float(_) => ParameterKind::Float,
            ParameterValue::Bool(_) => ParameterKind::Boolean,
            ParameterValue::String(_) => ParameterKind::String,
            ParameterValue::Color(_) => ParameterKind::Color,
            ParameterValue::Enum(_) => ParameterKind::Enumeration,
        }
    }

    /// Number of elements carried
    pub fn arity(&self) -> usize {
        match self {
            ParameterValue::Int(v) => v.len(),
            ParameterValue::Float(v) => v.len(),
            ParameterValue::Bool(v) => v.len(),
            ParameterValue::String(v) => v.len(),
            ParameterValue::Color(_) | ParameterValue::Enum(_) => 1,
        }
    }

    pub fn as_ints(&self) -> Option<&[i32]> {
        match self {
            ParameterValue::Int(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_floats(&self) -> Option<&[f32]> {
        match self {
            ParameterValue::Float(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bools(&self) -> Option<&[bool]> {
        match self {
            ParameterValue::Bool(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_strings(&self) -> Option<&[String]> {
        match self {
            ParameterValue::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<Color> {
        match self {
            ParameterValue::Color(c) => Some(*c),
            _ => None,
        }
    }

    pub fn as_enum_index(&self) -> Option<u8> {
        match self {
            ParameterValue::Enum(i) => Some(*i),
            _ => None,
        }
    }

    /// Get the type name of this value
    pub fn type_name(&self) -> &'static str {
        match self {
            ParameterValue::Int(_) => "int",
            ParameterValue::Float(_) => "float",
            ParameterValue::Bool(_) => "bool",
            ParameterValue::String(_) => "string",
            ParameterValue::Color(_) => "color",
            ParameterValue::Enum(_) => "enum",
        }
    }
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    if items.len() == 1 {
        return write!(f, "{}", items[0]);
    }
    write!(f, "[")?;
    for (i, v) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", v)?;
    }
    write!(f, "]")
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterValue::Int(v) => write_list(f, v),
            ParameterValue::Float(v) => write_list(f, v),
            ParameterValue::Bool(v) => write_list(f, v),
            ParameterValue::String(v) => {
                let quoted: Vec<String> = v.iter().map(|s| format!("\"{}\"", s)).collect();
                write_list(f, &quoted)
            }
            ParameterValue::Color(c) => write!(f, "#{:02X}{:02X}{:02X}{:02X}", c.r, c.g, c.b, c.a),
            ParameterValue::Enum(i) => write!(f, "choice {}", i),
        }
    }
}

impl From<i32> for ParameterValue {
    fn from(i: i32) -> Self {
        ParameterValue::Int(vec![i])
    }
}

impl From<f32> for ParameterValue {
    fn from(f: f32) -> Self {
        ParameterValue::Float(vec![f])
    }
}

impl From<bool> for ParameterValue {
    fn from(b: bool) -> Self {
        ParameterValue::Bool(vec![b])
    }
}

impl From<&str> for ParameterValue {
    fn from(s: &str) -> Self {
        ParameterValue::String(vec![s.to_string()])
    }
}

impl From<String> for ParameterValue {
    fn from(s: String) -> Self {
        ParameterValue::String(vec![s])
    }
}

impl From<Color> for ParameterValue {
    fn from(c: Color) -> Self {
        ParameterValue::Color(c)
    }
}

impl From<Vec<f32>> for ParameterValue {
    fn from(v: Vec<f32>) -> Self {
        ParameterValue::Float(v)
    }
}

impl From<Vec<i32>> for ParameterValue {
    fn from(v: Vec<i32>) -> Self {
        ParameterValue::Int(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_rgb_defaults_alpha() {
        let color = Color::from_linear_rgb(&[1.0, 0.0, 0.5]);
        assert_eq!(color, Color::rgba(255, 0, 128, 255));
    }

    #[test]
    fn test_color_rgba_roundtrip_bytes() {
        let color = Color::rgba(12, 200, 99, 40);
        assert_eq!(Color::from_linear_rgba(&color.to_linear_rgba()), color);
        assert_eq!(
            Color::from_linear_rgb(&color.to_linear_rgb()),
            Color::rgba(12, 200, 99, 255)
        );
    }

    #[test]
    fn test_color_clamps() {
        let color = Color::from_linear_rgba(&[-1.0, 2.0, 0.0, 1.5]);
        assert_eq!(color, Color::rgba(0, 255, 0, 255));
    }

    #[test]
    fn test_value_kinds() {
        assert_eq!(ParameterValue::from(1).kind(), ParameterKind::Integer);
        assert_eq!(ParameterValue::from(1.0f32).kind(), ParameterKind::Float);
        assert_eq!(ParameterValue::from(true).kind(), ParameterKind::Boolean);
        assert_eq!(ParameterValue::from("a").kind(), ParameterKind::String);
        assert_eq!(ParameterValue::Enum(2).kind(), ParameterKind::Enumeration);
        assert_eq!(ParameterValue::from(Color::WHITE).kind(), ParameterKind::Color);
    }

    #[test]
    fn test_value_accessors() {
        let value = ParameterValue::Float(vec![1.0, 2.0, 3.0]);
        assert_eq!(value.arity(), 3);
        assert_eq!(value.as_floats(), Some(&[1.0, 2.0, 3.0][..]));
        assert_eq!(value.as_ints(), None);
        assert_eq!(ParameterValue::Enum(4).as_enum_index(), Some(4));
    }

    #[test]
    fn test_value_display() {
        assert_eq!(format!("{}", ParameterValue::from(2.5f32)), "2.5");
        assert_eq!(format!("{}", ParameterValue::Int(vec![1, 2])), "[1, 2]");
        assert_eq!(format!("{}", ParameterValue::from("x")), "\"x\"");
        assert_eq!(
            format!("{}", ParameterValue::Color(Color::rgba(255, 0, 16, 255))),
            "#FF0010FF"
        );
    }
}
