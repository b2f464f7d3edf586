//! String-keyed metadata attached to synthesized fields and enum entries

use indexmap::IndexMap;

/// Ordered metadata map (insertion order is kept for deterministic archives)
pub type MetaData = IndexMap<String, String>;

/// Category tag; only fields in the reflector's category are tracked
pub const CATEGORY: &str = "Category";
/// Raw engine parameter name backing a field
pub const PARM_NAME: &str = "HoudiniParmName";
/// Label shown by property editors
pub const DISPLAY_NAME: &str = "DisplayName";
pub const UI_MIN: &str = "UIMin";
pub const UI_MAX: &str = "UIMax";
pub const CLAMP_MIN: &str = "ClampMin";
pub const CLAMP_MAX: &str = "ClampMax";
/// Present on enumerations backed by a string parameter
pub const STRING_CHOICE_LIST: &str = "HoudiniStringChoiceList";
/// Present on three-component colors
pub const HIDE_ALPHA_CHANNEL: &str = "HideAlphaChannel";
/// Present on fields edited since they were last pushed
pub const PROPERTY_CHANGED: &str = "HoudiniPropertyChanged";
/// Raw engine value of an enum entry
pub const HOUDINI_NAME: &str = "HoudiniName";

/// Replace every character that is not valid in an object name with `_`
pub fn sanitize_object_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// Format a float for metadata; whole numbers keep a `.0` suffix
pub fn format_float(value: f32) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}
