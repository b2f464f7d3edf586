//! Parameter and geometry API of the external procedural engine
//!
//! These traits mirror the engine's C API at the granularity the component
//! needs. Values come back in flat per-node arrays (one for ints, one for
//! floats, one for string handles); each `ParmInfo` records where its own
//! values start in those arrays. Text is exchanged as engine-native byte
//! buffers addressed by `EngineString` handles.

use crate::error::HapiResult;
use houdini_core::{AssetId, MeshData, NodeId, ParmId};
use serde::{Deserialize, Serialize};
use std::ffi::CStr;

/// Handle of a string in the engine's string table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EngineString(pub i32);

/// Asset-level information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetInfo {
    pub id: AssetId,
    /// Node holding the asset's parameters
    pub node_id: NodeId,
    pub name_sh: EngineString,
}

/// Node-level counts needed to size bulk parameter fetches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeInfo {
    pub id: NodeId,
    pub parm_count: i32,
    pub parm_int_value_count: i32,
    pub parm_float_value_count: i32,
    pub parm_string_value_count: i32,
}

/// Engine-side parameter type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParmType {
    Int,
    MultiParmList,
    Toggle,
    Button,
    Float,
    Color,
    String,
    PathFile,
    PathGeo,
    PathImage,
    Node,
    FolderList,
    Folder,
    Label,
    Separator,
}

/// Description of one engine parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParmInfo {
    pub id: ParmId,
    pub parm_type: ParmType,
    /// Number of components
    pub size: i32,
    /// Number of choice entries; zero for plain parameters
    pub choice_count: i32,
    /// Start of this parameter's entries in the node's choice list
    pub choice_index: i32,
    pub int_values_index: i32,
    pub float_values_index: i32,
    pub string_values_index: i32,
    pub name_sh: EngineString,
    pub label_sh: EngineString,
    pub invisible: bool,
    pub min: Option<f32>,
    pub max: Option<f32>,
    pub ui_min: Option<f32>,
    pub ui_max: Option<f32>,
}

/// One entry of a parameter's choice list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParmChoiceInfo {
    pub parent_parm_id: ParmId,
    pub label_sh: EngineString,
    pub value_sh: EngineString,
}

/// Parameter queries and updates
pub trait ParameterApi {
    fn get_asset_info(&self, asset: AssetId) -> HapiResult<AssetInfo>;

    fn get_node_info(&self, node: NodeId) -> HapiResult<NodeInfo>;

    /// Fetch `length` parameter infos starting at index `start`
    fn get_parameters(&self, node: NodeId, start: i32, length: i32) -> HapiResult<Vec<ParmInfo>>;

    fn get_parm_int_values(&self, node: NodeId, start: i32, length: i32) -> HapiResult<Vec<i32>>;

    fn get_parm_float_values(&self, node: NodeId, start: i32, length: i32) -> HapiResult<Vec<f32>>;

    /// Fetch string handles; `evaluate` expands expressions instead of
    /// returning the raw text
    fn get_parm_string_values(
        &self,
        node: NodeId,
        evaluate: bool,
        start: i32,
        length: i32,
    ) -> HapiResult<Vec<EngineString>>;

    fn set_parm_int_values(&self, node: NodeId, values: &[i32], start: i32, length: i32) -> HapiResult<()>;

    fn set_parm_float_values(&self, node: NodeId, values: &[f32], start: i32, length: i32) -> HapiResult<()>;

    /// Set component `index` of a string parameter
    fn set_parm_string_value(&self, node: NodeId, value: &CStr, parm: ParmId, index: i32) -> HapiResult<()>;

    fn get_parm_choice_lists(&self, node: NodeId, start: i32, length: i32) -> HapiResult<Vec<ParmChoiceInfo>>;

    /// Resolve a parameter id by name; unknown names yield `ParmId::INVALID`
    fn get_parm_id_from_name(&self, node: NodeId, name: &CStr) -> HapiResult<ParmId>;

    /// Buffer length needed for a string, including the terminator
    fn get_string_buf_length(&self, handle: EngineString) -> HapiResult<usize>;

    /// Copy a string into a buffer of `length` bytes
    fn get_string(&self, handle: EngineString, length: usize) -> HapiResult<Vec<u8>>;
}

/// Geometry extraction for a cooked asset
pub trait GeometryApi {
    fn get_asset_geometry(&self, asset: AssetId) -> HapiResult<MeshData>;
}

/// Resolve an engine string handle to a Rust string
///
/// A zero length yields an empty string without fetching.
pub fn fetch_string(api: &(impl ParameterApi + ?Sized), handle: EngineString) -> HapiResult<String> {
    let length = api.get_string_buf_length(handle)?;
    if length == 0 {
        return Ok(String::new());
    }
    let bytes = api.get_string(handle, length)?;
    houdini_core::encoding::decode_engine_string(&bytes)
        .map_err(|e| crate::error::HapiError::InvalidArgument(e.to_string()))
}
