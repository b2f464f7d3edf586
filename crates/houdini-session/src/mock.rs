//! In-memory engine and host for tests and demos
//!
//! `MockEngine` implements the parameter, geometry and task queue traits over
//! a scripted asset template. Instantiation lays the template out the way the
//! real engine does (flat value arrays, a string table, choice lists) so the
//! component exercises the same index arithmetic it uses in production.
//!
//! Faults can be injected per call name, per string and per task.

use crate::error::{HapiError, HapiResult};
use crate::hapi::{
    AssetInfo, EngineString, GeometryApi, NodeInfo, ParameterApi, ParmChoiceInfo, ParmInfo, ParmType,
};
use crate::host::{AssetDefinition, AssetResolver, EditorHost};
use crate::task::{CookRequest, TaskInfo, TaskKind, TaskQueue, TaskState};
use houdini_core::{AssetId, AssetPath, ComponentId, CorrelationId, MeshData, NodeId, ParmId, RangeHints};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::ffi::CStr;
use std::rc::Rc;

// ============================================================================
// Asset templates
// ============================================================================

/// Value layout of a template parameter
#[derive(Debug, Clone, PartialEq)]
pub enum MockParmKind {
    Int(Vec<i32>),
    Float(Vec<f32>),
    Toggle(Vec<bool>),
    Color(Vec<f32>),
    String(Vec<String>),
    /// Integer menu; choices are (label, value)
    IntChoice { choices: Vec<(String, String)>, index: i32 },
    /// String menu; choices are (label, value)
    StringChoice { choices: Vec<(String, String)>, value: String },
    /// A type the component does not reflect
    Button,
}

/// One parameter of a template asset
#[derive(Debug, Clone, PartialEq)]
pub struct MockParm {
    pub name: String,
    pub label: String,
    pub kind: MockParmKind,
    pub invisible: bool,
    pub range: RangeHints,
}

/// Blueprint for assets created by `MockEngine`
#[derive(Debug, Clone, PartialEq)]
pub struct MockAsset {
    pub name: String,
    pub parms: Vec<MockParm>,
    pub mesh: MeshData,
}

fn choice_pairs(choices: &[(&str, &str)]) -> Vec<(String, String)> {
    choices
        .iter()
        .map(|(label, value)| (label.to_string(), value.to_string()))
        .collect()
}

impl MockAsset {
    /// Create an empty template producing a two-triangle mesh
    pub fn new(name: impl Into<String>) -> Self {
        let mesh = MeshData::new(vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ]);
        Self {
            name: name.into(),
            parms: Vec::new(),
            mesh,
        }
    }

    fn push(mut self, name: &str, label: &str, kind: MockParmKind) -> Self {
        self.parms.push(MockParm {
            name: name.to_string(),
            label: label.to_string(),
            kind,
            invisible: false,
            range: RangeHints::default(),
        });
        self
    }

    pub fn int(self, name: &str, label: &str, values: &[i32]) -> Self {
        self.push(name, label, MockParmKind::Int(values.to_vec()))
    }

    pub fn float(self, name: &str, label: &str, values: &[f32]) -> Self {
        self.push(name, label, MockParmKind::Float(values.to_vec()))
    }

    pub fn toggle(self, name: &str, label: &str, values: &[bool]) -> Self {
        self.push(name, label, MockParmKind::Toggle(values.to_vec()))
    }

    pub fn color(self, name: &str, label: &str, values: &[f32]) -> Self {
        self.push(name, label, MockParmKind::Color(values.to_vec()))
    }

    pub fn string(self, name: &str, label: &str, values: &[&str]) -> Self {
        let values = values.iter().map(|s| s.to_string()).collect();
        self.push(name, label, MockParmKind::String(values))
    }

    pub fn int_choice(self, name: &str, label: &str, choices: &[(&str, &str)], index: i32) -> Self {
        let choices = choice_pairs(choices);
        self.push(name, label, MockParmKind::IntChoice { choices, index })
    }

    pub fn string_choice(self, name: &str, label: &str, choices: &[(&str, &str)], value: &str) -> Self {
        let choices = choice_pairs(choices);
        let value = value.to_string();
        self.push(name, label, MockParmKind::StringChoice { choices, value })
    }

    pub fn button(self, name: &str, label: &str) -> Self {
        self.push(name, label, MockParmKind::Button)
    }

    /// Hide the most recently added parameter
    pub fn invisible(mut self) -> Self {
        if let Some(parm) = self.parms.last_mut() {
            parm.invisible = true;
        }
        self
    }

    /// Attach range hints to the most recently added parameter
    pub fn range(mut self, range: RangeHints) -> Self {
        if let Some(parm) = self.parms.last_mut() {
            parm.range = range;
        }
        self
    }
}

// ============================================================================
// Engine
// ============================================================================

/// A recorded parameter write
#[derive(Debug, Clone, PartialEq)]
pub enum SetCall {
    Int { start: i32, values: Vec<i32> },
    Float { start: i32, values: Vec<f32> },
    String { parm: ParmId, index: i32, value: String },
}

#[derive(Debug, Clone)]
struct MockNode {
    asset: AssetInfo,
    node: NodeInfo,
    parms: Vec<ParmInfo>,
    ints: Vec<i32>,
    floats: Vec<f32>,
    strings: Vec<EngineString>,
    choices: Vec<ParmChoiceInfo>,
    mesh: MeshData,
}

#[derive(Debug, Clone)]
struct MockTask {
    request: CookRequest,
    info: TaskInfo,
    polls_left: u32,
    outcome: TaskState,
}

#[derive(Debug, Default)]
struct EngineState {
    strings: Vec<String>,
    nodes: HashMap<i32, MockNode>,
    tasks: HashMap<CorrelationId, MockTask>,
    template: Option<MockAsset>,
    next_asset_id: i32,
    processing_polls: u32,
    scripted_outcomes: VecDeque<TaskState>,
    failing_strings: HashSet<String>,
    failing_calls: HashSet<&'static str>,
    geometry_fails: bool,
    submitted: Vec<CookRequest>,
    set_calls: Vec<SetCall>,
}

impl EngineState {
    fn intern(&mut self, value: &str) -> EngineString {
        self.strings.push(value.to_string());
        EngineString((self.strings.len() - 1) as i32)
    }

    fn node(&self, node: NodeId) -> HapiResult<&MockNode> {
        self.nodes
            .values()
            .find(|n| n.node.id == node)
            .ok_or(HapiError::InvalidHandle(node.0))
    }

    fn node_mut(&mut self, node: NodeId) -> HapiResult<&mut MockNode> {
        self.nodes
            .values_mut()
            .find(|n| n.node.id == node)
            .ok_or(HapiError::InvalidHandle(node.0))
    }

    fn check(&self, call: &'static str) -> HapiResult<()> {
        if self.failing_calls.contains(call) {
            Err(HapiError::Failure)
        } else {
            Ok(())
        }
    }

    fn string(&self, handle: EngineString) -> HapiResult<&str> {
        let value = usize::try_from(handle.0)
            .ok()
            .and_then(|i| self.strings.get(i))
            .ok_or(HapiError::InvalidHandle(handle.0))?;
        if self.failing_strings.contains(value) {
            return Err(HapiError::Failure);
        }
        Ok(value)
    }

    /// Lay out a template as an instantiated node
    fn instantiate(&mut self, template: &MockAsset) -> AssetId {
        let asset_id = AssetId::new(self.next_asset_id);
        self.next_asset_id += 1;
        let node_id = NodeId(asset_id.raw() + 1000);

        let mut parms = Vec::new();
        let mut ints = Vec::new();
        let mut floats = Vec::new();
        let mut strings = Vec::new();
        let mut choices = Vec::new();

        for (index, parm) in template.parms.iter().enumerate() {
            let name_sh = self.intern(&parm.name);
            let label_sh = self.intern(&parm.label);
            let mut info = ParmInfo {
                id: ParmId(index as i32),
                parm_type: ParmType::Int,
                size: 1,
                choice_count: 0,
                choice_index: -1,
                int_values_index: ints.len() as i32,
                float_values_index: floats.len() as i32,
                string_values_index: strings.len() as i32,
                name_sh,
                label_sh,
                invisible: parm.invisible,
                min: parm.range.min,
                max: parm.range.max,
                ui_min: parm.range.ui_min,
                ui_max: parm.range.ui_max,
            };
            let mut add_choices = |state: &mut Self, list: &[(String, String)], info: &mut ParmInfo| {
                info.choice_index = choices.len() as i32;
                info.choice_count = list.len() as i32;
                for (label, value) in list {
                    choices.push(ParmChoiceInfo {
                        parent_parm_id: info.id,
                        label_sh: state.intern(label),
                        value_sh: state.intern(value),
                    });
                }
            };
            match &parm.kind {
                MockParmKind::Int(values) => {
                    info.size = values.len() as i32;
                    ints.extend_from_slice(values);
                }
                MockParmKind::Float(values) => {
                    info.parm_type = ParmType::Float;
                    info.size = values.len() as i32;
                    floats.extend_from_slice(values);
                }
                MockParmKind::Toggle(values) => {
                    info.parm_type = ParmType::Toggle;
                    info.size = values.len() as i32;
                    ints.extend(values.iter().map(|&b| i32::from(b)));
                }
                MockParmKind::Color(values) => {
                    info.parm_type = ParmType::Color;
                    info.size = values.len() as i32;
                    floats.extend_from_slice(values);
                }
                MockParmKind::String(values) => {
                    info.parm_type = ParmType::String;
                    info.size = values.len() as i32;
                    for value in values {
                        let handle = self.intern(value);
                        strings.push(handle);
                    }
                }
                MockParmKind::IntChoice { choices: list, index } => {
                    add_choices(self, list, &mut info);
                    ints.push(*index);
                }
                MockParmKind::StringChoice { choices: list, value } => {
                    info.parm_type = ParmType::String;
                    add_choices(self, list, &mut info);
                    let handle = self.intern(value);
                    strings.push(handle);
                }
                MockParmKind::Button => {
                    info.parm_type = ParmType::Button;
                    info.size = 0;
                }
            }
            parms.push(info);
        }

        let name_sh = self.intern(&template.name);
        let node = MockNode {
            asset: AssetInfo {
                id: asset_id,
                node_id,
                name_sh,
            },
            node: NodeInfo {
                id: node_id,
                parm_count: parms.len() as i32,
                parm_int_value_count: ints.len() as i32,
                parm_float_value_count: floats.len() as i32,
                parm_string_value_count: strings.len() as i32,
            },
            parms,
            ints,
            floats,
            strings,
            choices,
            mesh: template.mesh.clone(),
        };
        self.nodes.insert(asset_id.raw(), node);
        asset_id
    }

    fn finish(&mut self, id: CorrelationId) {
        let Some(task) = self.tasks.get(&id).cloned() else {
            return;
        };
        let mut info = task.info.clone();
        info.state = task.outcome;
        info.status_text = format!("{:?}", task.outcome);

        let instantiates = matches!(
            task.request.kind,
            TaskKind::Instantiate | TaskKind::InstantiateWithoutCooking
        );
        if instantiates && !task.outcome.is_error() {
            if let Some(template) = self.template.clone() {
                info.asset_id = self.instantiate(&template);
            }
        } else if let Some(asset_id) = task.request.asset_id {
            info.asset_id = asset_id;
        }

        if let Some(task) = self.tasks.get_mut(&id) {
            task.info = info;
        }
    }

    fn slice<T: Clone>(values: &[T], start: i32, length: i32) -> HapiResult<Vec<T>> {
        let start = usize::try_from(start).map_err(|_| HapiError::InvalidArgument("start".into()))?;
        let length = usize::try_from(length).map_err(|_| HapiError::InvalidArgument("length".into()))?;
        values
            .get(start..start + length)
            .map(<[T]>::to_vec)
            .ok_or_else(|| HapiError::InvalidArgument(format!("range {}..{}", start, start + length)))
    }

    fn write<T: Copy>(target: &mut [T], values: &[T], start: i32, length: i32) -> HapiResult<()> {
        let start = usize::try_from(start).map_err(|_| HapiError::InvalidArgument("start".into()))?;
        let length = usize::try_from(length).map_err(|_| HapiError::InvalidArgument("length".into()))?;
        if values.len() < length {
            return Err(HapiError::InvalidArgument("values shorter than length".into()));
        }
        let dest = target
            .get_mut(start..start + length)
            .ok_or_else(|| HapiError::InvalidArgument(format!("range {}..{}", start, start + length)))?;
        dest.copy_from_slice(&values[..length]);
        Ok(())
    }
}

/// Scriptable in-memory engine session
#[derive(Debug)]
pub struct MockEngine {
    state: RefCell<EngineState>,
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEngine {
    /// Create an engine with no template; instantiation yields no asset
    pub fn new() -> Self {
        Self {
            state: RefCell::new(EngineState::default()),
        }
    }

    /// Create an engine instantiating `template`
    pub fn with_asset(template: MockAsset) -> Self {
        let engine = Self::new();
        engine.set_template(template);
        engine
    }

    pub fn set_template(&self, template: MockAsset) {
        self.state.borrow_mut().template = Some(template);
    }

    /// Handle given to the next instantiated asset
    pub fn set_next_asset_id(&self, id: i32) {
        self.state.borrow_mut().next_asset_id = id;
    }

    /// Number of polls reporting `Processing` before a task finishes
    pub fn set_processing_polls(&self, polls: u32) {
        self.state.borrow_mut().processing_polls = polls;
    }

    /// Force the next submitted task to end in `state`
    pub fn script_next_outcome(&self, state: TaskState) {
        self.state.borrow_mut().scripted_outcomes.push_back(state);
    }

    /// Make every lookup of a string with this content fail
    pub fn fail_string(&self, value: &str) {
        self.state.borrow_mut().failing_strings.insert(value.to_string());
    }

    /// Make every call of the named API function fail
    pub fn fail_call(&self, call: &'static str) {
        self.state.borrow_mut().failing_calls.insert(call);
    }

    pub fn fail_geometry(&self, fails: bool) {
        self.state.borrow_mut().geometry_fails = fails;
    }

    /// Instantiate the template immediately, bypassing the task queue
    pub fn instantiate_now(&self) -> Option<AssetId> {
        let mut state = self.state.borrow_mut();
        let template = state.template.clone()?;
        Some(state.instantiate(&template))
    }

    pub fn asset_exists(&self, asset: AssetId) -> bool {
        self.state.borrow().nodes.contains_key(&asset.raw())
    }

    /// Every request submitted so far, in order
    pub fn submitted(&self) -> Vec<CookRequest> {
        self.state.borrow().submitted.clone()
    }

    pub fn set_calls(&self) -> Vec<SetCall> {
        self.state.borrow().set_calls.clone()
    }

    pub fn clear_set_calls(&self) {
        self.state.borrow_mut().set_calls.clear();
    }

    /// Tasks submitted and not yet removed
    pub fn outstanding_tasks(&self) -> usize {
        self.state.borrow().tasks.len()
    }

    /// Tasks submitted by `component` and not yet removed
    pub fn outstanding_for(&self, component: ComponentId) -> usize {
        self.state
            .borrow()
            .tasks
            .values()
            .filter(|t| t.request.component == Some(component))
            .count()
    }

    fn parm_of<'a>(node: &'a MockNode, state: &EngineState, name: &str) -> Option<&'a ParmInfo> {
        node.parms
            .iter()
            .find(|p| state.strings.get(p.name_sh.0 as usize).map(String::as_str) == Some(name))
    }

    /// Current integer values of a parameter (toggles and int menus included)
    pub fn int_values(&self, asset: AssetId, name: &str) -> Option<Vec<i32>> {
        let state = self.state.borrow();
        let node = state.nodes.get(&asset.raw())?;
        let parm = Self::parm_of(node, &state, name)?;
        let start = parm.int_values_index as usize;
        let len = parm.size.max(1) as usize;
        node.ints.get(start..start + len).map(<[i32]>::to_vec)
    }

    /// Current float values of a parameter (colors included)
    pub fn float_values(&self, asset: AssetId, name: &str) -> Option<Vec<f32>> {
        let state = self.state.borrow();
        let node = state.nodes.get(&asset.raw())?;
        let parm = Self::parm_of(node, &state, name)?;
        let start = parm.float_values_index as usize;
        node.floats
            .get(start..start + parm.size as usize)
            .map(<[f32]>::to_vec)
    }

    /// Current string values of a parameter (string menus included)
    pub fn string_values(&self, asset: AssetId, name: &str) -> Option<Vec<String>> {
        let state = self.state.borrow();
        let node = state.nodes.get(&asset.raw())?;
        let parm = Self::parm_of(node, &state, name)?;
        let start = parm.string_values_index as usize;
        let len = parm.size.max(1) as usize;
        node.strings
            .get(start..start + len)?
            .iter()
            .map(|h| state.strings.get(h.0 as usize).cloned())
            .collect()
    }
}

impl ParameterApi for MockEngine {
    fn get_asset_info(&self, asset: AssetId) -> HapiResult<AssetInfo> {
        let state = self.state.borrow();
        state.check("get_asset_info")?;
        state
            .nodes
            .get(&asset.raw())
            .map(|n| n.asset.clone())
            .ok_or(HapiError::InvalidHandle(asset.raw()))
    }

    fn get_node_info(&self, node: NodeId) -> HapiResult<NodeInfo> {
        let state = self.state.borrow();
        state.check("get_node_info")?;
        Ok(state.node(node)?.node.clone())
    }

    fn get_parameters(&self, node: NodeId, start: i32, length: i32) -> HapiResult<Vec<ParmInfo>> {
        let state = self.state.borrow();
        state.check("get_parameters")?;
        EngineState::slice(&state.node(node)?.parms, start, length)
    }

    fn get_parm_int_values(&self, node: NodeId, start: i32, length: i32) -> HapiResult<Vec<i32>> {
        let state = self.state.borrow();
        state.check("get_parm_int_values")?;
        EngineState::slice(&state.node(node)?.ints, start, length)
    }

    fn get_parm_float_values(&self, node: NodeId, start: i32, length: i32) -> HapiResult<Vec<f32>> {
        let state = self.state.borrow();
        state.check("get_parm_float_values")?;
        EngineState::slice(&state.node(node)?.floats, start, length)
    }

    fn get_parm_string_values(
        &self,
        node: NodeId,
        _evaluate: bool,
        start: i32,
        length: i32,
    ) -> HapiResult<Vec<EngineString>> {
        let state = self.state.borrow();
        state.check("get_parm_string_values")?;
        EngineState::slice(&state.node(node)?.strings, start, length)
    }

    fn set_parm_int_values(&self, node: NodeId, values: &[i32], start: i32, length: i32) -> HapiResult<()> {
        let mut state = self.state.borrow_mut();
        state.check("set_parm_int_values")?;
        EngineState::write(&mut state.node_mut(node)?.ints, values, start, length)?;
        state.set_calls.push(SetCall::Int {
            start,
            values: values.to_vec(),
        });
        Ok(())
    }

    fn set_parm_float_values(&self, node: NodeId, values: &[f32], start: i32, length: i32) -> HapiResult<()> {
        let mut state = self.state.borrow_mut();
        state.check("set_parm_float_values")?;
        EngineState::write(&mut state.node_mut(node)?.floats, values, start, length)?;
        state.set_calls.push(SetCall::Float {
            start,
            values: values.to_vec(),
        });
        Ok(())
    }

    fn set_parm_string_value(&self, node: NodeId, value: &CStr, parm: ParmId, index: i32) -> HapiResult<()> {
        let mut state = self.state.borrow_mut();
        state.check("set_parm_string_value")?;
        let text = value
            .to_str()
            .map_err(|e| HapiError::InvalidArgument(e.to_string()))?
            .to_string();
        let handle = state.intern(&text);
        let target = state.node_mut(node)?;
        let info = target
            .parms
            .iter()
            .find(|p| p.id == parm)
            .ok_or(HapiError::InvalidHandle(parm.0))?;
        if index < 0 || index >= info.size.max(1) {
            return Err(HapiError::ParmSetFailed(parm.0));
        }
        let slot = (info.string_values_index + index) as usize;
        let entry = target
            .strings
            .get_mut(slot)
            .ok_or(HapiError::ParmSetFailed(parm.0))?;
        *entry = handle;
        state.set_calls.push(SetCall::String {
            parm,
            index,
            value: text,
        });
        Ok(())
    }

    fn get_parm_choice_lists(&self, node: NodeId, start: i32, length: i32) -> HapiResult<Vec<ParmChoiceInfo>> {
        let state = self.state.borrow();
        state.check("get_parm_choice_lists")?;
        EngineState::slice(&state.node(node)?.choices, start, length)
    }

    fn get_parm_id_from_name(&self, node: NodeId, name: &CStr) -> HapiResult<ParmId> {
        let state = self.state.borrow();
        state.check("get_parm_id_from_name")?;
        let name = name.to_str().map_err(|e| HapiError::InvalidArgument(e.to_string()))?;
        let node = state.node(node)?;
        Ok(MockEngine::parm_of(node, &state, name)
            .map(|p| p.id)
            .unwrap_or(ParmId::INVALID))
    }

    fn get_string_buf_length(&self, handle: EngineString) -> HapiResult<usize> {
        let state = self.state.borrow();
        state.check("get_string_buf_length")?;
        Ok(state.string(handle)?.len() + 1)
    }

    fn get_string(&self, handle: EngineString, length: usize) -> HapiResult<Vec<u8>> {
        let state = self.state.borrow();
        state.check("get_string")?;
        let mut bytes = state.string(handle)?.as_bytes().to_vec();
        bytes.push(0);
        bytes.resize(length, 0);
        Ok(bytes)
    }
}

impl GeometryApi for MockEngine {
    fn get_asset_geometry(&self, asset: AssetId) -> HapiResult<MeshData> {
        let state = self.state.borrow();
        if state.geometry_fails {
            return Err(HapiError::CantLoadGeo(asset.raw()));
        }
        state
            .nodes
            .get(&asset.raw())
            .map(|n| n.mesh.clone())
            .ok_or(HapiError::InvalidHandle(asset.raw()))
    }
}

impl TaskQueue for MockEngine {
    fn submit(&self, request: CookRequest) {
        let mut state = self.state.borrow_mut();
        state.submitted.push(request.clone());

        if request.kind == TaskKind::Delete {
            if let Some(asset) = request.asset_id {
                state.nodes.remove(&asset.raw());
            }
            return;
        }

        let outcome = state.scripted_outcomes.pop_front().unwrap_or(match request.kind {
            TaskKind::Instantiate => TaskState::FinishedInstantiation,
            TaskKind::InstantiateWithoutCooking => TaskState::FinishedInstantiationWithoutCooking,
            _ => TaskState::FinishedCooking,
        });
        let polls_left = state.processing_polls;
        let id = request.correlation_id;
        state.tasks.insert(
            id,
            MockTask {
                request,
                info: TaskInfo {
                    state: TaskState::None,
                    status_text: String::new(),
                    asset_id: AssetId::INVALID,
                },
                polls_left,
                outcome,
            },
        );
    }

    fn poll(&self, id: CorrelationId) -> Option<TaskInfo> {
        let mut state = self.state.borrow_mut();
        let task = state.tasks.get_mut(&id)?;
        if task.info.state.is_terminal() {
            return Some(task.info.clone());
        }
        if task.polls_left > 0 {
            task.polls_left -= 1;
            task.info.state = TaskState::Processing;
            task.info.status_text = format!("{} in progress", task.request.kind);
            return Some(task.info.clone());
        }
        state.finish(id);
        state.tasks.get(&id).map(|t| t.info.clone())
    }

    fn remove(&self, id: CorrelationId) {
        self.state.borrow_mut().tasks.remove(&id);
    }
}

// ============================================================================
// Host
// ============================================================================

/// A recorded notification update
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationEvent {
    Shown(ComponentId, String),
    Updated(ComponentId, String),
    Expired(ComponentId, String),
}

#[derive(Debug, Default)]
struct HostState {
    labels: HashMap<ComponentId, String>,
    notifications: Vec<NotificationEvent>,
    render_releases: Vec<ComponentId>,
    render_creates: Vec<(ComponentId, usize)>,
    render_updates: Vec<(ComponentId, usize)>,
    packages: HashSet<String>,
    assets: HashMap<AssetPath, Rc<AssetDefinition>>,
}

/// In-memory editor host and asset store
#[derive(Debug, Default)]
pub struct MockHost {
    state: RefCell<HostState>,
}

impl MockHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an asset (and its package) and return the shared definition
    pub fn add_asset(&self, path: AssetPath) -> Rc<AssetDefinition> {
        let asset = Rc::new(AssetDefinition::new(path.clone()));
        let mut state = self.state.borrow_mut();
        state.packages.insert(path.package.clone());
        state.assets.insert(path, Rc::clone(&asset));
        asset
    }

    pub fn add_package(&self, package: &str) {
        self.state.borrow_mut().packages.insert(package.to_string());
    }

    pub fn set_label(&self, component: ComponentId, label: &str) {
        self.state.borrow_mut().labels.insert(component, label.to_string());
    }

    pub fn label(&self, component: ComponentId) -> Option<String> {
        self.state.borrow().labels.get(&component).cloned()
    }

    pub fn notifications(&self) -> Vec<NotificationEvent> {
        self.state.borrow().notifications.clone()
    }

    pub fn render_releases(&self) -> Vec<ComponentId> {
        self.state.borrow().render_releases.clone()
    }

    /// Render resource creations as (component, triangle count)
    pub fn render_creates(&self) -> Vec<(ComponentId, usize)> {
        self.state.borrow().render_creates.clone()
    }

    /// Rendering updates as (component, triangle count)
    pub fn render_updates(&self) -> Vec<(ComponentId, usize)> {
        self.state.borrow().render_updates.clone()
    }
}

impl EditorHost for MockHost {
    fn actor_label(&self, component: ComponentId) -> String {
        self.state
            .borrow()
            .labels
            .get(&component)
            .cloned()
            .unwrap_or_else(|| format!("Actor{}", component.raw()))
    }

    fn set_actor_label_unique(&self, component: ComponentId, label: &str) {
        let mut state = self.state.borrow_mut();
        let taken = |candidate: &str| {
            state
                .labels
                .iter()
                .any(|(owner, l)| *owner != component && l == candidate)
        };
        let mut unique = label.to_string();
        let mut suffix = 1;
        while taken(&unique) {
            suffix += 1;
            unique = format!("{}{}", label, suffix);
        }
        state.labels.insert(component, unique);
    }

    fn show_notification(&self, component: ComponentId, text: &str) {
        self.state
            .borrow_mut()
            .notifications
            .push(NotificationEvent::Shown(component, text.to_string()));
    }

    fn update_notification(&self, component: ComponentId, text: &str) {
        self.state
            .borrow_mut()
            .notifications
            .push(NotificationEvent::Updated(component, text.to_string()));
    }

    fn expire_notification(&self, component: ComponentId, text: &str) {
        self.state
            .borrow_mut()
            .notifications
            .push(NotificationEvent::Expired(component, text.to_string()));
    }

    fn release_render_resources(&self, component: ComponentId) {
        self.state.borrow_mut().render_releases.push(component);
    }

    fn create_render_resources(&self, component: ComponentId, mesh: &MeshData) {
        self.state
            .borrow_mut()
            .render_creates
            .push((component, mesh.triangle_count()));
    }

    fn update_rendering(&self, component: ComponentId, mesh: &MeshData) {
        self.state
            .borrow_mut()
            .render_updates
            .push((component, mesh.triangle_count()));
    }
}

impl AssetResolver for MockHost {
    fn find_or_load_package(&self, package: &str) -> bool {
        self.state.borrow().packages.contains(package)
    }

    fn find_asset(&self, path: &AssetPath) -> Option<Rc<AssetDefinition>> {
        self.state.borrow().assets.get(path).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hapi::fetch_string;
    use std::ffi::CString;

    fn template() -> MockAsset {
        MockAsset::new("rock")
            .float("size", "Size", &[1.0])
            .int("count", "", &[1, 2, 3])
            .string_choice("mode", "Mode", &[("A", "a"), ("B", "b")], "b")
            .string("path", "Path", &["x"])
    }

    #[test]
    fn test_instantiate_layout() {
        let engine = MockEngine::with_asset(template());
        engine.set_next_asset_id(7);
        let asset = engine.instantiate_now().unwrap();
        assert_eq!(asset, AssetId::new(7));

        let info = engine.get_asset_info(asset).unwrap();
        assert_eq!(fetch_string(&engine, info.name_sh).unwrap(), "rock");
        let node = engine.get_node_info(info.node_id).unwrap();
        assert_eq!(node.parm_count, 4);
        assert_eq!(node.parm_int_value_count, 3);
        assert_eq!(node.parm_float_value_count, 1);
        assert_eq!(node.parm_string_value_count, 2);

        let parms = engine.get_parameters(info.node_id, 0, node.parm_count).unwrap();
        assert_eq!(parms[2].choice_count, 2);
        assert_eq!(parms[3].string_values_index, 1);
        assert_eq!(engine.string_values(asset, "mode").unwrap(), vec!["b".to_string()]);
    }

    #[test]
    fn test_set_values_recorded() {
        let engine = MockEngine::with_asset(template());
        let asset = engine.instantiate_now().unwrap();
        let node = engine.get_asset_info(asset).unwrap().node_id;

        engine.set_parm_float_values(node, &[2.0], 0, 1).unwrap();
        let name = CString::new("path").unwrap();
        let parm = engine.get_parm_id_from_name(node, &name).unwrap();
        let value = CString::new("y").unwrap();
        engine.set_parm_string_value(node, &value, parm, 0).unwrap();

        assert_eq!(engine.float_values(asset, "size").unwrap(), vec![2.0]);
        assert_eq!(engine.string_values(asset, "path").unwrap(), vec!["y".to_string()]);
        assert_eq!(engine.set_calls().len(), 2);

        let missing = CString::new("nope").unwrap();
        assert_eq!(engine.get_parm_id_from_name(node, &missing).unwrap(), ParmId::INVALID);
    }

    #[test]
    fn test_task_lifecycle() {
        let engine = MockEngine::with_asset(template());
        engine.set_processing_polls(1);
        let id = CorrelationId(1);
        engine.submit(CookRequest::new(TaskKind::Instantiate, id));

        assert_eq!(engine.poll(id).unwrap().state, TaskState::Processing);
        let done = engine.poll(id).unwrap();
        assert_eq!(done.state, TaskState::FinishedInstantiation);
        assert!(done.asset_id.is_valid());
        assert!(engine.asset_exists(done.asset_id));

        engine.remove(id);
        assert!(engine.poll(id).is_none());
        assert_eq!(engine.outstanding_tasks(), 0);
    }

    #[test]
    fn test_scripted_failure() {
        let engine = MockEngine::with_asset(template());
        engine.script_next_outcome(TaskState::FinishedInstantiationWithErrors);
        let id = CorrelationId(2);
        engine.submit(CookRequest::new(TaskKind::Instantiate, id));
        let info = engine.poll(id).unwrap();
        assert!(info.state.is_error());
        assert!(!info.asset_id.is_valid());
    }

    #[test]
    fn test_failing_string() {
        let engine = MockEngine::with_asset(template());
        engine.fail_string("Size");
        let asset = engine.instantiate_now().unwrap();
        let node = engine.get_asset_info(asset).unwrap().node_id;
        let parms = engine.get_parameters(node, 0, 1).unwrap();
        assert!(engine.get_string_buf_length(parms[0].label_sh).is_err());
        assert!(engine.get_string_buf_length(parms[0].name_sh).is_ok());
    }

    #[test]
    fn test_unique_labels() {
        let host = MockHost::new();
        host.set_actor_label_unique(ComponentId::new(1), "rock");
        host.set_actor_label_unique(ComponentId::new(2), "rock");
        assert_eq!(host.label(ComponentId::new(1)).unwrap(), "rock");
        assert_eq!(host.label(ComponentId::new(2)).unwrap(), "rock2");
    }
}
