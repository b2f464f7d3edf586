//! The asset component: one procedural asset instance placed in a world
//!
//! The component owns the generated schema and scratch buffer backing its
//! editable fields, tracks user edits, and drives the engine's asynchronous
//! instantiate/cook/delete tasks from a recurring poll tick.
//!
//! Only one request is outstanding per component. Edits made while a
//! request is in flight stay in the change set and are pushed, followed by
//! a cook, on the first tick after that request finishes.

use crate::config::ComponentConfig;
use crate::error::{Error, Result};
use crate::lifecycle::{ComponentState, CookState, PollTimer, TickOutcome, TickReport};
use crate::marshal;
use crate::reflector::reflect;
use crate::schema::{next_schema_name, BaseSchema, GeneratedSchema, RestoredField};
use crate::tracker::{ChangeSet, ChangeType, EditEvent};
use houdini_core::{
    AssetId, ComponentId, CorrelationId, FieldId, MeshData, ParameterKind, ParameterValue, ScratchBuffer,
};
use houdini_session::{
    fetch_string, AssetDefinition, CookRequest, EngineSession, Host, ObjectRef, ReferenceCollector, TaskKind,
    TaskState,
};
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Everything a serializer hands back to rebuild a saved component
#[derive(Debug, Clone)]
pub struct RestoredComponent {
    pub state: ComponentState,
    pub asset: Option<Rc<AssetDefinition>>,
    pub fields: Vec<RestoredField>,
    pub scratch: Vec<u8>,
    pub strings: Vec<String>,
    pub mesh: Option<MeshData>,
}

/// A procedural asset instance bound to the engine and the host editor
pub struct AssetComponent {
    id: ComponentId,
    config: ComponentConfig,
    engine: Rc<dyn EngineSession>,
    host: Rc<dyn Host>,

    asset: Option<Rc<AssetDefinition>>,
    asset_id: AssetId,
    correlation: Option<CorrelationId>,
    state: CookState,
    timer: PollTimer,

    base: Rc<BaseSchema>,
    schema: Option<GeneratedSchema>,
    /// False between `pre_save` and `post_save`
    schema_active: bool,
    scratch: ScratchBuffer,
    changes: ChangeSet,

    mesh: MeshData,
    status_text: String,
    notification_open: bool,

    is_preview: bool,
    loaded: bool,
    requires_instantiation: bool,
    save_hooks: bool,
}

impl AssetComponent {
    pub fn new(
        id: ComponentId,
        config: ComponentConfig,
        engine: Rc<dyn EngineSession>,
        host: Rc<dyn Host>,
    ) -> Self {
        let base = Rc::new(BaseSchema::component(&config.class_name));
        Self {
            id,
            timer: PollTimer::new(config.poll_interval()),
            scratch: ScratchBuffer::new(config.scratch_capacity),
            config,
            engine,
            host,
            asset: None,
            asset_id: AssetId::INVALID,
            correlation: None,
            state: CookState::Idle,
            base,
            schema: None,
            schema_active: false,
            changes: ChangeSet::new(),
            mesh: MeshData::logo(),
            status_text: String::new(),
            notification_open: false,
            is_preview: false,
            loaded: false,
            requires_instantiation: false,
            save_hooks: false,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn id(&self) -> ComponentId {
        self.id
    }

    pub fn config(&self) -> &ComponentConfig {
        &self.config
    }

    pub fn asset(&self) -> Option<&Rc<AssetDefinition>> {
        self.asset.as_ref()
    }

    /// Engine handle of the instantiated asset; invalid until instantiated
    pub fn asset_id(&self) -> AssetId {
        self.asset_id
    }

    pub fn cook_state(&self) -> CookState {
        self.state
    }

    /// Id of the outstanding request, if any
    pub fn correlation(&self) -> Option<CorrelationId> {
        self.correlation
    }

    pub fn schema(&self) -> Option<&GeneratedSchema> {
        self.schema.as_ref()
    }

    /// Name of the schema currently describing this component
    pub fn active_schema_name(&self) -> &str {
        match &self.schema {
            Some(schema) if self.schema_active => schema.name(),
            _ => &self.base.name,
        }
    }

    pub fn scratch(&self) -> &ScratchBuffer {
        &self.scratch
    }

    pub fn changes(&self) -> &ChangeSet {
        &self.changes
    }

    pub fn mesh(&self) -> &MeshData {
        &self.mesh
    }

    /// Last status text reported by the engine
    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    pub fn is_preview(&self) -> bool {
        self.is_preview
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn requires_instantiation(&self) -> bool {
        self.requires_instantiation
    }

    pub fn is_polling(&self) -> bool {
        self.timer.is_active()
    }

    pub fn has_save_hooks(&self) -> bool {
        self.save_hooks
    }

    // ========================================================================
    // Asset and edits
    // ========================================================================

    /// Preview components show the asset but never instantiate it
    pub fn set_preview_mode(&mut self, preview: bool) {
        self.is_preview = preview;
    }

    /// Attach an asset definition
    ///
    /// Shows the asset's cooked preview if it has one. A component that is
    /// neither a preview nor restored from storage submits an instantiation.
    pub fn set_asset(&mut self, asset: Rc<AssetDefinition>) -> Result<()> {
        if self.asset.as_ref().is_some_and(|current| Rc::ptr_eq(current, &asset)) {
            return Ok(());
        }
        if let Some(pending) = self.correlation {
            return Err(Error::RequestInFlight(pending));
        }
        info!(component = %self.id, asset = %asset.path(), "setting asset");

        if !asset.has_logo_preview() {
            self.mesh = asset.preview().clone();
            self.host.update_rendering(self.id, &self.mesh);
        }
        let path = asset.path().clone();
        self.asset = Some(asset);

        if !self.is_preview && !self.loaded {
            let correlation = CorrelationId::generate();
            let request = CookRequest::new(TaskKind::Instantiate, correlation)
                .with_asset(path)
                .with_actor_label(self.host.actor_label(self.id))
                .with_component(self.id);
            self.submit(request, CookState::InstantiationPending);
        }
        Ok(())
    }

    /// Handle an edit notification; false if the edit was ignored
    pub fn post_edit_change(&mut self, event: &EditEvent) -> Result<bool> {
        if self.state == CookState::Deleting {
            return Ok(false);
        }
        let schema = self.schema.as_mut().ok_or(Error::UnknownField(event.field))?;
        let field = schema.field_mut(event.field).ok_or(Error::UnknownField(event.field))?;

        if field.category() != Some(self.config.category.as_str()) {
            return Ok(false);
        }
        if event.change == ChangeType::Interactive && field.kind == ParameterKind::Color {
            return Ok(false);
        }

        if self.loaded && !self.asset_id.is_valid() && !self.requires_instantiation {
            self.requires_instantiation = true;
        }

        field.set_changed(true);
        if self.changes.insert(event.field) {
            debug!(component = %self.id, parm = field.parm_name(), "field changed");
        }
        self.timer.start();
        Ok(true)
    }

    /// Write a field value and record the edit
    pub fn set_field_value(&mut self, field: FieldId, value: ParameterValue) -> Result<bool> {
        if self.state == CookState::Deleting {
            return Ok(false);
        }
        let schema = self.schema.as_ref().ok_or(Error::UnknownField(field))?;
        let def = schema.field(field).ok_or(Error::UnknownField(field))?;
        if let ParameterValue::Enum(index) = value {
            let len = schema.enum_of(def).map_or(0, |e| e.entries.len());
            if usize::from(index) >= len {
                return Err(houdini_core::Error::SlotIndex {
                    index: usize::from(index),
                    len,
                }
                .into());
            }
        }
        marshal::write_value(def, &mut self.scratch, &value)?;
        self.post_edit_change(&EditEvent::value_set(field))
    }

    pub fn field_value(&self, field: FieldId) -> Result<ParameterValue> {
        let schema = self.schema.as_ref().ok_or(Error::UnknownField(field))?;
        schema.value(field, &self.scratch)
    }

    /// Create the generated schema on first use, then rebuild its fields
    ///
    /// A no-op while the asset is not instantiated.
    pub fn ensure_patched(&mut self, actor_label: &str) -> Result<()> {
        if !self.asset_id.is_valid() {
            return Ok(());
        }
        let parameters = reflect(&*self.engine, self.asset_id)?;

        let created = self.schema.is_none();
        let mut schema = match self.schema.take() {
            Some(schema) => schema,
            None => GeneratedSchema::new(
                next_schema_name(&self.config.class_name, actor_label),
                Rc::clone(&self.base),
            ),
        };
        if let Err(err) = schema.rebuild(&parameters, &mut self.scratch, &self.config.category, &self.changes) {
            if !created {
                self.schema = Some(schema);
            }
            return Err(err);
        }
        if created {
            info!(component = %self.id, schema = %schema.name(), "generated schema");
            self.schema_active = true;
            self.save_hooks = true;
        }
        self.schema = Some(schema);
        Ok(())
    }

    // ========================================================================
    // Poll loop
    // ========================================================================

    fn submit(&mut self, request: CookRequest, state: CookState) {
        debug!(
            component = %self.id,
            correlation = %request.correlation_id,
            kind = %request.kind,
            "submitting request"
        );
        self.correlation = Some(request.correlation_id);
        self.state = state;
        self.engine.submit(request);
        self.timer.start();
    }

    /// Evict the finished request and close its notification
    fn finish_request(&mut self, correlation: CorrelationId) {
        self.engine.remove(correlation);
        self.correlation = None;
        self.state = CookState::Idle;
        if self.notification_open {
            self.host.expire_notification(self.id, &self.status_text);
            self.notification_open = false;
        }
    }

    /// Push all pending edits and clear the change set
    fn push_pending(&mut self) {
        if let Some(schema) = self.schema.as_mut() {
            match marshal::push_changes(&*self.engine, self.asset_id, schema, &self.scratch, &self.changes) {
                Ok(pushed) => debug!(component = %self.id, pushed, "pushed parameter changes"),
                Err(err) => warn!(component = %self.id, error = %err, "failed to push parameter changes"),
            }
            schema.clear_changed();
        }
        self.changes.clear();
    }

    /// Apply a finished cook: label, geometry, schema and render resources
    fn on_cooked(&mut self) -> Result<Option<MeshData>> {
        let name = self
            .engine
            .get_asset_info(self.asset_id)
            .and_then(|info| fetch_string(&*self.engine, info.name_sh));
        match name {
            Ok(name) => self.host.set_actor_label_unique(self.id, &name),
            Err(err) => warn!(component = %self.id, error = %err, "failed to read asset name"),
        }

        let mesh = match self.engine.get_asset_geometry(self.asset_id) {
            Ok(mesh) => mesh,
            Err(err) => {
                warn!(component = %self.id, asset_id = %self.asset_id, error = %err, "failed geometry extraction");
                return Ok(None);
            }
        };

        let label = self.host.actor_label(self.id);
        self.ensure_patched(&label)?;

        let mut preview = None;
        if let Some(asset) = &self.asset {
            if asset.has_logo_preview() {
                asset.set_preview(mesh.clone());
                preview = Some(mesh.clone());
            }
        }

        self.host.release_render_resources(self.id);
        self.mesh = mesh;
        self.host.create_render_resources(self.id, &self.mesh);
        self.host.update_rendering(self.id, &self.mesh);
        Ok(preview)
    }

    /// One poll of the outstanding request, then submission of pending work
    pub fn tick(&mut self) -> Result<TickReport> {
        if self.state == CookState::Deleting {
            self.timer.stop();
            return Ok(TickReport::stopped());
        }

        let mut stop = false;
        let mut preview = None;
        let mut failure = None;

        if let Some(correlation) = self.correlation {
            match self.engine.poll(correlation) {
                Some(info) => {
                    self.status_text = info.status_text.clone();
                    if info.state != TaskState::None && !self.notification_open {
                        self.host.show_notification(self.id, &info.status_text);
                        self.notification_open = true;
                    }

                    match info.state {
                        TaskState::FinishedInstantiationWithoutCooking => {
                            self.asset_id = info.asset_id;
                            if !info.asset_id.is_valid() {
                                warn!(component = %self.id, "received invalid asset id");
                                stop = true;
                            }
                            self.finish_request(correlation);
                        }
                        TaskState::FinishedInstantiation | TaskState::FinishedCooking => {
                            if info.asset_id.is_valid() {
                                self.asset_id = info.asset_id;
                                match self.on_cooked() {
                                    Ok(mesh) => preview = mesh,
                                    Err(err) => failure = Some(err),
                                }
                            } else {
                                warn!(component = %self.id, "received invalid asset id");
                            }
                            self.finish_request(correlation);
                            stop = true;
                        }
                        state if state.is_error() => {
                            error!(
                                component = %self.id,
                                correlation = %correlation,
                                status = %info.status_text,
                                "failed asset instantiation"
                            );
                            self.finish_request(correlation);
                            stop = true;
                        }
                        TaskState::Processing => {
                            if self.notification_open {
                                self.host.update_notification(self.id, &info.status_text);
                            }
                        }
                        _ => {}
                    }
                }
                None => {
                    debug!(component = %self.id, correlation = %correlation, "request no longer known");
                    self.correlation = None;
                    self.state = CookState::Idle;
                    stop = true;
                }
            }
        }

        if failure.is_none()
            && self.correlation.is_none()
            && (!self.changes.is_empty() || self.requires_instantiation)
        {
            stop = !self.submit_pending();
        }

        if stop {
            self.timer.stop();
        }
        if let Some(err) = failure {
            return Err(err);
        }
        Ok(TickReport {
            outcome: if stop { TickOutcome::Stop } else { TickOutcome::Continue },
            preview,
        })
    }

    /// Submit the work pending edits call for; false if nothing was submitted
    fn submit_pending(&mut self) -> bool {
        let correlation = CorrelationId::generate();
        let label = self.host.actor_label(self.id);

        if self.requires_instantiation {
            self.requires_instantiation = false;
            let Some(asset) = self.asset.as_ref() else {
                warn!(component = %self.id, "cannot instantiate without an asset");
                return false;
            };
            // With nothing to push there is no follow-up cook, so cook right away
            let kind = if self.changes.is_empty() {
                TaskKind::Instantiate
            } else {
                TaskKind::InstantiateWithoutCooking
            };
            let request = CookRequest::new(kind, correlation)
                .with_asset(asset.path().clone())
                .with_actor_label(label)
                .with_component(self.id);
            self.submit(request, CookState::InstantiationPending);
            return true;
        }

        if !self.asset_id.is_valid() {
            warn!(component = %self.id, pending = self.changes.len(), "edits pending on an uninstantiated asset");
            return false;
        }

        self.push_pending();
        let request = CookRequest::new(TaskKind::Cook, correlation)
            .with_asset_id(self.asset_id)
            .with_actor_label(label)
            .with_component(self.id);
        self.submit(request, CookState::CookingPending);
        true
    }

    /// Advance the poll timer, ticking when it fires
    pub fn advance(&mut self, delta: Duration) -> Result<Option<TickReport>> {
        if self.timer.advance(delta) {
            self.tick().map(Some)
        } else {
            Ok(None)
        }
    }

    /// Show a mesh cooked by another component for the same asset
    pub fn apply_preview(&mut self, mesh: &MeshData) {
        self.mesh = mesh.clone();
        self.host.update_rendering(self.id, &self.mesh);
    }

    // ========================================================================
    // Teardown
    // ========================================================================

    /// Tear down: cancel polling, release rendering and delete the asset
    pub fn on_destroyed(&mut self) {
        info!(component = %self.id, asset_id = %self.asset_id, "destroying component");

        if let Some(correlation) = self.correlation.take() {
            self.engine.remove(correlation);
            if self.notification_open {
                self.host.expire_notification(self.id, &self.status_text);
                self.notification_open = false;
            }
        }
        self.timer.stop();

        self.host.release_render_resources(self.id);

        if self.asset_id.is_valid() {
            let request = CookRequest::new(TaskKind::Delete, CorrelationId::generate())
                .with_asset_id(self.asset_id)
                .with_component(self.id);
            self.engine.submit(request);
            self.asset_id = AssetId::INVALID;
        }

        self.save_hooks = false;
        self.state = CookState::Deleting;
    }

    // ========================================================================
    // Save and collection
    // ========================================================================

    /// Revert to the static schema for a save; returns the schema to keep alive
    pub fn pre_save(&mut self) -> Option<ObjectRef> {
        if !self.save_hooks || !self.schema_active {
            return None;
        }
        let schema = self.schema.as_ref()?;
        self.schema_active = false;
        Some(ObjectRef::Schema(schema.name().to_string()))
    }

    /// Reinstate the generated schema after a save
    pub fn post_save(&mut self) {
        if self.save_hooks && self.schema.is_some() {
            self.schema_active = true;
        }
    }

    /// Objects this component keeps alive
    pub fn enumerate_references(&self) -> Vec<ObjectRef> {
        let mut refs = Vec::new();
        if let Some(schema) = &self.schema {
            refs.push(ObjectRef::Schema(schema.name().to_string()));
        }
        if let Some(asset) = &self.asset {
            refs.push(ObjectRef::Asset(asset.path().clone()));
        }
        refs
    }

    pub fn add_referenced_objects(&self, collector: &mut dyn ReferenceCollector) {
        for object in self.enumerate_references() {
            collector.add_referenced_object(object, self.id);
        }
    }

    /// Lifecycle summary written by serializers
    pub fn save_state(&self) -> ComponentState {
        match (&self.asset, self.asset_id.is_valid()) {
            (_, true) if self.correlation.is_some() => ComponentState::BeingCooked,
            (_, true) => ComponentState::Instantiated,
            (Some(_), false) => ComponentState::None,
            (None, false) => ComponentState::Invalid,
        }
    }

    /// Rebuild this component from saved state
    ///
    /// The component is marked as loaded, so attaching the asset does not
    /// instantiate it. Saved changes, or a save taken mid-cook, make the next
    /// tick instantiate the asset again.
    pub fn install_restored(&mut self, restored: RestoredComponent) -> Result<()> {
        self.loaded = true;
        self.scratch.load(&restored.scratch, restored.strings)?;

        if !restored.fields.is_empty() {
            let label = self.host.actor_label(self.id);
            let schema = GeneratedSchema::restore(
                next_schema_name(&self.config.class_name, &label),
                Rc::clone(&self.base),
                restored.fields,
                self.scratch.capacity(),
            )?;
            self.changes = schema.fields().iter().filter(|f| f.is_changed()).map(|f| f.id).collect();
            self.schema = Some(schema);
            self.schema_active = true;
            self.save_hooks = true;
        }

        if let Some(mesh) = restored.mesh {
            self.mesh = mesh;
            self.host.create_render_resources(self.id, &self.mesh);
        }
        if let Some(asset) = restored.asset {
            self.set_asset(asset)?;
        }

        if restored.state == ComponentState::BeingCooked || !self.changes.is_empty() {
            self.requires_instantiation = true;
            self.timer.start();
        }
        info!(
            component = %self.id,
            state = ?restored.state,
            pending = self.changes.len(),
            "restored component"
        );
        Ok(())
    }
}

impl std::fmt::Debug for AssetComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetComponent")
            .field("id", &self.id)
            .field("asset_id", &self.asset_id)
            .field("state", &self.state)
            .field("correlation", &self.correlation)
            .field("schema", &self.schema.as_ref().map(GeneratedSchema::name))
            .field("pending", &self.changes.len())
            .finish()
    }
}
