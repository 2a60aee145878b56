//! The engine: descriptor registry, instance allocation and accessors.

use std::any::Any;
use std::rc::Rc;

use tracing::Level;

use crate::descriptor::FsmDescriptor;
use crate::error::FsmError;
use crate::log::inst_log;
use crate::store::{Instance, InstanceStore};
use crate::timer::TimerQueue;
use crate::{EventId, InstanceId, StateId};

/// Engine-wide settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Embed a run-unique instance address in instance display names.
    pub log_addr: bool,
    /// Level used by [`Engine::alloc`] when the caller passes none.
    pub default_log_level: Level,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_addr: true,
            default_log_level: Level::DEBUG,
        }
    }
}

/// Registry of descriptors and owner of every instance tree built from them.
///
/// Not thread-safe: one engine belongs to one logical thread of control.
/// Independent engines never share state.
#[derive(Default)]
pub struct Engine {
    pub(crate) config: EngineConfig,
    pub(crate) fsms: Vec<Rc<FsmDescriptor>>,
    pub(crate) store: InstanceStore,
    pub(crate) timers: TimerQueue,
    next_addr: u64,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Toggles address embedding for instances allocated from now on.
    pub fn set_log_addr(&mut self, log_addr: bool) {
        self.config.log_addr = log_addr;
    }

    /// Adds a descriptor to the catalogue.
    ///
    /// Names are not checked for uniqueness: registering a second descriptor
    /// with an existing name shadows it for [`Engine::find_descriptor`].
    pub fn register(&mut self, fsm: &Rc<FsmDescriptor>) {
        self.fsms.push(Rc::clone(fsm));
    }

    /// Removes a descriptor from the catalogue.
    ///
    /// Live instances keep their reference and stay fully usable.
    pub fn unregister(&mut self, fsm: &Rc<FsmDescriptor>) {
        self.fsms.retain(|other| !Rc::ptr_eq(other, fsm));
    }

    /// First registered descriptor called `name`.
    pub fn find_descriptor(&self, name: &str) -> Option<&Rc<FsmDescriptor>> {
        self.fsms.iter().find(|fsm| fsm.name() == name)
    }

    pub fn descriptors(&self) -> &[Rc<FsmDescriptor>] {
        &self.fsms
    }

    /// Live instances of `fsm`, oldest first.
    pub fn instances_of(&self, fsm: &FsmDescriptor) -> &[InstanceId] {
        self.store.of_fsm(fsm)
    }

    /// Number of live instances across all descriptors.
    pub fn live_instances(&self) -> usize {
        self.store.len()
    }

    /// Allocates an instance of `fsm` in its initial state (state 0).
    ///
    /// No `onenter` hook runs for the initial state.
    pub fn alloc(
        &mut self,
        fsm: &Rc<FsmDescriptor>,
        priv_data: Option<Box<dyn Any>>,
        log_level: Option<Level>,
        id: Option<&str>,
    ) -> InstanceId {
        let name = self.display_name(fsm, id);
        let log_level = log_level.unwrap_or(self.config.default_log_level);
        let fi = self.store.insert(Instance::new(
            Rc::clone(fsm),
            priv_data,
            log_level,
            id.map(str::to_owned),
            name,
        ));
        inst_log!(log_level, fsm.log_subsys(), self.inst_name(fi), "Allocated");
        fi
    }

    /// Allocates an instance of `fsm` as a child of `parent`.
    ///
    /// The child inherits the parent's id and log level. `parent_term_event`
    /// is dispatched to the parent once the child terminates on its own.
    /// A parent that is itself terminating refuses the child and receives
    /// `parent_term_event` immediately, as if the child had already finished.
    pub fn alloc_child(
        &mut self,
        fsm: &Rc<FsmDescriptor>,
        parent: InstanceId,
        parent_term_event: impl Into<EventId>,
    ) -> Result<InstanceId, FsmError> {
        let parent_term_event = parent_term_event.into();
        let Some(p) = self.store.get(parent) else {
            tracing::error!(subsys = fsm.log_subsys(), %parent, "Cannot allocate {} child of non-existing FSM instance", fsm.name());
            return Err(FsmError::InvalidInstance(parent));
        };

        if p.terminating {
            let parent_name = p.name.clone();
            tracing::error!(subsys = fsm.log_subsys(), fsm = %parent_name, "Cannot allocate {} child while terminating", fsm.name());
            let _ = self.dispatch(parent, parent_term_event, None);
            return Err(FsmError::ParentTerminating(parent_name));
        }

        let id = p.id.clone();
        let log_level = p.log_level;
        let fi = self.alloc(fsm, None, Some(log_level), id.as_deref());

        if let Some(child) = self.store.get_mut(fi) {
            child.parent = Some(parent);
            child.parent_term_event = parent_term_event;
        }
        if let Some(p) = self.store.get_mut(parent) {
            p.children.push(fi);
        }

        inst_log!(log_level, fsm.log_subsys(), self.inst_name(fi), "is child of {}", self.inst_name(parent));
        Ok(fi)
    }

    /// Releases an instance: cancels its timer, drops it from its
    /// descriptor's instance list and frees it.
    ///
    /// Parent/child links are left alone and no cleanup hook runs; use
    /// [`Engine::terminate`] for an orderly end.
    pub fn free(&mut self, fi: InstanceId) {
        self.timers.cancel(fi);
        self.store.remove(fi);
    }

    pub fn is_alive(&self, fi: InstanceId) -> bool {
        self.store.get(fi).is_some()
    }

    /// Display name of the instance, `NULL` for a dead handle.
    pub fn inst_name(&self, fi: InstanceId) -> &str {
        self.store.get(fi).map_or("NULL", |inst| inst.name.as_str())
    }

    /// Caller-supplied correlation id.
    pub fn inst_id(&self, fi: InstanceId) -> Option<&str> {
        self.store.get(fi).and_then(|inst| inst.id.as_deref())
    }

    pub fn descriptor(&self, fi: InstanceId) -> Option<&Rc<FsmDescriptor>> {
        self.store.get(fi).map(|inst| &inst.fsm)
    }

    pub fn state(&self, fi: InstanceId) -> Option<StateId> {
        self.store.get(fi).map(|inst| inst.state)
    }

    pub fn parent(&self, fi: InstanceId) -> Option<InstanceId> {
        self.store.get(fi).and_then(|inst| inst.parent)
    }

    pub fn children(&self, fi: InstanceId) -> &[InstanceId] {
        self.store.get(fi).map_or(&[], |inst| inst.children.as_slice())
    }

    pub fn log_level(&self, fi: InstanceId) -> Option<Level> {
        self.store.get(fi).map(|inst| inst.log_level)
    }

    pub fn set_log_level(&mut self, fi: InstanceId, level: Level) {
        if let Some(inst) = self.store.get_mut(fi) {
            inst.log_level = level;
        }
    }

    /// Label of the most recently armed timer.
    pub fn timer_label(&self, fi: InstanceId) -> Option<u32> {
        self.store.get(fi).map(|inst| inst.timer_label)
    }

    pub fn priv_data<T: Any>(&self, fi: InstanceId) -> Option<&T> {
        self.store
            .get(fi)
            .and_then(|inst| inst.priv_data.as_deref())
            .and_then(|data| data.downcast_ref())
    }

    pub fn priv_data_mut<T: Any>(&mut self, fi: InstanceId) -> Option<&mut T> {
        self.store
            .get_mut(fi)
            .and_then(|inst| inst.priv_data.as_deref_mut())
            .and_then(|data| data.downcast_mut())
    }

    pub fn set_priv_data(&mut self, fi: InstanceId, data: Box<dyn Any>) {
        if let Some(inst) = self.store.get_mut(fi) {
            inst.priv_data = Some(data);
        }
    }

    /// Detaches the private data, typically from the cleanup hook.
    pub fn take_priv_data(&mut self, fi: InstanceId) -> Option<Box<dyn Any>> {
        self.store.get_mut(fi).and_then(|inst| inst.priv_data.take())
    }

    fn display_name(&mut self, fsm: &FsmDescriptor, id: Option<&str>) -> String {
        if !self.config.log_addr {
            return match id {
                Some(id) => format!("{}({id})", fsm.name()),
                None => fsm.name().to_owned(),
            };
        }

        self.next_addr += 1;
        let addr = self.next_addr;
        match id {
            Some(id) => format!("{}({id})[0x{addr:x}]", fsm.name()),
            None => format!("{}[0x{addr:x}]", fsm.name()),
        }
    }
}
