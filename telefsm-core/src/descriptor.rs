//! FSM descriptors: the immutable template shared by every instance of a class.

use std::borrow::Cow;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::BuildError;
use crate::mask::{EventMask, MAX_IDS, StateMask};
use crate::terminate::TermCause;
use crate::{Engine, EventData, EventId, InstanceId, StateId};

static NEXT_KEY: AtomicU64 = AtomicU64::new(1);

/// One row of a descriptor's state table. The row's position is its state id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateSpec {
    pub name: &'static str,
    /// Events accepted while in this state.
    pub in_event_mask: EventMask,
    /// States this state may transition into.
    pub out_state_mask: StateMask,
}

impl StateSpec {
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            in_event_mask: EventMask::EMPTY,
            out_state_mask: StateMask::EMPTY,
        }
    }

    #[must_use]
    pub const fn events(mut self, mask: EventMask) -> Self {
        self.in_event_mask = mask;
        self
    }

    #[must_use]
    pub const fn out(mut self, mask: StateMask) -> Self {
        self.out_state_mask = mask;
        self
    }
}

/// Hooks of one FSM class.
///
/// `action` is mandatory; every other hook defaults to doing nothing. Hooks
/// receive the engine itself, so they may dispatch, change state, allocate
/// or terminate re-entrantly.
pub trait FsmBehavior {
    /// Handles an event accepted by `state`'s input mask.
    fn action(
        &self,
        engine: &mut Engine,
        fi: InstanceId,
        state: StateId,
        event: EventId,
        data: Option<EventData>,
    );

    /// Called after the instance entered `state`, coming from `prev`.
    fn onenter(&self, _engine: &mut Engine, _fi: InstanceId, _state: StateId, _prev: StateId) {}

    /// Called before the instance leaves `state` for `next`.
    fn onleave(&self, _engine: &mut Engine, _fi: InstanceId, _state: StateId, _next: StateId) {}

    /// Handles events of the descriptor's all-state mask, whatever the
    /// current state is.
    fn allstate_action(
        &self,
        _engine: &mut Engine,
        _fi: InstanceId,
        _event: EventId,
        _data: Option<EventData>,
    ) {
    }

    /// Whether [`FsmBehavior::timer_cb`] is implemented. Classes that arm
    /// timeouts must override both.
    ///
    /// While this returns `false`, every non-zero timeout passed to
    /// [`Engine::state_chg`] logs a "cannot start timer" error.
    fn has_timer_cb(&self) -> bool {
        false
    }

    /// Called when the instance's timer expires.
    ///
    /// Override together with [`FsmBehavior::has_timer_cb`] returning
    /// `true`; the engine does not detect an override of this method alone.
    fn timer_cb(&self, _engine: &mut Engine, _fi: InstanceId) {}

    /// Last call before the instance is released.
    fn cleanup(&self, _engine: &mut Engine, _fi: InstanceId, _cause: TermCause) {}
}

/// State enums usable as a descriptor's state table.
///
/// Usually derived with `#[derive(FsmStates)]`.
pub trait FsmStates: Copy + Into<StateId> {
    fn table() -> Vec<StateSpec>;
}

/// Event enums usable as a descriptor's event table.
///
/// Usually derived with `#[derive(FsmEvent)]`.
pub trait FsmEvent: Copy + Into<EventId> {
    /// Display names, indexed by event id.
    const NAMES: &'static [&'static str];
}

/// Immutable template describing one class of state machine.
pub struct FsmDescriptor {
    key: u64,
    name: String,
    log_subsys: &'static str,
    states: Vec<StateSpec>,
    allstate_event_mask: EventMask,
    event_names: Option<&'static [&'static str]>,
    behavior: Box<dyn FsmBehavior>,
}

impl FsmDescriptor {
    pub fn builder(name: impl Into<String>) -> DescriptorBuilder {
        DescriptorBuilder {
            name: name.into(),
            log_subsys: "fsm",
            states: Vec::new(),
            allstate_event_mask: EventMask::EMPTY,
            event_names: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Logging subsystem tag attached to every record of this class.
    pub fn log_subsys(&self) -> &'static str {
        self.log_subsys
    }

    pub fn states(&self) -> &[StateSpec] {
        &self.states
    }

    pub fn num_states(&self) -> usize {
        self.states.len()
    }

    pub fn state(&self, state: StateId) -> Option<&StateSpec> {
        self.states.get(state as usize)
    }

    pub fn allstate_event_mask(&self) -> EventMask {
        self.allstate_event_mask
    }

    /// Display name of `event`, falling back to its decimal id.
    pub fn event_name(&self, event: EventId) -> Cow<'static, str> {
        match self.event_names.and_then(|names| names.get(event as usize)) {
            Some(&name) => Cow::Borrowed(name),
            None => Cow::Owned(event.to_string()),
        }
    }

    /// Display name of `state`, or `unknown <n>` for ids outside the table.
    pub fn state_name(&self, state: StateId) -> Cow<'static, str> {
        match self.state(state) {
            Some(spec) => Cow::Borrowed(spec.name),
            None => Cow::Owned(format!("unknown {state}")),
        }
    }

    pub(crate) fn key(&self) -> u64 {
        self.key
    }

    pub(crate) fn behavior(&self) -> &dyn FsmBehavior {
        self.behavior.as_ref()
    }
}

impl fmt::Debug for FsmDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FsmDescriptor")
            .field("name", &self.name)
            .field("log_subsys", &self.log_subsys)
            .field("states", &self.states)
            .field("allstate_event_mask", &self.allstate_event_mask)
            .finish_non_exhaustive()
    }
}

/// Builder for [`FsmDescriptor`].
#[derive(Debug, Clone)]
pub struct DescriptorBuilder {
    name: String,
    log_subsys: &'static str,
    states: Vec<StateSpec>,
    allstate_event_mask: EventMask,
    event_names: Option<&'static [&'static str]>,
}

impl DescriptorBuilder {
    #[must_use]
    pub fn log_subsys(mut self, subsys: &'static str) -> Self {
        self.log_subsys = subsys;
        self
    }

    /// Appends a state; its id is the number of states added before it.
    #[must_use]
    pub fn state(mut self, spec: StateSpec) -> Self {
        self.states.push(spec);
        self
    }

    /// Replaces the state table with the one generated for `S`.
    #[must_use]
    pub fn states<S: FsmStates>(mut self) -> Self {
        self.states = S::table();
        self
    }

    #[must_use]
    pub fn event_names(mut self, names: &'static [&'static str]) -> Self {
        self.event_names = Some(names);
        self
    }

    /// Uses the display names generated for `E`.
    #[must_use]
    pub fn events<E: FsmEvent>(self) -> Self {
        self.event_names(E::NAMES)
    }

    /// Events handled by [`FsmBehavior::allstate_action`] in every state.
    #[must_use]
    pub fn allstate_events(mut self, mask: EventMask) -> Self {
        self.allstate_event_mask = mask;
        self
    }

    pub fn build(self, behavior: impl FsmBehavior + 'static) -> Result<Rc<FsmDescriptor>, BuildError> {
        if self.states.is_empty() {
            return Err(BuildError::NoStates(self.name));
        }
        if self.states.len() > MAX_IDS as usize {
            return Err(BuildError::TooManyStates {
                fsm: self.name,
                count: self.states.len(),
                max: MAX_IDS,
            });
        }

        let num_states = self.states.len() as u32;
        for spec in &self.states {
            if let Some(target) = spec.out_state_mask.highest().filter(|t| *t >= num_states) {
                return Err(BuildError::StateOutOfRange {
                    fsm: self.name,
                    state: spec.name.to_owned(),
                    target,
                });
            }
        }

        if let Some(names) = self.event_names {
            let used = self
                .states
                .iter()
                .fold(self.allstate_event_mask, |mask, spec| mask | spec.in_event_mask);
            if let Some(event) = used.highest().filter(|e| *e as usize >= names.len()) {
                return Err(BuildError::EventOutOfRange {
                    fsm: self.name,
                    event,
                });
            }
        }

        Ok(Rc::new(FsmDescriptor {
            key: NEXT_KEY.fetch_add(1, Ordering::Relaxed),
            name: self.name,
            log_subsys: self.log_subsys,
            states: self.states,
            allstate_event_mask: self.allstate_event_mask,
            event_names: self.event_names,
            behavior: Box::new(behavior),
        }))
    }
}
