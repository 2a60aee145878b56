use thiserror::Error;

use crate::InstanceId;

/// Recoverable failures reported by the engine's entry points.
///
/// Each variant carries display names rather than raw ids so that the error
/// alone is enough to tell which instance refused what.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FsmError {
    /// The target handle does not refer to a live instance.
    #[error("FSM instance {0} does not exist")]
    InvalidInstance(InstanceId),

    /// The event is neither accepted by the current state nor an all-state
    /// event. The instance is left untouched.
    #[error("{fsm}({state}): Event {event} not permitted")]
    EventNotPermitted {
        fsm: String,
        state: String,
        event: String,
    },

    /// The current state does not declare the requested target state.
    #[error("{fsm}({state}): transition to state {target} not permitted")]
    TransitionNotPermitted {
        fsm: String,
        state: String,
        target: String,
    },

    /// A child was requested of an instance that is already being torn down.
    #[error("{0} is terminating, refusing to allocate a child")]
    ParentTerminating(String),
}

/// Descriptor construction failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("FSM `{0}` declares no states")]
    NoStates(String),

    #[error("FSM `{fsm}` declares {count} states, at most {max} fit a state mask")]
    TooManyStates { fsm: String, count: usize, max: u32 },

    #[error("FSM `{fsm}`: state {state} may transition into unknown state {target}")]
    StateOutOfRange {
        fsm: String,
        state: String,
        target: u32,
    },

    #[error("FSM `{fsm}`: event {event} has no name in the event table")]
    EventOutOfRange { fsm: String, event: u32 },
}
