//! Core runtime of telefsm.
//!
//! An [`FsmDescriptor`] describes one class of state machine: its state
//! table with per-state event and transition masks, its all-state events and
//! its [`FsmBehavior`] hooks. An [`Engine`] registers descriptors and owns
//! every instance allocated from them, addressed by [`InstanceId`].
//!
//! Everything runs synchronously on the caller's thread. Hooks receive the
//! engine and may dispatch, change state, allocate children or terminate
//! from inside a callback.

mod descriptor;
mod dispatch;
mod driver;
mod engine;
mod error;
mod log;
mod mask;
mod store;
mod terminate;
mod timer;
mod transition;

use std::any::Any;

pub use crate::descriptor::{DescriptorBuilder, FsmBehavior, FsmDescriptor, FsmEvent, FsmStates, StateSpec};
pub use crate::driver::{EngineHandle, Inbound, Mailbox, ShutdownMode, channel};
pub use crate::engine::{Engine, EngineConfig};
pub use crate::error::{BuildError, FsmError};
pub use crate::mask::{EventMask, MAX_IDS, StateMask};
pub use crate::store::InstanceId;
pub use crate::terminate::TermCause;
pub use crate::timer::TimerQueue;
pub use tracing::Level;

/// Index of a state in its descriptor's table.
pub type StateId = u32;

/// Event number, meaningful only to the descriptor that defines it.
pub type EventId = u32;

/// Opaque payload travelling with an event.
pub type EventData = Box<dyn Any>;
