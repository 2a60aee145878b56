//! # telefsm
//!
//! Event-driven finite state machines for protocol procedures: per-state
//! event and transition masks, timer-armed states and parent/child instance
//! trees that terminate as a whole.
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//!
//! use telefsm::{
//!     Engine, EventData, EventId, FsmBehavior, FsmDescriptor, FsmEvent, FsmStates, InstanceId,
//!     StateId,
//! };
//!
//! #[derive(Debug, Clone, Copy, FsmEvent)]
//! pub enum LuEvent {
//!     Start,
//!     Ack,
//! }
//!
//! #[derive(Debug, Clone, Copy, FsmStates)]
//! #[fsm(events = LuEvent)]
//! pub enum LuState {
//!     #[state(out(Wait), events(Start))]
//!     Idle,
//!     #[state(out(Idle, Done), events(Ack))]
//!     Wait,
//!     Done,
//! }
//!
//! struct Lu;
//!
//! impl FsmBehavior for Lu {
//!     fn action(&self, engine: &mut Engine, fi: InstanceId, state: StateId, _: EventId, _: Option<EventData>) {
//!         let next = match LuState::try_from(state) {
//!             Ok(LuState::Idle) => LuState::Wait,
//!             _ => LuState::Done,
//!         };
//!         let _ = engine.state_chg(fi, next, Duration::ZERO, 0);
//!     }
//! }
//!
//! let lu = FsmDescriptor::builder("LU")
//!     .states::<LuState>()
//!     .events::<LuEvent>()
//!     .build(Lu)
//!     .unwrap();
//!
//! let mut engine = Engine::default();
//! engine.register(&lu);
//! let fi = engine.alloc(&lu, None, None, Some("subscr-1"));
//!
//! engine.dispatch(fi, LuEvent::Start, None).unwrap();
//! engine.dispatch(fi, LuEvent::Ack, None).unwrap();
//! assert_eq!(engine.state(fi), Some(LuState::Done.into()));
//! ```

#[doc(inline)]
pub use telefsm_core::*;
#[doc(inline)]
pub use telefsm_macros::*;
