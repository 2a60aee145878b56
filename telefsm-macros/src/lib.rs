//! Derive macros generating state and event tables for telefsm descriptors.

use darling::FromDeriveInput;
use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod attrs;
mod codegen;
mod validation;

/// Derives `telefsm::FsmEvent` for a fieldless enum.
///
/// Variants are numbered in declaration order. The display name defaults to
/// the variant name and can be overridden with `#[event(name = "...")]`.
///
/// ```ignore
/// #[derive(Debug, Clone, Copy, FsmEvent)]
/// enum LuEvent {
///     #[event(name = "LU_START")]
///     Start,
///     Ack,
/// }
/// ```
#[proc_macro_derive(FsmEvent, attributes(event))]
pub fn derive_fsm_event(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let parsed = match attrs::EventsInput::from_derive_input(&input) {
        Ok(parsed) => parsed,
        Err(e) => return e.write_errors().into(),
    };
    match generate_events(parsed) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

/// Derives `telefsm::FsmStates` for a fieldless enum.
///
/// The first variant is the initial state. Each variant declares the states
/// it may move into and the events it accepts; the event names refer to
/// variants of the enum given in `#[fsm(events = ...)]`.
///
/// ```ignore
/// #[derive(Debug, Clone, Copy, FsmStates)]
/// #[fsm(events = LuEvent)]
/// enum LuState {
///     #[state(out(Wait))]
///     Idle,
///     #[state(out(Idle, Done), events(Ack))]
///     Wait,
///     Done,
/// }
/// ```
///
/// Unknown target states, more than 32 variants and states unreachable from
/// the initial one are compile errors. `#[fsm(allow_unreachable)]` lifts the
/// last check.
#[proc_macro_derive(FsmStates, attributes(fsm, state))]
pub fn derive_fsm_states(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let parsed = match attrs::StatesInput::from_derive_input(&input) {
        Ok(parsed) => parsed,
        Err(e) => return e.write_errors().into(),
    };
    match generate_states(parsed) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

fn generate_events(input: attrs::EventsInput) -> syn::Result<proc_macro2::TokenStream> {
    let structure = validation::EventsStructure::parse(input)?;
    Ok(codegen::generate_events(&structure))
}

fn generate_states(input: attrs::StatesInput) -> syn::Result<proc_macro2::TokenStream> {
    let structure = validation::StatesStructure::parse(input)?;
    Ok(codegen::generate_states(&structure))
}
