//! Attribute parsing for the derive macros.

use darling::ast::Data;
use darling::util::PathList;
use darling::{FromDeriveInput, FromVariant};
use syn::{Ident, Path};

/// Input of `#[derive(FsmStates)]`.
#[derive(Debug, FromDeriveInput)]
#[darling(attributes(fsm), supports(enum_unit))]
pub struct StatesInput {
    pub ident: Ident,
    pub data: Data<StateVariant, ()>,

    /// Event enum referenced by the variants' `events(...)` lists.
    #[darling(default)]
    pub events: Option<Path>,

    /// Skip the reachability check.
    #[darling(default)]
    pub allow_unreachable: bool,
}

/// Arguments for `#[state(out(A, B), events(X), name = "...")]`.
#[derive(Debug, FromVariant)]
#[darling(attributes(state))]
pub struct StateVariant {
    pub ident: Ident,

    /// Display name (default: the variant name).
    #[darling(default)]
    pub name: Option<String>,

    /// States this state may transition into.
    #[darling(default)]
    pub out: PathList,

    /// Events accepted in this state.
    #[darling(default)]
    pub events: PathList,
}

/// Input of `#[derive(FsmEvent)]`.
#[derive(Debug, FromDeriveInput)]
#[darling(supports(enum_unit))]
pub struct EventsInput {
    pub ident: Ident,
    pub data: Data<EventVariant, ()>,
}

/// Arguments for `#[event(name = "...")]`.
#[derive(Debug, FromVariant)]
#[darling(attributes(event))]
pub struct EventVariant {
    pub ident: Ident,

    /// Display name (default: the variant name).
    #[darling(default)]
    pub name: Option<String>,
}
