//! Validation of derive input.

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;
use syn::{Error, Ident, Path};

use crate::attrs::{EventsInput, StatesInput};

/// Width of the engine's permission masks.
const MAX_IDS: usize = 32;

/// A validated state.
#[derive(Debug, Clone)]
pub struct State {
    pub ident: Ident,
    pub name: String,
    pub out_bits: u32,
    pub events: Vec<Ident>,
}

/// A validated state enum.
#[derive(Debug)]
pub struct StatesStructure {
    pub enum_name: Ident,
    pub events_ty: Option<Path>,
    pub states: Vec<State>,
}

/// A validated event.
#[derive(Debug, Clone)]
pub struct Event {
    pub ident: Ident,
    pub name: String,
}

/// A validated event enum.
#[derive(Debug)]
pub struct EventsStructure {
    pub enum_name: Ident,
    pub events: Vec<Event>,
}

impl StatesStructure {
    pub fn parse(input: StatesInput) -> syn::Result<Self> {
        let enum_name = input.ident;
        let variants = input
            .data
            .take_enum()
            .ok_or_else(|| Error::new_spanned(&enum_name, "FsmStates can only be derived for enums"))?;

        check_width(&enum_name, variants.len(), "states")?;

        let idents: Vec<Ident> = variants.iter().map(|v| v.ident.clone()).collect();
        let mut errors: Option<Error> = None;
        let mut push = |err: Error| match errors.as_mut() {
            Some(acc) => acc.combine(err),
            None => errors = Some(err),
        };

        let mut states = Vec::with_capacity(variants.len());
        for variant in &variants {
            let mut out_bits = 0u32;
            for target in variant.out.iter() {
                match single_ident(target).and_then(|t| idents.iter().position(|i| i == t)) {
                    Some(pos) => out_bits |= 1 << pos,
                    None => push(Error::new_spanned(
                        target,
                        format!("unknown state in `out` of `{}`", variant.ident),
                    )),
                }
            }

            if !variant.events.is_empty() && input.events.is_none() {
                push(Error::new_spanned(
                    &variant.ident,
                    "`events(...)` needs the event enum: add #[fsm(events = YourEvent)]",
                ));
            }
            let mut events = Vec::with_capacity(variant.events.len());
            for event in variant.events.iter() {
                match single_ident(event) {
                    Some(ident) => events.push(ident.clone()),
                    None => push(Error::new_spanned(event, "expected an event variant name")),
                }
            }

            states.push(State {
                ident: variant.ident.clone(),
                name: variant.name.clone().unwrap_or_else(|| variant.ident.to_string()),
                out_bits,
                events,
            });
        }

        if let Some(err) = errors {
            return Err(err);
        }

        if !input.allow_unreachable {
            check_reachable(&states)?;
        }

        Ok(Self {
            enum_name,
            events_ty: input.events,
            states,
        })
    }
}

impl EventsStructure {
    pub fn parse(input: EventsInput) -> syn::Result<Self> {
        let enum_name = input.ident;
        let variants = input
            .data
            .take_enum()
            .ok_or_else(|| Error::new_spanned(&enum_name, "FsmEvent can only be derived for enums"))?;

        check_width(&enum_name, variants.len(), "events")?;

        let events = variants
            .into_iter()
            .map(|v| Event {
                name: v.name.unwrap_or_else(|| v.ident.to_string()),
                ident: v.ident,
            })
            .collect();

        Ok(Self { enum_name, events })
    }
}

fn check_width(enum_name: &Ident, count: usize, what: &str) -> syn::Result<()> {
    if count == 0 {
        return Err(Error::new_spanned(enum_name, format!("at least one variant is required for {what}")));
    }
    if count > MAX_IDS {
        return Err(Error::new_spanned(
            enum_name,
            format!("{count} {what} declared, at most {MAX_IDS} fit a permission mask"),
        ));
    }
    Ok(())
}

fn single_ident(path: &Path) -> Option<&Ident> {
    path.get_ident()
}

/// Every state must be reachable from the first (initial) one.
fn check_reachable(states: &[State]) -> syn::Result<()> {
    let mut graph = DiGraph::<usize, ()>::with_capacity(states.len(), 0);
    let nodes: Vec<NodeIndex> = (0..states.len()).map(|i| graph.add_node(i)).collect();
    for (from, state) in states.iter().enumerate() {
        for (to, node) in nodes.iter().enumerate() {
            if state.out_bits & (1 << to) != 0 {
                graph.add_edge(nodes[from], *node, ());
            }
        }
    }

    let mut reached = vec![false; states.len()];
    let mut dfs = Dfs::new(&graph, nodes[0]);
    while let Some(node) = dfs.next(&graph) {
        reached[graph[node]] = true;
    }

    let mut errors: Option<Error> = None;
    for (state, _) in states.iter().zip(&reached).filter(|(_, r)| !**r) {
        let err = Error::new_spanned(
            &state.ident,
            format!(
                "state `{}` is unreachable from initial state `{}`",
                state.ident, states[0].ident
            ),
        );
        match errors.as_mut() {
            Some(acc) => acc.combine(err),
            None => errors = Some(err),
        }
    }
    errors.map_or(Ok(()), Err)
}
