use proc_macro2::TokenStream;
use quote::quote;

use super::render_id_conversions;
use crate::validation::EventsStructure;

pub fn generate_events(fsm: &EventsStructure) -> TokenStream {
    let enum_name = &fsm.enum_name;
    let variants: Vec<_> = fsm.events.iter().map(|e| &e.ident).collect();
    let names: Vec<_> = fsm.events.iter().map(|e| &e.name).collect();
    let conversions = render_id_conversions(enum_name, &variants);

    quote! {
        #conversions

        impl ::telefsm::FsmEvent for #enum_name {
            const NAMES: &'static [&'static str] = &[#(#names),*];
        }
    }
}
