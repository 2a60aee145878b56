use proc_macro2::TokenStream;
use quote::quote;

use super::render_id_conversions;
use crate::validation::StatesStructure;

pub fn generate_states(fsm: &StatesStructure) -> TokenStream {
    let enum_name = &fsm.enum_name;
    let variants: Vec<_> = fsm.states.iter().map(|s| &s.ident).collect();
    let conversions = render_id_conversions(enum_name, &variants);

    let rows = fsm.states.iter().map(|state| {
        let name = &state.name;
        let out_bits = state.out_bits;
        let events = match &fsm.events_ty {
            Some(events_ty) => {
                let idents = &state.events;
                quote! { ::telefsm::EventMask::EMPTY #(.with(#events_ty::#idents))* }
            }
            None => quote! { ::telefsm::EventMask::EMPTY },
        };

        quote! {
            ::telefsm::StateSpec::new(#name)
                .events(#events)
                .out(::telefsm::StateMask::from_bits(#out_bits))
        }
    });

    quote! {
        #conversions

        impl ::telefsm::FsmStates for #enum_name {
            fn table() -> ::std::vec::Vec<::telefsm::StateSpec> {
                ::std::vec![#(#rows),*]
            }
        }
    }
}
