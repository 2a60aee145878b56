//! Code generation for the derive macros.

mod events;
mod states;

pub use events::generate_events;
pub use states::generate_states;

use proc_macro2::TokenStream;
use quote::quote;
use syn::Ident;

/// `From<Enum> for u32` and `TryFrom<u32> for Enum`, numbering variants in
/// declaration order regardless of any explicit discriminants.
fn render_id_conversions(enum_name: &Ident, variants: &[&Ident]) -> TokenStream {
    let ids: Vec<u32> = (0..variants.len() as u32).collect();

    quote! {
        impl ::core::convert::From<#enum_name> for u32 {
            fn from(value: #enum_name) -> u32 {
                match value {
                    #(#enum_name::#variants => #ids,)*
                }
            }
        }

        impl ::core::convert::TryFrom<u32> for #enum_name {
            type Error = u32;

            fn try_from(id: u32) -> ::core::result::Result<Self, u32> {
                match id {
                    #(#ids => ::core::result::Result::Ok(#enum_name::#variants),)*
                    other => ::core::result::Result::Err(other),
                }
            }
        }
    }
}
