//! Derive macros wrapping state change and event payloads into their enums.
use proc_macro::TokenStream;
use quote::quote;
use syn::{
	parse_macro_input,
	DeriveInput,
};

/// Derive `From<T> for Event`, wrapping the payload into the variant of the same name.
#[proc_macro_derive(IntoEvent)]
pub fn into_event(input: TokenStream) -> TokenStream {
	let input = parse_macro_input!(input as DeriveInput);
	let name = input.ident;

	let expanded = quote! {
		impl From<#name> for Event {
			fn from(inner: #name) -> Event {
				Event::#name(inner)
			}
		}
	};

	TokenStream::from(expanded)
}

/// Derive `From<T> for StateChange`, wrapping the payload into the variant of the same name.
#[proc_macro_derive(IntoStateChange)]
pub fn into_state_change(input: TokenStream) -> TokenStream {
	let input = parse_macro_input!(input as DeriveInput);
	let name = input.ident;

	let expanded = quote! {
		impl From<#name> for StateChange {
			fn from(inner: #name) -> StateChange {
				StateChange::#name(inner)
			}
		}
	};

	TokenStream::from(expanded)
}
