//! Procedural macros shared by the mapcache crates.
//!
//! The only macro is [`macro@context`], which attaches a formatted message to the error of any function
//! returning `anyhow::Result`, so that failures deep inside the SQLite layer arrive at the caller as a readable
//! chain ("putting tile ... : evicting entries: database is locked").

mod args;

use crate::args::Args;
use proc_macro::TokenStream;
use proc_macro2::{Ident, Span};
use quote::{ToTokens, quote};
use syn::parse_macro_input;

/// Wraps the body of a function so that an `Err` is returned with an additional `anyhow` context.
///
/// ```ignore
/// #[context("opening offline database at '{}'", path.display())]
/// fn open(path: &Path) -> Result<OfflineDatabase> { ... }
/// ```
///
/// Prefix the format arguments with `move,` when the body has to take ownership of captured arguments.
#[proc_macro_attribute]
pub fn context(args: TokenStream, input: TokenStream) -> TokenStream {
	let Args {
		move_token,
		format_args,
	} = parse_macro_input!(args);
	let mut input = parse_macro_input!(input as syn::ItemFn);

	let body = &input.block;
	let return_type = match &input.sig.output {
		syn::ReturnType::Default => {
			return syn::Error::new_spanned(&input.sig, "#[context] requires a function returning Result")
				.to_compile_error()
				.into();
		}
		syn::ReturnType::Type(_, return_type) => return_type.clone(),
	};
	let err = Ident::new("err", Span::mixed_site());

	let new_body = if input.sig.asyncness.is_some() {
		let result = Ident::new("result", Span::mixed_site());
		quote! {
			let #result: #return_type = async #move_token { #body }.await;
			#result.map_err(|#err| #err.context(format!(#format_args)).into())
		}
	} else {
		let once = Ident::new("once", Span::mixed_site());
		quote! {
			// Owning a non-Copy value makes the closure FnOnce, so the body may move out of its arguments.
			let #once = ::core::iter::empty::<()>();
			(#move_token || -> #return_type {
				::core::mem::drop(#once);
				#body
			})().map_err(|#err| #err.context(format!(#format_args)).into())
		}
	};
	input.block.stmts = vec![syn::Stmt::Expr(syn::Expr::Verbatim(new_body), None)];

	input.into_token_stream().into()
}
