//! Attribute macros that run an `async fn` on the `core-async` runtime.
//!
//! `#[core_async::test]` and `#[core_async::main]` accept an optional
//! `flavor = "current_thread" | "multi_thread"` argument. Tests that hand
//! directory calls to blocking workers need the multi-thread flavor.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse::Parser, parse_macro_input, punctuated::Punctuated, ItemFn, Lit, Meta, Token};

#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
    expand(attr, item, MacroKind::Test)
}

#[proc_macro_attribute]
pub fn main(attr: TokenStream, item: TokenStream) -> TokenStream {
    expand(attr, item, MacroKind::Main)
}

enum MacroKind {
    Test,
    Main,
}

#[derive(Clone, Copy)]
enum Flavor {
    CurrentThread,
    MultiThread,
}

fn parse_flavor(attr: TokenStream) -> syn::Result<Flavor> {
    if attr.is_empty() {
        return Ok(Flavor::CurrentThread);
    }

    let args = Punctuated::<Meta, Token![,]>::parse_terminated.parse(attr)?;
    let mut flavor = Flavor::CurrentThread;

    for arg in args {
        let Meta::NameValue(pair) = &arg else {
            return Err(syn::Error::new_spanned(
                arg,
                "expected `flavor = \"current_thread\"` or `flavor = \"multi_thread\"`",
            ));
        };

        if !pair.path.is_ident("flavor") {
            return Err(syn::Error::new_spanned(
                &pair.path,
                "unknown core_async attribute argument",
            ));
        }

        let value = match &pair.value {
            syn::Expr::Lit(expr) => match &expr.lit {
                Lit::Str(value) => value.value(),
                other => return Err(syn::Error::new_spanned(other, "flavor must be a string")),
            },
            other => return Err(syn::Error::new_spanned(other, "flavor must be a string")),
        };

        flavor = match value.as_str() {
            "current_thread" => Flavor::CurrentThread,
            "multi_thread" => Flavor::MultiThread,
            _ => {
                return Err(syn::Error::new_spanned(
                    &pair.value,
                    "flavor must be \"current_thread\" or \"multi_thread\"",
                ))
            }
        };
    }

    Ok(flavor)
}

fn expand(attr: TokenStream, item: TokenStream, kind: MacroKind) -> TokenStream {
    let flavor = match parse_flavor(attr) {
        Ok(flavor) => flavor,
        Err(err) => return err.to_compile_error().into(),
    };

    let input = parse_macro_input!(item as ItemFn);

    if input.sig.asyncness.is_none() {
        return syn::Error::new_spanned(
            input.sig.fn_token,
            "core_async attribute macros require `async fn`",
        )
        .to_compile_error()
        .into();
    }

    let mut sync_sig = input.sig.clone();
    sync_sig.asyncness = None;

    let attrs = input.attrs;
    let vis = input.vis;
    let block = input.block;

    let runner: TokenStream2 = match flavor {
        Flavor::CurrentThread => quote!(core_async::runtime::block_on),
        Flavor::MultiThread => quote!(core_async::runtime::block_on_multi_thread),
    };

    let test_attr = match kind {
        MacroKind::Test => quote!(#[test]),
        MacroKind::Main => TokenStream2::new(),
    };

    quote! {
        #(#attrs)*
        #test_attr
        #vis #sync_sig {
            #runner(async move #block)
        }
    }
    .into()
}
