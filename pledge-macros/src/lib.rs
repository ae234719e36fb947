mod args;
use args::MainArgs;

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::parse::Parser;
use syn::punctuated::Punctuated;
use syn::{Error, Expr, ItemFn, ReturnType, Token, parse_macro_input};

const MIN_ARITY: usize = 2;
const MAX_ARITY: usize = 6;

/// Joins two to six promises of possibly different types into a promise
/// of a tuple.
///
/// `all!(a, b, c)` expands to `::pledge::tuple_all((a, b, c))`.
#[proc_macro]
pub fn all(input: TokenStream) -> TokenStream {
    let parser = Punctuated::<Expr, Token![,]>::parse_terminated;
    let promises = match parser.parse(input) {
        Ok(promises) => promises,
        Err(err) => return err.to_compile_error().into(),
    };

    let count = promises.len();
    if !(MIN_ARITY..=MAX_ARITY).contains(&count) {
        let message = format!(
            "all! takes between {MIN_ARITY} and {MAX_ARITY} promises, got {count}; \
             use Promise::all for a list"
        );

        return Error::new(proc_macro2::Span::call_site(), message)
            .to_compile_error()
            .into();
    }

    let promises = promises.iter();

    quote! {
        ::pledge::tuple_all((#(#promises,)*))
    }
    .into()
}

/// Runs `main` on a fresh event loop.
///
/// The body must evaluate to a `Promise`. The loop is driven until that
/// promise settles. If `main` declares a return type, it receives the
/// `pledge::Result`; otherwise a rejection panics.
///
/// Accepted options: `name = "..."`, `worker_name_prefix = "..."` and
/// `worker_stack_size = N`.
#[proc_macro_attribute]
pub fn main(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as MainArgs);
    let input = parse_macro_input!(item as ItemFn);

    if let Some(asyncness) = input.sig.asyncness {
        return Error::new_spanned(
            asyncness,
            "#[pledge::main] expects a plain fn whose body evaluates to a Promise",
        )
        .to_compile_error()
        .into();
    }

    if input.sig.ident != "main" {
        return Error::new_spanned(&input.sig.ident, "#[pledge::main] must be used on fn main")
            .to_compile_error()
            .into();
    }

    let mut builder = quote!(::pledge::EventLoop::builder());

    if let Some(name) = &args.name {
        builder = quote!(#builder.name(#name));
    }

    if let Some(prefix) = &args.worker_name_prefix {
        builder = quote!(#builder.worker_name_prefix(#prefix));
    }

    if let Some(size) = &args.worker_stack_size {
        builder = quote!(#builder.worker_stack_size(#size));
    }

    drive(input, quote!(#builder.build()), false)
}

/// Runs a test body on a fresh event loop.
///
/// The body must evaluate to a `Promise`; the test fails if it rejects or
/// if the loop runs out of work before it settles.
#[proc_macro_attribute]
pub fn test(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);

    if let Some(asyncness) = input.sig.asyncness {
        return Error::new_spanned(
            asyncness,
            "#[pledge::test] expects a plain fn whose body evaluates to a Promise",
        )
        .to_compile_error()
        .into();
    }

    drive(input, quote!(::pledge::EventLoop::new()), true)
}

/// Rewrites `input` so its body is passed to `block_on` on `event_loop`.
fn drive(input: ItemFn, event_loop: TokenStream2, is_test: bool) -> TokenStream {
    let attrs = &input.attrs;
    let vis = &input.vis;
    let sig = &input.sig;
    let block = &input.block;

    let test_attr = is_test.then(|| quote!(#[::core::prelude::v1::test]));

    let body = match &sig.output {
        ReturnType::Type(..) => quote! {
            #event_loop.block_on(move || #block)
        },
        ReturnType::Default => quote! {
            if let ::core::result::Result::Err(error) = #event_loop.block_on(move || #block) {
                ::core::panic!("promise rejected: {error}");
            }
        },
    };

    quote! {
        #test_attr
        #(#attrs)*
        #vis #sig {
            #body
        }
    }
    .into()
}
