//! `lather! { "https://example.com/service?wsdl" }` expands to the client
//! modules for every service in the referenced WSDL, generated with the
//! default options.

use proc_macro::TokenStream;
use syn::{parse_macro_input, LitStr};

#[proc_macro]
pub fn lather(input: TokenStream) -> TokenStream {
    let url = parse_macro_input!(input as LitStr);

    match lather_codegen::inline_from_url(url.value(), &lather_codegen::Options::default()) {
        Ok(tokens) => tokens.into(),
        Err(err) => syn::Error::new(url.span(), err).to_compile_error().into(),
    }
}
