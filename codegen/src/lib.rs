//! WSDL to client-code projection.
//!
//! The pipeline is parse ([`lather_wsdl`]), graph, preprocess (resolve the
//! WSDL reference web into a per-service call model), then emit one
//! self-contained module per service.

use proc_macro2::TokenStream;
use quote::quote;

use lather_wsdl::{error as wsdl_error, Definition, Namespaces, TypeGraph};

pub mod codegen;
pub mod error;
pub mod naming;
pub mod preprocessor;
pub mod types;

pub use codegen::{Codegen, Context};
pub use error::Error;
pub use types::{EnumStyle, Options, OptionalStyle};

/// One generated service module, named after its service (or the package
/// override for it).
pub struct GeneratedModule {
    pub name: String,
    pub tokens: TokenStream,
}

pub fn from_url<S: AsRef<str>>(url: S, options: &Options) -> Result<Vec<GeneratedModule>, Error> {
    let (definition, namespaces) = lather_wsdl::parse(url)?;
    from_definition(&definition, &namespaces, options)
}

pub fn from_definition(
    definition: &Definition,
    namespaces: &Namespaces,
    options: &Options,
) -> Result<Vec<GeneratedModule>, Error> {
    let graph = TypeGraph::build(definition, namespaces)?;
    check_collisions(&graph, namespaces, options)?;

    let model = preprocessor::preprocess(definition, options)?;
    let ctx = Context {
        namespaces,
        graph: &graph,
        options,
    };

    model
        .services
        .iter()
        .map(|service| {
            codegen::module_tokens(&ctx, service).map(|tokens| GeneratedModule {
                name: service.module.clone(),
                tokens,
            })
        })
        .collect()
}

/// Everything from one WSDL as a single token stream, each service wrapped
/// in its own inline module. This is what the procedural macro expands to.
pub fn inline_from_url<S: AsRef<str>>(url: S, options: &Options) -> Result<TokenStream, Error> {
    let modules = from_url(url, options)?;

    let mut tokens = TokenStream::new();
    for module in modules {
        let name = proc_macro2::Ident::new(&module.name, proc_macro2::Span::call_site());
        let body = module.tokens;
        tokens.extend(quote! {
            pub mod #name {
                #body
            }
        });
    }

    Ok(tokens)
}

/// A local name defined in two namespaces maps both to the same Rust
/// identifier; at most one of the colliding namespaces may be left without
/// a prefix mapping.
fn check_collisions(
    graph: &TypeGraph<'_>,
    namespaces: &Namespaces,
    options: &Options,
) -> Result<(), Error> {
    for (name, indices) in graph.local_name_collisions() {
        let unmapped: Vec<String> = indices
            .iter()
            .map(|index| namespaces.get(*index).to_owned())
            .filter(|uri| !options.namespace_prefixes.contains_key(uri))
            .collect();

        if unmapped.len() > 1 {
            return Err(Error::Wsdl(wsdl_error::Error::IdentifierCollision {
                name: name.to_owned(),
                namespaces: unmapped,
            }));
        }
    }

    Ok(())
}
