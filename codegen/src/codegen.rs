//! Token emission. Every schema type becomes a Rust item implementing the
//! runtime codec traits; every port becomes a struct owning a configured
//! client with one method per operation.

use proc_macro2::{Ident, Span, TokenStream};
use quote::quote;
use tracing::warn;

use lather_wsdl::{
    error,
    types::{Cardinality, Field, NamespacedName, Type, TypeKind},
    Namespaces, TypeGraph,
};

use crate::{
    error::Error,
    naming,
    preprocessor::{PortModel, ServiceModel},
    types::{EnumStyle, Options, OptionalStyle},
};

const XSD_NS: &str = "http://www.w3.org/2001/XMLSchema";

pub struct Context<'a> {
    pub namespaces: &'a Namespaces,
    pub graph: &'a TypeGraph<'a>,
    pub options: &'a Options,
}

pub trait Codegen<'a> {
    fn codegen(&'a self, ctx: &Context<'a>) -> Result<TokenStream, Error>;
}

fn ident(name: &str) -> Ident {
    Ident::new(name, Span::call_site())
}

fn xsd_builtin(local: &str) -> Option<TokenStream> {
    Some(match local {
        "string" | "normalizedString" | "token" | "anyURI" | "QName" | "NMTOKEN" | "language"
        | "ID" | "IDREF" | "base64Binary" | "hexBinary" | "decimal" | "integer" | "duration"
        | "date" | "time" | "dateTime" | "gYear" | "gYearMonth" | "gMonth" | "gMonthDay"
        | "gDay" | "anyType" | "anySimpleType" => quote!(String),
        "boolean" => quote!(bool),
        "byte" => quote!(i8),
        "short" => quote!(i16),
        "int" => quote!(i32),
        "long" => quote!(i64),
        "unsignedByte" => quote!(u8),
        "unsignedShort" => quote!(u16),
        "unsignedInt" => quote!(u32),
        "unsignedLong" => quote!(u64),
        "float" => quote!(f32),
        "double" => quote!(f64),
        _ => return None,
    })
}

impl<'a> Context<'a> {
    /// Rust type name for a schema type, with the configured namespace
    /// prefix prepended when one is mapped.
    pub fn type_ident(&self, name: &NamespacedName) -> Ident {
        let local = naming::camel_case(&name.name);
        match self
            .options
            .namespace_prefixes
            .get(name.namespace(self.namespaces))
        {
            Some(prefix) => ident(&format!("{}{}", naming::camel_case(prefix), local)),
            None => ident(&local),
        }
    }

    fn rust_type(&self, name: &NamespacedName) -> Result<TokenStream, Error> {
        if name.namespace(self.namespaces) == XSD_NS {
            if let Some(builtin) = xsd_builtin(&name.name) {
                return Ok(builtin);
            }
        }

        if self.graph.contains(name) {
            let ident = self.type_ident(name);
            return Ok(quote!(#ident));
        }

        Err(Error::Wsdl(error::Error::UnresolvedReference {
            kind: "type",
            name: name.name.clone(),
        }))
    }

    fn is_abstract(&self, name: &NamespacedName) -> bool {
        matches!(
            self.graph.get(name).map(|ty| &ty.kind),
            Some(TypeKind::Struct(st)) if st.is_abstract
        )
    }

    fn qname_tokens(&self, name: &NamespacedName) -> TokenStream {
        let namespace = name.namespace(self.namespaces);
        let local = &name.name;
        quote!(QName::new(#namespace, #local))
    }

    fn field_is_optional(&self, field: &Field) -> bool {
        field.cardinality == Cardinality::Optional || field.nillable
    }

    /// A sentinel-style field still needs an `Option` when its type is a
    /// dispatch enum: serializing its zero state would assert a concrete
    /// xsi:type the caller never chose.
    fn field_style(&self, field: &Field) -> OptionalStyle {
        match self.options.optional_style {
            OptionalStyle::Sentinel if self.is_abstract(&field.ty) => OptionalStyle::Option,
            style => style,
        }
    }

    fn field_declaration(&self, field: &Field) -> Result<TokenStream, Error> {
        let name = ident(&naming::snake_case(&field.name.name));
        let base = self.rust_type(&field.ty)?;

        let ty = if field.cardinality == Cardinality::Repeated {
            quote!(Vec<#base>)
        } else if self.field_is_optional(field) {
            match self.field_style(field) {
                OptionalStyle::Option => quote!(Option<#base>),
                OptionalStyle::Pointer => quote!(Option<Box<#base>>),
                OptionalStyle::Sentinel => quote!(#base),
            }
        } else {
            quote!(#base)
        };

        Ok(quote!(pub #name: #ty,))
    }

    fn append_statement(&self, field: &Field) -> TokenStream {
        let name = ident(&naming::snake_case(&field.name.name));
        let qname = self.qname_tokens(&field.name);

        if field.cardinality == Cardinality::Repeated {
            return quote! {
                for value in &self.#name {
                    element.push(value.to_element(&#qname)?);
                }
            };
        }

        if self.field_is_optional(field) && self.field_style(field) != OptionalStyle::Sentinel {
            return quote! {
                if let Some(value) = &self.#name {
                    element.push(value.to_element(&#qname)?);
                }
            };
        }

        quote! {
            element.push(self.#name.to_element(&#qname)?);
        }
    }

    fn read_expression(&self, field: &Field) -> TokenStream {
        let name = ident(&naming::snake_case(&field.name.name));
        let qname = self.qname_tokens(&field.name);

        if field.cardinality == Cardinality::Repeated {
            return quote!(#name: children.repeated(&#qname)?,);
        }

        if self.field_is_optional(field) {
            return match self.field_style(field) {
                OptionalStyle::Option => quote!(#name: children.optional(&#qname)?,),
                OptionalStyle::Pointer => {
                    quote!(#name: children.optional(&#qname)?.map(Box::new),)
                }
                OptionalStyle::Sentinel => {
                    quote!(#name: children.optional(&#qname)?.unwrap_or_default(),)
                }
            };
        }

        quote!(#name: children.required(&#qname)?,)
    }
}

/// All fields a struct carries on the wire: inherited ones first, in
/// extension-chain order, then its own.
fn flattened_fields<'a>(ctx: &Context<'a>, ty: &'a Type) -> Result<Vec<&'a Field>, Error> {
    let mut fields = Vec::new();

    for ancestor in ctx.graph.ancestry(ty)? {
        if let TypeKind::Struct(st) = &ancestor.kind {
            fields.extend(&st.fields);
        }
    }

    Ok(fields)
}

fn struct_item(
    ctx: &Context<'_>,
    name: Ident,
    type_qname: TokenStream,
    fields: &[&Field],
) -> Result<TokenStream, Error> {
    let declarations = fields
        .iter()
        .map(|field| ctx.field_declaration(field))
        .collect::<Result<Vec<_>, _>>()?;
    let appends: Vec<_> = fields
        .iter()
        .map(|field| ctx.append_statement(field))
        .collect();
    let reads: Vec<_> = fields
        .iter()
        .map(|field| ctx.read_expression(field))
        .collect();

    Ok(quote! {
        #[derive(Debug, Clone, Default, PartialEq)]
        pub struct #name {
            #(#declarations)*
        }

        impl #name {
            fn append_fields(&self, element: &mut Element) -> Result<(), EncodingError> {
                #(#appends)*
                Ok(())
            }

            fn from_fields(children: &mut ChildReader<'_>) -> Result<Self, DecodingError> {
                Ok(Self {
                    #(#reads)*
                })
            }
        }

        impl ToXml for #name {
            fn type_name(&self) -> Option<QName> {
                Some(#type_qname)
            }

            fn to_element(&self, name: &QName) -> Result<Element, EncodingError> {
                let mut element = Element::new(name.clone());
                self.append_fields(&mut element)?;
                Ok(element)
            }
        }

        impl FromXml for #name {
            fn from_element(element: &Element) -> Result<Self, DecodingError> {
                let mut children = ChildReader::new(element);
                Self::from_fields(&mut children)
            }
        }
    })
}

fn concrete_struct<'a>(ctx: &Context<'a>, ty: &'a Type) -> Result<TokenStream, Error> {
    let fields = flattened_fields(ctx, ty)?;
    struct_item(
        ctx,
        ctx.type_ident(&ty.name),
        ctx.qname_tokens(&ty.name),
        &fields,
    )
}

fn dispatch_enum<'a>(ctx: &Context<'a>, ty: &'a Type) -> Result<TokenStream, Error> {
    let variants: Vec<&Type> = ctx
        .graph
        .derived_types(&ty.name)
        .into_iter()
        .filter(|derived| !matches!(&derived.kind, TypeKind::Struct(st) if st.is_abstract))
        .collect();

    if variants.is_empty() {
        warn!(
            name = ty.name.name.as_str(),
            "abstract type has no concrete subtypes, emitting it as a struct"
        );
        return concrete_struct(ctx, ty);
    }

    let name = ctx.type_ident(&ty.name);
    let variant_idents: Vec<Ident> = variants
        .iter()
        .map(|variant| ctx.type_ident(&variant.name))
        .collect();
    let first = &variant_idents[0];

    let decode_arms: Vec<TokenStream> = variants
        .iter()
        .zip(&variant_idents)
        .map(|(variant, ident)| {
            let namespace = variant.name.namespace(ctx.namespaces);
            let local = &variant.name.name;
            quote! {
                (#namespace, #local) => Ok(Self::#ident(#ident::from_element(element)?)),
            }
        })
        .collect();

    Ok(quote! {
        #[derive(Debug, Clone, PartialEq)]
        pub enum #name {
            #(#variant_idents(#variant_idents),)*
        }

        // The zero state is the first concrete subtype's zero state, so
        // structs with a required field of this type stay constructible
        // through `Default`.
        impl Default for #name {
            fn default() -> Self {
                Self::#first(#first::default())
            }
        }

        impl ToXml for #name {
            fn type_name(&self) -> Option<QName> {
                match self {
                    #(Self::#variant_idents(inner) => inner.type_name(),)*
                }
            }

            fn to_element(&self, name: &QName) -> Result<Element, EncodingError> {
                let mut element = match self {
                    #(Self::#variant_idents(inner) => inner.to_element(name)?,)*
                };
                element.xsi_type = self.type_name();
                Ok(element)
            }
        }

        impl FromXml for #name {
            fn from_element(element: &Element) -> Result<Self, DecodingError> {
                let xsi_type = element
                    .xsi_type
                    .as_ref()
                    .ok_or_else(|| DecodingError::MissingTypeTag(element.name.clone()))?;

                match (xsi_type.namespace.as_str(), xsi_type.local.as_str()) {
                    #(#decode_arms)*
                    _ => Err(DecodingError::UnresolvedType(xsi_type.clone())),
                }
            }
        }
    })
}

fn value_enum(ctx: &Context<'_>, ty: &Type, values: &[String]) -> TokenStream {
    let name = ctx.type_ident(&ty.name);

    if ctx.options.enum_style == EnumStyle::String || values.is_empty() {
        return quote!(pub type #name = String;);
    }

    let variant_idents: Vec<Ident> = values
        .iter()
        .map(|value| ident(&naming::camel_case(value)))
        .collect();
    let first = &variant_idents[0];

    quote! {
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub enum #name {
            #(#variant_idents,)*
            /// A value this code's schema snapshot does not list.
            Unknown(String),
        }

        impl Default for #name {
            fn default() -> Self {
                Self::#first
            }
        }

        impl ToXml for #name {
            fn to_element(&self, name: &QName) -> Result<Element, EncodingError> {
                let value = match self {
                    #(Self::#variant_idents => #values,)*
                    Self::Unknown(other) => other.as_str(),
                };
                Ok(Element::with_text(name.clone(), value))
            }
        }

        impl FromXml for #name {
            fn from_element(element: &Element) -> Result<Self, DecodingError> {
                Ok(match element.trimmed_text() {
                    #(#values => Self::#variant_idents,)*
                    other => Self::Unknown(other.to_owned()),
                })
            }
        }
    }
}

impl<'a> Codegen<'a> for Type {
    fn codegen(&'a self, ctx: &Context<'a>) -> Result<TokenStream, Error> {
        match &self.kind {
            TypeKind::Struct(st) if st.is_abstract => dispatch_enum(ctx, self),
            TypeKind::Struct(_) => concrete_struct(ctx, self),
            TypeKind::Enum(values) => Ok(value_enum(ctx, self, values)),
            TypeKind::Simple(target) | TypeKind::Alias(target) => {
                let name = ctx.type_ident(&self.name);
                let target = ctx.rust_type(target)?;
                Ok(quote!(pub type #name = #target;))
            }
        }
    }
}

/// Follows alias links to the struct type that actually defines a payload
/// element's content.
fn resolve_payload_struct<'a>(
    ctx: &Context<'a>,
    element: &'a NamespacedName,
) -> Result<&'a Type, Error> {
    let mut name = element;

    for _ in 0..16 {
        let ty = ctx.graph.get(name).ok_or_else(|| {
            Error::Wsdl(error::Error::UnresolvedReference {
                kind: "element",
                name: name.name.clone(),
            })
        })?;

        match &ty.kind {
            TypeKind::Struct(_) => return Ok(ty),
            TypeKind::Alias(target) => name = target,
            _ => break,
        }
    }

    Err(Error::Wsdl(error::Error::Unsupported {
        element: format!("element {}", element.name),
        detail: "operation wrapper must be a complex type".to_owned(),
    }))
}

/// The `Payload` impl tying a wrapper struct to its wire element name. An
/// element that aliases a named type gets a dedicated wrapper struct so
/// the element keeps its own QName.
fn payload_tokens<'a>(
    ctx: &Context<'a>,
    element: &'a NamespacedName,
) -> Result<TokenStream, Error> {
    let target = resolve_payload_struct(ctx, element)?;
    let element_qname = ctx.qname_tokens(element);
    let name = ctx.type_ident(element);

    let wrapper = if target.name == *element {
        TokenStream::new()
    } else {
        let fields = flattened_fields(ctx, target)?;
        struct_item(ctx, name.clone(), ctx.qname_tokens(&target.name), &fields)?
    };

    Ok(quote! {
        #wrapper

        impl Payload for #name {
            fn element_name() -> QName {
                #element_qname
            }
        }
    })
}

fn port_tokens(ctx: &Context<'_>, port: &PortModel<'_>) -> Result<TokenStream, Error> {
    let name = ident(&naming::camel_case(port.name));
    let location = port.location;

    let methods = port
        .operations
        .iter()
        .map(|operation| {
            let method = ident(&naming::snake_case(operation.name));
            let action = operation.action;
            let input = ctx.type_ident(operation.input);
            let output = ctx.type_ident(operation.output);

            let doc = operation.documentation.map(|text| quote!(#[doc = #text]));

            Ok(quote! {
                #doc
                pub fn #method(&self, request: &#input) -> Result<#output, lather_soap::CallError> {
                    self.client.call(#action, request)
                }
            })
        })
        .collect::<Result<Vec<_>, Error>>()?;

    Ok(quote! {
        pub struct #name {
            client: lather_soap::Client,
        }

        impl #name {
            pub const LOCATION: &'static str = #location;

            /// Connects to the address published in the service definition.
            pub fn new() -> Result<Self, lather_soap::ClientError> {
                Self::with_config(lather_soap::ClientConfig::for_endpoint(Self::LOCATION)?)
            }

            pub fn with_config(config: lather_soap::ClientConfig) -> Result<Self, lather_soap::ClientError> {
                Ok(Self {
                    client: lather_soap::Client::new(config)?,
                })
            }

            pub fn client(&self) -> &lather_soap::Client {
                &self.client
            }

            pub fn add_header(&self, fragment: std::sync::Arc<dyn lather_soap::HeaderFragment>) {
                self.client.add_header(fragment)
            }

            #(#methods)*
        }
    })
}

/// Emits one self-contained module for a service: every schema type, the
/// payload bindings for its operations, and a struct per port.
pub fn module_tokens<'a>(
    ctx: &Context<'a>,
    service: &ServiceModel<'a>,
) -> Result<TokenStream, Error> {
    let mut payload_elements: Vec<&NamespacedName> = Vec::new();
    for port in &service.ports {
        for operation in &port.operations {
            for element in [operation.input, operation.output] {
                if !payload_elements.contains(&element) {
                    payload_elements.push(element);
                }
            }
        }
    }

    // Aliased payload elements get a dedicated wrapper struct instead of
    // their `pub type` projection.
    let mut types = TokenStream::new();
    for ty in ctx.graph.topological_order()? {
        let is_aliased_payload =
            matches!(&ty.kind, TypeKind::Alias(_)) && payload_elements.contains(&&ty.name);
        if !is_aliased_payload {
            types.extend(ty.codegen(ctx)?);
        }
    }

    let mut payloads = TokenStream::new();
    for element in &payload_elements {
        payloads.extend(payload_tokens(ctx, *element)?);
    }

    let mut ports = TokenStream::new();
    for port in &service.ports {
        ports.extend(port_tokens(ctx, port)?);
    }

    Ok(quote! {
        use lather_soap::{
            ChildReader, DecodingError, Element, EncodingError, FromXml, Payload, QName, ToXml,
        };

        #types
        #payloads
        #ports
    })
}
