use quick_xml::{
    events::{attributes::Attributes, BytesStart, BytesText, Event},
    Reader,
};
use std::{
    collections::HashMap,
    io::{BufRead, BufReader},
};
use tracing::{debug, trace};
use url::Url;

use super::{
    error,
    types::{
        Binding, BindingOperation, Cardinality, Definition, Field, Message, NamespacedName,
        Namespaces, Operation, Part, Port, PortType, Service, StructType, Type, TypeKind,
    },
};

const WSDL_SOAP_NS: &str = "http://schemas.xmlsoap.org/wsdl/soap/";
const WSDL_SOAP12_NS: &str = "http://schemas.xmlsoap.org/wsdl/soap12/";

fn get_attributes<B: BufRead, const N: usize>(
    reader: &Reader<B>,
    attributes: Attributes<'_>,
    names: [&'static str; N],
) -> Result<[Option<String>; N], error::Error> {
    const INIT: Option<String> = None;
    let mut result = [INIT; N];

    for attribute in attributes {
        let attribute = attribute?;
        let key = reader.decode(attribute.key)?;

        for (index, name) in names.iter().enumerate() {
            if key == *name {
                result[index] = Some(reader.decode(attribute.value.as_ref())?.to_owned());
                break;
            }
        }
    }

    Ok(result)
}

fn require(
    value: Option<String>,
    element: &'static str,
    attribute: &'static str,
) -> Result<String, error::Error> {
    value.ok_or(error::Error::MissingAttribute { element, attribute })
}

fn split_namespaced_name(prefixed_name: &str) -> (Option<&str>, &str) {
    match prefixed_name.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, prefixed_name),
    }
}

#[derive(Clone, Default)]
struct CurrentNamespaces {
    target: Vec<String>,
    namespaces: HashMap<Option<String>, String>,
}

struct Parser {
    root: Url,

    definition: Definition,
    namespaces: Namespaces,
    current_namespaces: CurrentNamespaces,
}

#[derive(Debug)]
enum ParseState {
    Definitions,

    Types,
    Schema,
    Element {
        name: String,
        kind: Option<TypeKind>,
    },
    ComplexType {
        name: Option<String>,
        is_abstract: bool,
        base: Option<NamespacedName>,
        fields: Option<Vec<Field>>,
        simple_alias: Option<NamespacedName>,
    },
    ComplexContent {
        base: Option<NamespacedName>,
        fields: Vec<Field>,
    },
    ComplexExtension {
        base: NamespacedName,
        fields: Vec<Field>,
    },
    SimpleContent {
        ty: Option<NamespacedName>,
    },
    SimpleExtension {
        ty: NamespacedName,
    },
    Sequence(Vec<Field>),
    SequenceElement {
        name: String,
        ty: Option<NamespacedName>,
        cardinality: Cardinality,
        nillable: bool,
        inner: Option<TypeKind>,
    },
    SimpleType {
        name: Option<String>,
        kind: Option<TypeKind>,
    },
    Restriction {
        base: NamespacedName,
        values: Vec<String>,
    },
    Enumeration {
        value: String,
    },

    Message {
        name: String,
        parts: Vec<Part>,
    },
    MessagePart {
        name: String,
        element: NamespacedName,
    },

    PortType {
        name: String,
        operations: Vec<Operation>,
    },
    Operation {
        name: String,
        documentation: Option<String>,
        input: Option<NamespacedName>,
        output: Option<NamespacedName>,
    },
    Documentation(Option<String>),
    Input {
        message: NamespacedName,
    },
    Output {
        message: NamespacedName,
    },

    Binding {
        name: String,
        ty: NamespacedName,
        transport: Option<String>,
        style: Option<String>,
        operations: Vec<BindingOperation>,
    },
    SoapBinding {
        transport: String,
        style: Option<String>,
    },
    BindingOperation {
        name: String,
        action: Option<String>,
        style: Option<String>,
        input_use: Option<String>,
        output_use: Option<String>,
    },
    SoapOperation {
        action: String,
        style: Option<String>,
    },
    BindingInput {
        body_use: Option<String>,
    },
    BindingOutput {
        body_use: Option<String>,
    },
    BindingBody {
        body_use: String,
    },

    Service {
        name: String,
        ports: Vec<Port>,
    },
    Port {
        name: String,
        binding: NamespacedName,
        address: Option<String>,
    },
    Address {
        location: String,
    },

    Import {
        namespace: Option<String>,
    },

    Other(String),
}

impl CurrentNamespaces {
    fn push_target_namespace(&mut self, namespace: String) {
        self.target.push(namespace);
    }

    fn pop_target_namespace(&mut self) {
        self.target.pop();
    }

    fn add_namespace_prefix(&mut self, prefix: Option<String>, namespace: &str) {
        self.namespaces.insert(prefix, namespace.to_owned());
    }

    fn target_namespaced(
        &self,
        namespaces: &mut Namespaces,
        name: String,
    ) -> Result<NamespacedName, error::Error> {
        match self.target.last() {
            Some(target) => Ok(NamespacedName::new(namespaces, target, name)),
            None => Err(error::Error::MissingTargetNamespace),
        }
    }

    fn resolved_prefix(
        &self,
        namespaces: &mut Namespaces,
        prefix: Option<String>,
        name: String,
    ) -> Result<NamespacedName, error::Error> {
        match self.namespaces.get(&prefix) {
            Some(value) => Ok(NamespacedName::new(namespaces, value, name)),
            // Unprefixed names without a default binding, and the
            // conventional `tns`, resolve against the target namespace.
            None if prefix.is_none() || prefix.as_deref() == Some("tns") => {
                self.target_namespaced(namespaces, name)
            }
            None => Err(error::Error::UnknownPrefix(prefix.unwrap_or_default())),
        }
    }
}

impl Parser {
    fn new(url: Url) -> Self {
        Self {
            root: url.clone(),

            definition: Default::default(),
            namespaces: Default::default(),
            current_namespaces: Default::default(),
        }
    }

    fn push_target_namespace(&mut self, namespace: String) {
        self.current_namespaces.push_target_namespace(namespace);
    }

    fn pop_target_namespace(&mut self) {
        self.current_namespaces.pop_target_namespace();
    }

    fn add_namespace_prefix(&mut self, prefix: Option<String>, namespace: &str) {
        self.current_namespaces
            .add_namespace_prefix(prefix, namespace);
    }

    fn target_namespaced(&mut self, name: String) -> Result<NamespacedName, error::Error> {
        self.current_namespaces
            .target_namespaced(&mut self.namespaces, name)
    }

    fn resolve_namespace(&mut self, prefixed_name: &str) -> Result<NamespacedName, error::Error> {
        let (prefix, local_name) = split_namespaced_name(prefixed_name);
        self.current_namespaces.resolved_prefix(
            &mut self.namespaces,
            prefix.map(ToOwned::to_owned),
            local_name.to_owned(),
        )
    }

    fn parse(mut self) -> Result<(Definition, Namespaces), error::Error> {
        self.parse_url(self.root.clone())?;
        Ok((self.definition, self.namespaces))
    }

    fn parse_url(&mut self, url: Url) -> Result<(), error::Error> {
        debug!(%url, "parsing document");

        match url.scheme() {
            "file" => self.parse_xml(
                Reader::from_file(
                    url.to_file_path()
                        .map_err(|()| error::Error::PathConversionError(None))?,
                )
                .map_err(error::Error::FileOpenError)?,
            ),

            "http" | "https" => self.parse_xml(Reader::from_reader(BufReader::new(
                reqwest::blocking::get(url)?,
            ))),

            other => Err(error::Error::UnsupportedScheme(other.into())),
        }
    }

    fn parse_xml<B: BufRead>(&mut self, mut reader: Reader<B>) -> Result<(), error::Error> {
        reader.trim_text(true);

        let mut stack = Vec::new();
        let mut buffer = Vec::new();
        let mut namespace_buffer = Vec::new();

        loop {
            buffer.clear();

            let (namespace, event) =
                reader.read_namespaced_event(&mut buffer, &mut namespace_buffer)?;

            match event {
                Event::Decl(..) | Event::Comment(..) => (),

                Event::Start(start) => self.handle_start(&mut stack, &reader, start, namespace)?,
                Event::End(..) => self.handle_end(&mut stack)?,

                Event::Empty(start) => {
                    self.handle_start(&mut stack, &reader, start, namespace)?;
                    self.handle_end(&mut stack)?;
                }

                Event::Text(text) => self.handle_text(&mut stack, &reader, text)?,

                Event::Eof => break,

                event => trace!(?event, "skipping event"),
            }
        }

        Ok(())
    }

    fn handle_start<B: BufRead>(
        &mut self,
        stack: &mut Vec<ParseState>,
        reader: &Reader<B>,
        start: BytesStart<'_>,
        namespace_bytes: Option<&[u8]>,
    ) -> Result<(), error::Error> {
        let (prefix, local_name) = split_namespaced_name(reader.decode(start.name())?);
        let element_namespace = namespace_bytes.and_then(|ns| std::str::from_utf8(ns).ok());

        let state = stack.pop();
        let mut new_state = Some(ParseState::Other(local_name.to_owned()));

        for attribute in start.attributes() {
            let attribute = attribute?;
            let key = reader.decode(attribute.key)?;
            let (key_prefix, key_local) = split_namespaced_name(key);

            if key_prefix == Some("xmlns") {
                self.add_namespace_prefix(
                    Some(key_local.to_owned()),
                    reader.decode(attribute.value.as_ref())?,
                );
            } else if key_prefix.is_none() && key_local == "xmlns" {
                self.add_namespace_prefix(None, reader.decode(attribute.value.as_ref())?);
            }
        }

        match state {
            None => match local_name {
                "definitions" => {
                    let [namespace] =
                        get_attributes(reader, start.attributes(), ["targetNamespace"])?;
                    let namespace = require(namespace, "definitions", "targetNamespace")?;
                    self.push_target_namespace(namespace);
                    new_state = Some(ParseState::Definitions)
                }

                // A bare XSD reached through an import.
                "schema" => {
                    let [namespace] =
                        get_attributes(reader, start.attributes(), ["targetNamespace"])?;
                    let namespace = require(namespace, "schema", "targetNamespace")?;
                    self.push_target_namespace(namespace);
                    if let Some(element_namespace) = element_namespace {
                        self.add_namespace_prefix(
                            prefix.map(ToOwned::to_owned),
                            element_namespace,
                        );
                    }
                    new_state = Some(ParseState::Schema)
                }

                other => {
                    return Err(error::Error::UnexpectedElement {
                        context: "document root",
                        found: other.to_owned(),
                    })
                }
            },

            Some(ParseState::Definitions) => match local_name {
                "import" => {
                    let [location, namespace] =
                        get_attributes(reader, start.attributes(), ["location", "namespace"])?;

                    if let Some(location) = location {
                        self.parse_url(self.root.join(&location)?)?;
                    }

                    new_state = Some(ParseState::Import { namespace });
                }

                "types" => new_state = Some(ParseState::Types),

                "message" => {
                    let [name] = get_attributes(reader, start.attributes(), ["name"])?;
                    new_state = Some(ParseState::Message {
                        name: require(name, "message", "name")?,
                        parts: Vec::new(),
                    });
                }

                "portType" => {
                    let [name] = get_attributes(reader, start.attributes(), ["name"])?;
                    new_state = Some(ParseState::PortType {
                        name: require(name, "portType", "name")?,
                        operations: Vec::new(),
                    });
                }

                "binding" => {
                    let [name, ty] = get_attributes(reader, start.attributes(), ["name", "type"])?;
                    let ty = self.resolve_namespace(&require(ty, "binding", "type")?)?;
                    new_state = Some(ParseState::Binding {
                        name: require(name, "binding", "name")?,
                        ty,
                        transport: None,
                        style: None,
                        operations: Vec::new(),
                    });
                }

                "service" => {
                    let [name] = get_attributes(reader, start.attributes(), ["name"])?;
                    new_state = Some(ParseState::Service {
                        name: require(name, "service", "name")?,
                        ports: Vec::new(),
                    });
                }

                other => debug!(element = other, "skipping element in definitions"),
            },

            Some(ParseState::Types) => match local_name {
                "schema" => {
                    let [namespace] =
                        get_attributes(reader, start.attributes(), ["targetNamespace"])?;
                    let namespace = require(namespace, "schema", "targetNamespace")?;
                    self.push_target_namespace(namespace);
                    if let Some(element_namespace) = element_namespace {
                        self.add_namespace_prefix(
                            prefix.map(ToOwned::to_owned),
                            element_namespace,
                        );
                    }
                    new_state = Some(ParseState::Schema)
                }

                other => debug!(element = other, "skipping element in types"),
            },

            Some(ParseState::Schema) => match local_name {
                "element" => {
                    let [name, ty] = get_attributes(reader, start.attributes(), ["name", "type"])?;
                    let name = require(name, "element", "name")?;
                    let kind = match ty {
                        Some(ty) => Some(TypeKind::Alias(self.resolve_namespace(&ty)?)),
                        None => None,
                    };
                    new_state = Some(ParseState::Element { name, kind })
                }

                "complexType" => {
                    let [name, is_abstract] =
                        get_attributes(reader, start.attributes(), ["name", "abstract"])?;
                    new_state = Some(ParseState::ComplexType {
                        name: Some(require(name, "complexType", "name")?),
                        is_abstract: is_abstract.as_deref() == Some("true"),
                        base: None,
                        fields: None,
                        simple_alias: None,
                    });
                }

                "simpleType" => {
                    let [name] = get_attributes(reader, start.attributes(), ["name"])?;
                    new_state = Some(ParseState::SimpleType {
                        name: Some(require(name, "simpleType", "name")?),
                        kind: None,
                    })
                }

                "include" | "import" => {
                    let [location, namespace] = get_attributes(
                        reader,
                        start.attributes(),
                        ["schemaLocation", "namespace"],
                    )?;

                    if let Some(location) = location {
                        self.parse_url(self.root.join(&location)?)?;
                    }

                    new_state = Some(ParseState::Import { namespace });
                }

                other => debug!(element = other, "skipping element in schema"),
            },

            Some(ParseState::Element { .. }) => match local_name {
                "complexType" => {
                    let [is_abstract] = get_attributes(reader, start.attributes(), ["abstract"])?;
                    new_state = Some(ParseState::ComplexType {
                        name: None,
                        is_abstract: is_abstract.as_deref() == Some("true"),
                        base: None,
                        fields: None,
                        simple_alias: None,
                    })
                }

                other => debug!(element = other, "skipping element in element"),
            },

            Some(ParseState::ComplexType { .. }) => match local_name {
                "sequence" | "all" => new_state = Some(ParseState::Sequence(Vec::new())),

                "simpleContent" => new_state = Some(ParseState::SimpleContent { ty: None }),

                "complexContent" => {
                    new_state = Some(ParseState::ComplexContent {
                        base: None,
                        fields: Vec::new(),
                    })
                }

                other => debug!(element = other, "skipping element in complexType"),
            },

            Some(ParseState::ComplexContent { .. }) => match local_name {
                "extension" => {
                    let [base] = get_attributes(reader, start.attributes(), ["base"])?;
                    let base = self.resolve_namespace(&require(base, "extension", "base")?)?;
                    new_state = Some(ParseState::ComplexExtension {
                        base,
                        fields: Vec::new(),
                    });
                }

                "restriction" => {
                    return Err(error::Error::Unsupported {
                        element: "complexContent/restriction".to_owned(),
                        detail: "complex-content restriction is not supported".to_owned(),
                    })
                }

                other => debug!(element = other, "skipping element in complexContent"),
            },

            Some(ParseState::ComplexExtension { .. }) => match local_name {
                "sequence" | "all" => new_state = Some(ParseState::Sequence(Vec::new())),

                other => debug!(element = other, "skipping element in extension"),
            },

            Some(ParseState::SimpleContent { .. }) => match local_name {
                "extension" => {
                    let [base] = get_attributes(reader, start.attributes(), ["base"])?;
                    let ty = self.resolve_namespace(&require(base, "extension", "base")?)?;
                    new_state = Some(ParseState::SimpleExtension { ty });
                }

                other => debug!(element = other, "skipping element in simpleContent"),
            },

            Some(ParseState::SimpleExtension { .. }) => {
                debug!(element = local_name, "skipping element in simple extension")
            }

            Some(ParseState::SimpleType { .. }) => match local_name {
                "restriction" => {
                    let [base] = get_attributes(reader, start.attributes(), ["base"])?;
                    let base = self.resolve_namespace(&require(base, "restriction", "base")?)?;
                    new_state = Some(ParseState::Restriction {
                        base,
                        values: Vec::new(),
                    });
                }

                other => debug!(element = other, "skipping element in simpleType"),
            },

            Some(ParseState::Restriction { .. }) => match local_name {
                "enumeration" => {
                    let [value] = get_attributes(reader, start.attributes(), ["value"])?;
                    new_state = Some(ParseState::Enumeration {
                        value: require(value, "enumeration", "value")?,
                    });
                }

                // Length/pattern facets do not affect the projection.
                other => debug!(element = other, "skipping facet in restriction"),
            },

            Some(ParseState::Enumeration { .. }) => {
                debug!(element = local_name, "skipping element in enumeration")
            }

            Some(ParseState::Sequence(_)) => match local_name {
                "element" => {
                    let [name, ty, min_occurs, max_occurs, nillable] = get_attributes(
                        reader,
                        start.attributes(),
                        ["name", "type", "minOccurs", "maxOccurs", "nillable"],
                    )?;

                    let name = require(name, "element", "name")?;
                    let ty = match ty {
                        Some(ty) => Some(self.resolve_namespace(&ty)?),
                        None => None,
                    };

                    new_state = Some(ParseState::SequenceElement {
                        name,
                        ty,
                        cardinality: Cardinality::from_occurs(
                            min_occurs.as_deref(),
                            max_occurs.as_deref(),
                        ),
                        nillable: nillable.as_deref() == Some("true"),
                        inner: None,
                    });
                }

                other => debug!(element = other, "skipping element in sequence"),
            },

            Some(ParseState::SequenceElement { .. }) => match local_name {
                "complexType" => {
                    let [is_abstract] = get_attributes(reader, start.attributes(), ["abstract"])?;
                    new_state = Some(ParseState::ComplexType {
                        name: None,
                        is_abstract: is_abstract.as_deref() == Some("true"),
                        base: None,
                        fields: None,
                        simple_alias: None,
                    })
                }

                "simpleType" => new_state = Some(ParseState::SimpleType { name: None, kind: None }),

                other => debug!(element = other, "skipping element in sequence element"),
            },

            Some(ParseState::Message { .. }) => match local_name {
                "part" => {
                    let [name, element] =
                        get_attributes(reader, start.attributes(), ["name", "element"])?;

                    let name = require(name, "part", "name")?;
                    let element = match element {
                        Some(element) => self.resolve_namespace(&element)?,
                        // A `type` part means the binding is not
                        // wrapped-document/literal.
                        None => {
                            return Err(error::Error::Unsupported {
                                element: format!("part \"{}\"", name),
                                detail: "message parts must reference an element".to_owned(),
                            })
                        }
                    };

                    new_state = Some(ParseState::MessagePart { name, element });
                }

                other => debug!(element = other, "skipping element in message"),
            },

            Some(ParseState::MessagePart { .. }) => {
                debug!(element = local_name, "skipping element in part")
            }

            Some(ParseState::PortType { .. }) => match local_name {
                "operation" => {
                    let [name] = get_attributes(reader, start.attributes(), ["name"])?;
                    new_state = Some(ParseState::Operation {
                        name: require(name, "operation", "name")?,
                        documentation: None,
                        input: None,
                        output: None,
                    })
                }

                other => debug!(element = other, "skipping element in portType"),
            },

            Some(ParseState::Operation { .. }) => match local_name {
                "documentation" => new_state = Some(ParseState::Documentation(None)),

                "input" | "output" => {
                    let [message] = get_attributes(reader, start.attributes(), ["message"])?;
                    let element = if local_name == "input" { "input" } else { "output" };
                    let message = self.resolve_namespace(&require(message, element, "message")?)?;

                    if local_name == "input" {
                        new_state = Some(ParseState::Input { message })
                    } else {
                        new_state = Some(ParseState::Output { message })
                    }
                }

                other => debug!(element = other, "skipping element in operation"),
            },

            Some(ParseState::Documentation(_)) => {
                debug!(element = local_name, "skipping element in documentation")
            }

            Some(ParseState::Input { .. } | ParseState::Output { .. }) => {
                debug!(element = local_name, "skipping element in operation message")
            }

            Some(ParseState::Binding { .. }) => match local_name {
                "binding" => {
                    if element_namespace == Some(WSDL_SOAP12_NS) {
                        return Err(error::Error::Unsupported {
                            element: "binding".to_owned(),
                            detail: "SOAP 1.2 bindings are not supported".to_owned(),
                        });
                    }
                    if element_namespace != Some(WSDL_SOAP_NS) {
                        return Err(error::Error::Unsupported {
                            element: "binding".to_owned(),
                            detail: format!(
                                "unrecognized binding namespace {:?}",
                                element_namespace.unwrap_or("")
                            ),
                        });
                    }

                    let [transport, style] =
                        get_attributes(reader, start.attributes(), ["transport", "style"])?;
                    new_state = Some(ParseState::SoapBinding {
                        transport: require(transport, "binding", "transport")?,
                        style,
                    })
                }

                "operation" => {
                    let [name] = get_attributes(reader, start.attributes(), ["name"])?;
                    new_state = Some(ParseState::BindingOperation {
                        name: require(name, "operation", "name")?,
                        action: None,
                        style: None,
                        input_use: None,
                        output_use: None,
                    })
                }

                other => debug!(element = other, "skipping element in binding"),
            },

            Some(ParseState::SoapBinding { .. }) => {
                debug!(element = local_name, "skipping element in soap binding")
            }

            Some(ParseState::BindingOperation { .. }) => match local_name {
                "operation" => {
                    let [action, style] =
                        get_attributes(reader, start.attributes(), ["soapAction", "style"])?;
                    new_state = Some(ParseState::SoapOperation {
                        // Absent soapAction means the empty action.
                        action: action.unwrap_or_default(),
                        style,
                    });
                }

                "input" => new_state = Some(ParseState::BindingInput { body_use: None }),
                "output" => new_state = Some(ParseState::BindingOutput { body_use: None }),

                other => debug!(element = other, "skipping element in binding operation"),
            },

            Some(ParseState::SoapOperation { .. }) => {
                debug!(element = local_name, "skipping element in soap operation")
            }

            Some(ParseState::BindingInput { .. } | ParseState::BindingOutput { .. }) => {
                match local_name {
                    "body" => {
                        let [body_use] = get_attributes(reader, start.attributes(), ["use"])?;
                        new_state = Some(ParseState::BindingBody {
                            body_use: require(body_use, "body", "use")?,
                        });
                    }

                    other => debug!(element = other, "skipping element in binding body"),
                }
            }

            Some(ParseState::BindingBody { .. }) => {
                debug!(element = local_name, "skipping element in body")
            }

            Some(ParseState::Service { .. }) => match local_name {
                "port" => {
                    let [name, binding] =
                        get_attributes(reader, start.attributes(), ["name", "binding"])?;
                    let binding = self.resolve_namespace(&require(binding, "port", "binding")?)?;
                    new_state = Some(ParseState::Port {
                        name: require(name, "port", "name")?,
                        binding,
                        address: None,
                    });
                }

                other => debug!(element = other, "skipping element in service"),
            },

            Some(ParseState::Port { .. }) => match local_name {
                "address" => {
                    let [location] = get_attributes(reader, start.attributes(), ["location"])?;
                    new_state = Some(ParseState::Address {
                        location: require(location, "address", "location")?,
                    })
                }

                other => debug!(element = other, "skipping element in port"),
            },

            Some(ParseState::Address { .. }) => {
                debug!(element = local_name, "skipping element in address")
            }

            Some(ParseState::Import { .. }) => {
                debug!(element = local_name, "skipping element in import")
            }

            Some(ParseState::Other(ref name)) => {
                trace!(element = local_name, context = name.as_str(), "skipping element");
            }
        }

        stack.extend(state);
        stack.extend(new_state);

        Ok(())
    }

    fn handle_end(&mut self, stack: &mut Vec<ParseState>) -> Result<(), error::Error> {
        let finished_state = stack.pop();
        let mut next_state = stack.pop();

        match finished_state {
            Some(ParseState::Definitions | ParseState::Schema) => self.pop_target_namespace(),

            Some(ParseState::Element { name, kind }) => {
                let kind = kind.ok_or(error::Error::MissingAttribute {
                    element: "element",
                    attribute: "type",
                })?;
                let name = self.target_namespaced(name)?;
                self.definition.types.push(Type { name, kind })
            }

            Some(ParseState::ComplexType {
                name,
                is_abstract,
                base,
                fields,
                simple_alias,
            }) => {
                let kind = match simple_alias {
                    Some(alias) => TypeKind::Alias(alias),
                    None => TypeKind::Struct(StructType {
                        base,
                        is_abstract,
                        fields: fields.unwrap_or_default(),
                    }),
                };

                match next_state {
                    Some(ParseState::SequenceElement { ref mut inner, .. }) => {
                        // Anonymous inline type; the field hoists it under
                        // its own element name on close.
                        *inner = Some(kind);
                        if let Some(name) = name {
                            debug!(name = name.as_str(), "ignoring name on inline complexType");
                        }
                    }

                    Some(ParseState::Element {
                        kind: ref mut element_kind,
                        ..
                    }) => *element_kind = Some(kind),

                    _ => {
                        let name = name.ok_or(error::Error::MissingAttribute {
                            element: "complexType",
                            attribute: "name",
                        })?;
                        let name = self.target_namespaced(name)?;
                        self.definition.types.push(Type { name, kind })
                    }
                }
            }

            Some(ParseState::ComplexContent { base, fields }) => match next_state {
                Some(ParseState::ComplexType {
                    base: ref mut ty_base,
                    fields: ref mut ty_fields,
                    ..
                }) => {
                    *ty_base = base;
                    *ty_fields = Some(fields);
                }

                _ => {
                    return Err(error::Error::UnexpectedElement {
                        context: "complexContent",
                        found: "(misplaced)".to_owned(),
                    })
                }
            },

            Some(ParseState::ComplexExtension { base, fields }) => match next_state {
                Some(ParseState::ComplexContent {
                    base: ref mut content_base,
                    fields: ref mut content_fields,
                }) => {
                    *content_base = Some(base);
                    content_fields.extend(fields);
                }

                _ => {
                    return Err(error::Error::UnexpectedElement {
                        context: "extension",
                        found: "(misplaced)".to_owned(),
                    })
                }
            },

            Some(ParseState::SimpleContent { ty }) => match next_state {
                Some(ParseState::ComplexType {
                    ref mut simple_alias,
                    ..
                }) => *simple_alias = ty,

                _ => {
                    return Err(error::Error::UnexpectedElement {
                        context: "simpleContent",
                        found: "(misplaced)".to_owned(),
                    })
                }
            },

            Some(ParseState::SimpleExtension { ty: base }) => match next_state {
                Some(ParseState::SimpleContent { ref mut ty }) => *ty = Some(base),

                _ => {
                    return Err(error::Error::UnexpectedElement {
                        context: "extension",
                        found: "(misplaced)".to_owned(),
                    })
                }
            },

            Some(ParseState::SimpleType { name, kind }) => {
                let kind = kind.ok_or(error::Error::MissingAttribute {
                    element: "simpleType",
                    attribute: "restriction",
                })?;

                match next_state {
                    Some(ParseState::SequenceElement { ref mut inner, .. }) => {
                        *inner = Some(kind)
                    }

                    _ => {
                        let name = name.ok_or(error::Error::MissingAttribute {
                            element: "simpleType",
                            attribute: "name",
                        })?;
                        let name = self.target_namespaced(name)?;
                        self.definition.types.push(Type { name, kind })
                    }
                }
            }

            Some(ParseState::Restriction { base, values }) => match next_state {
                Some(ParseState::SimpleType { ref mut kind, .. }) => {
                    *kind = Some(if values.is_empty() {
                        TypeKind::Simple(base)
                    } else {
                        TypeKind::Enum(values)
                    })
                }

                _ => {
                    return Err(error::Error::UnexpectedElement {
                        context: "restriction",
                        found: "(misplaced)".to_owned(),
                    })
                }
            },

            Some(ParseState::Enumeration { value }) => match next_state {
                Some(ParseState::Restriction { ref mut values, .. }) => values.push(value),

                _ => {
                    return Err(error::Error::UnexpectedElement {
                        context: "enumeration",
                        found: "(misplaced)".to_owned(),
                    })
                }
            },

            Some(ParseState::Sequence(fields)) => match next_state {
                Some(ParseState::ComplexType {
                    fields: ref mut ty_fields,
                    ..
                }) if ty_fields.is_none() => *ty_fields = Some(fields),

                Some(ParseState::ComplexExtension {
                    fields: ref mut extension_fields,
                    ..
                }) => extension_fields.extend(fields),

                _ => {
                    return Err(error::Error::UnexpectedElement {
                        context: "sequence",
                        found: "(misplaced)".to_owned(),
                    })
                }
            },

            Some(ParseState::SequenceElement {
                name,
                ty,
                cardinality,
                nillable,
                inner,
            }) => {
                let field_name = self.target_namespaced(name.clone())?;

                let ty = match (ty, inner) {
                    (Some(ty), _) => ty,
                    (None, Some(kind)) => {
                        // Hoist the anonymous type under the element name.
                        let hoisted = self.target_namespaced(name)?;
                        self.definition.types.push(Type {
                            name: hoisted.clone(),
                            kind,
                        });
                        hoisted
                    }
                    (None, None) => {
                        return Err(error::Error::MissingAttribute {
                            element: "element",
                            attribute: "type",
                        })
                    }
                };

                match next_state {
                    Some(ParseState::Sequence(ref mut fields)) => fields.push(Field {
                        name: field_name,
                        ty,
                        cardinality,
                        nillable,
                    }),
                    _ => {
                        return Err(error::Error::UnexpectedElement {
                            context: "element",
                            found: "(misplaced)".to_owned(),
                        })
                    }
                }
            }

            Some(ParseState::Message { name, parts }) => {
                let name = self.target_namespaced(name)?;
                self.definition.messages.push(Message { name, parts })
            }

            Some(ParseState::MessagePart { name, element }) => match next_state {
                Some(ParseState::Message { ref mut parts, .. }) => {
                    parts.push(Part { name, element })
                }
                _ => {
                    return Err(error::Error::UnexpectedElement {
                        context: "part",
                        found: "(misplaced)".to_owned(),
                    })
                }
            },

            Some(ParseState::PortType { name, operations }) => {
                let name = self.target_namespaced(name)?;
                self.definition
                    .port_types
                    .push(PortType { name, operations })
            }

            Some(ParseState::Operation {
                name,
                input,
                output,
                documentation,
            }) => match next_state {
                Some(ParseState::PortType {
                    ref mut operations, ..
                }) => {
                    let name = self.target_namespaced(name)?;
                    operations.push(Operation {
                        name,
                        input,
                        output,
                        documentation,
                    })
                }
                _ => {
                    return Err(error::Error::UnexpectedElement {
                        context: "operation",
                        found: "(misplaced)".to_owned(),
                    })
                }
            },

            Some(ParseState::Documentation(text)) => match next_state {
                Some(ParseState::Operation {
                    ref mut documentation,
                    ..
                }) => *documentation = text,
                _ => (),
            },

            Some(ParseState::Input { message }) => match next_state {
                Some(ParseState::Operation { ref mut input, .. }) if input.is_none() => {
                    *input = Some(message)
                }
                _ => {
                    return Err(error::Error::UnexpectedElement {
                        context: "input",
                        found: "(misplaced)".to_owned(),
                    })
                }
            },

            Some(ParseState::Output { message }) => match next_state {
                Some(ParseState::Operation { ref mut output, .. }) if output.is_none() => {
                    *output = Some(message)
                }
                _ => {
                    return Err(error::Error::UnexpectedElement {
                        context: "output",
                        found: "(misplaced)".to_owned(),
                    })
                }
            },

            Some(ParseState::SoapBinding { transport, style }) => match next_state {
                Some(ParseState::Binding {
                    transport: ref mut binding_transport,
                    style: ref mut binding_style,
                    ..
                }) => {
                    *binding_transport = Some(transport);
                    *binding_style = style;
                }
                _ => {
                    return Err(error::Error::UnexpectedElement {
                        context: "binding",
                        found: "(misplaced)".to_owned(),
                    })
                }
            },

            Some(ParseState::Binding {
                name,
                ty,
                transport,
                style,
                operations,
            }) => {
                let name = self.target_namespaced(name)?;
                self.definition.bindings.push(Binding {
                    name,
                    ty,
                    transport: require(transport, "binding", "transport")?,
                    style,
                    operations,
                })
            }

            Some(ParseState::BindingOperation {
                name,
                action,
                style,
                input_use,
                output_use,
            }) => match next_state {
                Some(ParseState::Binding {
                    ref mut operations, ..
                }) => {
                    let name = self.target_namespaced(name)?;
                    operations.push(BindingOperation {
                        name,
                        action: action.unwrap_or_default(),
                        style,
                        input_use,
                        output_use,
                    })
                }
                _ => {
                    return Err(error::Error::UnexpectedElement {
                        context: "operation",
                        found: "(misplaced)".to_owned(),
                    })
                }
            },

            Some(ParseState::SoapOperation { action, style }) => match next_state {
                Some(ParseState::BindingOperation {
                    action: ref mut op_action,
                    style: ref mut op_style,
                    ..
                }) => {
                    *op_action = Some(action);
                    *op_style = style;
                }
                _ => {
                    return Err(error::Error::UnexpectedElement {
                        context: "operation",
                        found: "(misplaced)".to_owned(),
                    })
                }
            },

            Some(ParseState::BindingInput { body_use }) => match next_state {
                Some(ParseState::BindingOperation {
                    ref mut input_use, ..
                }) => *input_use = body_use,
                _ => (),
            },

            Some(ParseState::BindingOutput { body_use }) => match next_state {
                Some(ParseState::BindingOperation {
                    ref mut output_use, ..
                }) => *output_use = body_use,
                _ => (),
            },

            Some(ParseState::BindingBody { body_use }) => match next_state {
                Some(
                    ParseState::BindingInput {
                        body_use: ref mut target,
                    }
                    | ParseState::BindingOutput {
                        body_use: ref mut target,
                    },
                ) => *target = Some(body_use),
                _ => (),
            },

            Some(ParseState::Service { name, ports }) => {
                let name = self.target_namespaced(name)?;
                self.definition.services.push(Service { name, ports })
            }

            Some(ParseState::Port {
                name,
                binding,
                address,
            }) => match next_state {
                Some(ParseState::Service { ref mut ports, .. }) => {
                    let name = self.target_namespaced(name)?;
                    ports.push(Port {
                        name,
                        binding,
                        location: require(address, "port", "address")?,
                    })
                }
                _ => {
                    return Err(error::Error::UnexpectedElement {
                        context: "port",
                        found: "(misplaced)".to_owned(),
                    })
                }
            },

            Some(ParseState::Address { location }) => match next_state {
                Some(ParseState::Port {
                    ref mut address, ..
                }) => *address = Some(location),
                _ => {
                    return Err(error::Error::UnexpectedElement {
                        context: "address",
                        found: "(misplaced)".to_owned(),
                    })
                }
            },

            _ => (),
        }

        stack.extend(next_state);
        Ok(())
    }

    fn handle_text<B: BufRead>(
        &mut self,
        stack: &mut Vec<ParseState>,
        reader: &Reader<B>,
        text: BytesText<'_>,
    ) -> Result<(), error::Error> {
        let unescaped = text.unescaped()?;
        let decoded = reader.decode(unescaped.as_ref())?;
        let mut state = stack.pop();

        if let Some(ParseState::Documentation(ref mut docs)) = state {
            *docs = Some(decoded.to_owned())
        }

        stack.extend(state);
        Ok(())
    }
}

pub fn parse(url: Url) -> Result<(Definition, Namespaces), error::Error> {
    Parser::new(url).parse()
}
