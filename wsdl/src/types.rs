//! The in-memory model a parsed WSDL (plus its XSD imports) is reduced
//! to. Namespace URIs are interned once in [`Namespaces`]; every name in
//! the model is a [`NamespacedName`] indexing into that table.

#[derive(Default, Debug, Clone)]
pub struct Namespaces(Vec<String>);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamespacedName {
    namespace_idx: usize,
    pub name: String,
}

/// Element occurrence projection from `minOccurs`/`maxOccurs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    Required,
    Optional,
    Repeated,
}

#[derive(Debug, Clone)]
pub struct Field {
    pub name: NamespacedName,
    pub ty: NamespacedName,
    pub cardinality: Cardinality,
    pub nillable: bool,
}

/// A projected XSD complex type with sequence content.
#[derive(Debug, Clone, Default)]
pub struct StructType {
    /// Parent type from `<xsd:extension base="...">`, if any.
    pub base: Option<NamespacedName>,
    /// `abstract="true"` on the complex type.
    pub is_abstract: bool,
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone)]
pub enum TypeKind {
    Struct(StructType),
    /// Simple type restricted to a closed set of enumeration values.
    Enum(Vec<String>),
    /// Simple restriction without enumeration facets.
    Simple(NamespacedName),
    /// Top-level element (or simpleContent extension) aliasing a type.
    Alias(NamespacedName),
}

#[derive(Debug, Clone)]
pub struct Type {
    pub name: NamespacedName,
    pub kind: TypeKind,
}

#[derive(Debug, Clone)]
pub struct Part {
    pub name: String,
    pub element: NamespacedName,
}

#[derive(Debug, Clone)]
pub struct Message {
    pub name: NamespacedName,
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone)]
pub struct Operation {
    pub name: NamespacedName,
    pub documentation: Option<String>,
    pub input: Option<NamespacedName>,
    pub output: Option<NamespacedName>,
}

#[derive(Debug, Clone)]
pub struct PortType {
    pub name: NamespacedName,
    pub operations: Vec<Operation>,
}

#[derive(Debug, Clone)]
pub struct BindingOperation {
    pub name: NamespacedName,
    /// `soapAction`; empty when the WSDL does not specify one.
    pub action: String,
    pub style: Option<String>,
    /// `use` on the input/output `soap:body`.
    pub input_use: Option<String>,
    pub output_use: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Binding {
    pub name: NamespacedName,
    pub ty: NamespacedName,
    pub transport: String,
    pub style: Option<String>,
    pub operations: Vec<BindingOperation>,
}

#[derive(Debug, Clone)]
pub struct Port {
    pub name: NamespacedName,
    pub binding: NamespacedName,
    pub location: String,
}

#[derive(Debug, Clone)]
pub struct Service {
    pub name: NamespacedName,
    pub ports: Vec<Port>,
}

#[derive(Default, Debug, Clone)]
pub struct Definition {
    pub types: Vec<Type>,
    pub messages: Vec<Message>,
    pub port_types: Vec<PortType>,
    pub bindings: Vec<Binding>,
    pub services: Vec<Service>,
}

impl Namespaces {
    pub fn namespaces(&self) -> &[String] {
        &self.0
    }

    pub fn get(&self, index: usize) -> &str {
        &self.0[index]
    }

    pub fn add_or_get(&mut self, namespace: &str) -> usize {
        if let Some(index) = self.index_of(namespace) {
            index
        } else {
            let index = self.0.len();
            self.0.push(namespace.to_owned());
            index
        }
    }

    pub fn index_of(&self, namespace: &str) -> Option<usize> {
        self.0.iter().position(|value| value == namespace)
    }
}

impl NamespacedName {
    pub fn new(namespaces: &mut Namespaces, namespace: &str, name: String) -> Self {
        Self {
            namespace_idx: namespaces.add_or_get(namespace),
            name,
        }
    }

    pub fn index(&self) -> usize {
        self.namespace_idx
    }

    /// The name's namespace URI, resolved against the intern table.
    pub fn namespace<'a>(&self, namespaces: &'a Namespaces) -> &'a str {
        namespaces.get(self.namespace_idx)
    }
}

impl Cardinality {
    /// Project `minOccurs`/`maxOccurs` attribute values (absent means 1).
    pub fn from_occurs(min: Option<&str>, max: Option<&str>) -> Self {
        match max {
            Some("unbounded") => return Cardinality::Repeated,
            Some(value) if value.parse::<u64>().map_or(false, |n| n > 1) => {
                return Cardinality::Repeated
            }
            _ => (),
        }

        match min {
            Some("0") => Cardinality::Optional,
            _ => Cardinality::Required,
        }
    }
}
