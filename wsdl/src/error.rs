use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Unable to parse provided URL")]
    UrlParseError(#[from] url::ParseError),

    #[error("Unable to convert provided path")]
    PathConversionError(Option<std::io::Error>),

    #[error("Unable to open file")]
    FileOpenError(quick_xml::Error),

    #[error("Unable to get file from server")]
    ReqwestError(#[from] reqwest::Error),

    #[error("Unsupported URL scheme {0}")]
    UnsupportedScheme(String),

    #[error("Error parsing XML input")]
    XmlParseError(#[from] quick_xml::Error),

    #[error("element <{element}> is missing required attribute {attribute:?}")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },

    #[error("unexpected <{found}> inside <{context}>")]
    UnexpectedElement {
        context: &'static str,
        found: String,
    },

    #[error("no namespace binding for prefix {0:?}")]
    UnknownPrefix(String),

    #[error("document declares no targetNamespace")]
    MissingTargetNamespace,

    #[error("unsupported WSDL feature at <{element}>: {detail}")]
    Unsupported { element: String, detail: String },

    #[error("duplicate type definition {0}")]
    DuplicateType(String),

    #[error("required-field cycle involving type {0}")]
    RecursiveType(String),

    #[error("identifier {name} collides across namespaces {namespaces:?}; add a namespace prefix mapping")]
    IdentifierCollision {
        name: String,
        namespaces: Vec<String>,
    },

    #[error("definition references unknown {kind} {name}")]
    UnresolvedReference { kind: &'static str, name: String },
}
