use thiserror::Error;

use crate::qname::QName;

/// Failures while turning a request value into wire XML.
///
/// These are programming errors on the caller's side; nothing here is
/// retryable.
#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("value of {0} cannot be expressed in the target schema: {1}")]
    Unrepresentable(QName, String),

    #[error("error writing XML")]
    Xml(#[from] quick_xml::Error),
}

/// Failures while decoding a received envelope.
///
/// Everything here is a protocol error: either the document is not a
/// well-formed SOAP 1.1 envelope, or the payload does not match the
/// schema the response type was generated from.
#[derive(Debug, Error)]
pub enum DecodingError {
    #[error("error parsing XML")]
    Xml(#[from] quick_xml::Error),

    #[error("document root {0} is not a SOAP 1.1 Envelope")]
    NotAnEnvelope(QName),

    #[error("envelope contains no Body element")]
    MissingBody,

    #[error("Body contains no child element")]
    EmptyBody,

    #[error("Body contains {0} children; wrapped-document/literal requires exactly one")]
    MultipleBodyChildren(usize),

    #[error("expected element {expected}, found {found}")]
    UnexpectedElement { expected: QName, found: QName },

    #[error("missing required element {0}")]
    MissingElement(QName),

    #[error("element {0} has abstract declared type and no xsi:type attribute")]
    MissingTypeTag(QName),

    #[error("no concrete type registered for xsi:type {0}")]
    UnresolvedType(QName),

    #[error("undeclared namespace prefix {0:?}")]
    UndeclaredPrefix(String),

    #[error("invalid value {value:?} for {element}: {reason}")]
    InvalidValue {
        element: QName,
        value: String,
        reason: String,
    },
}
