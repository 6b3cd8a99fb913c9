use thiserror::Error;

use crate::error::DecodingError;
use crate::qname::{QName, SOAP_ENVELOPE_NS};
use crate::tree::Element;

/// A decoded SOAP 1.1 Fault.
///
/// The string form is the `faultstring`, which is what callers match
/// service error codes against (`AuthenticationError.AUTHENTICATION_FAILED`
/// and friends).
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct Fault {
    /// `faultcode`, a QName-like string such as `soap:Server`.
    pub code: String,
    /// `faultstring`, human-readable error text.
    pub message: String,
    /// `faultactor`, when the fault names the responsible intermediary.
    pub actor: Option<String>,
    /// `detail`, an opaque XML payload left undecoded.
    pub detail: Option<Element>,
}

impl Fault {
    pub fn element_name() -> QName {
        QName::new(SOAP_ENVELOPE_NS, "Fault")
    }

    /// Decode a `{soap}Fault` element. Fault subelements are unqualified
    /// per SOAP 1.1 section 4.4.
    pub fn from_element(element: &Element) -> Result<Self, DecodingError> {
        let text_child = |local: &str| {
            element
                .child(&QName::unqualified(local))
                .map(|child| child.trimmed_text().to_owned())
        };

        let code = text_child("faultcode")
            .ok_or_else(|| DecodingError::MissingElement(QName::unqualified("faultcode")))?;
        let message = text_child("faultstring")
            .ok_or_else(|| DecodingError::MissingElement(QName::unqualified("faultstring")))?;

        Ok(Self {
            code,
            message,
            actor: text_child("faultactor"),
            detail: element.child(&QName::unqualified("detail")).cloned(),
        })
    }
}
