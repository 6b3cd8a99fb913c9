//! SOAP 1.1 envelope framing: header composition on the way out, Body
//! routing (payload vs Fault) on the way in.

use std::sync::Arc;

use crate::codec::{HeaderFragment, Payload};
use crate::error::{DecodingError, EncodingError};
use crate::fault::Fault;
use crate::qname::{QName, SOAP_ENVELOPE_NS};
use crate::reader::parse_document;
use crate::tree::Element;
use crate::writer::write_document;

/// Outcome of decoding a well-formed envelope: exactly one of a payload
/// value or a Fault, never both.
#[derive(Debug)]
pub enum Decoded<T> {
    Value(T),
    Fault(Fault),
}

fn envelope_name() -> QName {
    QName::new(SOAP_ENVELOPE_NS, "Envelope")
}

fn header_name() -> QName {
    QName::new(SOAP_ENVELOPE_NS, "Header")
}

fn body_name() -> QName {
    QName::new(SOAP_ENVELOPE_NS, "Body")
}

/// Marshal a request into a complete envelope document.
///
/// `<Header>` is present exactly when `headers` is non-empty; fragments
/// are serialized in order.
pub fn marshal<T: Payload>(
    request: &T,
    headers: &[Arc<dyn HeaderFragment>],
) -> Result<Vec<u8>, EncodingError> {
    let mut envelope = Element::new(envelope_name());

    if !headers.is_empty() {
        let mut header = Element::new(header_name());
        for fragment in headers {
            header.push(fragment.to_element()?);
        }
        envelope.push(header);
    }

    let mut body = Element::new(body_name());
    body.push(request.to_element(&T::element_name())?);
    envelope.push(body);

    write_document(&envelope)
}

/// Unmarshal a response envelope into a payload value or a Fault.
///
/// The response type is only constructed after the Body passes the
/// wrapped-document/literal checks, so a failure never leaves a
/// partially decoded value behind.
pub fn unmarshal<T: Payload>(bytes: &[u8]) -> Result<Decoded<T>, DecodingError> {
    let document = parse_document(bytes)?;

    if document.name != envelope_name() {
        return Err(DecodingError::NotAnEnvelope(document.name));
    }

    let body = document
        .child(&body_name())
        .ok_or(DecodingError::MissingBody)?;

    let payload = match body.children.len() {
        0 => return Err(DecodingError::EmptyBody),
        1 => &body.children[0],
        n => return Err(DecodingError::MultipleBodyChildren(n)),
    };

    if payload.name == Fault::element_name() {
        return Ok(Decoded::Fault(Fault::from_element(payload)?));
    }

    let expected = T::element_name();
    if payload.name != expected {
        return Err(DecodingError::UnexpectedElement {
            expected,
            found: payload.name.clone(),
        });
    }

    Ok(Decoded::Value(T::from_element(payload)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{ChildReader, FromXml, ToXml};

    const SVC_NS: &str = "https://api.example/svc/v201802";

    #[derive(Debug, Clone, Default, PartialEq)]
    struct GetResponse {
        total_num_entries: Option<i64>,
    }

    impl ToXml for GetResponse {
        fn to_element(&self, name: &QName) -> Result<Element, EncodingError> {
            let mut element = Element::new(name.clone());
            let mut rval = Element::new(QName::new(SVC_NS, "rval"));
            if let Some(total) = &self.total_num_entries {
                rval.push(total.to_element(&QName::new(SVC_NS, "totalNumEntries"))?);
            }
            element.push(rval);
            Ok(element)
        }
    }

    impl FromXml for GetResponse {
        fn from_element(element: &Element) -> Result<Self, DecodingError> {
            let rval = element
                .child(&QName::new(SVC_NS, "rval"))
                .ok_or_else(|| DecodingError::MissingElement(QName::new(SVC_NS, "rval")))?;
            let mut children = ChildReader::new(rval);
            Ok(Self {
                total_num_entries: children.optional(&QName::new(SVC_NS, "totalNumEntries"))?,
            })
        }
    }

    impl Payload for GetResponse {
        fn element_name() -> QName {
            QName::new(SVC_NS, "getResponse")
        }
    }

    struct StaticHeader(&'static str);

    impl HeaderFragment for StaticHeader {
        fn to_element(&self) -> Result<Element, EncodingError> {
            Ok(Element::with_text(QName::new(SVC_NS, "RequestHeader"), self.0))
        }
    }

    #[test]
    fn header_present_iff_fragments_registered() {
        let request = GetResponse::default();

        let without = String::from_utf8(marshal(&request, &[]).unwrap()).unwrap();
        assert!(!without.contains("Header"));

        let headers: Vec<Arc<dyn HeaderFragment>> =
            vec![Arc::new(StaticHeader("a")), Arc::new(StaticHeader("b"))];
        let with = String::from_utf8(marshal(&request, &headers).unwrap()).unwrap();
        assert!(with.contains("soapenv:Header"));
        // Registration order preserved.
        let first = with.find(">a<").unwrap();
        let second = with.find(">b<").unwrap();
        assert!(first < second);
    }

    #[test]
    fn decodes_success_payload() {
        let body = br#"<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/">
            <soapenv:Body>
                <getResponse xmlns="https://api.example/svc/v201802">
                    <rval><totalNumEntries>0</totalNumEntries></rval>
                </getResponse>
            </soapenv:Body>
        </soapenv:Envelope>"#;

        match unmarshal::<GetResponse>(body).unwrap() {
            Decoded::Value(value) => assert_eq!(value.total_num_entries, Some(0)),
            Decoded::Fault(fault) => panic!("unexpected fault: {}", fault),
        }
    }

    #[test]
    fn fault_and_value_are_mutually_exclusive() {
        let body = br#"<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/">
            <soapenv:Body>
                <soapenv:Fault>
                    <faultcode>soap:Server</faultcode>
                    <faultstring>AuthenticationError.AUTHENTICATION_FAILED</faultstring>
                </soapenv:Fault>
            </soapenv:Body>
        </soapenv:Envelope>"#;

        match unmarshal::<GetResponse>(body).unwrap() {
            Decoded::Fault(fault) => {
                assert_eq!(fault.to_string(), "AuthenticationError.AUTHENTICATION_FAILED")
            }
            Decoded::Value(_) => panic!("fault decoded as value"),
        }
    }

    #[test]
    fn empty_body_is_a_protocol_error() {
        let body = br#"<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/">
            <soapenv:Body/>
        </soapenv:Envelope>"#;

        assert!(matches!(
            unmarshal::<GetResponse>(body),
            Err(DecodingError::EmptyBody)
        ));
    }

    #[test]
    fn two_body_children_mention_wrapped_doc_literal() {
        let body = br#"<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/">
            <soapenv:Body>
                <a xmlns="urn:x"/>
                <b xmlns="urn:x"/>
            </soapenv:Body>
        </soapenv:Envelope>"#;

        let err = unmarshal::<GetResponse>(body).unwrap_err();
        assert!(matches!(err, DecodingError::MultipleBodyChildren(2)));
        assert!(err.to_string().contains("wrapped-document/literal"));
    }

    #[test]
    fn wrong_payload_element_is_rejected() {
        let body = br#"<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/">
            <soapenv:Body>
                <mutateResponse xmlns="https://api.example/svc/v201802"/>
            </soapenv:Body>
        </soapenv:Envelope>"#;

        assert!(matches!(
            unmarshal::<GetResponse>(body),
            Err(DecodingError::UnexpectedElement { .. })
        ));
    }

    #[test]
    fn marshal_unmarshal_fixed_point_preserves_absent_fields() {
        let request = GetResponse {
            total_num_entries: None,
        };
        let wire = marshal(&request, &[]).unwrap();
        assert!(!String::from_utf8_lossy(&wire).contains("totalNumEntries"));

        // getResponse doubles as its own payload type here.
        match unmarshal::<GetResponse>(&wire).unwrap() {
            Decoded::Value(value) => assert_eq!(value, request),
            Decoded::Fault(fault) => panic!("unexpected fault: {}", fault),
        }
    }
}
