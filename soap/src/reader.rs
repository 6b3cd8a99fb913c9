//! Wire XML to [`Element`] trees, with scoped namespace resolution.

use quick_xml::{events::Event, Reader};

use crate::error::DecodingError;
use crate::qname::{QName, XSI_NS};
use crate::tree::Element;

fn split_prefixed(name: &str) -> (Option<&str>, &str) {
    match name.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, name),
    }
}

/// Prefix bindings in scope, tagged with the depth that introduced them.
struct Bindings {
    scopes: Vec<(usize, Option<String>, String)>,
}

impl Bindings {
    fn new() -> Self {
        Self { scopes: Vec::new() }
    }

    fn declare(&mut self, depth: usize, prefix: Option<String>, uri: String) {
        self.scopes.push((depth, prefix, uri));
    }

    fn leave(&mut self, depth: usize) {
        self.scopes.retain(|(d, _, _)| *d < depth);
    }

    fn resolve(&self, prefix: Option<&str>) -> Option<&str> {
        self.scopes
            .iter()
            .rev()
            .find(|(_, bound, _)| bound.as_deref() == prefix)
            .map(|(_, _, uri)| uri.as_str())
    }

    /// Resolve a prefixed element or attribute-value QName. A missing
    /// prefix falls back to the default namespace; a missing default
    /// namespace means the name is unqualified.
    fn qualify(&self, prefixed: &str) -> Result<QName, DecodingError> {
        let (prefix, local) = split_prefixed(prefixed);
        match prefix {
            Some(prefix) => match self.resolve(Some(prefix)) {
                Some(uri) => Ok(QName::new(uri, local)),
                None => Err(DecodingError::UndeclaredPrefix(prefix.to_owned())),
            },
            None => Ok(QName::new(self.resolve(None).unwrap_or(""), local)),
        }
    }
}

/// Parse a complete XML document into an element tree.
pub fn parse_document(bytes: &[u8]) -> Result<Element, DecodingError> {
    let mut reader = Reader::from_reader(bytes);
    reader.trim_text(true).expand_empty_elements(true);

    let mut buffer = Vec::new();
    let mut bindings = Bindings::new();
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;
    let mut depth = 0usize;

    loop {
        match reader.read_event(&mut buffer)? {
            Event::Start(start) => {
                depth += 1;

                // Namespace declarations first: they are in scope for the
                // element's own name and attributes.
                for attribute in start.attributes() {
                    let attribute = attribute?;
                    let key = reader.decode(attribute.key)?;
                    let value = attribute.unescaped_value()?;
                    let value = reader.decode(value.as_ref())?.to_owned();

                    match split_prefixed(key) {
                        (Some("xmlns"), prefix) => {
                            bindings.declare(depth, Some(prefix.to_owned()), value)
                        }
                        (None, "xmlns") => bindings.declare(depth, None, value),
                        _ => (),
                    }
                }

                let mut element = Element::new(bindings.qualify(reader.decode(start.name())?)?);

                for attribute in start.attributes() {
                    let attribute = attribute?;
                    let key = reader.decode(attribute.key)?;
                    let value = attribute.unescaped_value()?;
                    let value = reader.decode(value.as_ref())?.to_owned();

                    let (prefix, local) = split_prefixed(key);
                    if prefix == Some("xmlns") || (prefix.is_none() && local == "xmlns") {
                        continue;
                    }

                    // Attribute names do not pick up the default namespace.
                    let name = match prefix {
                        Some(prefix) => match bindings.resolve(Some(prefix)) {
                            Some(uri) => QName::new(uri, local),
                            None => {
                                return Err(DecodingError::UndeclaredPrefix(prefix.to_owned()))
                            }
                        },
                        None => QName::unqualified(local),
                    };

                    if name.namespace == XSI_NS && name.local == "type" {
                        element.xsi_type = Some(bindings.qualify(&value)?);
                    } else if name.namespace == XSI_NS && name.local == "nil" {
                        element.nil = value == "true" || value == "1";
                    } else {
                        element.set_attribute(name, value);
                    }
                }

                stack.push(element);
            }

            Event::End(..) => {
                bindings.leave(depth);
                depth = depth.saturating_sub(1);

                // quick-xml validates tag balance, so the stack is never
                // empty here.
                if let Some(element) = stack.pop() {
                    match stack.last_mut() {
                        Some(parent) => parent.push(element),
                        None => root = Some(element),
                    }
                }
            }

            Event::Text(text) => {
                let unescaped = text.unescaped()?;
                let decoded = reader.decode(unescaped.as_ref())?;
                if let Some(element) = stack.last_mut() {
                    match &mut element.text {
                        Some(existing) => existing.push_str(decoded),
                        None => element.text = Some(decoded.to_owned()),
                    }
                }
            }

            Event::CData(text) => {
                let decoded = reader.decode(text.escaped())?;
                if let Some(element) = stack.last_mut() {
                    match &mut element.text {
                        Some(existing) => existing.push_str(decoded),
                        None => element.text = Some(decoded.to_owned()),
                    }
                }
            }

            Event::Eof => break,

            // Declarations, comments, processing instructions.
            _ => (),
        }
    }

    root.ok_or_else(|| {
        DecodingError::Xml(quick_xml::Error::UnexpectedEof("document".to_owned()))
    })
}
