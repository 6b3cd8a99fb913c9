//! [`Element`] trees to wire XML, declaring namespace prefixes at the
//! element where a namespace is first used.

use std::io::{Cursor, Write};

use quick_xml::{
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
    Writer,
};

use crate::error::EncodingError;
use crate::qname::{QName, SOAP_ENVELOPE_NS, WSSE_NS, WSU_NS, XSI_NS};
use crate::tree::Element;

/// Conventional prefixes for the namespaces the runtime itself emits;
/// everything else gets `ns0`, `ns1`, ... in order of first use.
fn fixed_prefix(uri: &str) -> Option<&'static str> {
    match uri {
        SOAP_ENVELOPE_NS => Some("soapenv"),
        XSI_NS => Some("xsi"),
        WSSE_NS => Some("wsse"),
        WSU_NS => Some("wsu"),
        _ => None,
    }
}

struct Prefixes {
    in_scope: Vec<(String, String)>,
    counter: usize,
}

impl Prefixes {
    fn new() -> Self {
        Self {
            in_scope: Vec::new(),
            counter: 0,
        }
    }

    fn lookup(&self, uri: &str) -> Option<&str> {
        self.in_scope
            .iter()
            .rev()
            .find(|(bound, _)| bound == uri)
            .map(|(_, prefix)| prefix.as_str())
    }

    /// Prefix for `uri`, recording a declaration for the current element
    /// when the namespace is not yet in scope.
    fn ensure(&mut self, declarations: &mut Vec<(String, String)>, uri: &str) -> String {
        if let Some(prefix) = self.lookup(uri) {
            return prefix.to_owned();
        }

        let prefix = match fixed_prefix(uri) {
            Some(prefix) => prefix.to_owned(),
            None => {
                let prefix = format!("ns{}", self.counter);
                self.counter += 1;
                prefix
            }
        };

        self.in_scope.push((uri.to_owned(), prefix.clone()));
        declarations.push((prefix.clone(), uri.to_owned()));
        prefix
    }
}

/// Serialize a document with an XML declaration.
pub fn write_document(root: &Element) -> Result<Vec<u8>, EncodingError> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    writer.write_event(Event::Decl(BytesDecl::new(b"1.0", Some(b"utf-8"), None)))?;

    let mut prefixes = Prefixes::new();
    write_element(&mut writer, root, &mut prefixes)?;

    Ok(writer.into_inner().into_inner())
}

fn write_element<W: Write>(
    writer: &mut Writer<W>,
    element: &Element,
    prefixes: &mut Prefixes,
) -> Result<(), EncodingError> {
    let scope_depth = prefixes.in_scope.len();
    let mut declarations = Vec::new();

    let tag = qualified_tag(prefixes, &mut declarations, &element.name);
    let mut attributes: Vec<(String, String)> = Vec::new();

    if let Some(xsi_type) = &element.xsi_type {
        let xsi = prefixes.ensure(&mut declarations, XSI_NS);
        let value = if xsi_type.is_qualified() {
            format!(
                "{}:{}",
                prefixes.ensure(&mut declarations, &xsi_type.namespace),
                xsi_type.local
            )
        } else {
            xsi_type.local.clone()
        };
        attributes.push((format!("{}:type", xsi), value));
    }

    if element.nil {
        let xsi = prefixes.ensure(&mut declarations, XSI_NS);
        attributes.push((format!("{}:nil", xsi), "true".to_owned()));
    }

    for (name, value) in &element.attributes {
        attributes.push((
            qualified_tag(prefixes, &mut declarations, name),
            value.clone(),
        ));
    }

    let mut start = BytesStart::owned_name(tag.clone());
    for (prefix, uri) in &declarations {
        start.push_attribute((format!("xmlns:{}", prefix).as_str(), uri.as_str()));
    }
    for (name, value) in &attributes {
        start.push_attribute((name.as_str(), value.as_str()));
    }

    writer.write_event(Event::Start(start))?;

    if let Some(text) = &element.text {
        writer.write_event(Event::Text(BytesText::from_plain_str(text)))?;
    }

    for child in &element.children {
        write_element(writer, child, prefixes)?;
    }

    writer.write_event(Event::End(BytesEnd::owned(tag.into_bytes())))?;

    // Declarations made on this element go out of scope with it.
    prefixes.in_scope.truncate(scope_depth);

    Ok(())
}

fn qualified_tag(
    prefixes: &mut Prefixes,
    declarations: &mut Vec<(String, String)>,
    name: &QName,
) -> String {
    if name.is_qualified() {
        format!("{}:{}", prefixes.ensure(declarations, &name.namespace), name.local)
    } else {
        name.local.clone()
    }
}
