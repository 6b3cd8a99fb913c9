use crate::qname::QName;

/// One element of a document/literal payload.
///
/// Wrapped document/literal payloads never mix text and child elements,
/// so an `Element` carries either `children` or `text`. `xsi:type` and
/// `xsi:nil` are kept out of the attribute list: the reader resolves and
/// strips them, and the writer re-emits them with the `xsi` prefix.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: QName,
    /// Resolved `xsi:type` value, when present.
    pub xsi_type: Option<QName>,
    /// True when the element carried `xsi:nil="true"`.
    pub nil: bool,
    pub attributes: Vec<(QName, String)>,
    pub children: Vec<Element>,
    pub text: Option<String>,
}

impl Element {
    pub fn new(name: QName) -> Self {
        Self {
            name,
            xsi_type: None,
            nil: false,
            attributes: Vec::new(),
            children: Vec::new(),
            text: None,
        }
    }

    pub fn with_text(name: QName, text: impl Into<String>) -> Self {
        let mut element = Self::new(name);
        element.text = Some(text.into());
        element
    }

    pub fn push(&mut self, child: Element) {
        self.children.push(child);
    }

    pub fn set_attribute(&mut self, name: QName, value: impl Into<String>) {
        self.attributes.push((name, value.into()));
    }

    /// First child with the given name, if any.
    pub fn child(&self, name: &QName) -> Option<&Element> {
        self.children.iter().find(|child| child.name == *name)
    }

    /// Text content, with surrounding whitespace trimmed.
    pub fn trimmed_text(&self) -> &str {
        self.text.as_deref().map(str::trim).unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_lookup_matches_full_qname() {
        let mut parent = Element::new(QName::new("urn:a", "parent"));
        parent.push(Element::with_text(QName::new("urn:a", "x"), "1"));
        parent.push(Element::with_text(QName::new("urn:b", "x"), "2"));

        let found = parent.child(&QName::new("urn:b", "x")).unwrap();
        assert_eq!(found.trimmed_text(), "2");
        assert!(parent.child(&QName::new("urn:c", "x")).is_none());
    }
}
