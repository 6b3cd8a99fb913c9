use crate::error::{DecodingError, EncodingError};
use crate::qname::QName;
use crate::tree::Element;

/// Encode a schema value as a payload element.
///
/// The element name is supplied by the caller (the enclosing field or
/// operation wrapper); `type_name` reports the value's dynamic schema
/// type. Generated dispatch enums return the concrete variant's type so
/// the writer can emit `xsi:type`; plain structs return their own type
/// and never tag themselves.
pub trait ToXml {
    fn type_name(&self) -> Option<QName> {
        None
    }

    fn to_element(&self, name: &QName) -> Result<Element, EncodingError>;
}

/// Decode a schema value from a payload element.
pub trait FromXml: Sized {
    fn from_element(element: &Element) -> Result<Self, DecodingError>;
}

/// A request or response record: a codec pair plus the wrapper element
/// QName fixed by the operation's wrapped-document/literal contract.
pub trait Payload: ToXml + FromXml {
    fn element_name() -> QName;
}

/// An opaque SOAP header fragment. Fragments carry their own element
/// QName and are serialized in registration order.
pub trait HeaderFragment: Send + Sync {
    fn to_element(&self) -> Result<Element, EncodingError>;
}

/// Cursor over a struct element's children, applying the schema's
/// sequence order and cardinality rules.
///
/// The cursor never skips elements: a sequence fixes document order, so
/// an optional field is absent exactly when the next child has a
/// different name.
pub struct ChildReader<'a> {
    children: &'a [Element],
    position: usize,
}

impl<'a> ChildReader<'a> {
    pub fn new(element: &'a Element) -> Self {
        Self {
            children: &element.children,
            position: 0,
        }
    }

    pub fn required<T: FromXml>(&mut self, name: &QName) -> Result<T, DecodingError> {
        match self.next_named(name) {
            Some(element) => T::from_element(element),
            None => Err(DecodingError::MissingElement(name.clone())),
        }
    }

    pub fn optional<T: FromXml>(&mut self, name: &QName) -> Result<Option<T>, DecodingError> {
        match self.next_named(name) {
            Some(element) if element.nil => Ok(None),
            Some(element) => T::from_element(element).map(Some),
            None => Ok(None),
        }
    }

    pub fn repeated<T: FromXml>(&mut self, name: &QName) -> Result<Vec<T>, DecodingError> {
        let mut values = Vec::new();
        while let Some(element) = self.next_named(name) {
            values.push(T::from_element(element)?);
        }
        Ok(values)
    }

    fn next_named(&mut self, name: &QName) -> Option<&'a Element> {
        let element = self.children.get(self.position)?;
        if element.name == *name {
            self.position += 1;
            Some(element)
        } else {
            None
        }
    }
}

fn parse_text<T>(element: &Element) -> Result<T, DecodingError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let text = element.trimmed_text();
    text.parse().map_err(|err: T::Err| DecodingError::InvalidValue {
        element: element.name.clone(),
        value: text.to_owned(),
        reason: err.to_string(),
    })
}

macro_rules! text_codec {
    ($($ty:ty),* $(,)?) => {$(
        impl ToXml for $ty {
            fn to_element(&self, name: &QName) -> Result<Element, EncodingError> {
                Ok(Element::with_text(name.clone(), self.to_string()))
            }
        }

        impl FromXml for $ty {
            fn from_element(element: &Element) -> Result<Self, DecodingError> {
                parse_text(element)
            }
        }
    )*};
}

text_codec!(i8, i16, i32, i64, u8, u16, u32, u64, f32, f64);

impl ToXml for String {
    fn to_element(&self, name: &QName) -> Result<Element, EncodingError> {
        Ok(Element::with_text(name.clone(), self.clone()))
    }
}

impl FromXml for String {
    fn from_element(element: &Element) -> Result<Self, DecodingError> {
        Ok(element.text.clone().unwrap_or_default())
    }
}

impl ToXml for bool {
    fn to_element(&self, name: &QName) -> Result<Element, EncodingError> {
        Ok(Element::with_text(
            name.clone(),
            if *self { "true" } else { "false" },
        ))
    }
}

impl FromXml for bool {
    fn from_element(element: &Element) -> Result<Self, DecodingError> {
        // XSD boolean admits both lexical forms.
        match element.trimmed_text() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            other => Err(DecodingError::InvalidValue {
                element: element.name.clone(),
                value: other.to_owned(),
                reason: "not an xsd:boolean".to_owned(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(local: &str) -> QName {
        QName::new("urn:test", local)
    }

    fn parent(children: Vec<Element>) -> Element {
        let mut element = Element::new(name("parent"));
        element.children = children;
        element
    }

    #[test]
    fn sequence_cardinality() {
        let element = parent(vec![
            Element::with_text(name("a"), "1"),
            Element::with_text(name("c"), "x"),
            Element::with_text(name("c"), "y"),
        ]);

        let mut reader = ChildReader::new(&element);
        let a: i32 = reader.required(&name("a")).unwrap();
        let b: Option<i32> = reader.optional(&name("b")).unwrap();
        let c: Vec<String> = reader.repeated(&name("c")).unwrap();

        assert_eq!(a, 1);
        assert_eq!(b, None);
        assert_eq!(c, vec!["x".to_owned(), "y".to_owned()]);
    }

    #[test]
    fn missing_required_element() {
        let element = parent(vec![]);
        let mut reader = ChildReader::new(&element);
        let err = reader.required::<i32>(&name("a")).unwrap_err();
        assert!(matches!(err, DecodingError::MissingElement(_)));
    }

    #[test]
    fn nil_element_decodes_as_absent() {
        let mut child = Element::new(name("a"));
        child.nil = true;
        let element = parent(vec![child]);

        let mut reader = ChildReader::new(&element);
        let a: Option<i32> = reader.optional(&name("a")).unwrap();
        assert_eq!(a, None);
    }

    #[test]
    fn boolean_lexical_forms() {
        assert!(bool::from_element(&Element::with_text(name("b"), "1")).unwrap());
        assert!(!bool::from_element(&Element::with_text(name("b"), "false")).unwrap());
        assert!(bool::from_element(&Element::with_text(name("b"), "yes")).is_err());
    }
}
