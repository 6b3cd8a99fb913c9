//! Enumeration round-trips through a hand-written value enum, shaped
//! exactly like the code the generator emits.

use lather_soap::{DecodingError, Element, EncodingError, FromXml, QName, ToXml};

const SVC_NS: &str = "https://api.example/cm/v201802";

#[derive(Debug, Clone, PartialEq, Eq)]
enum CampaignStatus {
    Enabled,
    Paused,
    Removed,
    /// A value this code's schema snapshot does not list.
    Unknown(String),
}

impl Default for CampaignStatus {
    fn default() -> Self {
        Self::Enabled
    }
}

impl ToXml for CampaignStatus {
    fn to_element(&self, name: &QName) -> Result<Element, EncodingError> {
        let value = match self {
            Self::Enabled => "ENABLED",
            Self::Paused => "PAUSED",
            Self::Removed => "REMOVED",
            Self::Unknown(other) => other.as_str(),
        };
        Ok(Element::with_text(name.clone(), value))
    }
}

impl FromXml for CampaignStatus {
    fn from_element(element: &Element) -> Result<Self, DecodingError> {
        Ok(match element.trimmed_text() {
            "ENABLED" => Self::Enabled,
            "PAUSED" => Self::Paused,
            "REMOVED" => Self::Removed,
            other => Self::Unknown(other.to_owned()),
        })
    }
}

fn field_name() -> QName {
    QName::new(SVC_NS, "status")
}

#[test]
fn listed_values_round_trip() {
    for (status, text) in [
        (CampaignStatus::Enabled, "ENABLED"),
        (CampaignStatus::Paused, "PAUSED"),
        (CampaignStatus::Removed, "REMOVED"),
    ] {
        let element = status.to_element(&field_name()).unwrap();
        assert_eq!(element.trimmed_text(), text);
        assert_eq!(CampaignStatus::from_element(&element).unwrap(), status);
    }
}

#[test]
fn unlisted_wire_value_survives_as_unknown() {
    let element = Element::with_text(field_name(), "EXPERIMENTING");
    let status = CampaignStatus::from_element(&element).unwrap();
    assert_eq!(status, CampaignStatus::Unknown("EXPERIMENTING".to_owned()));

    // Re-encoding sends the server's value back verbatim.
    let wire = lather_soap::writer::write_document(&status.to_element(&field_name()).unwrap()).unwrap();
    let parsed = lather_soap::reader::parse_document(&wire).unwrap();
    assert_eq!(parsed.trimmed_text(), "EXPERIMENTING");
    assert_eq!(CampaignStatus::from_element(&parsed).unwrap(), status);
}

#[test]
fn default_is_the_first_listed_value() {
    assert_eq!(CampaignStatus::default(), CampaignStatus::Enabled);
}
