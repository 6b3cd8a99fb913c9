//! WS-Security UsernameToken header fragment (clear-text password
//! profile 1.0).

use rand::{distributions::Alphanumeric, Rng};

use crate::codec::HeaderFragment;
use crate::error::EncodingError;
use crate::qname::{QName, PASSWORD_TEXT_TYPE, WSSE_NS, WSU_NS};
use crate::tree::Element;

/// A `<wsse:Security>` header carrying a UsernameToken.
///
/// Each constructed token gets a fresh `wsu:Id` of the form
/// `UsernameToken-` plus nine alphanumeric characters; the id is an
/// envelope-local identifier, not a secret.
#[derive(Debug, Clone)]
pub struct UsernameToken {
    username: String,
    password: String,
    must_understand: bool,
    token_id: String,
}

impl UsernameToken {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::with_rng(&mut rand::thread_rng(), username, password)
    }

    /// Construct with an explicit random source (deterministic tests).
    pub fn with_rng(
        rng: &mut impl Rng,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        let suffix: String = rng
            .sample_iter(&Alphanumeric)
            .take(9)
            .map(char::from)
            .collect();

        Self {
            username: username.into(),
            password: password.into(),
            must_understand: false,
            token_id: format!("UsernameToken-{}", suffix),
        }
    }

    /// Request the SOAP `mustUnderstand` marker on the Security header.
    pub fn must_understand(mut self, flag: bool) -> Self {
        self.must_understand = flag;
        self
    }

    pub fn token_id(&self) -> &str {
        &self.token_id
    }
}

impl HeaderFragment for UsernameToken {
    fn to_element(&self) -> Result<Element, EncodingError> {
        let mut security = Element::new(QName::new(WSSE_NS, "Security"));
        if self.must_understand {
            security.set_attribute(QName::unqualified("mustUnderstand"), "1");
        }

        let mut token = Element::new(QName::new(WSSE_NS, "UsernameToken"));
        token.set_attribute(QName::new(WSU_NS, "Id"), self.token_id.clone());

        token.push(Element::with_text(
            QName::new(WSSE_NS, "Username"),
            self.username.clone(),
        ));

        let mut password = Element::with_text(
            QName::new(WSSE_NS, "Password"),
            self.password.clone(),
        );
        password.set_attribute(QName::unqualified("Type"), PASSWORD_TEXT_TYPE);
        token.push(password);

        security.push(token);
        Ok(security)
    }
}
