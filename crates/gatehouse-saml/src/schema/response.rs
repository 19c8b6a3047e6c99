//! Document model for SAML 2.0 protocol responses.
//!
//! A parsed [`Response`] is untrusted data: nothing in it may be believed
//! until the embedded signature has been verified against a caller-supplied
//! certificate (see
//! [`ResponseVerifier`](crate::services::response_verifier::ResponseVerifier)).

use chrono::{DateTime, Utc};
use roxmltree::{Document, Node};

use super::{child, parse_instant, require_attr, require_child, text_of};
use super::{NS_ASSERTION, NS_DSIG, NS_PROTOCOL};
use crate::error::{SamlError, SamlResult};

/// A SAML protocol response: the root document of one login attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Raw text content of `ds:SignatureValue`, empty when the response is
    /// unsigned. The verifier only consults this for the signed/unsigned
    /// gate; cryptographic verification always re-reads the original bytes.
    pub signature_value: String,
    /// The single assertion carried by the response
    pub assertion: Assertion,
}

/// The signed statement of facts about a subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assertion {
    /// Entity ID of the identity provider that produced the assertion
    pub issuer: String,
    pub subject: Subject,
    pub conditions: Conditions,
    pub attribute_statement: AttributeStatement,
}

/// The user the assertion is about, and how their identity was confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    pub name_id: NameId,
    pub subject_confirmation: SubjectConfirmation,
}

/// IdP-chosen identifier for the subject.
///
/// Opaque and format-tagged; not guaranteed unique across identity
/// providers, so callers must scope it to the issuing IdP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameId {
    pub format: Option<String>,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectConfirmation {
    pub data: SubjectConfirmationData,
}

/// Constraints on which entity may accept the subject, and until when.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectConfirmationData {
    /// URL the IdP intended the assertion to be delivered to
    pub recipient: String,
    /// Expiry of the confirmation; the boundary itself is already invalid
    pub not_on_or_after: DateTime<Utc>,
}

/// The overall assertion validity window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conditions {
    pub not_before: DateTime<Utc>,
    /// Exclusive upper bound: an assertion is invalid *on or after* this
    /// instant
    pub not_on_or_after: DateTime<Utc>,
}

/// User attributes in document order, duplicates permitted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AttributeStatement {
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub name_format: Option<String>,
    pub value: String,
}

impl Response {
    /// Parse a decoded (not base64) response document.
    ///
    /// Enforces the namespace-qualified structure of the protocol schema;
    /// any missing required element or attribute, or malformed timestamp,
    /// fails with [`SamlError::Parse`]. An absent signature parses fine and
    /// leaves `signature_value` empty — rejecting unsigned responses is the
    /// verifier's job, with its own error kind.
    pub fn parse(xml: &str) -> SamlResult<Self> {
        let doc = Document::parse(xml).map_err(|e| SamlError::Parse(e.to_string()))?;
        let root = doc.root_element();
        if !root.has_tag_name((NS_PROTOCOL, "Response")) {
            return Err(SamlError::Parse(format!(
                "root element is not a samlp:Response (got {})",
                root.tag_name().name()
            )));
        }

        let signature_value = child(root, NS_DSIG, "Signature")
            .and_then(|sig| child(sig, NS_DSIG, "SignatureValue"))
            .map(text_of)
            .unwrap_or_default();

        let assertion = Assertion::from_node(require_child(root, NS_ASSERTION, "Assertion")?)?;

        Ok(Response {
            signature_value,
            assertion,
        })
    }
}

impl Assertion {
    fn from_node(node: Node<'_, '_>) -> SamlResult<Self> {
        let issuer = text_of(require_child(node, NS_ASSERTION, "Issuer")?);
        let subject = Subject::from_node(require_child(node, NS_ASSERTION, "Subject")?)?;
        let conditions = Conditions::from_node(require_child(node, NS_ASSERTION, "Conditions")?)?;

        // AttributeStatement is optional; an assertion without one simply
        // carries no attributes.
        let attribute_statement = match child(node, NS_ASSERTION, "AttributeStatement") {
            Some(stmt) => AttributeStatement::from_node(stmt)?,
            None => AttributeStatement::default(),
        };

        Ok(Assertion {
            issuer,
            subject,
            conditions,
            attribute_statement,
        })
    }
}

impl Subject {
    fn from_node(node: Node<'_, '_>) -> SamlResult<Self> {
        let name_id_node = require_child(node, NS_ASSERTION, "NameID")?;
        let name_id = NameId {
            format: name_id_node.attribute("Format").map(str::to_string),
            value: text_of(name_id_node),
        };

        let confirmation_node = require_child(node, NS_ASSERTION, "SubjectConfirmation")?;
        let data_node = require_child(confirmation_node, NS_ASSERTION, "SubjectConfirmationData")?;
        let data = SubjectConfirmationData {
            recipient: require_attr(data_node, "Recipient")?.to_string(),
            not_on_or_after: parse_instant(require_attr(data_node, "NotOnOrAfter")?)?,
        };

        Ok(Subject {
            name_id,
            subject_confirmation: SubjectConfirmation { data },
        })
    }
}

impl Conditions {
    fn from_node(node: Node<'_, '_>) -> SamlResult<Self> {
        Ok(Conditions {
            not_before: parse_instant(require_attr(node, "NotBefore")?)?,
            not_on_or_after: parse_instant(require_attr(node, "NotOnOrAfter")?)?,
        })
    }
}

impl AttributeStatement {
    fn from_node(node: Node<'_, '_>) -> SamlResult<Self> {
        let mut attributes = Vec::new();
        for attr_node in node
            .children()
            .filter(|c| c.is_element() && c.has_tag_name((NS_ASSERTION, "Attribute")))
        {
            let value = child(attr_node, NS_ASSERTION, "AttributeValue")
                .map(text_of)
                .unwrap_or_default();
            attributes.push(Attribute {
                name: require_attr(attr_node, "Name")?.to_string(),
                name_format: attr_node.attribute("NameFormat").map(str::to_string),
                value,
            });
        }
        Ok(AttributeStatement { attributes })
    }
}
