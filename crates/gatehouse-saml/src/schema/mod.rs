//! Typed document model for the two XML schemas this crate consumes: the
//! SAML protocol response and the IdP metadata entity descriptor.
//!
//! Element matching is namespace-exact: every lookup is on a
//! `(namespace URI, local name)` pair, never on the local name alone, so a
//! document that puts `Issuer` in the wrong namespace fails to parse rather
//! than silently matching.

pub mod metadata;
pub mod response;

use chrono::{DateTime, Utc};
use roxmltree::Node;

use crate::error::{SamlError, SamlResult};

/// SAML 2.0 protocol namespace (`Response`)
pub const NS_PROTOCOL: &str = "urn:oasis:names:tc:SAML:2.0:protocol";

/// SAML 2.0 assertion namespace (`Issuer`, `Subject`, `Conditions`,
/// `AttributeStatement`)
pub const NS_ASSERTION: &str = "urn:oasis:names:tc:SAML:2.0:assertion";

/// SAML 2.0 metadata namespace (`EntityDescriptor`, `IDPSSODescriptor`,
/// `KeyDescriptor`, `SingleSignOnService`)
pub const NS_METADATA: &str = "urn:oasis:names:tc:SAML:2.0:metadata";

/// XML digital signature namespace (`Signature`, `KeyInfo`, `X509Data`)
pub const NS_DSIG: &str = "http://www.w3.org/2000/09/xmldsig#";

/// First child element matching the namespace-qualified name, in document
/// order.
pub(crate) fn child<'a, 'input>(
    node: Node<'a, 'input>,
    ns: &str,
    local: &str,
) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|c| c.is_element() && c.has_tag_name((ns, local)))
}

/// Like [`child`], but a missing element is a parse failure.
pub(crate) fn require_child<'a, 'input>(
    node: Node<'a, 'input>,
    ns: &str,
    local: &str,
) -> SamlResult<Node<'a, 'input>> {
    child(node, ns, local).ok_or_else(|| {
        SamlError::Parse(format!(
            "missing element {{{ns}}}{local} under {}",
            node.tag_name().name()
        ))
    })
}

/// Required attribute lookup; missing attribute is a parse failure.
pub(crate) fn require_attr<'a>(node: Node<'a, '_>, name: &str) -> SamlResult<&'a str> {
    node.attribute(name).ok_or_else(|| {
        SamlError::Parse(format!(
            "missing attribute {name} on {}",
            node.tag_name().name()
        ))
    })
}

/// Trimmed text content of an element (empty string when the element has no
/// text children).
pub(crate) fn text_of(node: Node<'_, '_>) -> String {
    node.text().unwrap_or_default().trim().to_string()
}

/// Parse a SAML timestamp attribute (RFC 3339 / xsd:dateTime) to UTC.
pub(crate) fn parse_instant(value: &str) -> SamlResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| SamlError::Parse(format!("invalid timestamp {value:?}: {e}")))
}
