//! Document model for IdP metadata (entity descriptors).

use roxmltree::{Document, Node};

use super::{require_attr, require_child, text_of, NS_DSIG, NS_METADATA};
use crate::error::{SamlError, SamlResult};

/// URI of the SAML HTTP-Redirect binding.
pub const BINDING_HTTP_REDIRECT: &str = "urn:oasis:names:tc:SAML:2.0:bindings:HTTP-Redirect";

/// An identity provider's published description of itself: its entity ID,
/// signing key, and endpoints. Usually called "IdP metadata".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityDescriptor {
    /// The IdP's issuer identity
    pub entity_id: String,
    pub idp_sso_descriptor: IdpSsoDescriptor,
}

/// The single-sign-on offerings of an identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdpSsoDescriptor {
    pub key_descriptor: KeyDescriptor,
    /// Declared bindings in document order
    pub single_sign_on_services: Vec<SingleSignOnService>,
}

/// The key an identity provider signs with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyDescriptor {
    /// Base64-encoded DER of the signing certificate, as published (may
    /// contain line wrapping)
    pub certificate: String,
}

/// One transport binding of the IdP and the URL where it is reachable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SingleSignOnService {
    pub binding: String,
    pub location: String,
}

impl EntityDescriptor {
    /// Parse an IdP metadata document.
    pub fn parse(xml: &str) -> SamlResult<Self> {
        let doc = Document::parse(xml).map_err(|e| SamlError::Parse(e.to_string()))?;
        let root = doc.root_element();
        if !root.has_tag_name((NS_METADATA, "EntityDescriptor")) {
            return Err(SamlError::Parse(format!(
                "root element is not an md:EntityDescriptor (got {})",
                root.tag_name().name()
            )));
        }

        let entity_id = require_attr(root, "entityID")?.to_string();
        let idp_sso_descriptor =
            IdpSsoDescriptor::from_node(require_child(root, NS_METADATA, "IDPSSODescriptor")?)?;

        Ok(EntityDescriptor {
            entity_id,
            idp_sso_descriptor,
        })
    }
}

impl IdpSsoDescriptor {
    fn from_node(node: Node<'_, '_>) -> SamlResult<Self> {
        let key_node = require_child(node, NS_METADATA, "KeyDescriptor")?;
        let key_info = require_child(key_node, NS_DSIG, "KeyInfo")?;
        let x509_data = require_child(key_info, NS_DSIG, "X509Data")?;
        let certificate = text_of(require_child(x509_data, NS_DSIG, "X509Certificate")?);

        let mut single_sign_on_services = Vec::new();
        for service in node
            .children()
            .filter(|c| c.is_element() && c.has_tag_name((NS_METADATA, "SingleSignOnService")))
        {
            single_sign_on_services.push(SingleSignOnService {
                binding: require_attr(service, "Binding")?.to_string(),
                location: require_attr(service, "Location")?.to_string(),
            });
        }

        Ok(IdpSsoDescriptor {
            key_descriptor: KeyDescriptor { certificate },
            single_sign_on_services,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_metadata() -> &'static str {
        r#"<?xml version="1.0" encoding="UTF-8"?>
<md:EntityDescriptor xmlns:md="urn:oasis:names:tc:SAML:2.0:metadata"
    entityID="https://idp.example/metadata">
  <md:IDPSSODescriptor protocolSupportEnumeration="urn:oasis:names:tc:SAML:2.0:protocol">
    <md:KeyDescriptor use="signing">
      <ds:KeyInfo xmlns:ds="http://www.w3.org/2000/09/xmldsig#">
        <ds:X509Data>
          <ds:X509Certificate>MIIBkTCCATag</ds:X509Certificate>
        </ds:X509Data>
      </ds:KeyInfo>
    </md:KeyDescriptor>
    <md:SingleSignOnService Binding="urn:oasis:names:tc:SAML:2.0:bindings:HTTP-POST"
        Location="https://idp.example/sso/post"/>
    <md:SingleSignOnService Binding="urn:oasis:names:tc:SAML:2.0:bindings:HTTP-Redirect"
        Location="https://idp.example/sso/redirect"/>
  </md:IDPSSODescriptor>
</md:EntityDescriptor>"#
    }

    #[test]
    fn parses_entity_descriptor() {
        let descriptor = EntityDescriptor::parse(sample_metadata()).unwrap();
        assert_eq!(descriptor.entity_id, "https://idp.example/metadata");
        assert_eq!(
            descriptor.idp_sso_descriptor.key_descriptor.certificate,
            "MIIBkTCCATag"
        );
    }

    #[test]
    fn services_keep_document_order() {
        let descriptor = EntityDescriptor::parse(sample_metadata()).unwrap();
        let services = &descriptor.idp_sso_descriptor.single_sign_on_services;
        assert_eq!(services.len(), 2);
        assert_eq!(
            services[0].binding,
            "urn:oasis:names:tc:SAML:2.0:bindings:HTTP-POST"
        );
        assert_eq!(services[1].binding, BINDING_HTTP_REDIRECT);
        assert_eq!(services[1].location, "https://idp.example/sso/redirect");
    }

    #[test]
    fn rejects_missing_entity_id() {
        let xml = sample_metadata().replace(r#"entityID="https://idp.example/metadata""#, "");
        let err = EntityDescriptor::parse(&xml).unwrap_err();
        assert!(err.to_string().contains("entityID"));
    }

    #[test]
    fn rejects_missing_key_descriptor() {
        let xml = sample_metadata().replace("md:KeyDescriptor", "md:SomethingElse");
        let err = EntityDescriptor::parse(&xml).unwrap_err();
        assert!(matches!(err, SamlError::Parse(_)));
    }

    #[test]
    fn rejects_wrong_root() {
        let err = EntityDescriptor::parse("<EntityDescriptor/>").unwrap_err();
        assert!(matches!(err, SamlError::Parse(_)));
    }
}
