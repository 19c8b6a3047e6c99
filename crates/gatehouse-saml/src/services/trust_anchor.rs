//! Trust-anchor extraction from IdP metadata.

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine};
use openssl::x509::X509;
use tracing::debug;
use url::Url;

use crate::error::{SamlError, SamlResult};
use crate::schema::metadata::{EntityDescriptor, BINDING_HTTP_REDIRECT};

/// The three facts a relying party needs from an identity provider's
/// metadata to validate future logins: who the IdP is, what key it signs
/// with, and where to send the user's browser.
///
/// Extraction runs once per trust relationship (typically on administrator
/// upload of metadata); the anchor is persisted by the caller and supplied
/// to the response verifier on every subsequent login.
#[derive(Clone)]
pub struct TrustAnchor {
    /// The IdP's issuer identity, compared against `Assertion.Issuer`
    pub entity_id: String,
    /// The IdP's signing certificate. Structurally parsed only: expiry and
    /// chain are not checked here.
    pub certificate: X509,
    /// Location of the IdP's HTTP-Redirect single-sign-on endpoint
    pub redirect_url: Url,
}

impl TrustAnchor {
    /// Extract a trust anchor from a parsed entity descriptor.
    ///
    /// The first `SingleSignOnService` in document order whose binding is
    /// [`BINDING_HTTP_REDIRECT`] wins; if none is declared the metadata is
    /// unusable for redirect-initiated login and extraction fails with
    /// [`SamlError::NoRedirectBinding`].
    pub fn from_descriptor(descriptor: &EntityDescriptor) -> SamlResult<Self> {
        // Published certificates are usually line-wrapped; the base64
        // decoder does not tolerate whitespace.
        let encoded = descriptor
            .idp_sso_descriptor
            .key_descriptor
            .certificate
            .replace(['\n', '\r', ' ', '\t'], "");
        let der = STANDARD
            .decode(encoded)
            .map_err(|e| SamlError::Decode(e.to_string()))?;
        let certificate =
            X509::from_der(&der).map_err(|e| SamlError::CertificateParse(e.to_string()))?;

        for service in &descriptor.idp_sso_descriptor.single_sign_on_services {
            if service.binding == BINDING_HTTP_REDIRECT {
                let redirect_url = Url::parse(&service.location).map_err(|e| {
                    SamlError::Parse(format!("invalid SSO location {:?}: {e}", service.location))
                })?;
                debug!(entity_id = %descriptor.entity_id, "extracted IdP trust anchor");
                return Ok(TrustAnchor {
                    entity_id: descriptor.entity_id.clone(),
                    certificate,
                    redirect_url,
                });
            }
        }

        Err(SamlError::NoRedirectBinding)
    }

    /// Convenience entry point: parse a metadata document and extract its
    /// trust anchor in one step.
    pub fn from_metadata_xml(xml: &str) -> SamlResult<Self> {
        Self::from_descriptor(&EntityDescriptor::parse(xml)?)
    }
}

impl fmt::Debug for TrustAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrustAnchor")
            .field("entity_id", &self.entity_id)
            .field("redirect_url", &self.redirect_url.as_str())
            .finish_non_exhaustive()
    }
}
