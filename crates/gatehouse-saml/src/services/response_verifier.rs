//! SAML response verification service.

use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, Utc};
use openssl::x509::X509;
use tracing::{debug, warn};

use super::signature_verifier::{SignatureVerifier, XmlDsig};
use crate::error::{SamlError, SamlResult};
use crate::schema::response::Response;

/// Maximum encoded size for a `SAMLResponse` form value (512 KB).
/// Prevents memory exhaustion from oversized base64 input before decoding.
const MAX_ENCODED_SIZE: usize = 512 * 1024;

/// Verifies SAML responses: decode, parse, signature gate, business rules.
///
/// The verifier is stateless and reads nothing but its arguments, so one
/// instance may be shared freely across threads. The current time is a
/// parameter rather than a clock read, which keeps verification
/// deterministic and testable.
///
/// The signature collaborator is injected so tests can substitute a double;
/// production callers use [`ResponseVerifier::new`], which wires in
/// [`XmlDsig`].
pub struct ResponseVerifier<V = XmlDsig> {
    dsig: V,
}

impl ResponseVerifier<XmlDsig> {
    pub fn new() -> Self {
        Self { dsig: XmlDsig }
    }
}

impl Default for ResponseVerifier<XmlDsig> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: SignatureVerifier> ResponseVerifier<V> {
    /// Build a verifier around a custom signature collaborator.
    pub fn with_verifier(dsig: V) -> Self {
        Self { dsig }
    }

    /// Parse and verify a SAML response.
    ///
    /// `saml_response` is the base64 value of the `SAMLResponse` POST body
    /// field. `expected_issuer` and `expected_recipient` are compared by
    /// exact string equality against the assertion. `cert` is the IdP's
    /// signing certificate, typically taken from a persisted
    /// [`TrustAnchor`](crate::services::trust_anchor::TrustAnchor); its own
    /// expiry is *not* checked here. `now` should be the current time in
    /// production and a fixed instant in tests.
    ///
    /// Check order is load-bearing: the signature is verified against the
    /// original decoded bytes before any field value is trusted, so a
    /// document that fails both the signature check and a business rule
    /// always reports [`SamlError::SignatureInvalid`].
    ///
    /// Every failure is a final verdict for this input; nothing is retried.
    pub fn verify(
        &self,
        saml_response: &str,
        expected_issuer: &str,
        cert: &X509,
        expected_recipient: &str,
        now: DateTime<Utc>,
    ) -> SamlResult<Response> {
        if saml_response.len() > MAX_ENCODED_SIZE {
            return Err(SamlError::Decode(format!(
                "encoded response exceeds maximum size ({} > {MAX_ENCODED_SIZE} bytes)",
                saml_response.len()
            )));
        }

        let data = STANDARD
            .decode(saml_response)
            .map_err(|e| SamlError::Decode(e.to_string()))?;

        let xml = std::str::from_utf8(&data)
            .map_err(|e| SamlError::Parse(format!("invalid UTF-8: {e}")))?;
        let response = Response::parse(xml)?;

        // Only a fully-signed response is acceptable. An IdP that signs
        // only the inner assertion counts as unsigned.
        if response.signature_value.is_empty() {
            warn!("rejected SAML response: not signed");
            return Err(SamlError::ResponseNotSigned);
        }

        // The signature is checked over the bytes as received, never a
        // re-serialization of the parsed structure: a lenient re-serialize
        // would drop injected sibling elements that the parser still read
        // values from (signature wrapping).
        if let Err(err) = self.dsig.verify_signature(cert, &data) {
            warn!(error = %err, "rejected SAML response: signature verification failed");
            return Err(err);
        }

        // Past this point the parsed fields are trustworthy.
        let assertion = &response.assertion;

        if assertion.issuer != expected_issuer {
            warn!(issuer = %assertion.issuer, "rejected SAML response: unexpected issuer");
            return Err(SamlError::InvalidIssuer(assertion.issuer.clone()));
        }

        let confirmation = &assertion.subject.subject_confirmation.data;
        if confirmation.recipient != expected_recipient {
            warn!(recipient = %confirmation.recipient, "rejected SAML response: unexpected recipient");
            return Err(SamlError::InvalidRecipient(confirmation.recipient.clone()));
        }

        if now < assertion.conditions.not_before {
            warn!("rejected SAML response: assertion not yet valid");
            return Err(SamlError::AssertionExpired);
        }

        // "Not on or after": the boundary instant itself is expired.
        if now >= assertion.conditions.not_on_or_after {
            warn!("rejected SAML response: assertion expired");
            return Err(SamlError::AssertionExpired);
        }

        if now >= confirmation.not_on_or_after {
            warn!("rejected SAML response: subject confirmation expired");
            return Err(SamlError::AssertionExpired);
        }

        debug!(issuer = %assertion.issuer, "SAML response verified");
        Ok(response)
    }
}
