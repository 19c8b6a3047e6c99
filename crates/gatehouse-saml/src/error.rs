//! SAML verification error types

use thiserror::Error;

/// Result type for SAML operations
pub type SamlResult<T> = Result<T, SamlError>;

/// Errors returned by response verification and metadata extraction.
///
/// Every variant is a terminal verdict for the input that produced it;
/// nothing is retried internally. Callers should show end users an opaque
/// rejection and keep the precise variant for operator-facing logs — most
/// of these (`SignatureInvalid` and `InvalidIssuer` in particular) are
/// security signals, not user mistakes.
#[derive(Debug, Error)]
pub enum SamlError {
    /// Base64 payload malformed or oversized
    #[error("base64 decode failed: {0}")]
    Decode(String),

    /// XML malformed, a required element or attribute missing, or a URL
    /// malformed
    #[error("malformed document: {0}")]
    Parse(String),

    /// The response carries no signature value.
    ///
    /// Only a fully-signed response is accepted. An identity provider that
    /// signs only the inner assertion is treated as unsigned.
    #[error("response not signed")]
    ResponseNotSigned,

    /// Cryptographic signature verification failed
    #[error("signature verification failed: {0}")]
    SignatureInvalid(String),

    /// The assertion was issued by an entity other than the expected one.
    ///
    /// May indicate an attacker replaying an assertion issued by their own
    /// identity provider.
    #[error("unexpected issuer: {0}")]
    InvalidIssuer(String),

    /// The assertion was addressed to a recipient other than the expected
    /// one.
    ///
    /// May indicate an assertion meant for a different service provider
    /// being replayed against this one.
    #[error("unexpected recipient: {0}")]
    InvalidRecipient(String),

    /// The assertion is expired or not yet valid
    #[error("assertion expired")]
    AssertionExpired,

    /// The embedded certificate bytes are not a valid X.509 certificate
    #[error("certificate parse error: {0}")]
    CertificateParse(String),

    /// The IdP metadata declares no HTTP-Redirect single-sign-on binding
    #[error("no HTTP-Redirect binding in IdP metadata")]
    NoRedirectBinding,
}
