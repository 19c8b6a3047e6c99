//! SP-side SAML 2.0 response verification for gatehouse
//!
//! This crate turns an untrusted HTTP form field into a trustworthy
//! statement about who logged in, issued by whom, valid until when, and
//! intended for whom. It provides:
//! - Response verification: decode, parse, cryptographically authenticate,
//!   and business-validate a signed SAML response
//!   ([`ResponseVerifier`])
//! - Trust-anchor extraction: pull the issuer identity, signing
//!   certificate, and HTTP-Redirect endpoint out of IdP metadata
//!   ([`TrustAnchor`])
//!
//! Both operations are synchronous, side-effect-free functions over their
//! arguments: no internal state, no clock reads (the caller supplies
//! `now`), no I/O. Application concerns — sessions, users, HTTP routing,
//! persistence of trust anchors — live in the caller.

pub mod error;
pub mod schema;
pub mod services;

pub use error::{SamlError, SamlResult};
pub use schema::metadata::{
    EntityDescriptor, IdpSsoDescriptor, KeyDescriptor, SingleSignOnService,
    BINDING_HTTP_REDIRECT,
};
pub use schema::response::{
    Assertion, Attribute, AttributeStatement, Conditions, NameId, Response, Subject,
    SubjectConfirmation, SubjectConfirmationData,
};
pub use services::{ResponseVerifier, SignatureVerifier, TrustAnchor, XmlDsig};

/// Name of the HTTP POST body field where SAML delivers responses.
///
/// Handlers responding to SAML logins read the base64 response from this
/// form field and hand it to [`ResponseVerifier::verify`].
pub const PARAM_SAML_RESPONSE: &str = "SAMLResponse";

/// Name of the relay-state parameter: the query parameter to set when
/// initiating a login, and the POST body field it is echoed back on.
///
/// Its contents are an opaque deep-link token for the caller; this crate
/// never inspects or validates it.
pub const PARAM_RELAY_STATE: &str = "RelayState";
