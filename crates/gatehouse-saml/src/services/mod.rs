//! Verification and extraction services

pub mod response_verifier;
pub mod signature_verifier;
pub mod trust_anchor;

pub use response_verifier::ResponseVerifier;
pub use signature_verifier::{SignatureVerifier, XmlDsig};
pub use trust_anchor::TrustAnchor;
