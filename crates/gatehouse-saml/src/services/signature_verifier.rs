//! Enveloped XML signature verification.
//!
//! The verifier consumes this through the [`SignatureVerifier`] trait so
//! tests can substitute a double that asserts on exactly which bytes it was
//! handed. [`XmlDsig`] is the production implementation.

use base64::{engine::general_purpose::STANDARD, Engine};
use openssl::hash::MessageDigest;
use openssl::sign::Verifier;
use openssl::x509::X509;
use quick_xml::events::Event;
use quick_xml::Reader;
use xml_canonicalization::Canonicalizer;

use crate::error::{SamlError, SamlResult};

/// Cryptographic verification of the signature embedded in a document.
///
/// Implementations must be safe to call concurrently and must not retain
/// the certificate or document beyond the call. Failures are reported as
/// [`SamlError::SignatureInvalid`].
pub trait SignatureVerifier: Send + Sync {
    /// Verify the enveloped signature in `document` against `cert`.
    ///
    /// `document` is the raw decoded byte stream as received on the wire,
    /// never a re-serialization of parsed structure.
    fn verify_signature(&self, cert: &X509, document: &[u8]) -> SamlResult<()>;
}

/// XML-DSig verifier: enveloped-signature transform, exclusive C14N,
/// SHA-256 reference digest, RSA signature per `SignatureMethod`.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlDsig;

impl SignatureVerifier for XmlDsig {
    fn verify_signature(&self, cert: &X509, document: &[u8]) -> SamlResult<()> {
        let xml = std::str::from_utf8(document)
            .map_err(|e| SamlError::SignatureInvalid(format!("document is not UTF-8: {e}")))?;

        let embedded = extract_embedded_signature(xml)?;

        // The reference must cover the document root. A reference that
        // points anywhere else would let unsigned sibling content be read
        // as trusted (signature wrapping).
        require_reference_covers_root(xml, &embedded.reference_uri)?;
        verify_document_digest(xml, &embedded.digest_value)?;

        let canonical_signed_info = canonicalize_exclusive(&embedded.signed_info)?;

        let signature_bytes = STANDARD
            .decode(embedded.signature_value.replace(['\n', '\r', ' '], ""))
            .map_err(|e| SamlError::SignatureInvalid(format!("signature encoding: {e}")))?;

        let digest = digest_for_algorithm(&embedded.signature_algorithm)?;

        let public_key = cert
            .public_key()
            .map_err(|e| SamlError::SignatureInvalid(format!("certificate public key: {e}")))?;

        let mut verifier = Verifier::new(digest, &public_key)
            .map_err(|e| SamlError::SignatureInvalid(format!("verifier init: {e}")))?;
        verifier
            .update(canonical_signed_info.as_bytes())
            .map_err(|e| SamlError::SignatureInvalid(format!("verifier update: {e}")))?;

        let valid = verifier
            .verify(&signature_bytes)
            .map_err(|e| SamlError::SignatureInvalid(format!("verification: {e}")))?;
        if valid {
            Ok(())
        } else {
            Err(SamlError::SignatureInvalid(
                "signature does not match".to_string(),
            ))
        }
    }
}

/// Components of a `ds:Signature` pulled out of the raw document text.
#[derive(Debug)]
struct EmbeddedSignature {
    signed_info: String,
    signature_value: String,
    digest_value: String,
    reference_uri: String,
    signature_algorithm: Option<String>,
}

/// Extract `SignedInfo` (verbatim, with qualified tag names preserved for
/// canonicalization), `SignatureValue`, the reference URI, its digest, and
/// the declared signature algorithm.
fn extract_embedded_signature(xml: &str) -> SamlResult<EmbeddedSignature> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut in_signed_info = false;
    let mut in_signature_value = false;
    let mut in_digest_value = false;
    let mut signed_info = String::new();
    let mut signature_value = String::new();
    let mut digest_value = String::new();
    let mut reference_uri = String::new();
    let mut signature_algorithm = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let local = e.local_name();
                let local = std::str::from_utf8(local.as_ref()).unwrap_or("");

                if local == "SignedInfo" {
                    in_signed_info = true;
                }
                if in_signed_info {
                    let raw = std::str::from_utf8(&e).unwrap_or("");
                    signed_info.push('<');
                    signed_info.push_str(raw);
                    signed_info.push('>');
                    scan_signed_info_element(
                        local,
                        &e,
                        &mut reference_uri,
                        &mut signature_algorithm,
                    );
                }
                match local {
                    "SignatureValue" => in_signature_value = true,
                    "DigestValue" => in_digest_value = true,
                    _ => {}
                }
            }
            Ok(Event::Empty(e)) => {
                let local = e.local_name();
                let local = std::str::from_utf8(local.as_ref()).unwrap_or("");
                if in_signed_info {
                    let raw = std::str::from_utf8(&e).unwrap_or("");
                    signed_info.push('<');
                    signed_info.push_str(raw);
                    signed_info.push_str("/>");
                    scan_signed_info_element(
                        local,
                        &e,
                        &mut reference_uri,
                        &mut signature_algorithm,
                    );
                }
            }
            Ok(Event::End(e)) => {
                let qualified = std::str::from_utf8(e.name().as_ref())
                    .unwrap_or("")
                    .to_string();
                let local = e.local_name();
                let local = std::str::from_utf8(local.as_ref()).unwrap_or("");

                if in_signed_info {
                    signed_info.push_str("</");
                    signed_info.push_str(&qualified);
                    signed_info.push('>');
                    if local == "SignedInfo" {
                        in_signed_info = false;
                    }
                }
                match local {
                    "SignatureValue" => in_signature_value = false,
                    "DigestValue" => in_digest_value = false,
                    _ => {}
                }
            }
            Ok(Event::Text(e)) => {
                let text = e.unescape().unwrap_or_default();
                if in_signed_info {
                    signed_info.push_str(&text);
                }
                if in_signature_value {
                    signature_value.push_str(&text);
                }
                if in_digest_value {
                    digest_value.push_str(&text);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(SamlError::SignatureInvalid(format!("XML parse error: {e}")));
            }
            _ => {}
        }
    }

    if signed_info.is_empty() {
        return Err(SamlError::SignatureInvalid(
            "no SignedInfo element".to_string(),
        ));
    }
    if signature_value.trim().is_empty() {
        return Err(SamlError::SignatureInvalid(
            "no SignatureValue element".to_string(),
        ));
    }

    Ok(EmbeddedSignature {
        signed_info,
        signature_value,
        digest_value,
        reference_uri,
        signature_algorithm,
    })
}

fn scan_signed_info_element(
    local: &str,
    element: &quick_xml::events::BytesStart<'_>,
    reference_uri: &mut String,
    signature_algorithm: &mut Option<String>,
) {
    match local {
        "Reference" => {
            for attr in element.attributes().flatten() {
                if attr.key.as_ref() == b"URI" {
                    *reference_uri = attr.unescape_value().unwrap_or_default().to_string();
                }
            }
        }
        "SignatureMethod" => {
            for attr in element.attributes().flatten() {
                if attr.key.as_ref() == b"Algorithm" {
                    *signature_algorithm =
                        Some(attr.unescape_value().unwrap_or_default().to_string());
                }
            }
        }
        _ => {}
    }
}

/// An empty reference URI means "this document". A fragment reference must
/// name the ID of the document root; anything else is rejected.
fn require_reference_covers_root(xml: &str, reference_uri: &str) -> SamlResult<()> {
    let target = reference_uri.trim_start_matches('#');
    if target.is_empty() {
        return Ok(());
    }

    let doc = roxmltree::Document::parse(xml)
        .map_err(|e| SamlError::SignatureInvalid(format!("XML parse error: {e}")))?;
    match doc.root_element().attribute("ID") {
        Some(root_id) if root_id == target => Ok(()),
        _ => Err(SamlError::SignatureInvalid(format!(
            "signature reference {reference_uri:?} does not cover the document root"
        ))),
    }
}

/// Enveloped-signature transform plus digest comparison over the whole
/// document.
fn verify_document_digest(xml: &str, expected_digest: &str) -> SamlResult<()> {
    let content = strip_signature_element(xml);
    let canonical = canonicalize_exclusive(&content)?;

    let digest = openssl::hash::hash(MessageDigest::sha256(), canonical.as_bytes())
        .map_err(|e| SamlError::SignatureInvalid(format!("digest: {e}")))?;
    let computed = STANDARD.encode(digest);

    let expected = expected_digest.replace(['\n', '\r', ' '], "");
    if computed != expected {
        return Err(SamlError::SignatureInvalid("digest mismatch".to_string()));
    }
    Ok(())
}

/// Remove the `ds:Signature` element (the enveloped-signature transform).
fn strip_signature_element(xml: &str) -> String {
    for (open, close) in [
        ("<ds:Signature", "</ds:Signature>"),
        ("<Signature", "</Signature>"),
    ] {
        if let (Some(start), Some(end)) = (xml.find(open), xml.find(close)) {
            let mut result = String::with_capacity(xml.len());
            result.push_str(&xml[..start]);
            result.push_str(&xml[end + close.len()..]);
            return result;
        }
    }
    xml.to_string()
}

/// Apply exclusive XML canonicalization (C14N) without comments.
fn canonicalize_exclusive(xml: &str) -> SamlResult<String> {
    let mut output = Vec::new();
    Canonicalizer::read_from_str(xml)
        .write_to_writer(&mut output)
        .canonicalize(false)
        .map_err(|e| SamlError::SignatureInvalid(format!("canonicalization: {e}")))?;

    String::from_utf8(output)
        .map_err(|e| SamlError::SignatureInvalid(format!("canonical output not UTF-8: {e}")))
}

fn digest_for_algorithm(algorithm: &Option<String>) -> SamlResult<MessageDigest> {
    match algorithm.as_deref() {
        Some("http://www.w3.org/2001/04/xmldsig-more#rsa-sha256") => Ok(MessageDigest::sha256()),
        Some("http://www.w3.org/2000/09/xmldsig#rsa-sha1") => Ok(MessageDigest::sha1()),
        Some("http://www.w3.org/2001/04/xmldsig-more#rsa-sha384") => Ok(MessageDigest::sha384()),
        Some("http://www.w3.org/2001/04/xmldsig-more#rsa-sha512") => Ok(MessageDigest::sha512()),
        Some(other) => Err(SamlError::SignatureInvalid(format!(
            "unsupported signature algorithm: {other}"
        ))),
        None => Err(SamlError::SignatureInvalid(
            "missing SignatureMethod algorithm".to_string(),
        )),
    }
}

// Self-signed certificate (DER, base64) shared by this crate's tests.
#[cfg(test)]
pub(crate) const TEST_CERT_BASE64: &str = "MIIC/zCCAeegAwIBAgIUeBumeIsMNakKlofC3AioissDusswDQYJKoZIhvcNAQELBQAwDzENMAsGA1UEAwwEdGVzdDAeFw0yNjAxMjMwMzQzMDRaFw0yNzAxMjMwMzQzMDRaMA8xDTALBgNVBAMMBHRlc3QwggEiMA0GCSqGSIb3DQEBAQUAA4IBDwAwggEKAoIBAQCk+cG6tSoKRZ0LxMcY3E0oMirafnj7qeSVhDv8LQLuocklq8tIzOvVN1HEb/ZZyuD7E0Xy03SOw9ZeTy0FWCqXcDWpGD2+RbdMZku8q6G35joLq+dW/95kK+dsvWu427ySPVT0AsxzH6VuhdiNQY8ncNc0jV82aMgLt74FGG61xWfwt3Su2NEJ4ZUj9M+0q/o1tmDCBIYF7hUsI5F3qLV9Ivm8UU2C/Uuqxnb3ZtsG5wvnCgi720cU2j+1C0hmt1wf1zUgr18Q1UZ92iQeXHW0FEg3XmULMh3/5GehrP6RyGhegRs4stOdaEZFojW93wQ/YGYQjQmIXW32dq4nyNQ9AgMBAAGjUzBRMB0GA1UdDgQWBBS/LUDCdZWGFd4Ra/rLdqUT2WKkWzAfBgNVHSMEGDAWgBS/LUDCdZWGFd4Ra/rLdqUT2WKkWzAPBgNVHRMBAf8EBTADAQH/MA0GCSqGSIb3DQEBCwUAA4IBAQBUAol6uvWDwrX1XZk7Fzi0zLo4vPslAPxzestYgla+wbmL/Aeo+H3zw5IDmVxq4EOACKHZmAJ7QzVY4XpHtq60zj4HpqGqCJELCh53rrIfJNweIGUxYzMPYueq8aeyFgnGzxIUtLDdJUrrc6kuVDv3g0vVY7loS28Zjps+E4/W7s2dPhsco73dc0VZJra77xGh2F7pYdIVw84Jf1/QEP7G+qT00T3iLtw8TueXFhkYskhQx24/F1+Giwq9Lki2Dgf8TLpXtkcy/aqfRguEFHZhsLOKh09hTj+7qXLoUp5iCz7fA5hrUKjvYxyeYGatyLExkqIG4E3nH5UrOWH+t6Rp";
