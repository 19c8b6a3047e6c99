//! Shared fixtures and signature-collaborator doubles for integration
//! tests.
#![allow(dead_code)]

use std::sync::Mutex;

use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, TimeZone, Utc};
use openssl::x509::X509;

use gatehouse_saml::{SamlError, SamlResult, SignatureVerifier};

/// Self-signed certificate (DER, base64). The signature doubles below never
/// actually use the key; verification tests only need a structurally valid
/// certificate to pass in.
pub const TEST_CERT_BASE64: &str = "MIIC/zCCAeegAwIBAgIUeBumeIsMNakKlofC3AioissDusswDQYJKoZIhvcNAQELBQAwDzENMAsGA1UEAwwEdGVzdDAeFw0yNjAxMjMwMzQzMDRaFw0yNzAxMjMwMzQzMDRaMA8xDTALBgNVBAMMBHRlc3QwggEiMA0GCSqGSIb3DQEBAQUAA4IBDwAwggEKAoIBAQCk+cG6tSoKRZ0LxMcY3E0oMirafnj7qeSVhDv8LQLuocklq8tIzOvVN1HEb/ZZyuD7E0Xy03SOw9ZeTy0FWCqXcDWpGD2+RbdMZku8q6G35joLq+dW/95kK+dsvWu427ySPVT0AsxzH6VuhdiNQY8ncNc0jV82aMgLt74FGG61xWfwt3Su2NEJ4ZUj9M+0q/o1tmDCBIYF7hUsI5F3qLV9Ivm8UU2C/Uuqxnb3ZtsG5wvnCgi720cU2j+1C0hmt1wf1zUgr18Q1UZ92iQeXHW0FEg3XmULMh3/5GehrP6RyGhegRs4stOdaEZFojW93wQ/YGYQjQmIXW32dq4nyNQ9AgMBAAGjUzBRMB0GA1UdDgQWBBS/LUDCdZWGFd4Ra/rLdqUT2WKkWzAfBgNVHSMEGDAWgBS/LUDCdZWGFd4Ra/rLdqUT2WKkWzAPBgNVHRMBAf8EBTADAQH/MA0GCSqGSIb3DQEBCwUAA4IBAQBUAol6uvWDwrX1XZk7Fzi0zLo4vPslAPxzestYgla+wbmL/Aeo+H3zw5IDmVxq4EOACKHZmAJ7QzVY4XpHtq60zj4HpqGqCJELCh53rrIfJNweIGUxYzMPYueq8aeyFgnGzxIUtLDdJUrrc6kuVDv3g0vVY7loS28Zjps+E4/W7s2dPhsco73dc0VZJra77xGh2F7pYdIVw84Jf1/QEP7G+qT00T3iLtw8TueXFhkYskhQx24/F1+Giwq9Lki2Dgf8TLpXtkcy/aqfRguEFHZhsLOKh09hTj+7qXLoUp5iCz7fA5hrUKjvYxyeYGatyLExkqIG4E3nH5UrOWH+t6Rp";

pub fn test_certificate() -> X509 {
    let der = STANDARD.decode(TEST_CERT_BASE64).unwrap();
    X509::from_der(&der).unwrap()
}

/// Fixture epoch: all test windows are offsets from this instant.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 5, 10, 0, 0).unwrap()
}

pub struct ResponseFixture {
    pub issuer: String,
    pub recipient: String,
    pub name_id: String,
    pub not_before: DateTime<Utc>,
    pub conditions_not_on_or_after: DateTime<Utc>,
    pub confirmation_not_on_or_after: DateTime<Utc>,
    pub signature_value: String,
}

impl Default for ResponseFixture {
    fn default() -> Self {
        ResponseFixture {
            issuer: "idp-a".to_string(),
            recipient: "https://sp.example/acs".to_string(),
            name_id: "alice@example.com".to_string(),
            not_before: t0(),
            conditions_not_on_or_after: t0() + chrono::Duration::minutes(5),
            confirmation_not_on_or_after: t0() + chrono::Duration::minutes(5),
            signature_value: "ZmFrZS1zaWduYXR1cmU=".to_string(),
        }
    }
}

impl ResponseFixture {
    pub fn xml(&self) -> String {
        let fmt = "%Y-%m-%dT%H:%M:%SZ";
        format!(
            r##"<?xml version="1.0" encoding="UTF-8"?>
<samlp:Response xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol"
    xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion"
    xmlns:ds="http://www.w3.org/2000/09/xmldsig#"
    ID="_resp1" Version="2.0" IssueInstant="{issue_instant}">
  <ds:Signature>
    <ds:SignedInfo>
      <ds:SignatureMethod Algorithm="http://www.w3.org/2001/04/xmldsig-more#rsa-sha256"/>
      <ds:Reference URI="#_resp1"><ds:DigestValue>AAAA</ds:DigestValue></ds:Reference>
    </ds:SignedInfo>
    <ds:SignatureValue>{signature_value}</ds:SignatureValue>
  </ds:Signature>
  <saml:Assertion ID="_assert1" Version="2.0" IssueInstant="{issue_instant}">
    <saml:Issuer>{issuer}</saml:Issuer>
    <saml:Subject>
      <saml:NameID Format="urn:oasis:names:tc:SAML:1.1:nameid-format:emailAddress">{name_id}</saml:NameID>
      <saml:SubjectConfirmation Method="urn:oasis:names:tc:SAML:2.0:cm:bearer">
        <saml:SubjectConfirmationData Recipient="{recipient}"
            NotOnOrAfter="{confirmation_not_on_or_after}"/>
      </saml:SubjectConfirmation>
    </saml:Subject>
    <saml:Conditions NotBefore="{not_before}" NotOnOrAfter="{conditions_not_on_or_after}"/>
    <saml:AttributeStatement>
      <saml:Attribute Name="email">
        <saml:AttributeValue>{name_id}</saml:AttributeValue>
      </saml:Attribute>
    </saml:AttributeStatement>
  </saml:Assertion>
</samlp:Response>"##,
            issue_instant = self.not_before.format(fmt),
            signature_value = self.signature_value,
            issuer = self.issuer,
            name_id = self.name_id,
            recipient = self.recipient,
            not_before = self.not_before.format(fmt),
            conditions_not_on_or_after = self.conditions_not_on_or_after.format(fmt),
            confirmation_not_on_or_after = self.confirmation_not_on_or_after.format(fmt),
        )
    }

    /// The fixture as it arrives on the wire: base64 of the XML.
    pub fn encoded(&self) -> String {
        STANDARD.encode(self.xml())
    }
}

/// Collaborator double that accepts every signature.
pub struct AcceptAll;

impl SignatureVerifier for AcceptAll {
    fn verify_signature(&self, _cert: &X509, _document: &[u8]) -> SamlResult<()> {
        Ok(())
    }
}

/// Collaborator double that rejects every signature.
pub struct RejectAll;

impl SignatureVerifier for RejectAll {
    fn verify_signature(&self, _cert: &X509, _document: &[u8]) -> SamlResult<()> {
        Err(SamlError::SignatureInvalid("test double".to_string()))
    }
}

/// Collaborator double that accepts and records the exact bytes it was
/// handed, so tests can assert the verifier passes through the original
/// decoded byte stream.
#[derive(Default)]
pub struct Recording {
    pub seen: Mutex<Option<Vec<u8>>>,
}

impl SignatureVerifier for Recording {
    fn verify_signature(&self, _cert: &X509, document: &[u8]) -> SamlResult<()> {
        *self.seen.lock().unwrap() = Some(document.to_vec());
        Ok(())
    }
}
