/*
 * Copyright (c) 2021 gematik GmbH
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *    http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 *
 */

//! Verification of a returned signed prescription. After the format check,
//! every check runs and every failure is reported; a single call names all
//! the independent reasons a signature is invalid.

use std::time::Duration;

use chrono::{DateTime, Utc};
use log::warn;
use openssl::hash::MessageDigest;
use openssl::sign::Verifier;
use openssl::x509::{X509VerifyResult, X509};

use hl7v3::datatypes::Timestamp;
use hl7v3::fragments::{author_time, signature_root};
use hl7v3::{canonicalize, namespaced, Element, XML_DSIG_NS};

use super::digest::prepare_digest;
use super::error::Error;
use super::revocation::{asn1_to_utc, fetch_revocation_status};

const INVALID_FORMAT: &str = "Invalid signature format";
const INVALID_CERTIFICATE: &str = "Invalid certificate";
const DIGEST_MISMATCH: &str = "Signature doesn't match prescription";
const SIGNATURE_INVALID: &str = "Signature is invalid";
const CERTIFICATE_EXPIRED: &str = "Certificate expired when signed";
const CERTIFICATE_UNTRUSTED: &str = "Certificate not trusted";
const CERTIFICATE_REVOKED: &str = "Certificate is revoked";

#[derive(Debug)]
pub struct VerifyOptions {
    /// The issuing authorities prescriptions must be signed under
    /// (chain-of-one check).
    pub trusted_sub_cas: Vec<X509>,
    pub crl_timeout: Duration,
}

/// Checks a message containing a signed ParentPrescription. The returned
/// list holds one human readable entry per failed check; an empty list
/// means the signature is valid.
pub fn verify_signature(root: &Element, options: &VerifyOptions) -> Vec<String> {
    let signature = match checked_signature(root) {
        Ok(signature) => signature,
        Err(_) => return vec![INVALID_FORMAT.to_owned()],
    };

    let certificate = match parse_certificate(&signature.certificate_base64) {
        Ok(certificate) => certificate,
        Err(err) => {
            warn!("Could not parse X509 certificate: {}", err);
            return vec![INVALID_CERTIFICATE.to_owned()];
        }
    };

    let signing_time = match signing_time(root) {
        Ok(signing_time) => signing_time,
        Err(_) => return vec![INVALID_FORMAT.to_owned()],
    };

    let mut errors = Vec::new();
    let canonical_signed_info = canonicalize(&namespaced(signature.signed_info, XML_DSIG_NS));

    if !digest_matches(root, signature.signed_info) {
        errors.push(DIGEST_MISMATCH.to_owned());
    }

    match signature_valid(&canonical_signed_info, signature.signature_base64, &certificate) {
        Ok(true) => (),
        Ok(false) => errors.push(SIGNATURE_INVALID.to_owned()),
        Err(err) => {
            warn!("Unable to verify signature value: {}", err);
            errors.push(SIGNATURE_INVALID.to_owned());
        }
    }

    if !valid_when_signed(&certificate, signing_time) {
        errors.push(CERTIFICATE_EXPIRED.to_owned());
    }

    if !is_trusted(&certificate, &options.trusted_sub_cas) {
        errors.push(CERTIFICATE_UNTRUSTED.to_owned());
    }

    if fetch_revocation_status(&certificate, signing_time, options.crl_timeout).is_invalid() {
        errors.push(CERTIFICATE_REVOKED.to_owned());
    }

    errors
}

/// Revocation-only view used by the certificate validity endpoint.
pub fn is_certificate_valid(root: &Element, options: &VerifyOptions) -> bool {
    let signature = match checked_signature(root) {
        Ok(signature) => signature,
        Err(_) => return false,
    };

    let certificate = match parse_certificate(&signature.certificate_base64) {
        Ok(certificate) => certificate,
        Err(err) => {
            warn!("Could not parse X509 certificate: {}", err);
            return false;
        }
    };

    let signing_time = match signing_time(root) {
        Ok(signing_time) => signing_time,
        Err(_) => return false,
    };

    !fetch_revocation_status(&certificate, signing_time, options.crl_timeout).is_invalid()
}

struct CheckedSignature<'a> {
    signed_info: &'a Element,
    signature_base64: &'a str,
    certificate_base64: String,
}

/// Format check: SignedInfo, a non-empty SignatureValue, and an embedded
/// certificate must all be present before anything else is computable.
fn checked_signature(root: &Element) -> Result<CheckedSignature<'_>, Error> {
    let signature = signature_root(root)?;

    let signed_info = signature
        .find("SignedInfo")
        .ok_or_else(|| missing("SignedInfo"))?;

    let signature_element = signature
        .find("SignatureValue")
        .ok_or_else(|| missing("SignatureValue"))?;
    let signature_base64 = match signature_element.children.first() {
        Some(hl7v3::Node::Text(text)) if !text.trim().is_empty() => text.as_str(),
        _ => return Err(missing("SignatureValue")),
    };

    let certificate_base64 = signature
        .find_path(&["KeyInfo", "X509Data", "X509Certificate"])
        .map(|element| element.text_content())
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| missing("X509Certificate"))?;

    Ok(CheckedSignature {
        signed_info,
        signature_base64,
        certificate_base64,
    })
}

fn missing(name: &str) -> Error {
    Error::Hl7V3(hl7v3::Error::MissingElement(name.to_owned()))
}

/// The embedded certificate is bare base64 DER; armor has to be added
/// before a standard parser accepts it.
fn parse_certificate(base64_der: &str) -> Result<X509, Error> {
    let pem = format!(
        "-----BEGIN CERTIFICATE-----\n{}\n-----END CERTIFICATE-----\n",
        base64_der.trim()
    );

    Ok(X509::from_pem(pem.as_bytes())?)
}

fn signing_time(root: &Element) -> Result<DateTime<Utc>, Error> {
    let value = author_time(root)?;

    Timestamp::parse(value)
        .map(|t| t.to_utc())
        .map_err(|_| Error::InvalidSigningTime(value.to_owned()))
}

fn digest_matches(root: &Element, signed_info: &Element) -> bool {
    let digest_on_signature = match signed_info.find_path(&["Reference", "DigestValue"]) {
        Some(value) => value.text_content().trim().to_owned(),
        None => return false,
    };

    match prepare_digest(root) {
        Ok(prepared) => prepared.digest_value == digest_on_signature,
        Err(err) => {
            warn!("Unable to recompute prescription digest: {}", err);
            false
        }
    }
}

fn signature_valid(
    canonical_signed_info: &[u8],
    signature_base64: &str,
    certificate: &X509,
) -> Result<bool, Error> {
    let without_whitespace: String = signature_base64
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    let signature = base64::decode(&without_whitespace)?;

    let public_key = certificate.public_key()?;
    let mut verifier = Verifier::new(MessageDigest::sha1(), &public_key)?;
    verifier.update(canonical_signed_info)?;

    Ok(verifier.verify(&signature)?)
}

fn valid_when_signed(certificate: &X509, signing_time: DateTime<Utc>) -> bool {
    let not_before = match asn1_to_utc(certificate.not_before()) {
        Ok(t) => t,
        Err(_) => return false,
    };
    let not_after = match asn1_to_utc(certificate.not_after()) {
        Ok(t) => t,
        Err(_) => return false,
    };

    not_before <= signing_time && signing_time <= not_after
}

fn is_trusted(certificate: &X509, trusted_sub_cas: &[X509]) -> bool {
    trusted_sub_cas.iter().any(|ca| {
        if ca.issued(certificate) != X509VerifyResult::OK {
            return false;
        }

        match ca.public_key() {
            Ok(key) => certificate.verify(&key).unwrap_or(false),
            Err(_) => false,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use openssl::asn1::Asn1Time;
    use openssl::bn::{BigNum, MsbOption};
    use openssl::hash::MessageDigest;
    use openssl::nid::Nid;
    use openssl::pkey::{PKey, Private};
    use openssl::rsa::Rsa;
    use openssl::sign::Signer;
    use openssl::x509::{X509NameBuilder, X509};

    use hl7v3::parse;

    const PRESCRIPTION: &str = r#"<ParentPrescription>
        <recordTarget><Patient><id root="2.16.840.1.113883.2.1.4.1" extension="9990548609"/></Patient></recordTarget>
        <pertinentInformation1>
            <pertinentPrescription>
                <id root="A5B9DC81-CCF4-4DAB-B887-3D88E557FEBB"/>
                <id root="2.16.840.1.113883.2.1.3.2.4.18.8" extension="E3E6FA-A83008-41F09Y"/>
                <author>
                    <time value="20201218123400"/>
                    <signatureText nullFlavor="NA"/>
                    <AgentPerson><id root="1.2.826.0.1285.0.2.0.67" extension="100102238986"/></AgentPerson>
                </author>
                <pertinentInformation2><pertinentLineItem><id root="A54219B8-F741-4C47-B662-E4F8DFA49AB6"/></pertinentLineItem></pertinentInformation2>
            </pertinentPrescription>
        </pertinentInformation1>
    </ParentPrescription>"#;

    fn generate_key() -> PKey<Private> {
        let rsa = Rsa::generate(2048).unwrap();

        PKey::from_rsa(rsa).unwrap()
    }

    /// Self signed test certificate, the same way the workspace tooling
    /// creates them.
    fn generate_certificate(key: &PKey<Private>, not_before: i64, not_after: i64) -> X509 {
        let mut name = X509NameBuilder::new().unwrap();
        name.append_entry_by_nid(Nid::COMMONNAME, "Test Prescriber").unwrap();
        let name = name.build();

        let mut serial = BigNum::new().unwrap();
        serial.rand(159, MsbOption::MAYBE_ZERO, false).unwrap();
        let serial = serial.to_asn1_integer().unwrap();

        let mut builder = X509::builder().unwrap();
        builder.set_version(2).unwrap();
        builder.set_serial_number(&serial).unwrap();
        builder.set_subject_name(&name).unwrap();
        builder.set_issuer_name(&name).unwrap();
        builder
            .set_not_before(&Asn1Time::from_unix(not_before).unwrap())
            .unwrap();
        builder
            .set_not_after(&Asn1Time::from_unix(not_after).unwrap())
            .unwrap();
        builder.set_pubkey(key).unwrap();
        builder.sign(key, MessageDigest::sha256()).unwrap();

        builder.build()
    }

    fn child_mut<'a>(element: &'a mut Element, name: &str) -> &'a mut Element {
        element
            .children
            .iter_mut()
            .find_map(|node| match node {
                hl7v3::Node::Element(e) if e.name == name => Some(e),
                _ => None,
            })
            .unwrap()
    }

    /// Signs the prescription and embeds Signature/SignedInfo/KeyInfo into
    /// the author's signatureText.
    fn signed_prescription(key: &PKey<Private>, certificate: &X509) -> Element {
        let mut root = parse(PRESCRIPTION).unwrap();

        let prepared = prepare_digest(&root).unwrap();

        let mut signer = Signer::new(MessageDigest::sha1(), key).unwrap();
        signer.update(prepared.signed_info.as_bytes()).unwrap();
        let signature_value = base64::encode(signer.sign_to_vec().unwrap());

        let signed_info = parse(&prepared.signed_info).unwrap();
        let certificate_base64 = base64::encode(certificate.to_der().unwrap());

        let signature = Element::new("Signature")
            .attr("xmlns", XML_DSIG_NS)
            .child(signed_info)
            .child(Element::new("SignatureValue").text(signature_value))
            .child(
                Element::new("KeyInfo").child(
                    Element::new("X509Data")
                        .child(Element::new("X509Certificate").text(certificate_base64)),
                ),
            );

        let prescription = child_mut(child_mut(&mut root, "pertinentInformation1"), "pertinentPrescription");
        let signature_text = child_mut(child_mut(prescription, "author"), "signatureText");
        signature_text.attributes.clear();
        signature_text.children = vec![hl7v3::Node::Element(signature)];

        root
    }

    fn options(trusted: Vec<X509>) -> VerifyOptions {
        VerifyOptions {
            trusted_sub_cas: trusted,
            crl_timeout: Duration::from_secs(10),
        }
    }

    // certificate window covering the fixed signing time 2020-12-18
    const VALID_FROM: i64 = 1_577_836_800; // 2020-01-01
    const VALID_TO: i64 = 1_672_531_200; // 2023-01-01

    #[test]
    fn valid_signature_produces_no_errors() {
        let key = generate_key();
        let certificate = generate_certificate(&key, VALID_FROM, VALID_TO);
        let root = signed_prescription(&key, &certificate);

        let errors = verify_signature(&root, &options(vec![certificate]));

        assert_eq!(errors, Vec::<String>::new());
    }

    #[test]
    fn tampered_fragment_fails_the_digest_check() {
        let key = generate_key();
        let certificate = generate_certificate(&key, VALID_FROM, VALID_TO);
        let mut root = signed_prescription(&key, &certificate);

        let patient_id = child_mut(child_mut(child_mut(&mut root, "recordTarget"), "Patient"), "id");
        patient_id.set_attribute("extension", "9990548617");

        let errors = verify_signature(&root, &options(vec![certificate]));

        assert!(errors.contains(&DIGEST_MISMATCH.to_owned()));
    }

    #[test]
    fn certificate_window_excluding_signing_time_is_reported() {
        let key = generate_key();
        // window opens a year after the prescription was signed
        let certificate = generate_certificate(&key, 1_640_995_200, 1_672_531_200);
        let root = signed_prescription(&key, &certificate);

        let errors = verify_signature(&root, &options(vec![certificate]));

        assert!(errors.contains(&CERTIFICATE_EXPIRED.to_owned()));
    }

    #[test]
    fn unrelated_issuer_is_untrusted() {
        let key = generate_key();
        let certificate = generate_certificate(&key, VALID_FROM, VALID_TO);
        let other_key = generate_key();
        let other_ca = generate_certificate(&other_key, VALID_FROM, VALID_TO);
        let root = signed_prescription(&key, &certificate);

        let errors = verify_signature(&root, &options(vec![other_ca]));

        assert!(errors.contains(&CERTIFICATE_UNTRUSTED.to_owned()));
    }

    #[test]
    fn missing_signature_is_a_format_error() {
        let root = parse(PRESCRIPTION).unwrap();

        let errors = verify_signature(&root, &options(Vec::new()));

        assert_eq!(errors, vec![INVALID_FORMAT.to_owned()]);
    }

    #[test]
    fn wrong_key_fails_the_cryptographic_check() {
        let key = generate_key();
        let other_key = generate_key();
        // certificate carries a different public key than the signing key
        let certificate = generate_certificate(&other_key, VALID_FROM, VALID_TO);
        let root = signed_prescription(&key, &certificate);

        let errors = verify_signature(&root, &options(vec![certificate]));

        assert!(errors.contains(&SIGNATURE_INVALID.to_owned()));
    }
}
