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

//! Builds the canonical `SignedInfo` for a prescription: fragments are
//! extracted in the mandated order, canonicalized, hashed with SHA-1, and
//! the base64 digest is wrapped in the xmldsig `SignedInfo` structure which
//! is itself canonicalized for the external signer.

use openssl::hash::{hash, MessageDigest};

use hl7v3::fragments::{extract, Fragments};
use hl7v3::{canonicalize, namespaced, Element, Error as Hl7V3Error, XML_DSIG_NS};

use super::error::Error;

pub const EXC_C14N: &str = "http://www.w3.org/2001/10/xml-exc-c14n#";
pub const RSA_SHA1: &str = "http://www.w3.org/2000/09/xmldsig#rsa-sha1";
pub const SHA1: &str = "http://www.w3.org/2000/09/xmldsig#sha1";

#[derive(Clone, PartialEq, Debug)]
pub struct PreparedDigest {
    /// Base64 SHA-1 over the canonicalized fragment set.
    pub digest_value: String,
    /// Canonical bytes of the `SignedInfo` element, the exact value an
    /// external signer signs.
    pub signed_info: String,
    /// The fragments the digest was computed over, kept for traceability.
    pub fragments: Fragments,
}

/// Computes the signing digest for a message containing a
/// ParentPrescription.
pub fn prepare_digest(root: &Element) -> Result<PreparedDigest, Error> {
    let fragments = extract(root)?;

    let hashable = canonicalize(&fragments.to_hashable());
    let digest_value = base64::encode(hash(MessageDigest::sha1(), &hashable)?);

    let signed_info = signed_info(&digest_value);
    let signed_info = String::from_utf8(canonicalize(&signed_info))
        .map_err(|_| Error::Hl7V3(Hl7V3Error::MissingRoot))?;

    Ok(PreparedDigest {
        digest_value,
        signed_info,
        fragments,
    })
}

pub fn signed_info(digest_value: &str) -> Element {
    let element = Element::new("SignedInfo")
        .child(algorithm("CanonicalizationMethod", EXC_C14N))
        .child(algorithm("SignatureMethod", RSA_SHA1))
        .child(
            Element::new("Reference")
                .child(Element::new("Transforms").child(algorithm("Transform", EXC_C14N)))
                .child(algorithm("DigestMethod", SHA1))
                .child(Element::new("DigestValue").text(digest_value.to_owned())),
        );

    namespaced(&element, XML_DSIG_NS)
}

fn algorithm(name: &str, value: &str) -> Element {
    Element::new(name).attr("Algorithm", value)
}

#[cfg(test)]
mod tests {
    use super::*;
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

    #[test]
    fn digest_is_deterministic() {
        let root = parse(PRESCRIPTION).unwrap();

        let first = prepare_digest(&root).unwrap();
        let second = prepare_digest(&root).unwrap();

        assert_eq!(first.digest_value, second.digest_value);
        assert_eq!(first.signed_info, second.signed_info);
    }

    #[test]
    fn digest_changes_with_the_prescription() {
        let root = parse(PRESCRIPTION).unwrap();
        let tampered = parse(&PRESCRIPTION.replace("9990548609", "9990548617")).unwrap();

        let original = prepare_digest(&root).unwrap();
        let modified = prepare_digest(&tampered).unwrap();

        assert_ne!(original.digest_value, modified.digest_value);
    }

    #[test]
    fn signed_info_carries_the_xmldsig_namespace_and_methods() {
        let root = parse(PRESCRIPTION).unwrap();

        let prepared = prepare_digest(&root).unwrap();

        assert!(prepared
            .signed_info
            .starts_with("<SignedInfo xmlns=\"http://www.w3.org/2000/09/xmldsig#\">"));
        assert!(prepared.signed_info.contains(EXC_C14N));
        assert!(prepared.signed_info.contains(RSA_SHA1));
        assert!(prepared.signed_info.contains(&prepared.digest_value));
    }
}
