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

//! The signable excerpt of a prescription. The fragment order below is part
//! of the signing contract: author time and prescription id first, then the
//! author's AgentPerson, the record target, and every line item in document
//! order. Reordering changes the digest.

use super::c14n::namespaced;
use super::element::{Element, HL7_V3_NS};
use super::error::Error;

#[derive(Clone, PartialEq, Debug)]
pub struct Fragments {
    pub time: Element,
    pub id: Element,
    pub agent_person: Element,
    pub record_target: Element,
    pub line_items: Vec<Element>,
}

/// Extracts the signable fragments from a (built or parsed) message that
/// contains a ParentPrescription. Every fragment root regains the explicit
/// wire namespace so that hashing an extracted sub-tree matches hashing it
/// in place.
pub fn extract(root: &Element) -> Result<Fragments, Error> {
    let parent_prescription = root
        .find_descendant("ParentPrescription")
        .ok_or_else(|| Error::MissingElement("ParentPrescription".into()))?;

    let prescription = parent_prescription
        .find_path(&["pertinentInformation1", "pertinentPrescription"])
        .ok_or_else(|| Error::MissingElement("pertinentPrescription".into()))?;

    let author = prescription
        .find("author")
        .ok_or_else(|| Error::MissingElement("author".into()))?;
    let time = author
        .find("time")
        .ok_or_else(|| Error::MissingElement("author/time".into()))?;
    let agent_person = author
        .find("AgentPerson")
        .ok_or_else(|| Error::MissingElement("author/AgentPerson".into()))?;

    let id = prescription
        .find("id")
        .ok_or_else(|| Error::MissingElement("pertinentPrescription/id".into()))?;

    let record_target = parent_prescription
        .find("recordTarget")
        .ok_or_else(|| Error::MissingElement("recordTarget".into()))?;

    let line_items = prescription
        .find_all("pertinentInformation2")
        .map(|wrapper| {
            wrapper
                .find("pertinentLineItem")
                .map(|item| namespaced(item, HL7_V3_NS))
                .ok_or_else(|| Error::MissingElement("pertinentLineItem".into()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Fragments {
        time: namespaced(time, HL7_V3_NS),
        id: namespaced(id, HL7_V3_NS),
        agent_person: namespaced(agent_person, HL7_V3_NS),
        record_target: namespaced(record_target, HL7_V3_NS),
        line_items,
    })
}

impl Fragments {
    /// The document that actually gets hashed:
    /// `<FragmentsToBeHashed><Fragment>…</Fragment>…</FragmentsToBeHashed>`.
    pub fn to_hashable(&self) -> Element {
        let mut root = Element::new("FragmentsToBeHashed")
            .child(
                Element::new("Fragment")
                    .child(self.time.clone())
                    .child(self.id.clone()),
            )
            .child(Element::new("Fragment").child(self.agent_person.clone()))
            .child(Element::new("Fragment").child(self.record_target.clone()));

        for line_item in &self.line_items {
            root = root.child(Element::new("Fragment").child(line_item.clone()));
        }

        root
    }
}

/// The signature root embedded in the author's `signatureText`, present on
/// a signed prescription.
pub fn signature_root(root: &Element) -> Result<&Element, Error> {
    root.find_descendant("ParentPrescription")
        .and_then(|p| p.find_path(&["pertinentInformation1", "pertinentPrescription", "author"]))
        .and_then(|author| author.find("signatureText"))
        .and_then(|text| text.find("Signature"))
        .ok_or_else(|| Error::MissingElement("signatureText/Signature".into()))
}

/// The author time attribute, which doubles as the signing time.
pub fn author_time(root: &Element) -> Result<&str, Error> {
    root.find_descendant("ParentPrescription")
        .and_then(|p| p.find_path(&["pertinentInformation1", "pertinentPrescription", "author", "time"]))
        .and_then(|time| time.attribute("value"))
        .ok_or_else(|| Error::MissingAttribute("author/time/@value".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::c14n::canonicalize;
    use crate::read::parse;

    const PRESCRIPTION: &str = r#"<ParentPrescription classCode="INFO" moodCode="EVN">
        <id root="A5B9DC81-CCF4-4DAB-B887-3D88E557FEBB"/>
        <effectiveTime value="20201218123400"/>
        <recordTarget typeCode="RCT"><Patient classCode="PAT"><id root="2.16.840.1.113883.2.1.4.1" extension="9990548609"/></Patient></recordTarget>
        <pertinentInformation1 typeCode="PERT">
            <pertinentPrescription classCode="SBADM" moodCode="RQO">
                <id root="A5B9DC81-CCF4-4DAB-B887-3D88E557FEBB"/>
                <id root="2.16.840.1.113883.2.1.3.2.4.18.8" extension="E3E6FA-A83008-41F09Y"/>
                <author typeCode="AUT">
                    <time value="20201218123400"/>
                    <signatureText nullFlavor="NA"/>
                    <AgentPerson classCode="AGNT"><id root="1.2.826.0.1285.0.2.0.67" extension="100102238986"/></AgentPerson>
                </author>
                <pertinentInformation2 typeCode="PERT"><pertinentLineItem classCode="SBADM" moodCode="RQO"><id root="A54219B8-F741-4C47-B662-E4F8DFA49AB6"/></pertinentLineItem></pertinentInformation2>
                <pertinentInformation2 typeCode="PERT"><pertinentLineItem classCode="SBADM" moodCode="RQO"><id root="1C35B0AF-62BC-46C8-9B91-1F1F61680E48"/></pertinentLineItem></pertinentInformation2>
            </pertinentPrescription>
        </pertinentInformation1>
    </ParentPrescription>"#;

    #[test]
    fn fragment_order_is_fixed() {
        let root = parse(PRESCRIPTION).unwrap();

        let fragments = extract(&root).unwrap();
        let hashable = fragments.to_hashable();

        let names: Vec<_> = hashable
            .find_all("Fragment")
            .map(|f| f.elements().next().unwrap().name.clone())
            .collect();
        assert_eq!(
            names,
            ["time", "AgentPerson", "recordTarget", "pertinentLineItem", "pertinentLineItem"]
        );
    }

    #[test]
    fn fragment_roots_regain_the_namespace() {
        let root = parse(PRESCRIPTION).unwrap();

        let fragments = extract(&root).unwrap();

        assert_eq!(fragments.time.attribute("xmlns"), Some(HL7_V3_NS));
        assert_eq!(fragments.record_target.attribute("xmlns"), Some(HL7_V3_NS));
    }

    #[test]
    fn hashable_form_is_deterministic() {
        let root = parse(PRESCRIPTION).unwrap();

        let first = canonicalize(&extract(&root).unwrap().to_hashable());
        let second = canonicalize(&extract(&root).unwrap().to_hashable());

        assert_eq!(first, second);
    }

    #[test]
    fn author_time_reads_signing_time() {
        let root = parse(PRESCRIPTION).unwrap();

        assert_eq!(author_time(&root).unwrap(), "20201218123400");
    }

    #[test]
    fn missing_author_is_an_error() {
        let root = parse("<ParentPrescription><pertinentInformation1><pertinentPrescription/></pertinentInformation1></ParentPrescription>").unwrap();

        assert!(matches!(extract(&root), Err(Error::MissingElement(_))));
    }
}
