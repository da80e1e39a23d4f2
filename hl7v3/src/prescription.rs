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

//! Typed model of the ParentPrescription message. Every struct renders into
//! the generic element tree in a fixed child order; building the same value
//! twice therefore serializes to identical bytes.

use super::codes::{
    annotation_code, global_identifier, nhs_number, professional_code, rooted_identifier,
    sds_job_role_code, sds_organization_id, sds_role_profile_id, sex_code, short_form_id,
    snomed_code, system_code, oid,
};
use super::datatypes::{bool_value, Address, Name, Null, Telecom, Timestamp};
use super::element::{Element, Node, ToElement};

pub const TREATMENT_TYPE_VOCAB: &str = "2.16.840.1.113883.2.1.3.2.4.16.36";
pub const PRESCRIPTION_TYPE_VOCAB: &str = "2.16.840.1.113883.2.1.3.2.4.17.25";
pub const DISPENSING_SITE_PREFERENCE_VOCAB: &str = "2.16.840.1.113883.2.1.3.2.4.17.21";
pub const ORGANIZATION_TYPE_VOCAB: &str = "2.16.840.1.113883.2.1.3.2.4.17.94";

#[derive(Clone, PartialEq, Debug)]
pub struct ParentPrescription {
    pub id: String,
    pub effective_time: Timestamp,
    pub record_target: RecordTarget,
    pub prescription: Prescription,
    pub care_record_element_category: CareRecordElementCategory,
}

impl ToElement for ParentPrescription {
    fn to_element(&self) -> Element {
        Element::new("ParentPrescription")
            .attr("classCode", "INFO")
            .attr("moodCode", "EVN")
            .child(global_identifier("id", &self.id))
            .child(Element::new("effectiveTime").attr("value", self.effective_time.to_string()))
            .child(self.record_target.to_element())
            .child(
                Element::new("pertinentInformation1")
                    .attr("typeCode", "PERT")
                    .attr("contextConductionInd", "true")
                    .child(self.prescription.to_element()),
            )
            .child(
                Element::new("pertinentInformation2")
                    .attr("typeCode", "PERT")
                    .attr("contextConductionInd", "false")
                    .child(self.care_record_element_category.to_element()),
            )
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct RecordTarget {
    pub patient: Patient,
}

impl ToElement for RecordTarget {
    fn to_element(&self) -> Element {
        Element::new("recordTarget")
            .attr("typeCode", "RCT")
            .child(self.patient.to_element())
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct Patient {
    pub nhs_number: String,
    pub address: Option<Address>,
    pub person: PatientPerson,
}

impl ToElement for Patient {
    fn to_element(&self) -> Element {
        Element::new("Patient")
            .attr("classCode", "PAT")
            .child(nhs_number(&self.nhs_number))
            .child_opt(self.address.as_ref().map(ToElement::to_element))
            .child(self.person.to_element())
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct PatientPerson {
    pub name: Name,
    pub gender_code: Option<String>,
    pub birth_time: Option<String>,
}

impl ToElement for PatientPerson {
    fn to_element(&self) -> Element {
        let mut element = Element::new("patientPerson")
            .attr("classCode", "PSN")
            .attr("determinerCode", "INSTANCE")
            .child(self.name.to_element());
        if let Some(gender_code) = &self.gender_code {
            element = element.child(sex_code(gender_code));
        }
        if let Some(birth_time) = &self.birth_time {
            element = element.child(Element::new("birthTime").attr("value", birth_time.clone()));
        }

        element
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct Prescription {
    pub id: String,
    pub short_form_id: String,
    pub performer: Option<Performer>,
    pub author: PrescriptionAuthor,
    pub responsible_party: ResponsibleParty,
    pub days_supply: Option<DaysSupply>,
    pub repeat_number: Option<Interval>,
    pub treatment_type_code: String,
    pub dispensing_site_preference: String,
    pub line_items: Vec<LineItem>,
    pub token_issued: bool,
    pub prescription_type_code: String,
    pub review_date: Option<Timestamp>,
}

impl ToElement for Prescription {
    fn to_element(&self) -> Element {
        let mut element = Element::new("pertinentPrescription")
            .attr("classCode", "SBADM")
            .attr("moodCode", "RQO")
            .child(global_identifier("id", &self.id))
            .child(short_form_id("id", &self.short_form_id))
            .child_opt(self.performer.as_ref().map(ToElement::to_element))
            .child(self.author.to_element())
            .child(self.responsible_party.to_element())
            .child_opt(self.days_supply.as_ref().map(ToElement::to_element));

        if let Some(repeat_number) = &self.repeat_number {
            element = element.child(repeat_number.to_named_element("repeatNumber"));
        }

        element = element
            .child(pertinent_information(
                "pertinentInformation5",
                "true",
                annotation(
                    "pertinentPrescriptionTreatmentType",
                    "PTT",
                    system_code("value", TREATMENT_TYPE_VOCAB, &self.treatment_type_code, None),
                ),
            ))
            .child(pertinent_information(
                "pertinentInformation1",
                "true",
                annotation(
                    "pertinentDispensingSitePreference",
                    "DSP",
                    system_code(
                        "value",
                        DISPENSING_SITE_PREFERENCE_VOCAB,
                        &self.dispensing_site_preference,
                        None,
                    ),
                ),
            ));

        for line_item in &self.line_items {
            element = element.child(
                pertinent_information("pertinentInformation2", "true", line_item.to_element())
                    .attr("inversionInd", "false")
                    .attr("negationInd", "false"),
            );
        }

        element = element.child(pertinent_information(
            "pertinentInformation8",
            "false",
            annotation(
                "pertinentTokenIssued",
                "TI",
                bool_value("value", self.token_issued),
            ),
        ));

        if let Some(review_date) = &self.review_date {
            element = element.child(pertinent_information(
                "pertinentInformation7",
                "false",
                annotation(
                    "pertinentReviewDate",
                    "RD",
                    Element::new("value").attr("value", review_date.to_string()),
                ),
            ));
        }

        element.child(pertinent_information(
            "pertinentInformation4",
            "true",
            annotation(
                "pertinentPrescriptionType",
                "PT",
                system_code("value", PRESCRIPTION_TYPE_VOCAB, &self.prescription_type_code, None),
            ),
        ))
    }
}

/// `<{name} typeCode="PERT" contextConductionInd="{conduction}">` with the
/// mandatory separable indicator.
fn pertinent_information(name: &str, conduction: &str, payload: Element) -> Element {
    Element::new(name)
        .attr("typeCode", "PERT")
        .attr("contextConductionInd", conduction)
        .child(bool_value("seperatableInd", false))
        .child(payload)
}

/// Prescription annotation: an observation with a fixed annotation kind code
/// and a caller supplied value element.
fn annotation(name: &str, kind: &str, value: Element) -> Element {
    Element::new(name)
        .attr("classCode", "OBS")
        .attr("moodCode", "EVN")
        .child(annotation_code(kind))
        .child(value)
}

#[derive(Clone, PartialEq, Debug)]
pub struct PrescriptionAuthor {
    pub time: Timestamp,
    pub signature_text: SignatureText,
    pub agent_person: AgentPerson,
}

#[derive(Clone, PartialEq, Debug)]
pub enum SignatureText {
    NotApplicable,
    Signed(Element),
}

impl ToElement for PrescriptionAuthor {
    fn to_element(&self) -> Element {
        let signature_text = match &self.signature_text {
            SignatureText::NotApplicable => {
                Element::new("signatureText").attr("nullFlavor", Null::NotApplicable.as_str())
            }
            SignatureText::Signed(signature) => {
                Element::new("signatureText").child(signature.clone())
            }
        };

        Element::new("author")
            .attr("typeCode", "AUT")
            .attr("contextControlCode", "OP")
            .child(Element::new("time").attr("value", self.time.to_string()))
            .child(signature_text)
            .child(self.agent_person.to_element())
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct ResponsibleParty {
    pub agent_person: AgentPerson,
}

impl ToElement for ResponsibleParty {
    fn to_element(&self) -> Element {
        Element::new("responsibleParty")
            .attr("typeCode", "RESP")
            .attr("contextControlCode", "OP")
            .child(self.agent_person.to_element())
    }
}

/// Nominated dispensing organization, carried by SDS identity only.
#[derive(Clone, PartialEq, Debug)]
pub struct Performer {
    pub organization_code: String,
}

impl ToElement for Performer {
    fn to_element(&self) -> Element {
        Element::new("performer")
            .attr("typeCode", "PRF")
            .attr("contextControlCode", "OP")
            .child(
                Element::new("AgentOrgSDS").attr("classCode", "AGNT").child(
                    Element::new("agentOrganizationSDS")
                        .attr("classCode", "ORG")
                        .attr("determinerCode", "INSTANCE")
                        .child(sds_organization_id(&self.organization_code)),
                ),
            )
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct AgentPerson {
    pub role_profile_id: String,
    pub job_role_code: String,
    pub telecom: Vec<Telecom>,
    pub person: AgentPersonPerson,
    pub organization: Organization,
}

impl ToElement for AgentPerson {
    fn to_element(&self) -> Element {
        Element::new("AgentPerson")
            .attr("classCode", "AGNT")
            .child(sds_role_profile_id(&self.role_profile_id))
            .child(sds_job_role_code(&self.job_role_code))
            .children(self.telecom.iter().map(ToElement::to_element))
            .child(self.person.to_element())
            .child(self.organization.to_element())
    }
}

/// The acting person. The identifier is one of the professional code
/// vocabularies; prescribing (spurious/DIN) codes use their own root.
#[derive(Clone, PartialEq, Debug)]
pub struct AgentPersonPerson {
    pub id: PersonId,
    pub name: Option<Name>,
}

#[derive(Clone, PartialEq, Debug)]
pub enum PersonId {
    Professional(String),
    Prescribing(String),
    SdsUser(String),
}

impl ToElement for PersonId {
    fn to_element(&self) -> Element {
        match self {
            Self::Professional(value) => professional_code(value),
            Self::Prescribing(value) => {
                rooted_identifier("id", oid::PRESCRIBING_CODE, value)
            }
            Self::SdsUser(value) => rooted_identifier("id", oid::SDS_USER_ID, value),
        }
    }
}

impl ToElement for AgentPersonPerson {
    fn to_element(&self) -> Element {
        Element::new("agentPerson")
            .attr("classCode", "PSN")
            .attr("determinerCode", "INSTANCE")
            .child(self.id.to_element())
            .child_opt(self.name.as_ref().map(ToElement::to_element))
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct Organization {
    pub organization_code: String,
    pub type_code: String,
    pub name: String,
    pub telecom: Option<Telecom>,
    pub address: Option<Address>,
    /// Primary care: the parent organization carrying the provider license.
    pub provider_license: Option<Box<Organization>>,
}

impl Organization {
    fn render(&self, name: &str) -> Element {
        let mut element = Element::new(name)
            .attr("classCode", "ORG")
            .attr("determinerCode", "INSTANCE")
            .child(sds_organization_id(&self.organization_code))
            .child(system_code(
                "code",
                ORGANIZATION_TYPE_VOCAB,
                &self.type_code,
                None,
            ))
            .child(Element::new("name").text(self.name.clone()));

        if let Some(telecom) = &self.telecom {
            element = element.child(telecom.to_element());
        }
        if let Some(address) = &self.address {
            element = element.child(address.to_element());
        }
        if let Some(parent) = &self.provider_license {
            element = element.child(
                Element::new("healthCareProviderLicense")
                    .attr("classCode", "PROV")
                    .child(parent.render("Organization")),
            );
        }

        element
    }
}

impl ToElement for Organization {
    fn to_element(&self) -> Element {
        self.render("representedOrganization")
    }
}

/// Closed integer interval, e.g. the repeat number low/high pair.
#[derive(Clone, PartialEq, Debug)]
pub struct Interval {
    pub low: u32,
    pub high: u32,
}

impl Interval {
    pub fn to_named_element(&self, name: &str) -> Element {
        Element::new(name)
            .child(Element::new("low").attr("value", self.low.to_string()))
            .child(Element::new("high").attr("value", self.high.to_string()))
    }
}

/// Supply duration and validity window for repeat dispensing.
#[derive(Clone, PartialEq, Debug)]
pub struct DaysSupply {
    pub low: Option<Timestamp>,
    pub high: Option<Timestamp>,
    pub expected_use_days: Option<String>,
}

impl ToElement for DaysSupply {
    fn to_element(&self) -> Element {
        let mut days_supply = Element::new("daysSupply")
            .attr("classCode", "SPLY")
            .attr("moodCode", "RQO");

        if self.low.is_some() || self.high.is_some() {
            let mut effective_time = Element::new("effectiveTime");
            if let Some(low) = &self.low {
                effective_time =
                    effective_time.child(Element::new("low").attr("value", low.to_string()));
            }
            if let Some(high) = &self.high {
                effective_time =
                    effective_time.child(Element::new("high").attr("value", high.to_string()));
            }
            days_supply = days_supply.child(effective_time);
        }

        if let Some(days) = &self.expected_use_days {
            days_supply = days_supply.child(
                Element::new("expectedUseTime")
                    .child(Element::new("width").attr("value", days.clone()).attr("unit", "d")),
            );
        }

        Element::new("component1")
            .attr("typeCode", "COMP")
            .child(bool_value("seperatableInd", true))
            .child(days_supply)
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct LineItem {
    pub id: String,
    pub medication: MedicationCode,
    pub quantity: LineItemQuantity,
    pub dosage_instructions: String,
    pub additional_instructions: Option<String>,
    pub repeat_number: Option<Interval>,
}

#[derive(Clone, PartialEq, Debug)]
pub struct MedicationCode {
    pub code: String,
    pub display: Option<String>,
}

#[derive(Clone, PartialEq, Debug)]
pub struct LineItemQuantity {
    pub value: String,
    pub unit_code: String,
    pub unit_display: Option<String>,
}

impl ToElement for LineItem {
    fn to_element(&self) -> Element {
        let mut element = Element::new("pertinentLineItem")
            .attr("classCode", "SBADM")
            .attr("moodCode", "RQO")
            .child(global_identifier("id", &self.id));

        if let Some(repeat_number) = &self.repeat_number {
            element = element.child(repeat_number.to_named_element("repeatNumber"));
        }

        element = element
            .child(
                Element::new("product")
                    .attr("typeCode", "PRD")
                    .attr("contextControlCode", "OP")
                    .child(
                        Element::new("manufacturedProduct")
                            .attr("classCode", "MANU")
                            .child(
                                Element::new("manufacturedRequestedMaterial")
                                    .attr("classCode", "MMAT")
                                    .attr("determinerCode", "KIND")
                                    .child(snomed_code(
                                        "code",
                                        &self.medication.code,
                                        self.medication.display.as_deref(),
                                    )),
                            ),
                    ),
            )
            .child(
                Element::new("component")
                    .attr("typeCode", "COMP")
                    .child(bool_value("seperatableInd", false))
                    .child(
                        Element::new("lineItemQuantity")
                            .attr("classCode", "SPLY")
                            .attr("moodCode", "RQO")
                            .child(
                                Element::new("quantity")
                                    .attr("value", self.quantity.value.clone())
                                    .attr("unit", "1")
                                    .child(
                                        snomed_code(
                                            "translation",
                                            &self.quantity.unit_code,
                                            self.quantity.unit_display.as_deref(),
                                        )
                                        .attr("value", self.quantity.value.clone()),
                                    ),
                            ),
                    ),
            )
            .child(
                pertinent_information(
                    "pertinentInformation2",
                    "true",
                    annotation(
                        "pertinentDosageInstructions",
                        "DI",
                        Element::new("value").text(self.dosage_instructions.clone()),
                    ),
                )
                .attr("inversionInd", "false")
                .attr("negationInd", "false"),
            );

        if let Some(additional_instructions) = &self.additional_instructions {
            element = element.child(pertinent_information(
                "pertinentInformation1",
                "false",
                annotation(
                    "pertinentAdditionalInstructions",
                    "AI",
                    additional_instructions_value(additional_instructions),
                ),
            ));
        }

        element
    }
}

/// Additional instructions carry an embedded `<medication>`/`<patientInfo>`
/// sub-grammar inside the text field. The already-marked-up string is
/// re-parsed here so the markup survives as child elements rather than
/// being escaped to text.
fn additional_instructions_value(text: &str) -> Element {
    match crate::read::parse(&format!("<value>{}</value>", text)) {
        Ok(element) => element,
        Err(_) => Element::new("value").text(text.to_owned()),
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct CareRecordElementCategory {
    pub act_ids: Vec<String>,
}

impl ToElement for CareRecordElementCategory {
    fn to_element(&self) -> Element {
        let mut element = Element::new("pertinentCareRecordElementCategory")
            .attr("classCode", "CATEGORY")
            .attr("moodCode", "EVN");

        for id in &self.act_ids {
            element = element.child(
                Element::new("component").attr("typeCode", "COMP").child(
                    Element::new("actRef")
                        .attr("classCode", "SBADM")
                        .attr("moodCode", "RQO")
                        .child(global_identifier("id", id)),
                ),
            );
        }

        element
    }
}

/// Strips the element tree form back to the embedded markup string, the
/// inverse of `additional_instructions_value`.
pub fn flatten_value_markup(value: &Element) -> String {
    let mut out = String::new();
    for node in &value.children {
        match node {
            Node::Text(t) => out.push_str(t),
            Node::Element(e) => {
                out.push('<');
                out.push_str(&e.name);
                out.push('>');
                out.push_str(&flatten_value_markup(e));
                out.push_str("</");
                out.push_str(&e.name);
                out.push('>');
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::c14n::canonicalize;

    use chrono::{TimeZone, Utc};

    fn agent_person() -> AgentPerson {
        AgentPerson {
            role_profile_id: "100102238986".into(),
            job_role_code: "R8000".into(),
            telecom: vec![Telecom {
                use_: Some(crate::datatypes::TelecomUse::Workplace),
                value: "tel:01234567890".into(),
            }],
            person: AgentPersonPerson {
                id: PersonId::Professional("6095103".into()),
                name: Some(Name {
                    text: Some("DR SMITH".into()),
                    ..Default::default()
                }),
            },
            organization: Organization {
                organization_code: "A83008".into(),
                type_code: "001".into(),
                name: "HALLGARTH SURGERY".into(),
                telecom: None,
                address: None,
                provider_license: None,
            },
        }
    }

    fn prescription() -> Prescription {
        Prescription {
            id: "a5b9dc81-ccf4-4dab-b887-3d88e557febb".into(),
            short_form_id: "E3E6FA-A83008-41F09Y".into(),
            performer: None,
            author: PrescriptionAuthor {
                time: Timestamp::minutes(Utc.ymd(2020, 12, 18).and_hms(12, 34, 34)),
                signature_text: SignatureText::NotApplicable,
                agent_person: agent_person(),
            },
            responsible_party: ResponsibleParty {
                agent_person: agent_person(),
            },
            days_supply: None,
            repeat_number: None,
            treatment_type_code: "0001".into(),
            dispensing_site_preference: "P1".into(),
            line_items: vec![LineItem {
                id: "a54219b8-f741-4c47-b662-e4f8dfa49ab6".into(),
                medication: MedicationCode {
                    code: "322237000".into(),
                    display: Some("Paracetamol 500mg soluble tablets".into()),
                },
                quantity: LineItemQuantity {
                    value: "100".into(),
                    unit_code: "428673006".into(),
                    unit_display: Some("tablet".into()),
                },
                dosage_instructions: "4 times a day - Oral".into(),
                additional_instructions: None,
                repeat_number: None,
            }],
            token_issued: false,
            prescription_type_code: "0101".into(),
            review_date: None,
        }
    }

    #[test]
    fn rendering_is_deterministic() {
        let value = prescription();

        let first = canonicalize(&value.to_element());
        let second = canonicalize(&value.to_element());

        assert_eq!(first, second);
    }

    #[test]
    fn author_time_uses_minute_precision() {
        let element = prescription().author.to_element();

        let actual = element.find("time").unwrap().attribute("value").unwrap().to_owned();

        assert_eq!(actual, "20201218123400");
    }

    #[test]
    fn short_form_id_lands_on_second_id() {
        let element = prescription().to_element();

        let ids: Vec<_> = element.find_all("id").collect();

        assert_eq!(ids.len(), 2);
        assert_eq!(ids[1].attribute("extension"), Some("E3E6FA-A83008-41F09Y"));
    }

    #[test]
    fn embedded_markup_survives_rendering() {
        let mut line_item = prescription().line_items[0].clone();
        line_item.additional_instructions =
            Some("<medication>Something</medication><patientInfo>Advice</patientInfo>Rest".into());

        let element = line_item.to_element();
        let value = element
            .find_path(&["pertinentInformation1", "pertinentAdditionalInstructions", "value"])
            .unwrap();

        assert!(value.find("medication").is_some());
        assert_eq!(
            flatten_value_markup(value),
            "<medication>Something</medication><patientInfo>Advice</patientInfo>Rest"
        );
    }
}
