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

//! Dispense-side messages: the notification sent after supplying medication
//! and the claim for reimbursement.

use super::codes::{global_identifier, nhs_number, short_form_id, snomed_code, system_code};
use super::datatypes::{bool_value, Null, Timestamp};
use super::element::{Element, ToElement};
use super::prescription::{AgentPerson, Organization};

pub const PRESCRIPTION_STATUS_VOCAB: &str = "2.16.840.1.113883.2.1.3.2.4.17.30";

#[derive(Clone, PartialEq, Debug)]
pub struct DispenseNotification {
    pub id: String,
    pub effective_time: Timestamp,
    pub patient_nhs_number: String,
    pub receiver_organization: ReceiverOrganization,
    pub supply_header: SupplyHeader,
    pub sequel_to: PriorReleaseEventRef,
}

impl ToElement for DispenseNotification {
    fn to_element(&self) -> Element {
        Element::new("DispenseNotification")
            .attr("classCode", "INFO")
            .attr("moodCode", "EVN")
            .child(global_identifier("id", &self.id))
            .child(Element::new("effectiveTime").attr("value", self.effective_time.to_string()))
            .child(
                Element::new("recordTarget").attr("typeCode", "RCT").child(
                    Element::new("patient")
                        .attr("classCode", "PAT")
                        .child(nhs_number(&self.patient_nhs_number)),
                ),
            )
            .child(self.receiver_organization.to_element())
            .child(
                Element::new("pertinentInformation1")
                    .attr("typeCode", "PERT")
                    .attr("contextConductionInd", "false")
                    .child(bool_value("seperatableInd", false))
                    .child(self.supply_header.to_element()),
            )
            .child(self.sequel_to.to_element())
    }
}

/// The commissioning organization the notification is addressed to.
#[derive(Clone, PartialEq, Debug)]
pub struct ReceiverOrganization {
    pub organization: Organization,
}

impl ToElement for ReceiverOrganization {
    fn to_element(&self) -> Element {
        Element::new("primaryInformationRecipient")
            .attr("typeCode", "PRCP")
            .child(
                Element::new("AgentOrg")
                    .attr("classCode", "AGNT")
                    .child(self.organization.to_element()),
            )
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct SupplyHeader {
    pub id: String,
    pub author: DispenseAuthor,
    pub line_items: Vec<SuppliedLineItem>,
    pub prescription_status: CodedValue,
    pub prescription_short_form_id: String,
    pub prior_prescription_id: String,
}

impl ToElement for SupplyHeader {
    fn to_element(&self) -> Element {
        let mut element = Element::new("pertinentSupplyHeader")
            .attr("classCode", "SBADM")
            .attr("moodCode", "EVN")
            .child(global_identifier("id", &self.id))
            .child(self.author.to_element());

        for line_item in &self.line_items {
            element = element.child(
                Element::new("pertinentInformation1")
                    .attr("typeCode", "PERT")
                    .attr("contextConductionInd", "true")
                    .attr("inversionInd", "false")
                    .attr("negationInd", "false")
                    .child(bool_value("seperatableInd", false))
                    .child(line_item.to_element()),
            );
        }

        element
            .child(
                Element::new("pertinentInformation3")
                    .attr("typeCode", "PERT")
                    .attr("contextConductionInd", "true")
                    .child(bool_value("seperatableInd", false))
                    .child(status_observation(
                        "pertinentPrescriptionStatus",
                        "PS",
                        &self.prescription_status,
                    )),
            )
            .child(
                Element::new("pertinentInformation4")
                    .attr("typeCode", "PERT")
                    .attr("contextConductionInd", "true")
                    .child(bool_value("seperatableInd", false))
                    .child(
                        Element::new("pertinentPrescriptionID")
                            .attr("classCode", "OBS")
                            .attr("moodCode", "EVN")
                            .child(system_code(
                                "code",
                                PRESCRIPTION_STATUS_VOCAB,
                                "PID",
                                None,
                            ))
                            .child(short_form_id("value", &self.prescription_short_form_id)),
                    ),
            )
            .child(
                Element::new("inFulfillmentOf")
                    .attr("typeCode", "FLFS")
                    .child(bool_value("seperatableInd", true))
                    .child(
                        Element::new("priorOriginalPrescriptionRef")
                            .attr("classCode", "SBADM")
                            .attr("moodCode", "RQO")
                            .child(global_identifier("id", &self.prior_prescription_id)),
                    ),
            )
    }
}

/// The dispensing author: time of supply plus the dispensing agent resolved
/// from the performer graph.
#[derive(Clone, PartialEq, Debug)]
pub struct DispenseAuthor {
    pub time: Timestamp,
    pub agent_person: AgentPerson,
}

impl ToElement for DispenseAuthor {
    fn to_element(&self) -> Element {
        Element::new("author")
            .attr("typeCode", "AUT")
            .attr("contextControlCode", "OP")
            .child(Element::new("time").attr("value", self.time.to_string()))
            .child(Element::new("signatureText").attr("nullFlavor", Null::NotApplicable.as_str()))
            .child(self.agent_person.to_element())
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct CodedValue {
    pub code: String,
    pub display: Option<String>,
}

fn status_observation(name: &str, kind: &str, value: &CodedValue) -> Element {
    let mut value_element = Element::new("value")
        .attr("codeSystem", PRESCRIPTION_STATUS_VOCAB)
        .attr("code", value.code.clone());
    if let Some(display) = &value.display {
        value_element = value_element.attr("displayName", display.clone());
    }

    Element::new(name)
        .attr("classCode", "OBS")
        .attr("moodCode", "EVN")
        .child(system_code("code", PRESCRIPTION_STATUS_VOCAB, kind, None))
        .child(value_element)
}

#[derive(Clone, PartialEq, Debug)]
pub struct SuppliedLineItem {
    pub id: String,
    pub medication_code: String,
    pub medication_display: Option<String>,
    pub quantity_value: String,
    pub quantity_unit_code: String,
    pub quantity_unit_display: Option<String>,
    pub supply_instructions: String,
    pub status: CodedValue,
    pub prior_line_item_id: String,
    /// Claim messages additionally carry the charge and endorsements.
    pub charge_payment: Option<bool>,
    pub endorsements: Vec<String>,
}

impl ToElement for SuppliedLineItem {
    fn to_element(&self) -> Element {
        let quantity = Element::new("quantity")
            .attr("value", self.quantity_value.clone())
            .attr("unit", "1")
            .child(
                snomed_code(
                    "translation",
                    &self.quantity_unit_code,
                    self.quantity_unit_display.as_deref(),
                )
                .attr("value", self.quantity_value.clone()),
            );

        let mut supplied_quantity = Element::new("suppliedLineItemQuantity")
            .attr("classCode", "SPLY")
            .attr("moodCode", "EVN")
            .child(snomed_code(
                "code",
                &self.quantity_unit_code,
                self.quantity_unit_display.as_deref(),
            ))
            .child(quantity.clone())
            .child(
                Element::new("product")
                    .attr("typeCode", "PRD")
                    .attr("contextControlCode", "OP")
                    .child(
                        Element::new("suppliedManufacturedProduct")
                            .attr("classCode", "MANU")
                            .child(
                                Element::new("manufacturedSuppliedMaterial")
                                    .attr("classCode", "MMAT")
                                    .attr("determinerCode", "KIND")
                                    .child(snomed_code(
                                        "code",
                                        &self.medication_code,
                                        self.medication_display.as_deref(),
                                    )),
                            ),
                    ),
            )
            .child(
                Element::new("pertinentInformation1")
                    .attr("typeCode", "PERT")
                    .attr("contextConductionInd", "true")
                    .child(bool_value("seperatableInd", false))
                    .child(
                        Element::new("pertinentSupplyInstructions")
                            .attr("classCode", "OBS")
                            .attr("moodCode", "EVN")
                            .child(system_code("code", PRESCRIPTION_STATUS_VOCAB, "SI", None))
                            .child(Element::new("value").text(self.supply_instructions.clone())),
                    ),
            );

        if let Some(charge_paid) = self.charge_payment {
            supplied_quantity = supplied_quantity.child(
                Element::new("pertinentInformation2")
                    .attr("typeCode", "PERT")
                    .attr("contextConductionInd", "true")
                    .child(bool_value("seperatableInd", false))
                    .child(
                        Element::new("pertinentChargePayment")
                            .attr("classCode", "OBS")
                            .attr("moodCode", "EVN")
                            .child(system_code("code", PRESCRIPTION_STATUS_VOCAB, "CP", None))
                            .child(bool_value("value", charge_paid)),
                    ),
            );
        }

        for endorsement in &self.endorsements {
            supplied_quantity = supplied_quantity.child(
                Element::new("pertinentInformation3")
                    .attr("typeCode", "PERT")
                    .attr("contextConductionInd", "true")
                    .child(bool_value("seperatableInd", false))
                    .child(
                        Element::new("pertinentDispensingEndorsement")
                            .attr("classCode", "OBS")
                            .attr("moodCode", "EVN")
                            .child(system_code("code", PRESCRIPTION_STATUS_VOCAB, "DE", None))
                            .child(Element::new("value").attr("code", endorsement.clone())),
                    ),
            );
        }

        Element::new("pertinentSuppliedLineItem")
            .attr("classCode", "SBADM")
            .attr("moodCode", "PRMS")
            .child(global_identifier("id", &self.id))
            .child(snomed_code("code", &self.medication_code, None))
            .child(Element::new("effectiveTime").attr("nullFlavor", Null::NotApplicable.as_str()))
            .child(
                Element::new("consumable")
                    .attr("typeCode", "CSM")
                    .child(
                        Element::new("requestedManufacturedProduct")
                            .attr("classCode", "MANU")
                            .child(
                                Element::new("manufacturedRequestedMaterial")
                                    .attr("classCode", "MMAT")
                                    .attr("determinerCode", "KIND")
                                    .child(snomed_code(
                                        "code",
                                        &self.quantity_unit_code,
                                        self.quantity_unit_display.as_deref(),
                                    )),
                            ),
                    ),
            )
            .child(
                Element::new("component")
                    .attr("typeCode", "COMP")
                    .child(bool_value("seperatableInd", false))
                    .child(supplied_quantity),
            )
            .child(
                Element::new("component1")
                    .attr("typeCode", "COMP")
                    .child(bool_value("seperatableInd", true))
                    .child(
                        Element::new("supplyRequest")
                            .attr("classCode", "SPLY")
                            .attr("moodCode", "RQO")
                            .child(snomed_code(
                                "code",
                                &self.quantity_unit_code,
                                self.quantity_unit_display.as_deref(),
                            ))
                            .child(quantity),
                    ),
            )
            .child(
                Element::new("pertinentInformation3")
                    .attr("typeCode", "PERT")
                    .attr("contextConductionInd", "true")
                    .child(bool_value("seperatableInd", false))
                    .child(status_observation("pertinentItemStatus", "IS", &self.status)),
            )
            .child(
                Element::new("inFulfillmentOf")
                    .attr("typeCode", "FLFS")
                    .child(bool_value("seperatableInd", true))
                    .child(
                        Element::new("priorOriginalItemRef")
                            .attr("classCode", "SBADM")
                            .attr("moodCode", "RQO")
                            .child(global_identifier("id", &self.prior_line_item_id)),
                    ),
            )
    }
}

/// Reference to the release event this supply responds to.
#[derive(Clone, PartialEq, Debug)]
pub struct PriorReleaseEventRef {
    pub id: String,
}

impl ToElement for PriorReleaseEventRef {
    fn to_element(&self) -> Element {
        Element::new("sequelTo")
            .attr("typeCode", "SEQL")
            .child(
                Element::new("priorPrescriptionReleaseEventRef")
                    .attr("classCode", "INFO")
                    .attr("moodCode", "EVN")
                    .child(global_identifier("id", &self.id)),
            )
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct DispenseClaim {
    pub id: String,
    pub effective_time: Timestamp,
    pub receiver_organization: ReceiverOrganization,
    pub supply_header: SupplyHeader,
    /// Replaces an earlier claim when amending.
    pub replacement_of: Option<String>,
}

impl ToElement for DispenseClaim {
    fn to_element(&self) -> Element {
        let mut element = Element::new("DispenseClaim")
            .attr("classCode", "INFO")
            .attr("moodCode", "EVN")
            .child(global_identifier("id", &self.id))
            .child(Element::new("effectiveTime").attr("value", self.effective_time.to_string()))
            .child(self.receiver_organization.to_element())
            .child(
                Element::new("pertinentInformation1")
                    .attr("typeCode", "PERT")
                    .attr("contextConductionInd", "false")
                    .child(bool_value("seperatableInd", false))
                    .child(self.supply_header.to_element()),
            );

        if let Some(prior_message_id) = &self.replacement_of {
            element = element.child(
                Element::new("replacementOf").attr("typeCode", "RPLC").child(
                    Element::new("priorMessageRef")
                        .attr("classCode", "INFO")
                        .attr("moodCode", "EVN")
                        .child(global_identifier("id", prior_message_id)),
                ),
            );
        }

        element
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::c14n::canonicalize;
    use crate::datatypes::Name;
    use crate::prescription::{AgentPersonPerson, PersonId};

    use chrono::{TimeZone, Utc};

    fn supply_header() -> SupplyHeader {
        SupplyHeader {
            id: "6b2192e2-d069-4fb7-a086-c1328d2b54ae".into(),
            author: DispenseAuthor {
                time: Timestamp::seconds(Utc.ymd(2021, 3, 2).and_hms(9, 30, 0)),
                agent_person: AgentPerson {
                    role_profile_id: "100243444980".into(),
                    job_role_code: "R1290".into(),
                    telecom: Vec::new(),
                    person: AgentPersonPerson {
                        id: PersonId::SdsUser("3415870201".into()),
                        name: Some(Name {
                            text: Some("MR PHARMACIST".into()),
                            ..Default::default()
                        }),
                    },
                    organization: crate::prescription::Organization {
                        organization_code: "FA565".into(),
                        type_code: "182".into(),
                        name: "GREENE PHARMACY".into(),
                        telecom: None,
                        address: None,
                        provider_license: None,
                    },
                },
            },
            line_items: vec![SuppliedLineItem {
                id: "9d1b8fb4-7b86-4a79-9b2e-6b6e53c1d5f7".into(),
                medication_code: "322237000".into(),
                medication_display: Some("Paracetamol 500mg soluble tablets".into()),
                quantity_value: "100".into(),
                quantity_unit_code: "428673006".into(),
                quantity_unit_display: Some("tablet".into()),
                supply_instructions: "4 times a day - Oral".into(),
                status: CodedValue {
                    code: "0001".into(),
                    display: Some("Item fully dispensed".into()),
                },
                prior_line_item_id: "a54219b8-f741-4c47-b662-e4f8dfa49ab6".into(),
                charge_payment: None,
                endorsements: Vec::new(),
            }],
            prescription_status: CodedValue {
                code: "0006".into(),
                display: Some("Dispensed".into()),
            },
            prescription_short_form_id: "E3E6FA-A83008-41F09Y".into(),
            prior_prescription_id: "a5b9dc81-ccf4-4dab-b887-3d88e557febb".into(),
        }
    }

    #[test]
    fn notification_rendering_is_deterministic() {
        let value = DispenseNotification {
            id: "b4fdbbe8-9666-4a4f-a0f1-4d0c7d4a746c".into(),
            effective_time: Timestamp::seconds(Utc.ymd(2021, 3, 2).and_hms(9, 30, 0)),
            patient_nhs_number: "9990548609".into(),
            receiver_organization: ReceiverOrganization {
                organization: crate::prescription::Organization {
                    organization_code: "T1450".into(),
                    type_code: "RO197".into(),
                    name: "NHS BUSINESS SERVICES AUTHORITY".into(),
                    telecom: None,
                    address: None,
                    provider_license: None,
                },
            },
            supply_header: supply_header(),
            sequel_to: PriorReleaseEventRef {
                id: "ffb232b1-be86-4b22-b9a4-9a51b687ba0c".into(),
            },
        };

        assert_eq!(
            canonicalize(&value.to_element()),
            canonicalize(&value.to_element())
        );
    }

    #[test]
    fn claim_line_items_carry_charge_and_endorsements() {
        let mut header = supply_header();
        header.line_items[0].charge_payment = Some(false);
        header.line_items[0].endorsements = vec!["NDEC".into()];

        let element = header.to_element();
        let quantity = element
            .find_path(&["pertinentInformation1", "pertinentSuppliedLineItem", "component"])
            .unwrap()
            .find("suppliedLineItemQuantity")
            .unwrap();

        assert!(quantity
            .find_path(&["pertinentInformation2", "pertinentChargePayment"])
            .is_some());
        assert!(quantity
            .find_path(&["pertinentInformation3", "pertinentDispensingEndorsement"])
            .is_some());
    }
}
