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

//! Dispense workflow reversals: returning a prescription to the exchange
//! (dispense proposal return) and withdrawing a submitted dispense
//! notification.

use super::codes::{annotation_code, global_identifier, nhs_number, short_form_id};
use super::datatypes::{bool_value, Timestamp};
use super::element::{Element, ToElement};

/// Identity of the requesting user, carried as SDS identifiers.
#[derive(Clone, PartialEq, Debug)]
pub struct AgentPersonSds {
    pub role_profile_id: String,
    pub user_id: String,
}

impl ToElement for AgentPersonSds {
    fn to_element(&self) -> Element {
        Element::new("AgentPersonSDS")
            .attr("classCode", "AGNT")
            .child(crate::codes::sds_role_profile_id(&self.role_profile_id))
            .child(
                Element::new("agentPersonSDS")
                    .attr("classCode", "PSN")
                    .attr("determinerCode", "INSTANCE")
                    .child(crate::codes::sds_user_id(&self.user_id)),
            )
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct DispenseProposalReturn {
    pub id: String,
    pub effective_time: Timestamp,
    pub author: AgentPersonSds,
    pub prescription_short_form_id: String,
    pub reason: ReturnReason,
    pub prior_release_response_id: String,
}

#[derive(Clone, PartialEq, Debug)]
pub struct ReturnReason {
    pub code: String,
    pub display: Option<String>,
}

impl ToElement for DispenseProposalReturn {
    fn to_element(&self) -> Element {
        Element::new("DispenseProposalReturn")
            .attr("classCode", "INFO")
            .attr("moodCode", "EVN")
            .child(global_identifier("id", &self.id))
            .child(Element::new("effectiveTime").attr("value", self.effective_time.to_string()))
            .child(
                Element::new("author")
                    .attr("typeCode", "AUT")
                    .child(self.author.to_element()),
            )
            .child(
                Element::new("pertinentInformation1")
                    .attr("typeCode", "PERT")
                    .attr("contextConductionInd", "true")
                    .child(bool_value("seperatableInd", false))
                    .child(
                        annotation_observation("pertinentPrescriptionID", "PID")
                            .child(short_form_id("value", &self.prescription_short_form_id)),
                    ),
            )
            .child(
                Element::new("pertinentInformation3")
                    .attr("typeCode", "PERT")
                    .attr("contextConductionInd", "false")
                    .child(bool_value("seperatableInd", false))
                    .child(
                        annotation_observation("pertinentReturnReason", "RR")
                            .child(coded_value(&self.reason.code, self.reason.display.as_deref())),
                    ),
            )
            .child(
                Element::new("reversalOf")
                    .attr("typeCode", "REV")
                    .attr("inversionInd", "true")
                    .attr("negationInd", "false")
                    .child(bool_value("seperatableInd", true))
                    .child(
                        Element::new("priorPrescriptionReleaseResponseRef")
                            .attr("classCode", "INFO")
                            .attr("moodCode", "EVN")
                            .child(global_identifier("id", &self.prior_release_response_id)),
                    ),
            )
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct EtpWithdraw {
    pub id: String,
    pub effective_time: Timestamp,
    pub patient_nhs_number: String,
    pub author: AgentPersonSds,
    pub prescription_short_form_id: String,
    pub reason: ReturnReason,
    pub dispense_notification_id: String,
}

impl ToElement for EtpWithdraw {
    fn to_element(&self) -> Element {
        Element::new("EtpWithdraw")
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
            .child(
                Element::new("author")
                    .attr("typeCode", "AUT")
                    .child(self.author.to_element()),
            )
            .child(
                Element::new("pertinentInformation3")
                    .attr("typeCode", "PERT")
                    .attr("contextConductionInd", "true")
                    .child(bool_value("seperatableInd", false))
                    .child(
                        annotation_observation("pertinentWithdrawID", "PID")
                            .child(short_form_id("value", &self.prescription_short_form_id)),
                    ),
            )
            .child(
                Element::new("pertinentInformation2")
                    .attr("typeCode", "PERT")
                    .attr("contextConductionInd", "true")
                    .child(bool_value("seperatableInd", false))
                    .child(
                        annotation_observation("pertinentWithdrawType", "WT")
                            .child(coded_value("LD", Some("Last Dispense"))),
                    ),
            )
            .child(
                Element::new("pertinentInformation5")
                    .attr("typeCode", "PERT")
                    .attr("contextConductionInd", "true")
                    .child(bool_value("seperatableInd", false))
                    .child(
                        annotation_observation("pertinentWithdrawReason", "WR")
                            .child(coded_value(&self.reason.code, self.reason.display.as_deref())),
                    ),
            )
            .child(
                Element::new("pertinentInformation4")
                    .attr("typeCode", "PERT")
                    .attr("contextConductionInd", "true")
                    .child(bool_value("seperatableInd", false))
                    .child(
                        Element::new("pertinentDispenseNotificationRef")
                            .attr("classCode", "INFO")
                            .attr("moodCode", "EVN")
                            .child(global_identifier("id", &self.dispense_notification_id)),
                    ),
            )
    }
}

fn annotation_observation(name: &str, kind: &str) -> Element {
    Element::new(name)
        .attr("classCode", "OBS")
        .attr("moodCode", "EVN")
        .child(annotation_code(kind))
}

fn coded_value(code: &str, display: Option<&str>) -> Element {
    let mut element = Element::new("value").attr("code", code);
    if let Some(display) = display {
        element = element.attr("displayName", display);
    }

    element
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::c14n::canonicalize;

    use chrono::{TimeZone, Utc};

    #[test]
    fn return_carries_short_form_id_and_reason() {
        let value = DispenseProposalReturn {
            id: "0ba2f83f-24b9-4f3e-bd91-57e3ef223a10".into(),
            effective_time: Timestamp::seconds(Utc.ymd(2021, 3, 2).and_hms(10, 15, 0)),
            author: AgentPersonSds {
                role_profile_id: "100102238986".into(),
                user_id: "3415870201".into(),
            },
            prescription_short_form_id: "E3E6FA-A83008-41F09Y".into(),
            reason: ReturnReason {
                code: "0002".into(),
                display: Some("Unable to dispense medication on prescriptions".into()),
            },
            prior_release_response_id: "ffb232b1-be86-4b22-b9a4-9a51b687ba0c".into(),
        };

        let element = value.to_element();

        let id = element
            .find_path(&["pertinentInformation1", "pertinentPrescriptionID", "value"])
            .unwrap();
        assert_eq!(id.attribute("extension"), Some("E3E6FA-A83008-41F09Y"));

        assert_eq!(
            canonicalize(&value.to_element()),
            canonicalize(&value.to_element())
        );
    }

    #[test]
    fn withdraw_type_is_last_dispense() {
        let value = EtpWithdraw {
            id: "fec2c37c-4682-4e64-9b3b-bcb9e4c1b13c".into(),
            effective_time: Timestamp::seconds(Utc.ymd(2021, 3, 2).and_hms(10, 15, 0)),
            patient_nhs_number: "9990548609".into(),
            author: AgentPersonSds {
                role_profile_id: "100102238986".into(),
                user_id: "3415870201".into(),
            },
            prescription_short_form_id: "E3E6FA-A83008-41F09Y".into(),
            reason: ReturnReason {
                code: "MU".into(),
                display: Some("Medication Update".into()),
            },
            dispense_notification_id: "b4fdbbe8-9666-4a4f-a0f1-4d0c7d4a746c".into(),
        };

        let element = value.to_element();
        let type_value = element
            .find_path(&["pertinentInformation2", "pertinentWithdrawType", "value"])
            .unwrap();

        assert_eq!(type_value.attribute("code"), Some("LD"));
    }
}
