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

//! The `SendMessagePayload` transmission wrapper and its `ControlActEvent`,
//! plus the parsed view of acknowledgement responses.

use super::codes::{accredited_system_id, global_identifier, interaction_id, oid, rooted_identifier};
use super::datatypes::Timestamp;
use super::element::{Element, ToElement, HL7_V3_NS};
use super::withdraw::AgentPersonSds;

/// Interaction identifiers of the messages this gateway sends or receives.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Interaction {
    ParentPrescriptionUrgent,
    CancelRequest,
    CancelResponse,
    DispenseNotification,
    DispenseClaimInformation,
    DispenseProposalReturn,
    EtpWithdraw,
    ApplicationAcknowledgement,
}

impl Interaction {
    pub fn id(&self) -> &'static str {
        match self {
            Self::ParentPrescriptionUrgent => "PORX_IN020101UK31",
            Self::CancelRequest => "PORX_IN030101UK32",
            Self::CancelResponse => "PORX_IN050101UK31",
            Self::DispenseNotification => "PORX_IN080101UK31",
            Self::DispenseClaimInformation => "PORX_IN090101UK31",
            Self::DispenseProposalReturn => "PORX_IN110101UK30",
            Self::EtpWithdraw => "PORX_IN510101UK31",
            Self::ApplicationAcknowledgement => "MCCI_IN010000UK13",
        }
    }
}

/// The authenticated author of a submission: the user identity from the
/// request context, not the clinical author inside the payload.
#[derive(Clone, PartialEq, Debug)]
pub struct ControlActAuthor {
    pub agent: AgentPersonSds,
    pub job_role_code: String,
}

impl ToElement for ControlActAuthor {
    fn to_element(&self) -> Element {
        let mut agent = self.agent.to_element();
        agent.children.push(crate::element::Node::Element(
            Element::new("part").attr("typeCode", "PART").child(
                Element::new("partSDSRole").attr("classCode", "ROL").child(
                    rooted_identifier("id", oid::SDS_JOB_ROLE, &self.job_role_code),
                ),
            ),
        ));

        Element::new("author")
            .attr("typeCode", "AUT")
            .child(agent)
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct SendMessagePayload<T> {
    pub id: String,
    pub creation_time: Timestamp,
    pub interaction: Interaction,
    pub from_asid: String,
    pub to_asid: String,
    pub author: Option<ControlActAuthor>,
    pub subject: T,
}

impl<T: ToElement> ToElement for SendMessagePayload<T> {
    fn to_element(&self) -> Element {
        let control_act_event = Element::new("ControlActEvent")
            .attr("classCode", "CACT")
            .attr("moodCode", "EVN")
            .child_opt(self.author.as_ref().map(ToElement::to_element))
            .child(
                Element::new("author1").attr("typeCode", "AUT").child(
                    Element::new("AgentSystemSDS").attr("classCode", "AGNT").child(
                        Element::new("agentSystemSDS")
                            .attr("classCode", "DEV")
                            .attr("determinerCode", "INSTANCE")
                            .child(accredited_system_id("id", &self.from_asid)),
                    ),
                ),
            )
            .child(
                Element::new("subject")
                    .attr("typeCode", "SUBJ")
                    .attr("contextConductionInd", "false")
                    .child(self.subject.to_element()),
            );

        Element::new(self.interaction.id())
            .attr("xmlns", HL7_V3_NS)
            .child(global_identifier("id", &self.id))
            .child(Element::new("creationTime").attr("value", self.creation_time.to_string()))
            .child(Element::new("versionCode").attr("code", "V3NPfIT4.2.00"))
            .child(interaction_id(self.interaction.id()))
            .child(Element::new("processingCode").attr("code", "P"))
            .child(Element::new("processingModeCode").attr("code", "T"))
            .child(Element::new("acceptAckCode").attr("code", "NE"))
            .child(communication_function("communicationFunctionRcv", "RCV", &self.to_asid))
            .child(communication_function("communicationFunctionSnd", "SND", &self.from_asid))
            .child(control_act_event)
    }
}

fn communication_function(name: &str, type_code: &str, asid: &str) -> Element {
    Element::new(name).attr("typeCode", type_code).child(
        Element::new("device")
            .attr("classCode", "DEV")
            .attr("determinerCode", "INSTANCE")
            .child(accredited_system_id("id", asid)),
    )
}

/// Acknowledgement type code on a response message.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum AcknowledgementType {
    Accepted,
    Error,
    Rejected,
}

impl AcknowledgementType {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "AA" => Some(Self::Accepted),
            "AE" => Some(Self::Error),
            "AR" => Some(Self::Rejected),
            _ => None,
        }
    }
}

/// Parsed view of the `acknowledgement` element of a response.
#[derive(Clone, PartialEq, Debug)]
pub struct Acknowledgement {
    pub type_: AcknowledgementType,
    pub message_ref: Option<String>,
    pub details: Vec<AcknowledgementDetail>,
}

#[derive(Clone, PartialEq, Debug)]
pub struct AcknowledgementDetail {
    pub code: Option<String>,
    pub display: Option<String>,
}

impl Acknowledgement {
    pub fn from_element(root: &Element) -> Option<Self> {
        let acknowledgement = root.find_descendant("acknowledgement")?;
        let type_ = acknowledgement
            .attribute("typeCode")
            .and_then(AcknowledgementType::from_code)?;

        let message_ref = acknowledgement
            .find_path(&["messageRef", "id"])
            .and_then(|id| id.attribute("root"))
            .map(str::to_owned);

        let details = acknowledgement
            .find_all("acknowledgementDetail")
            .filter_map(|detail| detail.find("code"))
            .map(|code| AcknowledgementDetail {
                code: code.attribute("code").map(str::to_owned),
                display: code.attribute("displayName").map(str::to_owned),
            })
            .collect();

        Some(Self {
            type_,
            message_ref,
            details,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::c14n::canonicalize;
    use crate::read::parse;

    use chrono::{TimeZone, Utc};

    struct Subject;

    impl ToElement for Subject {
        fn to_element(&self) -> Element {
            Element::new("ParentPrescription")
                .attr("classCode", "INFO")
                .attr("moodCode", "EVN")
        }
    }

    #[test]
    fn envelope_carries_device_asids() {
        let payload = SendMessagePayload {
            id: "6b2192e2-d069-4fb7-a086-c1328d2b54ae".into(),
            creation_time: Timestamp::seconds(Utc.ymd(2020, 9, 21).and_hms(14, 14, 46)),
            interaction: Interaction::ParentPrescriptionUrgent,
            from_asid: "200000001285".into(),
            to_asid: "567456789789".into(),
            author: None,
            subject: Subject,
        };

        let element = payload.to_element();

        assert_eq!(element.name, "PORX_IN020101UK31");
        let snd = element
            .find_path(&["communicationFunctionSnd", "device", "id"])
            .unwrap();
        assert_eq!(snd.attribute("extension"), Some("200000001285"));

        let xml = String::from_utf8(canonicalize(&element)).unwrap();
        assert!(xml.starts_with("<PORX_IN020101UK31 xmlns=\"urn:hl7-org:v3\">"));
    }

    #[test]
    fn acknowledgement_parses_type_and_details() {
        let root = parse(
            r#"<hl7:MCCI_IN010000UK13 xmlns:hl7="urn:hl7-org:v3">
                <hl7:acknowledgement typeCode="AE">
                    <hl7:acknowledgementDetail typeCode="ER">
                        <hl7:code codeSystem="2.16.840.1.113883.2.1.3.2.4.17.32" code="5000" displayName="Unable to process message"/>
                    </hl7:acknowledgementDetail>
                    <hl7:messageRef><hl7:id root="6B2192E2-D069-4FB7-A086-C1328D2B54AE"/></hl7:messageRef>
                </hl7:acknowledgement>
            </hl7:MCCI_IN010000UK13>"#,
        )
        .unwrap();

        let actual = Acknowledgement::from_element(&root).unwrap();

        assert_eq!(actual.type_, AcknowledgementType::Error);
        assert_eq!(actual.details.len(), 1);
        assert_eq!(actual.details[0].code.as_deref(), Some("5000"));
        assert_eq!(
            actual.message_ref.as_deref(),
            Some("6B2192E2-D069-4FB7-A086-C1328D2B54AE")
        );
    }
}
