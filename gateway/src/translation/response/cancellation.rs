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

//! Maps a cancellation response back into a FHIR message bundle: the
//! responding patient and practitioner graph, the medication request with
//! its status history, and a message header tying them together.

use log::error;

use hl7v3::codes::oid;
use hl7v3::datatypes::Timestamp;
use hl7v3::Element;

use resources::bundle::{Bundle, Entry, Resource, Type};
use resources::message_header::{MessageHeader, Response, ResponseCode};
use resources::operation_outcome::{Issue, IssueType, OperationOutcome, Severity};
use resources::patient::Gender;
use resources::primitives::{Date, DateTime, Id};
use resources::types::{
    CodeableConcept, Coding, ContactPoint, Extension, ExtensionValue, HumanName, Identifier,
    Reference,
};
use resources::{MedicationRequest, Organization, Patient, Practitioner, PractitionerRole};

use super::{server_error_response, ResponseBody, TranslatedResponse};
use crate::translation::{extensions, systems};

use std::convert::TryFrom;

pub fn translate_cancel_response(root: &Element) -> TranslatedResponse {
    let response = match root.find_descendant("CancellationResponse") {
        Some(response) => response,
        None => return server_error_response(),
    };

    let status = response
        .find_path(&["pertinentInformation3", "pertinentResponse", "value"])
        .map(|value| {
            (
                value.attribute("code").unwrap_or_default().to_owned(),
                value.attribute("displayName").unwrap_or_default().to_owned(),
            )
        });

    let (status_code, status_display) = match status {
        Some(status) => status,
        None => {
            error!("Cancellation response carries no status code");
            return server_error_response();
        }
    };

    // processing failures become outcomes, business responses become bundles
    if let "5000" | "5888" = status_code.as_str() {
        return TranslatedResponse {
            status_code: 400,
            body: ResponseBody::OperationOutcome(status_outcome(&status_code, &status_display)),
        };
    }

    match build_bundle(response, &status_code) {
        Some(bundle) => TranslatedResponse {
            status_code: 200,
            body: ResponseBody::Bundle(Box::new(bundle)),
        },
        None => server_error_response(),
    }
}

fn status_outcome(code: &str, display: &str) -> OperationOutcome {
    OperationOutcome {
        issue: vec![Issue {
            severity: Severity::Error,
            code: IssueType::Processing,
            details: Some(CodeableConcept {
                coding: vec![status_history_coding(code, display)],
                text: None,
            }),
            diagnostics: None,
            expression: Vec::new(),
        }],
    }
}

fn build_bundle(response: &Element, status_code: &str) -> Option<Bundle> {
    let message_id = response.find("id")?.attribute("root")?.to_owned();

    let effective_time = response
        .find("effectiveTime")
        .and_then(|time| time.attribute("value"))
        .and_then(|value| Timestamp::parse(value).ok())
        .map(|timestamp| DateTime::from(timestamp.to_utc()));

    let patient = translate_patient(
        response.find_path(&["recordTarget", "Patient"])?,
    )?;
    let patient_id = patient.id.clone()?;

    let author_agent = response.find_path(&["author", "AgentPerson"])?;
    let author = translate_agent_person(author_agent)?;

    // the responsible party is the original prescription author when the
    // cancel request came from someone else
    let responsible_party = response
        .find_path(&["responsibleParty", "AgentPerson"])
        .filter(|agent| !same_role_profile(agent, author_agent))
        .and_then(translate_agent_person);

    let performer = response
        .find_path(&["performer", "AgentPerson"])
        .and_then(translate_agent_person);

    let responsible_role_id = responsible_party
        .as_ref()
        .unwrap_or(&author)
        .practitioner_role
        .id
        .clone()?;

    let mut medication_request = translate_medication_request(
        response,
        status_code,
        &patient_id,
        author.practitioner_role.id.as_ref()?,
        &responsible_role_id,
    )?;

    if let Some(performer) = &performer {
        medication_request.dispense_request = dispenser_reference(performer);
    }

    let medication_request_id = medication_request.id.clone()?;

    let header = message_header(response, &author, &[&patient_id, &medication_request_id]);

    let mut bundle = Bundle::new(Type::Message);
    bundle.identifier = Some(Identifier {
        system: Some(systems::RFC4122.to_owned()),
        value: Some(message_id.to_lowercase()),
        ..Default::default()
    });
    bundle.timestamp = effective_time;

    push_resource(&mut bundle, Resource::MessageHeader(Box::new(header)));
    push_resource(&mut bundle, Resource::Patient(Box::new(patient)));
    push_agent(&mut bundle, author);
    if let Some(responsible_party) = responsible_party {
        push_agent(&mut bundle, responsible_party);
    }
    if let Some(performer) = performer {
        push_agent(&mut bundle, performer);
    }
    push_resource(
        &mut bundle,
        Resource::MedicationRequest(Box::new(medication_request)),
    );

    Some(bundle)
}

struct TranslatedAgent {
    practitioner: Practitioner,
    practitioner_role: PractitionerRole,
    organization: Organization,
}

fn push_resource(bundle: &mut Bundle, resource: Resource) {
    let full_url = resource.id().map(|id| format!("urn:uuid:{}", id));
    let mut entry = Entry::new(resource);
    entry.full_url = full_url;
    bundle.entries.push(entry);
}

fn push_agent(bundle: &mut Bundle, agent: TranslatedAgent) {
    push_resource(bundle, Resource::Practitioner(Box::new(agent.practitioner)));
    push_resource(
        bundle,
        Resource::PractitionerRole(Box::new(agent.practitioner_role)),
    );
    push_resource(bundle, Resource::Organization(Box::new(agent.organization)));
}

fn same_role_profile(a: &Element, b: &Element) -> bool {
    let id = |agent: &Element| {
        agent
            .find("id")
            .and_then(|id| id.attribute("extension").map(str::to_owned))
    };

    id(a).is_some() && id(a) == id(b)
}

fn translate_patient(patient: &Element) -> Option<Patient> {
    let nhs_number = patient.find("id")?.attribute("extension")?.to_owned();
    let person = patient.find("patientPerson");

    let name = person
        .and_then(|person| person.find("name"))
        .map(translate_name);

    let birth_date = person
        .and_then(|person| person.find("birthTime"))
        .and_then(|birth_time| birth_time.attribute("value"))
        .and_then(format_date);

    let gender = person
        .and_then(|person| person.find("administrativeGenderCode"))
        .and_then(|code| code.attribute("code"))
        .and_then(|code| match code {
            "1" => Some(Gender::Male),
            "2" => Some(Gender::Female),
            "9" => Some(Gender::Other),
            "0" => Some(Gender::Unknown),
            _ => None,
        });

    Some(Patient {
        id: Some(Id::generate()),
        identifier: vec![Identifier {
            system: Some(systems::NHS_NUMBER.to_owned()),
            value: Some(nhs_number),
            ..Default::default()
        }],
        name: name.into_iter().collect(),
        gender,
        birth_date,
        address: Vec::new(),
        general_practitioner: Vec::new(),
    })
}

fn format_date(compact: &str) -> Option<Date> {
    if compact.len() != 8 || !compact.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let formatted = format!("{}-{}-{}", &compact[..4], &compact[4..6], &compact[6..8]);

    Date::try_from(formatted).ok()
}

fn translate_name(name: &Element) -> HumanName {
    let texts = |tag: &str| {
        name.find_all(tag)
            .map(|element| element.text_content())
            .collect::<Vec<_>>()
    };

    let family = name.find("family").map(|family| family.text_content());

    HumanName {
        use_: None,
        family,
        given: texts("given"),
        prefix: texts("prefix"),
        suffix: texts("suffix"),
    }
}

fn translate_agent_person(agent: &Element) -> Option<TranslatedAgent> {
    let role_profile_id = agent.find("id")?.attribute("extension")?.to_owned();
    let job_role_code = agent
        .find("code")
        .and_then(|code| code.attribute("code"))
        .map(str::to_owned);

    let person = agent.find("agentPerson");
    let person_identifier = person
        .and_then(|person| person.find("id"))
        .and_then(person_identifier);
    let person_name = person.and_then(|person| person.find("name")).map(translate_name);

    let practitioner = Practitioner {
        id: Some(Id::generate()),
        identifier: person_identifier.into_iter().collect(),
        name: person_name.into_iter().collect(),
        telecom: Vec::new(),
    };

    let organization = translate_organization(agent.find("representedOrganization")?)?;

    let practitioner_role = PractitionerRole {
        id: Some(Id::generate()),
        identifier: vec![Identifier {
            system: Some(systems::SDS_ROLE_PROFILE.to_owned()),
            value: Some(role_profile_id),
            ..Default::default()
        }],
        practitioner: practitioner
            .id
            .as_ref()
            .map(|id| Reference::new(format!("urn:uuid:{}", id))),
        organization: organization
            .id
            .as_ref()
            .map(|id| Reference::new(format!("urn:uuid:{}", id))),
        code: job_role_code
            .map(|code| CodeableConcept {
                coding: vec![Coding {
                    system: Some(systems::SDS_JOB_ROLE.to_owned()),
                    code: Some(code),
                    display: None,
                }],
                text: None,
            })
            .into_iter()
            .collect(),
        healthcare_service: Vec::new(),
        telecom: Vec::new(),
    };

    Some(TranslatedAgent {
        practitioner,
        practitioner_role,
        organization,
    })
}

fn person_identifier(id: &Element) -> Option<Identifier> {
    let value = id.attribute("extension")?.to_owned();
    let system = match id.attribute("root")? {
        root if root == oid::SDS_USER_ID => systems::SDS_USER,
        root if root == oid::PRESCRIBING_CODE => systems::SPURIOUS_CODE,
        _ => systems::PROFESSIONAL_CODE,
    };

    Some(Identifier {
        system: Some(system.to_owned()),
        value: Some(value),
        ..Default::default()
    })
}

fn translate_organization(organization: &Element) -> Option<Organization> {
    let code = organization.find("id")?.attribute("extension")?.to_owned();
    let name = organization.find("name").map(|name| name.text_content());

    let telecom = organization
        .find("telecom")
        .and_then(|telecom| telecom.attribute("value"))
        .map(|value| ContactPoint {
            system: Some("phone".to_owned()),
            value: Some(value.to_owned()),
            use_: Some("work".to_owned()),
        });

    Some(Organization {
        id: Some(Id::generate()),
        identifier: vec![Identifier {
            system: Some(systems::ODS_ORGANIZATION.to_owned()),
            value: Some(code),
            ..Default::default()
        }],
        type_: Vec::new(),
        name,
        telecom: telecom.into_iter().collect(),
        address: Vec::new(),
        part_of: None,
    })
}

fn translate_medication_request(
    response: &Element,
    status_code: &str,
    patient_id: &Id,
    author_role_id: &Id,
    responsible_role_id: &Id,
) -> Option<MedicationRequest> {
    let line_item_id = response
        .find_path(&["pertinentInformation1", "pertinentLineItemRef", "id"])?
        .attribute("root")?
        .to_lowercase();

    let group_identifier = response
        .find_path(&["pertinentInformation2", "pertinentPrescriptionID", "value"])?
        .attribute("extension")?
        .to_owned();

    let authored_on = response
        .find("effectiveTime")
        .and_then(|time| time.attribute("value"))
        .and_then(|value| Timestamp::parse(value).ok())
        .map(|timestamp| DateTime::from(timestamp.to_utc()));

    let (history_code, history_display) = status_history(status_code)?;

    Some(MedicationRequest {
        id: Some(Id::generate()),
        extension: vec![
            Extension::new(
                extensions::STATUS_HISTORY,
                ExtensionValue::Nested(vec![Extension::new(
                    "status",
                    ExtensionValue::Coding(status_history_coding(history_code, history_display)),
                )]),
            ),
            Extension::new(
                extensions::RESPONSIBLE_PRACTITIONER,
                ExtensionValue::Reference(Reference::new(format!(
                    "urn:uuid:{}",
                    responsible_role_id
                ))),
            ),
        ],
        identifier: vec![Identifier {
            system: Some(systems::PRESCRIPTION_ORDER_ITEM.to_owned()),
            value: Some(line_item_id),
            ..Default::default()
        }],
        status: Some(medication_request_status(status_code)?.to_owned()),
        intent: Some("order".to_owned()),
        medication_codeable_concept: Some(CodeableConcept {
            coding: vec![Coding {
                system: Some(systems::SNOMED.to_owned()),
                code: Some("763158003".to_owned()),
                display: Some("Medicinal product".to_owned()),
            }],
            text: None,
        }),
        subject: Some(Reference::new(format!("urn:uuid:{}", patient_id))),
        authored_on,
        requester: Some(Reference::new(format!("urn:uuid:{}", author_role_id))),
        group_identifier: Some(Identifier {
            system: Some(systems::PRESCRIPTION_ORDER_NUMBER.to_owned()),
            value: Some(group_identifier),
            ..Default::default()
        }),
        course_of_therapy_type: None,
        dosage_instruction: Vec::new(),
        dispense_request: None,
        substitution: None,
    })
}

fn status_history_coding(code: &str, display: &str) -> Coding {
    Coding {
        system: Some(systems::STATUS_HISTORY.to_owned()),
        code: Some(code.to_owned()),
        display: Some(display.to_owned()),
    }
}

fn medication_request_status(code: &str) -> Option<&'static str> {
    match code {
        "0001" | "0006" => Some("cancelled"),
        "0002" | "0003" | "0009" | "0010" => Some("active"),
        "0004" => Some("completed"),
        "0005" => Some("stopped"),
        "0007" | "0008" => Some("unknown"),
        _ => None,
    }
}

fn status_history(code: &str) -> Option<(&'static str, &'static str)> {
    match code {
        "0001" => Some(("R-0001", "Prescription/item was cancelled")),
        "0002" => Some(("R-0002", "Prescription/item was not cancelled – With dispenser")),
        "0003" => Some(("R-0003", "Prescription item was not cancelled – With dispenser active")),
        "0004" => Some(("R-0004", "Prescription/item was not cancelled – Dispensed to Patient")),
        "0005" => Some(("R-0005", "Prescription item had expired")),
        "0006" => Some(("R-0006", "Prescription/item had already been cancelled")),
        "0007" => Some((
            "R-0007",
            "Prescription/item cancellation requested by another prescriber",
        )),
        "0008" => Some(("R-0008", "Prescription/item not found")),
        "0009" => Some(("R-0009", "Cancellation functionality disabled in Spine")),
        "0010" => Some((
            "R-0010",
            "Prescription/item was not cancelled. Prescription has been not dispensed",
        )),
        _ => None,
    }
}

fn dispenser_reference(
    performer: &TranslatedAgent,
) -> Option<resources::medication_request::DispenseRequest> {
    let role_id = performer.practitioner_role.id.as_ref()?;
    let organization_identifier = performer.organization.identifier.first()?.clone();

    Some(resources::medication_request::DispenseRequest {
        performer: Some(Reference {
            extension: vec![Extension::new(
                extensions::DISPENSING_PERFORMER,
                ExtensionValue::Reference(Reference::new(format!("urn:uuid:{}", role_id))),
            )],
            identifier: Some(organization_identifier),
            display: performer.organization.name.clone(),
            ..Default::default()
        }),
        ..Default::default()
    })
}

fn message_header(
    response: &Element,
    author: &TranslatedAgent,
    focus_ids: &[&Id],
) -> MessageHeader {
    let cancel_request_id = response
        .find_path(&["pertinentInformation4", "pertinentCancellationRequestRef", "id"])
        .and_then(|id| id.attribute("root"))
        .map(str::to_owned);

    let sender_code = author
        .organization
        .identifier
        .first()
        .and_then(|identifier| identifier.value.clone());

    MessageHeader {
        id: Some(Id::generate()),
        event_coding: Coding {
            system: Some("https://fhir.nhs.uk/CodeSystem/message-event".to_owned()),
            code: Some("prescription-order-response".to_owned()),
            display: Some("Prescription Order Response".to_owned()),
        },
        sender: sender_code.map(|code| {
            Reference::from_identifier(Identifier {
                system: Some(systems::ODS_ORGANIZATION.to_owned()),
                value: Some(code),
                ..Default::default()
            })
        }),
        source: None,
        destination: Vec::new(),
        response: cancel_request_id.map(|identifier| Response {
            identifier: identifier.to_lowercase(),
            code: ResponseCode::Ok,
        }),
        focus: focus_ids
            .iter()
            .map(|id| Reference::new(format!("urn:uuid:{}", id)))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CANCEL_RESPONSE: &str = r#"<hl7:PORX_IN050101UK31 xmlns:hl7="urn:hl7-org:v3">
        <hl7:ControlActEvent classCode="CACT" moodCode="EVN">
            <hl7:subject>
                <hl7:CancellationResponse classCode="INFO" moodCode="EVN">
                    <hl7:id root="0F5A30F4-8367-4D32-9C91-1D9FB54C5C14"/>
                    <hl7:effectiveTime value="20210302093000"/>
                    <hl7:recordTarget typeCode="RCT">
                        <hl7:Patient classCode="PAT">
                            <hl7:id root="2.16.840.1.113883.2.1.4.1" extension="9990548609"/>
                            <hl7:patientPerson classCode="PSN" determinerCode="INSTANCE">
                                <hl7:name><hl7:given>JANE</hl7:given><hl7:family>SMITH</hl7:family></hl7:name>
                                <hl7:administrativeGenderCode code="2"/>
                                <hl7:birthTime value="19730421"/>
                            </hl7:patientPerson>
                        </hl7:Patient>
                    </hl7:recordTarget>
                    <hl7:author typeCode="AUT">
                        <hl7:AgentPerson classCode="AGNT">
                            <hl7:id root="1.2.826.0.1285.0.2.0.67" extension="100102238986"/>
                            <hl7:code codeSystem="1.2.826.0.1285.0.2.1.104" code="R8000"/>
                            <hl7:agentPerson classCode="PSN" determinerCode="INSTANCE">
                                <hl7:id root="1.2.826.0.1285.0.2.1.54" extension="6095103"/>
                                <hl7:name><hl7:given>ANNE</hl7:given><hl7:family>DOCTOR</hl7:family></hl7:name>
                            </hl7:agentPerson>
                            <hl7:representedOrganization classCode="ORG" determinerCode="INSTANCE">
                                <hl7:id root="1.2.826.0.1285.0.1.10" extension="A83008"/>
                                <hl7:name>HALLGARTH SURGERY</hl7:name>
                            </hl7:representedOrganization>
                        </hl7:AgentPerson>
                    </hl7:author>
                    <hl7:pertinentInformation1 typeCode="PERT">
                        <hl7:pertinentLineItemRef classCode="SBADM" moodCode="RQO">
                            <hl7:id root="A54219B8-F741-4C47-B662-E4F8DFA49AB6"/>
                        </hl7:pertinentLineItemRef>
                    </hl7:pertinentInformation1>
                    <hl7:pertinentInformation2 typeCode="PERT">
                        <hl7:pertinentPrescriptionID classCode="OBS" moodCode="EVN">
                            <hl7:value root="2.16.840.1.113883.2.1.3.2.4.18.8" extension="E3E6FA-A83008-41F09Y"/>
                        </hl7:pertinentPrescriptionID>
                    </hl7:pertinentInformation2>
                    <hl7:pertinentInformation3 typeCode="PERT">
                        <hl7:pertinentResponse classCode="OBS" moodCode="EVN">
                            <hl7:value code="0001" displayName="Prescription/item was cancelled"/>
                        </hl7:pertinentResponse>
                    </hl7:pertinentInformation3>
                    <hl7:pertinentInformation4 typeCode="PERT">
                        <hl7:pertinentCancellationRequestRef classCode="INFO" moodCode="EVN">
                            <hl7:id root="8D79B459-0FE4-4B6B-B64B-D1AF85D5F766"/>
                        </hl7:pertinentCancellationRequestRef>
                    </hl7:pertinentInformation4>
                </hl7:CancellationResponse>
            </hl7:subject>
        </hl7:ControlActEvent>
    </hl7:PORX_IN050101UK31>"#;

    #[test]
    fn cancelled_response_becomes_a_message_bundle() {
        let root = hl7v3::parse(CANCEL_RESPONSE).unwrap();

        let actual = translate_cancel_response(&root);

        assert_eq!(actual.status_code, 200);
        let bundle = match actual.body {
            ResponseBody::Bundle(bundle) => bundle,
            body => panic!("unexpected body: {:?}", body),
        };

        assert_eq!(
            bundle.identifier.as_ref().unwrap().value.as_deref(),
            Some("0f5a30f4-8367-4d32-9c91-1d9fb54c5c14")
        );

        let types: Vec<_> = bundle
            .entries
            .iter()
            .map(|entry| entry.resource.type_name())
            .collect();
        assert_eq!(
            types,
            [
                "MessageHeader",
                "Patient",
                "Practitioner",
                "PractitionerRole",
                "Organization",
                "MedicationRequest"
            ]
        );

        let request = bundle
            .entries
            .iter()
            .find_map(|entry| match &entry.resource {
                Resource::MedicationRequest(request) => Some(request),
                _ => None,
            })
            .unwrap();
        assert_eq!(request.status.as_deref(), Some("cancelled"));
        assert_eq!(
            request.group_identifier.as_ref().unwrap().value.as_deref(),
            Some("E3E6FA-A83008-41F09Y")
        );
    }

    #[test]
    fn processing_failure_becomes_an_outcome() {
        let raw = CANCEL_RESPONSE.replace(
            r#"code="0001" displayName="Prescription/item was cancelled""#,
            r#"code="5000" displayName="Unable to process message""#,
        );
        let root = hl7v3::parse(&raw).unwrap();

        let actual = translate_cancel_response(&root);

        assert_eq!(actual.status_code, 400);
        assert!(matches!(actual.body, ResponseBody::OperationOutcome(_)));
    }

    #[test]
    fn round_trip_preserves_patient_and_prescription_identifiers() {
        let root = hl7v3::parse(CANCEL_RESPONSE).unwrap();

        let actual = translate_cancel_response(&root);
        let bundle = match actual.body {
            ResponseBody::Bundle(bundle) => bundle,
            body => panic!("unexpected body: {:?}", body),
        };

        let patient = bundle
            .entries
            .iter()
            .find_map(|entry| match &entry.resource {
                Resource::Patient(patient) => Some(patient),
                _ => None,
            })
            .unwrap();
        assert_eq!(
            patient.identifier[0].value.as_deref(),
            Some("9990548609")
        );
        assert_eq!(patient.birth_date.as_ref().unwrap().to_compact(), "19730421");
        assert_eq!(patient.gender, Some(Gender::Female));
    }
}
