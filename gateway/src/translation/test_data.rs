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

//! Representative bundles for the translation tests, modeled on a primary
//! care acute prescription.

use std::convert::TryFrom;

use serde_json::Number;

use resources::bundle::{Bundle, Entry, Resource, Type};
use resources::communication_request::{CommunicationRequest, Payload};
use resources::medication_dispense::{MedicationDispense, Performer};
use resources::medication_request::{
    DispenseRequest, Dosage, MedicationRequest, Substitution,
};
use resources::message_header::{Destination, MessageHeader, Response, ResponseCode};
use resources::patient::Gender;
use resources::primitives::{Date, DateTime};
use resources::provenance::{Agent, Provenance, Signature};
use resources::types::{
    Address, CodeableConcept, Coding, ContactPoint, Extension, ExtensionValue, HumanName,
    Identifier, Quantity, Reference,
};
use resources::{Organization, Patient, Practitioner, PractitionerRole};

use super::{extensions, systems};

pub const MESSAGE_ID: &str = "6b2192e2-d069-4fb7-a086-c1328d2b54ae";
pub const SHORT_FORM_ID: &str = "E3E6FA-A83008-41F09Y";
pub const LONG_FORM_ID: &str = "a5b9dc81-ccf4-4dab-b887-3d88e557febb";
pub const LINE_ITEM_ID: &str = "a54219b8-f741-4c47-b662-e4f8dfa49ab6";
pub const NHS_NUMBER: &str = "9990548609";
pub const SIGNED_AT: &str = "2020-12-18T12:34:34Z";

pub const PATIENT_URL: &str = "urn:uuid:78d3c2eb-009e-4ec8-a358-b042954aa9b2";
pub const PRACTITIONER_URL: &str = "urn:uuid:a8c85454-f8cb-498d-9629-78e2cb5fa47a";
pub const ROLE_URL: &str = "urn:uuid:56166769-c1c4-4d07-afa8-132b5dfca666";
pub const ORGANIZATION_URL: &str = "urn:uuid:3b4b03a5-52ba-4ba6-9b82-70350aa109d8";
pub const PARENT_ORGANIZATION_URL: &str = "urn:uuid:cc850777-b73f-43cd-23c8-a41a188f29d4";

fn identifier(system: &str, value: &str) -> Identifier {
    Identifier {
        system: Some(system.to_owned()),
        value: Some(value.to_owned()),
        ..Default::default()
    }
}

fn coding(system: &str, code: &str, display: Option<&str>) -> Coding {
    Coding {
        system: Some(system.to_owned()),
        code: Some(code.to_owned()),
        display: display.map(str::to_owned),
    }
}

fn concept(system: &str, code: &str, display: Option<&str>) -> CodeableConcept {
    CodeableConcept {
        coding: vec![coding(system, code, display)],
        text: None,
    }
}

fn entry(full_url: &str, resource: Resource) -> Entry {
    let mut entry = Entry::new(resource);
    entry.full_url = Some(full_url.to_owned());
    entry
}

pub fn patient() -> Patient {
    Patient {
        id: None,
        identifier: vec![identifier(systems::NHS_NUMBER, NHS_NUMBER)],
        name: vec![HumanName {
            use_: Some("usual".into()),
            family: Some("SMITH".into()),
            given: vec!["JANE".into()],
            prefix: vec!["MS".into()],
            suffix: Vec::new(),
        }],
        gender: Some(Gender::Female),
        birth_date: Some(Date::try_from("1973-04-21").unwrap()),
        address: vec![Address {
            use_: Some("home".into()),
            line: vec!["1 Trevelyan Square".into(), "Boar Lane".into()],
            city: Some("Leeds".into()),
            postal_code: Some("LS1 6AE".into()),
            ..Default::default()
        }],
        general_practitioner: Vec::new(),
    }
}

pub fn practitioner() -> Practitioner {
    Practitioner {
        id: None,
        identifier: vec![
            identifier(systems::SDS_USER, "3415870201"),
            identifier(systems::GMC_NUMBER, "6095103"),
        ],
        name: vec![HumanName {
            use_: Some("usual".into()),
            family: Some("DOCTOR".into()),
            given: vec!["ANNE".into()],
            prefix: vec!["DR".into()],
            suffix: Vec::new(),
        }],
        telecom: Vec::new(),
    }
}

pub fn practitioner_role() -> PractitionerRole {
    PractitionerRole {
        id: None,
        identifier: vec![identifier(systems::SDS_ROLE_PROFILE, "100102238986")],
        practitioner: Some(Reference::new(PRACTITIONER_URL)),
        organization: Some(Reference::new(ORGANIZATION_URL)),
        code: vec![concept(systems::SDS_JOB_ROLE, "R8000", Some("Clinical Practitioner Access Role"))],
        healthcare_service: Vec::new(),
        telecom: vec![ContactPoint {
            system: Some("phone".into()),
            value: Some("01234567890".into()),
            use_: Some("work".into()),
        }],
    }
}

pub fn organization() -> Organization {
    Organization {
        id: None,
        identifier: vec![identifier(systems::ODS_ORGANIZATION, "A83008")],
        type_: Vec::new(),
        name: Some("HALLGARTH SURGERY".into()),
        telecom: vec![ContactPoint {
            system: Some("phone".into()),
            value: Some("01159737320".into()),
            use_: Some("work".into()),
        }],
        address: vec![Address {
            use_: Some("work".into()),
            line: vec!["HALLGARTH SURGERY".into(), "CHEAPSIDE".into()],
            city: Some("SHILDON".into()),
            postal_code: Some("DL4 2HP".into()),
            ..Default::default()
        }],
        part_of: Some(Reference::new(PARENT_ORGANIZATION_URL)),
    }
}

pub fn parent_organization() -> Organization {
    Organization {
        identifier: vec![identifier(systems::ODS_ORGANIZATION, "84H")],
        name: Some("NHS COUNTY DURHAM CCG".into()),
        ..Default::default()
    }
}

pub fn medication_request() -> MedicationRequest {
    MedicationRequest {
        id: None,
        extension: vec![Extension::new(
            extensions::PRESCRIPTION_TYPE,
            ExtensionValue::Coding(coding(
                "https://fhir.nhs.uk/CodeSystem/prescription-type",
                "0101",
                Some("Primary Care Prescriber - Medical Prescriber"),
            )),
        )],
        identifier: vec![identifier(systems::PRESCRIPTION_ORDER_ITEM, LINE_ITEM_ID)],
        status: Some("active".into()),
        intent: Some("order".into()),
        medication_codeable_concept: Some(concept(
            systems::SNOMED,
            "322237000",
            Some("Paracetamol 500mg soluble tablets"),
        )),
        subject: Some(Reference::new(PATIENT_URL)),
        authored_on: Some(DateTime::try_from(SIGNED_AT).unwrap()),
        requester: Some(Reference::new(ROLE_URL)),
        group_identifier: Some(Identifier {
            extension: vec![Extension::new(
                extensions::PRESCRIPTION_ID,
                ExtensionValue::Identifier(identifier(systems::PRESCRIPTION, LONG_FORM_ID)),
            )],
            system: Some(systems::PRESCRIPTION_ORDER_NUMBER.to_owned()),
            value: Some(SHORT_FORM_ID.to_owned()),
        }),
        course_of_therapy_type: Some(concept(systems::COURSE_OF_THERAPY, "acute", Some("Short course (acute) therapy"))),
        dosage_instruction: vec![Dosage {
            text: Some("4 times a day - Oral".into()),
            patient_instruction: None,
        }],
        dispense_request: Some(DispenseRequest {
            extension: vec![Extension::new(
                extensions::PERFORMER_SITE_TYPE,
                ExtensionValue::Coding(coding(
                    "https://fhir.nhs.uk/CodeSystem/dispensing-site-preference",
                    "P1",
                    None,
                )),
            )],
            validity_period: None,
            quantity: Some(Quantity {
                value: Some(Number::from(100u32)),
                unit: Some("tablet".into()),
                system: Some(systems::SNOMED.to_owned()),
                code: Some("428673006".into()),
            }),
            expected_supply_duration: Some(Quantity {
                value: Some(Number::from(28u32)),
                unit: Some("days".into()),
                system: Some(systems::UCUM.to_owned()),
                code: Some("d".into()),
            }),
            performer: Some(Reference::from_identifier(identifier(
                systems::ODS_ORGANIZATION,
                "FX748",
            ))),
            number_of_repeats_allowed: None,
        }),
        substitution: Some(Substitution {
            allowed_boolean: false,
        }),
    }
}

pub fn communication_request() -> CommunicationRequest {
    CommunicationRequest {
        id: None,
        status: Some("unknown".into()),
        subject: Some(Reference::new(PATIENT_URL)),
        payload: vec![Payload::String(
            "Please make an appointment with the nurse".into(),
        )],
        requester: Some(Reference::from_identifier(identifier(
            systems::ODS_ORGANIZATION,
            "A83008",
        ))),
        recipient: vec![identifier(systems::NHS_NUMBER, NHS_NUMBER)],
    }
}

pub fn provenance() -> Provenance {
    // a placeholder detached signature, structurally valid XML-DSig
    let signature_xml = "<Signature xmlns=\"http://www.w3.org/2000/09/xmldsig#\">\
        <SignedInfo><Reference><DigestValue>placeholder</DigestValue></Reference></SignedInfo>\
        <SignatureValue>cGxhY2Vob2xkZXI=</SignatureValue>\
        </Signature>";

    Provenance {
        id: None,
        target: vec![Reference::new(ROLE_URL)],
        recorded: Some(DateTime::try_from(SIGNED_AT).unwrap()),
        agent: vec![Agent {
            who: Some(Reference::new(ROLE_URL)),
        }],
        signature: vec![Signature {
            type_: vec![coding(
                "urn:iso-astm:E1762-95:2013",
                "1.2.840.10065.1.12.1.1",
                None,
            )],
            when: DateTime::try_from(SIGNED_AT).unwrap(),
            who: Reference::new(ROLE_URL),
            data: Some(base64::encode(signature_xml)),
        }],
    }
}

fn message_header(event_code: &str) -> MessageHeader {
    MessageHeader {
        id: None,
        event_coding: coding(
            "https://fhir.nhs.uk/CodeSystem/message-event",
            event_code,
            None,
        ),
        sender: Some(Reference::from_identifier(identifier(
            systems::ODS_ORGANIZATION,
            "A83008",
        ))),
        source: None,
        destination: Vec::new(),
        response: None,
        focus: Vec::new(),
    }
}

/// A complete, signed prescription-order bundle.
pub fn prescription_order_bundle() -> Bundle {
    let mut bundle = Bundle::new(Type::Message);
    bundle.identifier = Some(identifier(systems::RFC4122, MESSAGE_ID));
    bundle.entries = vec![
        entry(
            "urn:uuid:3599c0e9-9292-413e-9270-9a1ef1ead99c",
            Resource::MessageHeader(Box::new(message_header("prescription-order"))),
        ),
        entry(PATIENT_URL, Resource::Patient(Box::new(patient()))),
        entry(
            PRACTITIONER_URL,
            Resource::Practitioner(Box::new(practitioner())),
        ),
        entry(
            ROLE_URL,
            Resource::PractitionerRole(Box::new(practitioner_role())),
        ),
        entry(
            ORGANIZATION_URL,
            Resource::Organization(Box::new(organization())),
        ),
        entry(
            PARENT_ORGANIZATION_URL,
            Resource::Organization(Box::new(parent_organization())),
        ),
        entry(
            "urn:uuid:a6e79eb6-7ee0-4b5c-87e9-159bb1d1fbb6",
            Resource::MedicationRequest(Box::new(medication_request())),
        ),
        entry(
            "urn:uuid:28828c55-8fa7-42d7-916f-fcf076e0c10e",
            Resource::CommunicationRequest(Box::new(communication_request())),
        ),
        entry(
            "urn:uuid:5cb17f5a-11ac-4e18-825f-6470467238b3",
            Resource::Provenance(Box::new(provenance())),
        ),
    ];

    bundle
}

pub const PHARMACY_ROLE_URL: &str = "urn:uuid:11c9bf5a-c222-4b12-a8b8-f79c2c1f4c12";
pub const PHARMACIST_URL: &str = "urn:uuid:91f55a4d-9e01-4e08-b07f-6d0a2fe0a22d";
pub const PHARMACY_ORGANIZATION_URL: &str = "urn:uuid:154b9e70-76cd-4927-9a12-9a5ddd7c1335";
pub const RELEASE_EVENT_ID: &str = "ffb232b1-be86-4b22-b9a4-9a51b687ba0c";

pub fn pharmacist() -> Practitioner {
    Practitioner {
        identifier: vec![identifier(systems::SDS_USER, "7654321000")],
        name: vec![HumanName {
            family: Some("CHEMIST".into()),
            given: vec!["SARAH".into()],
            ..Default::default()
        }],
        ..Default::default()
    }
}

pub fn pharmacy_role() -> PractitionerRole {
    PractitionerRole {
        identifier: vec![identifier(systems::SDS_ROLE_PROFILE, "100243444980")],
        practitioner: Some(Reference::new(PHARMACIST_URL)),
        organization: Some(Reference::new(PHARMACY_ORGANIZATION_URL)),
        code: vec![concept(systems::SDS_JOB_ROLE, "R1290", None)],
        telecom: vec![ContactPoint {
            system: Some("phone".into()),
            value: Some("01208812760".into()),
            use_: Some("work".into()),
        }],
        ..Default::default()
    }
}

pub fn pharmacy() -> Organization {
    Organization {
        identifier: vec![identifier(systems::ODS_ORGANIZATION, "FA565")],
        name: Some("GREENE PHARMACY".into()),
        ..Default::default()
    }
}

pub fn medication_dispense() -> MedicationDispense {
    MedicationDispense {
        id: None,
        extension: vec![Extension::new(
            extensions::TASK_BUSINESS_STATUS,
            ExtensionValue::Coding(coding(
                "https://fhir.nhs.uk/CodeSystem/EPS-task-business-status",
                "0006",
                Some("Dispensed"),
            )),
        )],
        identifier: vec![identifier(
            systems::PRESCRIPTION_DISPENSE_ITEM,
            "9d1b8fb4-7b86-4a79-9b2e-6b6e53c1d5f7",
        )],
        status: Some("completed".into()),
        medication_codeable_concept: Some(concept(
            systems::SNOMED,
            "322237000",
            Some("Paracetamol 500mg soluble tablets"),
        )),
        subject: Some(Reference::from_identifier(identifier(
            systems::NHS_NUMBER,
            NHS_NUMBER,
        ))),
        performer: vec![Performer {
            actor: Reference::new(PHARMACY_ROLE_URL),
        }],
        authorizing_prescription: vec![Reference {
            extension: vec![Extension::new(
                extensions::GROUP_IDENTIFIER,
                ExtensionValue::Nested(vec![
                    Extension::new(
                        "shortForm",
                        ExtensionValue::Identifier(identifier(
                            systems::PRESCRIPTION_ORDER_NUMBER,
                            SHORT_FORM_ID,
                        )),
                    ),
                    Extension::new(
                        "UUID",
                        ExtensionValue::Identifier(identifier(systems::PRESCRIPTION, LONG_FORM_ID)),
                    ),
                ]),
            )],
            identifier: Some(identifier(systems::PRESCRIPTION_ORDER_ITEM, LINE_ITEM_ID)),
            ..Default::default()
        }],
        type_: Some(concept(
            systems::MEDICATION_DISPENSE_TYPE,
            "0001",
            Some("Item fully dispensed"),
        )),
        quantity: Some(Quantity {
            value: Some(Number::from(100u32)),
            unit: Some("tablet".into()),
            system: Some(systems::SNOMED.to_owned()),
            code: Some("428673006".into()),
        }),
        when_prepared: Some(DateTime::try_from("2021-03-02T09:30:00Z").unwrap()),
        dosage_instruction: vec![Dosage {
            text: Some("4 times a day - Oral".into()),
            patient_instruction: None,
        }],
    }
}

/// A dispense-notification bundle with the full performer graph.
pub fn dispense_notification_bundle() -> Bundle {
    let mut header = message_header("dispense-notification");
    header.destination = vec![Destination {
        endpoint: Some("urn:nhs-uk:addressing:ods:T1450".into()),
        receiver: Some(Reference {
            identifier: Some(identifier(systems::ODS_ORGANIZATION, "T1450")),
            display: Some("NHS BUSINESS SERVICES AUTHORITY".into()),
            ..Default::default()
        }),
    }];
    header.response = Some(Response {
        identifier: RELEASE_EVENT_ID.to_owned(),
        code: ResponseCode::Ok,
    });

    let mut bundle = Bundle::new(Type::Message);
    bundle.identifier = Some(identifier(
        systems::RFC4122,
        "b4fdbbe8-9666-4a4f-a0f1-4d0c7d4a746c",
    ));
    bundle.entries = vec![
        entry(
            "urn:uuid:dd59fb2a-88e3-4d1c-ae4c-14b2b2ad9cd5",
            Resource::MessageHeader(Box::new(header)),
        ),
        entry(
            "urn:uuid:22f9e8f4-b1f7-41f6-bcd9-cdefa9c2c2c4",
            Resource::MedicationDispense(Box::new(medication_dispense())),
        ),
        entry(PHARMACIST_URL, Resource::Practitioner(Box::new(pharmacist()))),
        entry(
            PHARMACY_ROLE_URL,
            Resource::PractitionerRole(Box::new(pharmacy_role())),
        ),
        entry(
            PHARMACY_ORGANIZATION_URL,
            Resource::Organization(Box::new(pharmacy())),
        ),
    ];

    bundle
}

pub fn return_task() -> resources::Task {
    resources::Task {
        id: None,
        identifier: vec![identifier(
            systems::RFC4122,
            "0ba2f83f-24b9-4f3e-bd91-57e3ef223a10",
        )],
        status: resources::task::Status::Rejected,
        intent: Some("order".into()),
        code: Some(concept(
            "http://hl7.org/fhir/CodeSystem/task-code",
            "fulfill",
            None,
        )),
        group_identifier: Some(identifier(systems::PRESCRIPTION_ORDER_NUMBER, SHORT_FORM_ID)),
        focus: Some(Reference::from_identifier(identifier(
            systems::RFC4122,
            RELEASE_EVENT_ID,
        ))),
        for_: Some(Reference::from_identifier(identifier(
            systems::NHS_NUMBER,
            NHS_NUMBER,
        ))),
        authored_on: Some(DateTime::try_from("2021-03-02T10:15:00Z").unwrap()),
        requester: None,
        owner: None,
        reason_code: Some(concept(
            systems::RETURN_REASON,
            "0002",
            Some("Unable to dispense medication on prescriptions"),
        )),
        status_reason: None,
    }
}

pub fn withdraw_task() -> resources::Task {
    let mut task = return_task();
    task.status = resources::task::Status::InProgress;
    task.reason_code = None;
    task.status_reason = Some(concept(
        systems::WITHDRAW_REASON,
        "MU",
        Some("Medication Update"),
    ));
    task.focus = Some(Reference::from_identifier(identifier(
        systems::RFC4122,
        "b4fdbbe8-9666-4a4f-a0f1-4d0c7d4a746c",
    )));

    task
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_bundle_is_internally_consistent() {
        let bundle = prescription_order_bundle();

        assert!(crate::navigator::check_unique_full_urls(&bundle).is_ok());
        assert!(crate::navigator::message_header(&bundle).is_ok());
    }
}
