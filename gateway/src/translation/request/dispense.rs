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

//! Dispense notification and dispense claim pipelines. The dispensing
//! author identity is always resolved from the performer practitioner
//! role / organization graph.

use hl7v3::datatypes::Timestamp;
use hl7v3::dispense::{
    CodedValue, DispenseAuthor, DispenseClaim, DispenseNotification, PriorReleaseEventRef,
    ReceiverOrganization, SupplyHeader, SuppliedLineItem,
};
use hl7v3::prescription::Organization as Hl7Organization;

use resources::bundle::Bundle;
use resources::medication_dispense::MedicationDispense;
use resources::message_header::MessageHeader;
use resources::types::{Coding, ExtensionValue};

use super::practitioner::{convert_practitioner_role, PersonIdStrategy};
use crate::error::Error;
use crate::navigator::{
    coding_for_system, extension_by_url, extension_by_url_strict, identifier_value,
    identifier_value_or_null, medication_dispenses, message_header, only_element,
    patient_or_null, resolve_practitioner_role,
};
use crate::translation::{extensions, systems};

pub fn convert_dispense_notification(
    bundle: &Bundle,
    message_id: &str,
) -> Result<DispenseNotification, Error> {
    let header = message_header(bundle)?;
    let dispenses = medication_dispenses(bundle);
    let first = *dispenses.first().ok_or_else(|| {
        Error::too_few_values(
            "Expected at least one MedicationDispense",
            "Bundle.entry.ofType(MedicationDispense)",
        )
    })?;

    let supply_header = convert_supply_header(bundle, message_id, first, &dispenses, false)?;
    let effective_time = when_prepared(first)?;

    Ok(DispenseNotification {
        id: message_id.to_owned(),
        effective_time,
        patient_nhs_number: patient_nhs_number(bundle, first)?,
        receiver_organization: receiver_organization(header)?,
        supply_header,
        sequel_to: prior_release_event(header)?,
    })
}

pub fn convert_dispense_claim(bundle: &Bundle, message_id: &str) -> Result<DispenseClaim, Error> {
    let header = message_header(bundle)?;
    let dispenses = medication_dispenses(bundle);
    let first = *dispenses.first().ok_or_else(|| {
        Error::too_few_values(
            "Expected at least one MedicationDispense",
            "Bundle.entry.ofType(MedicationDispense)",
        )
    })?;

    let supply_header = convert_supply_header(bundle, message_id, first, &dispenses, true)?;

    let replacement_of = extension_by_url(&header_extensions(header), extensions::REPLACEMENT_OF)
        .map(|extension| match &extension.value {
            Some(ExtensionValue::Identifier(identifier)) => {
                identifier.value.clone().ok_or_else(|| {
                    Error::invalid_value(
                        "replacementOf identifier has no value",
                        "MessageHeader.extension",
                    )
                })
            }
            _ => Err(Error::invalid_value(
                "replacementOf extension must carry an identifier",
                "MessageHeader.extension",
            )),
        })
        .transpose()?;

    Ok(DispenseClaim {
        id: message_id.to_owned(),
        effective_time: when_prepared(first)?,
        receiver_organization: receiver_organization(header)?,
        supply_header,
        replacement_of,
    })
}

// MessageHeader has no extension list of its own in this model; claims
// carry replacementOf on the focus references.
fn header_extensions(header: &MessageHeader) -> Vec<resources::types::Extension> {
    header
        .focus
        .iter()
        .flat_map(|reference| reference.extension.iter().cloned())
        .collect()
}

fn convert_supply_header(
    bundle: &Bundle,
    message_id: &str,
    first: &MedicationDispense,
    dispenses: &[&MedicationDispense],
    claim: bool,
) -> Result<SupplyHeader, Error> {
    let line_items = dispenses
        .iter()
        .map(|dispense| convert_supplied_line_item(dispense, claim))
        .collect::<Result<Vec<_>, _>>()?;

    let group_identifier = authorizing_group_identifier(first)?;

    Ok(SupplyHeader {
        id: message_id.to_owned(),
        author: convert_dispense_author(bundle, first)?,
        line_items,
        prescription_status: prescription_status(first)?,
        prescription_short_form_id: group_identifier.0,
        prior_prescription_id: group_identifier.1,
    })
}

/// The dispensing author resolved from the performer practitioner role
/// graph.
fn convert_dispense_author(
    bundle: &Bundle,
    first: &MedicationDispense,
) -> Result<DispenseAuthor, Error> {
    let path = "MedicationDispense.performer";
    let role_reference = first
        .performer
        .iter()
        .map(|performer| &performer.actor)
        .find(|actor| actor.reference.is_some())
        .ok_or_else(|| {
            Error::too_few_values("Expected a performer with a resolvable actor", path)
        })?;

    let role = resolve_practitioner_role(bundle, role_reference, path)?;
    let agent_person = convert_practitioner_role(bundle, role, PersonIdStrategy::Dispenser)?;

    Ok(DispenseAuthor {
        time: when_prepared(first)?,
        agent_person,
    })
}

fn when_prepared(first: &MedicationDispense) -> Result<Timestamp, Error> {
    let path = "MedicationDispense.whenPrepared";
    let when = first
        .when_prepared
        .as_ref()
        .ok_or_else(|| Error::invalid_value("MedicationDispense has no whenPrepared", path))?;

    when.to_utc()
        .map(Timestamp::seconds)
        .map_err(|value| Error::invalid_value(format!("Invalid dateTime '{}'", value), path))
}

fn patient_nhs_number(bundle: &Bundle, first: &MedicationDispense) -> Result<String, Error> {
    if let Some(patient) = patient_or_null(bundle)? {
        if let Some(value) = identifier_value_or_null(
            &patient.identifier,
            systems::NHS_NUMBER,
            "Patient.identifier",
        )? {
            return Ok(value.to_owned());
        }
    }

    let path = "MedicationDispense.subject";
    first
        .subject
        .as_ref()
        .and_then(|subject| subject.identifier.as_ref())
        .and_then(|identifier| identifier.value.clone())
        .ok_or_else(|| Error::invalid_value("Unable to determine the patient's NHS number", path))
}

/// The notification is addressed to the organization in the message
/// header's single destination.
fn receiver_organization(header: &MessageHeader) -> Result<ReceiverOrganization, Error> {
    let destination = only_element(&header.destination, "MessageHeader.destination")?;
    let receiver = destination.receiver.as_ref().ok_or_else(|| {
        Error::invalid_value(
            "MessageHeader destination has no receiver",
            "MessageHeader.destination",
        )
    })?;

    let code = receiver
        .identifier
        .as_ref()
        .and_then(|identifier| identifier.value.as_deref())
        .ok_or_else(|| {
            Error::invalid_value(
                "Expected an identifier reference for the receiver",
                "MessageHeader.destination.receiver",
            )
        })?;

    Ok(ReceiverOrganization {
        organization: Hl7Organization {
            organization_code: code.to_owned(),
            type_code: "RO197".to_owned(),
            name: receiver.display.clone().unwrap_or_default(),
            telecom: None,
            address: None,
            provider_license: None,
        },
    })
}

fn prior_release_event(header: &MessageHeader) -> Result<PriorReleaseEventRef, Error> {
    let response = header.response.as_ref().ok_or_else(|| {
        Error::too_few_values(
            "Dispense messages must reference the prior release event",
            "MessageHeader.response",
        )
    })?;

    Ok(PriorReleaseEventRef {
        id: response.identifier.clone(),
    })
}

fn prescription_status(first: &MedicationDispense) -> Result<CodedValue, Error> {
    let path = "MedicationDispense.extension";
    let extension =
        extension_by_url_strict(&first.extension, extensions::TASK_BUSINESS_STATUS, path)?;

    match &extension.value {
        Some(ExtensionValue::Coding(coding)) => Ok(CodedValue {
            code: coding
                .code
                .clone()
                .ok_or_else(|| Error::invalid_value("Business status coding has no code", path))?,
            display: coding.display.clone(),
        }),
        _ => Err(Error::invalid_value(
            "Business status extension must carry a coding",
            path,
        )),
    }
}

/// Short form and UUID of the authorizing prescription, from the group
/// identifier extension on the authorizingPrescription reference.
fn authorizing_group_identifier(first: &MedicationDispense) -> Result<(String, String), Error> {
    let path = "MedicationDispense.authorizingPrescription";
    let authorizing_extensions: Vec<_> = first
        .authorizing_prescription
        .iter()
        .flat_map(|reference| reference.extension.iter().cloned())
        .collect();

    let group_identifier =
        extension_by_url_strict(&authorizing_extensions, extensions::GROUP_IDENTIFIER, path)?;
    let nested = match &group_identifier.value {
        Some(ExtensionValue::Nested(nested)) => nested,
        _ => {
            return Err(Error::invalid_value(
                "Group identifier extension must carry sub-extensions",
                path,
            ))
        }
    };

    let short_form = nested_identifier(nested, "shortForm", path)?;
    let long_form = nested_identifier(nested, "UUID", path)?;

    Ok((short_form, long_form))
}

fn nested_identifier(
    nested: &[resources::types::Extension],
    url: &str,
    path: &str,
) -> Result<String, Error> {
    let extension = extension_by_url_strict(nested, url, path)?;

    match &extension.value {
        Some(ExtensionValue::Identifier(identifier)) => identifier.value.clone().ok_or_else(|| {
            Error::invalid_value(format!("'{}' identifier has no value", url), path)
        }),
        _ => Err(Error::invalid_value(
            format!("'{}' extension must carry an identifier", url),
            path,
        )),
    }
}

fn convert_supplied_line_item(
    dispense: &MedicationDispense,
    claim: bool,
) -> Result<SuppliedLineItem, Error> {
    let id = identifier_value(
        &dispense.identifier,
        systems::PRESCRIPTION_DISPENSE_ITEM,
        "MedicationDispense.identifier",
    )?;

    let medication_path = "MedicationDispense.medicationCodeableConcept";
    let medication = dispense
        .medication_codeable_concept
        .as_ref()
        .ok_or_else(|| Error::invalid_value("MedicationDispense has no medication", medication_path))?;
    let medication_coding = only_element(&medication.coding, medication_path)?;
    let medication_code = medication_coding
        .code
        .as_deref()
        .ok_or_else(|| Error::invalid_value("Medication coding has no code", medication_path))?;

    let quantity_path = "MedicationDispense.quantity";
    let quantity = dispense
        .quantity
        .as_ref()
        .ok_or_else(|| Error::invalid_value("MedicationDispense has no quantity", quantity_path))?;
    let quantity_value = quantity
        .value
        .as_ref()
        .map(|value| value.to_string())
        .ok_or_else(|| Error::invalid_value("Quantity has no value", quantity_path))?;
    let quantity_unit_code = quantity
        .code
        .as_deref()
        .ok_or_else(|| Error::invalid_value("Quantity has no coded unit", quantity_path))?;

    let dosage = only_element(&dispense.dosage_instruction, "MedicationDispense.dosageInstruction")?;
    let supply_instructions = dosage.text.as_deref().ok_or_else(|| {
        Error::invalid_value(
            "Dosage instruction has no text",
            "MedicationDispense.dosageInstruction.text",
        )
    })?;

    let type_path = "MedicationDispense.type";
    let type_concept = dispense
        .type_
        .as_ref()
        .ok_or_else(|| Error::invalid_value("MedicationDispense has no type", type_path))?;
    let status_coding = coding_for_system(
        std::slice::from_ref(type_concept),
        systems::MEDICATION_DISPENSE_TYPE,
        type_path,
    )?;

    let prior_line_item_id = identifier_value(
        &dispense
            .authorizing_prescription
            .iter()
            .filter_map(|reference| reference.identifier.clone())
            .collect::<Vec<_>>(),
        systems::PRESCRIPTION_ORDER_ITEM,
        "MedicationDispense.authorizingPrescription.identifier",
    )?
    .to_owned();

    let (charge_payment, endorsements) = if claim {
        (Some(charge_paid(dispense)?), endorsement_codes(dispense))
    } else {
        (None, Vec::new())
    };

    Ok(SuppliedLineItem {
        id: id.to_owned(),
        medication_code: medication_code.to_owned(),
        medication_display: medication_coding.display.clone(),
        quantity_value,
        quantity_unit_code: quantity_unit_code.to_owned(),
        quantity_unit_display: quantity.unit.clone(),
        supply_instructions: supply_instructions.to_owned(),
        status: CodedValue {
            code: status_coding.code.clone().ok_or_else(|| {
                Error::invalid_value("Line item status coding has no code", type_path)
            })?,
            display: status_coding.display.clone(),
        },
        prior_line_item_id,
        charge_payment,
        endorsements,
    })
}

/// Claim line items state whether the prescription charge was paid.
fn charge_paid(dispense: &MedicationDispense) -> Result<bool, Error> {
    let path = "MedicationDispense.extension";
    let coding = extension_coding_for_system(dispense, systems::PRESCRIPTION_CHARGE)
        .ok_or_else(|| Error::too_few_values("Expected a prescription charge code", path))?;

    match coding.code.as_deref() {
        Some("paid-once") | Some("paid-twice") => Ok(true),
        Some("not-paid") => Ok(false),
        _ => Err(Error::invalid_value("Unsupported prescription charge code", path)),
    }
}

fn endorsement_codes(dispense: &MedicationDispense) -> Vec<String> {
    dispense
        .extension
        .iter()
        .filter_map(|extension| match &extension.value {
            Some(ExtensionValue::Coding(coding))
                if coding.system.as_deref() == Some(systems::DISPENSE_ENDORSEMENT) =>
            {
                coding.code.clone()
            }
            _ => None,
        })
        .collect()
}

fn extension_coding_for_system<'a>(
    dispense: &'a MedicationDispense,
    system: &str,
) -> Option<&'a Coding> {
    dispense.extension.iter().find_map(|extension| match &extension.value {
        Some(ExtensionValue::Coding(coding)) if coding.system.as_deref() == Some(system) => {
            Some(coding)
        }
        _ => None,
    })
}
