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

//! Builds the ParentPrescription for new prescriptions and cancellations.

use hl7v3::datatypes::Timestamp;
use hl7v3::prescription::{
    CareRecordElementCategory, DaysSupply, Interval, LineItem, LineItemQuantity, MedicationCode,
    ParentPrescription, Patient as Hl7Patient, PatientPerson, Performer, Prescription,
    RecordTarget, ResponsibleParty,
};

use resources::bundle::Bundle;
use resources::medication_request::MedicationRequest;
use resources::misc::{NhsNumber, ShortFormId};
use resources::types::{ExtensionValue, Identifier};
use resources::Patient;

use super::demographics::{convert_address, convert_gender, convert_name};
use super::practitioner::{convert_author, convert_responsible_party};
use crate::error::Error;
use crate::navigator::{
    coding_for_system, communication_requests, extension_by_url, extension_by_url_strict,
    identifier_value, medication_requests, only_element, only_element_or_null, patient,
};
use crate::translation::additional_instructions::{embed, AdditionalInstructions};
use crate::translation::{extensions, systems};

const TREATMENT_ACUTE: &str = "0001";
const TREATMENT_CONTINUOUS: &str = "0002";
const TREATMENT_REPEAT_DISPENSING: &str = "0003";

pub fn convert_parent_prescription(
    bundle: &Bundle,
    with_signature: bool,
) -> Result<ParentPrescription, Error> {
    let requests = medication_requests(bundle);
    let first_request = *requests.first().ok_or_else(|| {
        Error::too_few_values(
            "Expected at least one MedicationRequest",
            "Bundle.entry.ofType(MedicationRequest)",
        )
    })?;

    let prescription = convert_prescription(bundle, first_request, &requests, with_signature)?;
    let record_target = convert_record_target(patient(bundle)?)?;

    let line_item_ids = prescription
        .line_items
        .iter()
        .map(|item| item.id.clone())
        .collect();

    Ok(ParentPrescription {
        id: prescription.id.clone(),
        effective_time: prescription.author.time,
        record_target,
        prescription,
        care_record_element_category: CareRecordElementCategory {
            act_ids: line_item_ids,
        },
    })
}

fn convert_record_target(fhir_patient: &Patient) -> Result<RecordTarget, Error> {
    let nhs_number = identifier_value(
        &fhir_patient.identifier,
        systems::NHS_NUMBER,
        "Patient.identifier",
    )?;
    let nhs_number: NhsNumber = nhs_number.parse().map_err(|err| {
        Error::invalid_value(format!("Invalid NHS number: {}", err), "Patient.identifier")
    })?;

    let name = only_element(&fhir_patient.name, "Patient.name")
        .and_then(|name| convert_name(name, "Patient.name"))?;

    let address = only_element_or_null(&fhir_patient.address, "Patient.address")?
        .map(|address| convert_address(address, "Patient.address"))
        .transpose()?;

    Ok(RecordTarget {
        patient: Hl7Patient {
            nhs_number: nhs_number.to_string(),
            address,
            person: PatientPerson {
                name,
                gender_code: fhir_patient.gender.map(|g| convert_gender(g).to_owned()),
                birth_time: fhir_patient.birth_date.as_ref().map(|date| date.to_compact()),
            },
        },
    })
}

fn convert_prescription(
    bundle: &Bundle,
    first_request: &MedicationRequest,
    requests: &[&MedicationRequest],
    with_signature: bool,
) -> Result<Prescription, Error> {
    let (id, short_form_id) = prescription_ids(first_request)?;

    let treatment_type_code = treatment_type(first_request)?;
    let repeat_dispensing = treatment_type_code == TREATMENT_REPEAT_DISPENSING;

    let dispense_request = first_request.dispense_request.as_ref().ok_or_else(|| {
        Error::invalid_value(
            "MedicationRequest has no dispenseRequest",
            "MedicationRequest.dispenseRequest",
        )
    })?;

    let performer = dispense_request
        .performer
        .as_ref()
        .map(|reference| {
            let identifier = reference.identifier.as_ref().ok_or_else(|| {
                Error::invalid_value(
                    "Expected an identifier reference for the nominated performer",
                    "MedicationRequest.dispenseRequest.performer",
                )
            })?;
            let code = identifier.value.as_deref().ok_or_else(|| {
                Error::invalid_value(
                    "Performer identifier has no value",
                    "MedicationRequest.dispenseRequest.performer",
                )
            })?;

            Ok(Performer {
                organization_code: code.to_owned(),
            })
        })
        .transpose()?;

    let days_supply = convert_days_supply(first_request, repeat_dispensing)?;
    let (repeat_number, review_date) = convert_repeat_information(first_request, repeat_dispensing)?;

    let patient_info = patient_info_text(bundle)?;
    let line_items = requests
        .iter()
        .enumerate()
        .map(|(index, request)| {
            let embedded = if index == 0 { patient_info.clone() } else { None };
            convert_line_item(request, embedded, repeat_number.clone())
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Prescription {
        id,
        short_form_id,
        performer,
        author: convert_author(bundle, first_request, with_signature)?,
        responsible_party: ResponsibleParty {
            agent_person: convert_responsible_party(bundle, first_request)?,
        },
        days_supply,
        repeat_number,
        treatment_type_code: treatment_type_code.to_owned(),
        dispensing_site_preference: dispensing_site_preference(first_request)?,
        line_items,
        token_issued: false,
        prescription_type_code: prescription_type(first_request)?,
        review_date,
    })
}

/// Long-form UUID from the group identifier's PrescriptionId extension,
/// short form from the group identifier value. Both are validated.
fn prescription_ids(first_request: &MedicationRequest) -> Result<(String, String), Error> {
    let group_identifier = group_identifier(first_request)?;

    let extension = extension_by_url_strict(
        &group_identifier.extension,
        extensions::PRESCRIPTION_ID,
        "MedicationRequest.groupIdentifier.extension",
    )?;
    let long_form = match &extension.value {
        Some(ExtensionValue::Identifier(identifier)) => {
            identifier.value.as_deref().ok_or_else(|| {
                Error::invalid_value(
                    "PrescriptionId extension identifier has no value",
                    "MedicationRequest.groupIdentifier.extension",
                )
            })?
        }
        _ => {
            return Err(Error::invalid_value(
                "PrescriptionId extension must carry an identifier",
                "MedicationRequest.groupIdentifier.extension",
            ))
        }
    };

    let short_form = group_identifier.value.as_deref().ok_or_else(|| {
        Error::invalid_value(
            "Group identifier has no value",
            "MedicationRequest.groupIdentifier",
        )
    })?;
    let short_form: ShortFormId = short_form.parse().map_err(|err| {
        Error::invalid_value(
            format!("Invalid short-form prescription id: {}", err),
            "MedicationRequest.groupIdentifier",
        )
    })?;

    Ok((long_form.to_owned(), short_form.to_string()))
}

fn group_identifier(first_request: &MedicationRequest) -> Result<&Identifier, Error> {
    first_request.group_identifier.as_ref().ok_or_else(|| {
        Error::invalid_value(
            "MedicationRequest has no groupIdentifier",
            "MedicationRequest.groupIdentifier",
        )
    })
}

fn treatment_type(first_request: &MedicationRequest) -> Result<&'static str, Error> {
    let path = "MedicationRequest.courseOfTherapyType";
    let concept = first_request
        .course_of_therapy_type
        .as_ref()
        .ok_or_else(|| Error::invalid_value("MedicationRequest has no courseOfTherapyType", path))?;

    let coding = only_element(&concept.coding, path)?;

    match coding.code.as_deref() {
        Some("acute") => Ok(TREATMENT_ACUTE),
        Some("continuous") => Ok(TREATMENT_CONTINUOUS),
        Some("continuous-repeat-dispensing") => Ok(TREATMENT_REPEAT_DISPENSING),
        Some(other) => Err(Error::invalid_value(
            format!("Unhandled courseOfTherapyType '{}'", other),
            path,
        )),
        None => Err(Error::invalid_value("courseOfTherapyType coding has no code", path)),
    }
}

/// Supply durations are expressed in days; anything else is a translation
/// error, never silently converted.
fn convert_days_supply(
    first_request: &MedicationRequest,
    repeat_dispensing: bool,
) -> Result<Option<DaysSupply>, Error> {
    let dispense_request = match &first_request.dispense_request {
        Some(dispense_request) => dispense_request,
        None => return Ok(None),
    };

    let duration_path = "MedicationRequest.dispenseRequest.expectedSupplyDuration";
    let expected_use_days = dispense_request
        .expected_supply_duration
        .as_ref()
        .map(|duration| {
            if duration.code.as_deref() != Some("d") {
                return Err(Error::invalid_value(
                    "Expected supply duration must be specified in days",
                    duration_path,
                ));
            }
            duration
                .value
                .as_ref()
                .map(|value| value.to_string())
                .ok_or_else(|| Error::invalid_value("Supply duration has no value", duration_path))
        })
        .transpose()?;

    let validity = dispense_request.validity_period.as_ref();
    let low = validity
        .and_then(|period| period.start.as_ref())
        .map(|start| to_day_timestamp(start, "validityPeriod.start"))
        .transpose()?;
    let high = validity
        .and_then(|period| period.end.as_ref())
        .map(|end| to_day_timestamp(end, "validityPeriod.end"))
        .transpose()?;

    if repeat_dispensing {
        if validity.is_none() {
            return Err(Error::invalid_value(
                "Repeat dispensing prescriptions require a validity period",
                "MedicationRequest.dispenseRequest.validityPeriod",
            ));
        }
        if expected_use_days.is_none() {
            return Err(Error::invalid_value(
                "Repeat dispensing prescriptions require an expected supply duration",
                duration_path,
            ));
        }
    }

    if expected_use_days.is_none() && low.is_none() && high.is_none() {
        return Ok(None);
    }

    Ok(Some(DaysSupply {
        low,
        high,
        expected_use_days,
    }))
}

fn to_day_timestamp(value: &resources::primitives::DateTime, what: &str) -> Result<Timestamp, Error> {
    value
        .to_utc()
        .map(Timestamp::day)
        .map_err(|value| {
            Error::invalid_value(
                format!("Invalid dateTime '{}'", value),
                format!("MedicationRequest.dispenseRequest.{}", what),
            )
        })
}

/// Repeat dispensing prescriptions carry a repeat-information extension
/// with the allowed repeat count and the authorisation expiry (review)
/// date; its absence is a translation error, not a default.
fn convert_repeat_information(
    first_request: &MedicationRequest,
    repeat_dispensing: bool,
) -> Result<(Option<Interval>, Option<Timestamp>), Error> {
    let path = "MedicationRequest.extension";
    let extension = extension_by_url(&first_request.extension, extensions::REPEAT_INFORMATION);

    let extension = match (extension, repeat_dispensing) {
        (Some(extension), _) => extension,
        (None, false) => return Ok((None, None)),
        (None, true) => {
            return Err(Error::invalid_value(
                "Repeat dispensing prescriptions require the repeat information extension",
                path,
            ))
        }
    };

    let nested = match &extension.value {
        Some(ExtensionValue::Nested(nested)) => nested,
        _ => {
            return Err(Error::invalid_value(
                "Repeat information extension must carry sub-extensions",
                path,
            ))
        }
    };

    let mut repeat_number = None;
    let mut review_date = None;
    for sub_extension in nested {
        match (sub_extension.url.as_str(), &sub_extension.value) {
            ("numberOfRepeatPrescriptionsAllowed", Some(ExtensionValue::UnsignedInt(count))) => {
                repeat_number = Some(Interval {
                    low: 1,
                    high: *count as u32,
                });
            }
            ("authorisationExpiryDate", Some(ExtensionValue::DateTime(date))) => {
                review_date = Some(to_day_timestamp(date, "authorisationExpiryDate")?);
            }
            _ => (),
        }
    }

    if repeat_dispensing && repeat_number.is_none() {
        return Err(Error::invalid_value(
            "Repeat information extension has no numberOfRepeatPrescriptionsAllowed",
            path,
        ));
    }

    Ok((repeat_number, review_date))
}

fn dispensing_site_preference(first_request: &MedicationRequest) -> Result<String, Error> {
    let path = "MedicationRequest.dispenseRequest.extension";
    let dispense_request = first_request.dispense_request.as_ref().ok_or_else(|| {
        Error::invalid_value(
            "MedicationRequest has no dispenseRequest",
            "MedicationRequest.dispenseRequest",
        )
    })?;

    let extension =
        extension_by_url_strict(&dispense_request.extension, extensions::PERFORMER_SITE_TYPE, path)?;

    match &extension.value {
        Some(ExtensionValue::Coding(coding)) => coding
            .code
            .clone()
            .ok_or_else(|| Error::invalid_value("Performer site type coding has no code", path)),
        _ => Err(Error::invalid_value(
            "Performer site type extension must carry a coding",
            path,
        )),
    }
}

fn prescription_type(first_request: &MedicationRequest) -> Result<String, Error> {
    let path = "MedicationRequest.extension";
    let extension =
        extension_by_url_strict(&first_request.extension, extensions::PRESCRIPTION_TYPE, path)?;

    match &extension.value {
        Some(ExtensionValue::Coding(coding)) => coding
            .code
            .clone()
            .ok_or_else(|| Error::invalid_value("Prescription type coding has no code", path)),
        _ => Err(Error::invalid_value(
            "Prescription type extension must carry a coding",
            path,
        )),
    }
}

/// Patient-info texts from the bundle's communication requests, embedded
/// into the first line item only.
fn patient_info_text(bundle: &Bundle) -> Result<Option<String>, Error> {
    let requests = communication_requests(bundle);
    let request = match only_element_or_null(&requests, "Bundle.entry.ofType(CommunicationRequest)")? {
        Some(request) => *request,
        None => return Ok(None),
    };

    let patient_info: Vec<String> = request
        .payload
        .iter()
        .filter_map(|payload| match payload {
            resources::communication_request::Payload::String(text) => Some(text.clone()),
            resources::communication_request::Payload::Reference(_) => None,
        })
        .collect();

    if patient_info.is_empty() {
        return Ok(None);
    }

    Ok(Some(embed(&AdditionalInstructions {
        patient_info,
        ..Default::default()
    })))
}

fn convert_line_item(
    request: &MedicationRequest,
    embedded_patient_info: Option<String>,
    repeat_number: Option<Interval>,
) -> Result<LineItem, Error> {
    let id = identifier_value(
        &request.identifier,
        systems::PRESCRIPTION_ORDER_ITEM,
        "MedicationRequest.identifier",
    )?;

    let medication_path = "MedicationRequest.medicationCodeableConcept";
    let medication = request
        .medication_codeable_concept
        .as_ref()
        .ok_or_else(|| Error::invalid_value("MedicationRequest has no medication", medication_path))?;
    let coding = coding_for_system(
        std::slice::from_ref(medication),
        systems::SNOMED,
        medication_path,
    )?;
    let medication_code = coding.code.as_deref().ok_or_else(|| {
        Error::invalid_value("Medication coding has no code", medication_path)
    })?;

    let quantity_path = "MedicationRequest.dispenseRequest.quantity";
    let quantity = request
        .dispense_request
        .as_ref()
        .and_then(|dispense_request| dispense_request.quantity.as_ref())
        .ok_or_else(|| Error::invalid_value("MedicationRequest has no quantity", quantity_path))?;
    let quantity_value = quantity
        .value
        .as_ref()
        .map(|value| value.to_string())
        .ok_or_else(|| Error::invalid_value("Quantity has no value", quantity_path))?;
    let quantity_unit_code = quantity
        .code
        .as_deref()
        .ok_or_else(|| Error::invalid_value("Quantity has no coded unit", quantity_path))?;

    let dosage = only_element(&request.dosage_instruction, "MedicationRequest.dosageInstruction")?;
    let dosage_text = dosage.text.as_deref().ok_or_else(|| {
        Error::invalid_value(
            "Dosage instruction has no text",
            "MedicationRequest.dosageInstruction.text",
        )
    })?;

    let additional_instructions = match (embedded_patient_info, &dosage.patient_instruction) {
        (Some(embedded), Some(instruction)) => Some(format!("{}{}", embedded, instruction)),
        (Some(embedded), None) => Some(embedded),
        (None, Some(instruction)) => Some(instruction.clone()),
        (None, None) => None,
    };

    Ok(LineItem {
        id: id.to_owned(),
        medication: MedicationCode {
            code: medication_code.to_owned(),
            display: coding.display.clone(),
        },
        quantity: LineItemQuantity {
            value: quantity_value,
            unit_code: quantity_unit_code.to_owned(),
            unit_display: quantity.unit.clone(),
        },
        dosage_instructions: dosage_text.to_owned(),
        additional_instructions,
        repeat_number,
    })
}
