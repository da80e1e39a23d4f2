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

use serde::{Deserialize, Serialize};

use super::primitives::{DateTime, Id};
use super::types::{
    CodeableConcept, Extension, Identifier, Period, Quantity, Reference,
};

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct MedicationRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<Extension>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Identifier>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,

    #[serde(
        rename = "medicationCodeableConcept",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub medication_codeable_concept: Option<CodeableConcept>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<Reference>,

    #[serde(rename = "authoredOn", default, skip_serializing_if = "Option::is_none")]
    pub authored_on: Option<DateTime>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requester: Option<Reference>,

    #[serde(
        rename = "groupIdentifier",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub group_identifier: Option<Identifier>,

    #[serde(
        rename = "courseOfTherapyType",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub course_of_therapy_type: Option<CodeableConcept>,

    #[serde(
        rename = "dosageInstruction",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub dosage_instruction: Vec<Dosage>,

    #[serde(
        rename = "dispenseRequest",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub dispense_request: Option<DispenseRequest>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub substitution: Option<Substitution>,
}

#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct Dosage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(
        rename = "patientInstruction",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub patient_instruction: Option<String>,
}

#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct DispenseRequest {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<Extension>,

    #[serde(
        rename = "validityPeriod",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub validity_period: Option<Period>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<Quantity>,

    #[serde(
        rename = "expectedSupplyDuration",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub expected_supply_duration: Option<Quantity>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performer: Option<Reference>,

    #[serde(
        rename = "numberOfRepeatsAllowed",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub number_of_repeats_allowed: Option<u32>,
}

#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct Substitution {
    #[serde(rename = "allowedBoolean")]
    pub allowed_boolean: bool,
}
