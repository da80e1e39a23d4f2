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

use super::communication_request::CommunicationRequest;
use super::medication_dispense::MedicationDispense;
use super::medication_request::MedicationRequest;
use super::message_header::MessageHeader;
use super::operation_outcome::OperationOutcome;
use super::organization::{HealthcareService, Organization};
use super::parameters::Parameters;
use super::patient::Patient;
use super::practitioner::Practitioner;
use super::practitioner_role::PractitionerRole;
use super::primitives::{Id, Instant};
use super::provenance::Provenance;
use super::task::Task;
use super::types::Identifier;

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Bundle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<Identifier>,

    #[serde(rename = "type")]
    pub type_: Type,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Instant>,

    #[serde(rename = "entry", default, skip_serializing_if = "Vec::is_empty")]
    pub entries: Vec<Entry>,
}

#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct Meta {
    #[serde(rename = "lastUpdated", default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<Instant>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub profile: Vec<String>,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Entry {
    #[serde(rename = "fullUrl", default, skip_serializing_if = "Option::is_none")]
    pub full_url: Option<String>,

    pub resource: Resource,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub enum Type {
    #[serde(rename = "document")]
    Document,
    #[serde(rename = "message")]
    Message,
    #[serde(rename = "transaction")]
    Transaction,
    #[serde(rename = "collection")]
    Collection,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(tag = "resourceType")]
pub enum Resource {
    Bundle(Box<Bundle>),
    MessageHeader(Box<MessageHeader>),
    Patient(Box<Patient>),
    Practitioner(Box<Practitioner>),
    PractitionerRole(Box<PractitionerRole>),
    Organization(Box<Organization>),
    HealthcareService(Box<HealthcareService>),
    MedicationRequest(Box<MedicationRequest>),
    MedicationDispense(Box<MedicationDispense>),
    CommunicationRequest(Box<CommunicationRequest>),
    Provenance(Box<Provenance>),
    Task(Box<Task>),
    Parameters(Box<Parameters>),
    OperationOutcome(Box<OperationOutcome>),
}

impl Bundle {
    pub fn new(type_: Type) -> Self {
        Self {
            id: None,
            meta: None,
            identifier: None,
            type_,
            timestamp: None,
            entries: Vec::new(),
        }
    }
}

impl Entry {
    pub fn new(resource: Resource) -> Self {
        Self {
            full_url: None,
            resource,
        }
    }
}

impl Resource {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bundle(_) => "Bundle",
            Self::MessageHeader(_) => "MessageHeader",
            Self::Patient(_) => "Patient",
            Self::Practitioner(_) => "Practitioner",
            Self::PractitionerRole(_) => "PractitionerRole",
            Self::Organization(_) => "Organization",
            Self::HealthcareService(_) => "HealthcareService",
            Self::MedicationRequest(_) => "MedicationRequest",
            Self::MedicationDispense(_) => "MedicationDispense",
            Self::CommunicationRequest(_) => "CommunicationRequest",
            Self::Provenance(_) => "Provenance",
            Self::Task(_) => "Task",
            Self::Parameters(_) => "Parameters",
            Self::OperationOutcome(_) => "OperationOutcome",
        }
    }

    pub fn id(&self) -> Option<&Id> {
        match self {
            Self::Bundle(v) => v.id.as_ref(),
            Self::MessageHeader(v) => v.id.as_ref(),
            Self::Patient(v) => v.id.as_ref(),
            Self::Practitioner(v) => v.id.as_ref(),
            Self::PractitionerRole(v) => v.id.as_ref(),
            Self::Organization(v) => v.id.as_ref(),
            Self::HealthcareService(v) => v.id.as_ref(),
            Self::MedicationRequest(v) => v.id.as_ref(),
            Self::MedicationDispense(v) => v.id.as_ref(),
            Self::CommunicationRequest(v) => v.id.as_ref(),
            Self::Provenance(v) => v.id.as_ref(),
            Self::Task(v) => v.id.as_ref(),
            Self::Parameters(_) => None,
            Self::OperationOutcome(_) => None,
        }
    }
}
