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

#[macro_use]
extern crate lazy_static;

pub mod bundle;
pub mod communication_request;
pub mod medication_dispense;
pub mod medication_request;
pub mod message_header;
pub mod misc;
pub mod operation_outcome;
pub mod organization;
pub mod parameters;
pub mod patient;
pub mod practitioner;
pub mod practitioner_role;
pub mod primitives;
pub mod provenance;
pub mod task;
pub mod types;

pub use bundle::{Bundle, Entry, Resource};
pub use communication_request::CommunicationRequest;
pub use medication_dispense::MedicationDispense;
pub use medication_request::MedicationRequest;
pub use message_header::MessageHeader;
pub use operation_outcome::OperationOutcome;
pub use organization::{HealthcareService, Organization};
pub use parameters::Parameters;
pub use patient::Patient;
pub use practitioner::Practitioner;
pub use practitioner_role::PractitionerRole;
pub use provenance::Provenance;
pub use task::Task;
pub use types::{
    Address, CodeableConcept, Coding, ContactPoint, Extension, ExtensionValue, HumanName,
    Identifier, Period, Quantity, Reference,
};
