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

//! Outbound translation: classify the inbound resource, run the matching
//! pipeline, and wrap the result in the transmission envelope.

pub mod demographics;
pub mod dispense;
pub mod organization;
pub mod practitioner;
pub mod prescribe;
pub mod signature;
pub mod task;

use chrono::Utc;
use uuid::Uuid;

use hl7v3::datatypes::Timestamp;
use hl7v3::messaging::{ControlActAuthor, Interaction, SendMessagePayload};
use hl7v3::withdraw::AgentPersonSds;
use hl7v3::{Element, ToElement};

use resources::bundle::{Bundle, Resource};
use resources::message_header::Event;
use resources::task::Status;
use resources::Task;

use crate::error::Error;
use crate::navigator::{
    check_unique_full_urls, coding_for_system, identifier_value, medication_requests,
    message_header, resolve_practitioner, resolve_practitioner_role,
};
use crate::settings::Settings;
use crate::translation::systems;

pub use signature::prepare_digest;

#[derive(Clone, PartialEq, Debug)]
pub struct TranslatedRequest {
    pub interaction: Interaction,
    pub message: Element,
}

impl TranslatedRequest {
    /// Wire bytes of the message; any previously hashed portion serializes
    /// exactly as it was hashed.
    pub fn to_bytes(&self) -> Vec<u8> {
        hl7v3::canonicalize(&self.message)
    }
}

/// Translates an inbound FHIR Bundle or Task into the matching HL7 V3
/// message.
pub fn translate_request(resource: &Resource, settings: &Settings) -> Result<TranslatedRequest, Error> {
    match resource {
        Resource::Bundle(bundle) => translate_bundle(bundle, settings),
        Resource::Task(task) => translate_task(task, settings),
        _ => Err(Error::UnsupportedMessageType),
    }
}

fn translate_bundle(bundle: &Bundle, settings: &Settings) -> Result<TranslatedRequest, Error> {
    check_unique_full_urls(bundle)?;

    let event = message_header(bundle)?
        .event()
        .ok_or(Error::UnsupportedMessageType)?;
    let message_id = bundle_message_id(bundle)?;

    match event {
        Event::PrescriptionOrder => {
            let subject = prescribe::convert_parent_prescription(bundle, true)?;
            envelope(
                Interaction::ParentPrescriptionUrgent,
                message_id,
                requester_author(bundle)?,
                settings,
                &subject,
            )
        }
        Event::PrescriptionOrderUpdate => {
            let subject = prescribe::convert_parent_prescription(bundle, false)?;
            envelope(
                Interaction::CancelRequest,
                message_id,
                requester_author(bundle)?,
                settings,
                &subject,
            )
        }
        Event::DispenseNotification => {
            let subject = dispense::convert_dispense_notification(bundle, &message_id)?;
            envelope(
                Interaction::DispenseNotification,
                Uuid::new_v4().to_string(),
                settings_author(settings),
                settings,
                &subject,
            )
        }
        Event::DispenseClaim => {
            let subject = dispense::convert_dispense_claim(bundle, &message_id)?;
            envelope(
                Interaction::DispenseClaimInformation,
                Uuid::new_v4().to_string(),
                settings_author(settings),
                settings,
                &subject,
            )
        }
        Event::PrescriptionOrderResponse => Err(Error::UnsupportedMessageType),
    }
}

fn translate_task(task: &Task, settings: &Settings) -> Result<TranslatedRequest, Error> {
    match task.status {
        Status::Rejected => {
            let subject = task::convert_dispense_proposal_return(task, settings)?;
            envelope(
                Interaction::DispenseProposalReturn,
                Uuid::new_v4().to_string(),
                settings_author(settings),
                settings,
                &subject,
            )
        }
        Status::InProgress => {
            let subject = task::convert_etp_withdraw(task, settings)?;
            envelope(
                Interaction::EtpWithdraw,
                Uuid::new_v4().to_string(),
                settings_author(settings),
                settings,
                &subject,
            )
        }
        _ => Err(Error::UnsupportedMessageType),
    }
}

fn envelope<T: ToElement>(
    interaction: Interaction,
    message_id: String,
    author: ControlActAuthor,
    settings: &Settings,
    subject: &T,
) -> Result<TranslatedRequest, Error> {
    let payload = SendMessagePayload {
        id: message_id,
        creation_time: Timestamp::seconds(Utc::now()),
        interaction,
        from_asid: settings.from_asid.clone(),
        to_asid: settings.to_asid.clone(),
        author: Some(author),
        subject,
    };

    Ok(TranslatedRequest {
        interaction,
        message: payload.to_element(),
    })
}

fn bundle_message_id(bundle: &Bundle) -> Result<String, Error> {
    let identifier = bundle
        .identifier
        .clone()
        .ok_or_else(|| Error::invalid_value("Bundle has no identifier", "Bundle.identifier"))?;

    identifier_value(&[identifier], systems::RFC4122, "Bundle.identifier").map(str::to_owned)
}

/// The authenticated author of a clinical submission is taken from the
/// requester graph: the user who signs is the user who submits.
fn requester_author(bundle: &Bundle) -> Result<ControlActAuthor, Error> {
    let requests = medication_requests(bundle);
    let first_request = *requests.first().ok_or_else(|| {
        Error::too_few_values(
            "Expected at least one MedicationRequest",
            "Bundle.entry.ofType(MedicationRequest)",
        )
    })?;
    let requester = first_request.requester.as_ref().ok_or_else(|| {
        Error::invalid_value(
            "MedicationRequest has no requester",
            "MedicationRequest.requester",
        )
    })?;

    let role = resolve_practitioner_role(bundle, requester, "MedicationRequest.requester")?;
    let practitioner = role.practitioner.as_ref().ok_or_else(|| {
        Error::invalid_value(
            "PractitionerRole has no practitioner",
            "PractitionerRole.practitioner",
        )
    })?;
    let practitioner =
        resolve_practitioner(bundle, practitioner, "PractitionerRole.practitioner")?;

    let user_id = identifier_value(
        &practitioner.identifier,
        systems::SDS_USER,
        "Practitioner.identifier",
    )?;
    let role_profile_id = identifier_value(
        &role.identifier,
        systems::SDS_ROLE_PROFILE,
        "PractitionerRole.identifier",
    )?;
    let job_role_code = coding_for_system(&role.code, systems::SDS_JOB_ROLE, "PractitionerRole.code")?
        .code
        .as_deref()
        .ok_or_else(|| {
            Error::invalid_value("Job role coding has no code", "PractitionerRole.code")
        })?;

    Ok(ControlActAuthor {
        agent: AgentPersonSds {
            role_profile_id: role_profile_id.to_owned(),
            user_id: user_id.to_owned(),
        },
        job_role_code: job_role_code.to_owned(),
    })
}

fn settings_author(settings: &Settings) -> ControlActAuthor {
    ControlActAuthor {
        agent: AgentPersonSds {
            role_profile_id: settings.user.role_profile_id.clone(),
            user_id: settings.user.user_id.clone(),
        },
        job_role_code: settings.user.job_role_code.clone(),
    }
}
