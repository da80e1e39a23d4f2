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

//! Task driven reversals: a rejected task returns the prescription to the
//! exchange, an in-progress task withdraws a submitted dispense
//! notification.

use hl7v3::datatypes::Timestamp;
use hl7v3::withdraw::{AgentPersonSds, DispenseProposalReturn, EtpWithdraw, ReturnReason};

use resources::misc::ShortFormId;
use resources::types::{CodeableConcept, Identifier, Reference};
use resources::Task;

use crate::error::Error;
use crate::navigator::{coding_for_system, identifier_value};
use crate::settings::Settings;
use crate::translation::systems;

pub fn convert_dispense_proposal_return(
    task: &Task,
    settings: &Settings,
) -> Result<DispenseProposalReturn, Error> {
    let reason = reason_coding(
        task.reason_code.as_ref(),
        systems::RETURN_REASON,
        "Task.reasonCode",
    )?;

    Ok(DispenseProposalReturn {
        id: task_message_id(task)?,
        effective_time: authored_on(task)?,
        author: author(settings),
        prescription_short_form_id: short_form_id(task)?,
        reason,
        prior_release_response_id: focus_identifier(task)?,
    })
}

pub fn convert_etp_withdraw(task: &Task, settings: &Settings) -> Result<EtpWithdraw, Error> {
    let reason = reason_coding(
        task.status_reason.as_ref(),
        systems::WITHDRAW_REASON,
        "Task.statusReason",
    )?;

    Ok(EtpWithdraw {
        id: task_message_id(task)?,
        effective_time: authored_on(task)?,
        patient_nhs_number: patient_nhs_number(task)?,
        author: author(settings),
        prescription_short_form_id: short_form_id(task)?,
        reason,
        dispense_notification_id: focus_identifier(task)?,
    })
}

fn author(settings: &Settings) -> AgentPersonSds {
    AgentPersonSds {
        role_profile_id: settings.user.role_profile_id.clone(),
        user_id: settings.user.user_id.clone(),
    }
}

fn task_message_id(task: &Task) -> Result<String, Error> {
    identifier_value(&task.identifier, systems::RFC4122, "Task.identifier").map(str::to_owned)
}

fn authored_on(task: &Task) -> Result<Timestamp, Error> {
    let path = "Task.authoredOn";
    let authored_on = task
        .authored_on
        .as_ref()
        .ok_or_else(|| Error::invalid_value("Task has no authoredOn", path))?;

    authored_on
        .to_utc()
        .map(Timestamp::seconds)
        .map_err(|value| Error::invalid_value(format!("Invalid dateTime '{}'", value), path))
}

fn short_form_id(task: &Task) -> Result<String, Error> {
    let path = "Task.groupIdentifier";
    let group_identifier = task
        .group_identifier
        .as_ref()
        .ok_or_else(|| Error::invalid_value("Task has no groupIdentifier", path))?;

    let value = identifier_with_system(group_identifier, systems::PRESCRIPTION_ORDER_NUMBER, path)?;
    let short_form: ShortFormId = value.parse().map_err(|err| {
        Error::invalid_value(format!("Invalid short-form prescription id: {}", err), path)
    })?;

    Ok(short_form.to_string())
}

fn patient_nhs_number(task: &Task) -> Result<String, Error> {
    let path = "Task.for.identifier";
    let for_ = task
        .for_
        .as_ref()
        .ok_or_else(|| Error::invalid_value("Task has no patient", "Task.for"))?;
    let identifier = identifier_reference(for_, "Task.for")?;

    identifier_with_system(identifier, systems::NHS_NUMBER, path)
}

/// The referenced message id: the prior release response for returns, the
/// dispense notification for withdrawals.
fn focus_identifier(task: &Task) -> Result<String, Error> {
    let path = "Task.focus.identifier";
    let focus = task
        .focus
        .as_ref()
        .ok_or_else(|| Error::invalid_value("Task has no focus", "Task.focus"))?;
    let identifier = identifier_reference(focus, "Task.focus")?;

    identifier_with_system(identifier, systems::RFC4122, path)
}

/// Task references use the identifier form; a URN here is a structural
/// contract violation.
fn identifier_reference<'a>(reference: &'a Reference, path: &str) -> Result<&'a Identifier, Error> {
    reference.identifier.as_ref().ok_or_else(|| {
        Error::invalid_value("Expected an identifier reference, got a resource reference", path)
    })
}

fn identifier_with_system(
    identifier: &Identifier,
    system: &str,
    path: &str,
) -> Result<String, Error> {
    if identifier.system.as_deref() != Some(system) {
        return Err(Error::invalid_value(
            format!("Expected identifier with system '{}'", system),
            path,
        ));
    }

    identifier
        .value
        .clone()
        .ok_or_else(|| Error::invalid_value("Identifier has no value", path))
}

fn reason_coding(
    concept: Option<&CodeableConcept>,
    system: &str,
    path: &str,
) -> Result<ReturnReason, Error> {
    let concept =
        concept.ok_or_else(|| Error::invalid_value("Task has no reason code", path))?;

    let coding = coding_for_system(std::slice::from_ref(concept), system, path)?;

    Ok(ReturnReason {
        code: coding
            .code
            .clone()
            .ok_or_else(|| Error::invalid_value("Reason coding has no code", path))?,
        display: coding.display.clone(),
    })
}
