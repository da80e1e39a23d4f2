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

//! The clinical author chain: requester → PractitionerRole →
//! Practitioner/Organization[/HealthcareService], resolved explicitly and
//! failing loudly on ambiguity.

use chrono::Utc;

use hl7v3::datatypes::{Telecom, Timestamp};
use hl7v3::prescription::{
    AgentPerson, AgentPersonPerson, PersonId, PrescriptionAuthor, SignatureText,
};

use resources::bundle::Bundle;
use resources::medication_request::MedicationRequest;
use resources::provenance::Signature;
use resources::types::{ExtensionValue, Reference};
use resources::{Practitioner, PractitionerRole};

use super::demographics::{convert_name, convert_telecom};
use super::organization::convert_organization_and_provider_license;
use crate::error::Error;
use crate::navigator::{
    coding_for_system, extension_by_url, identifier_value, identifier_value_or_null,
    only_element, only_element_or_null, provenances, resolve_healthcare_service,
    resolve_organization, resolve_practitioner, resolve_practitioner_role,
};
use crate::translation::{extensions, systems};

pub fn convert_author(
    bundle: &Bundle,
    medication_request: &MedicationRequest,
    with_signature: bool,
) -> Result<PrescriptionAuthor, Error> {
    let requester = requester(medication_request)?;

    let signature = if with_signature {
        find_requester_signature(bundle, requester)?
    } else {
        None
    };

    let (time, signature_text) = match signature {
        Some(signature) => {
            let when = signature.when.to_utc().map_err(|value| {
                Error::invalid_value(
                    format!("Invalid signature time '{}'", value),
                    "Provenance.signature.when",
                )
            })?;

            let data = signature.data.as_deref().ok_or_else(|| {
                Error::invalid_value("Signature has no data", "Provenance.signature.data")
            })?;
            let decoded = base64::decode(data).map_err(|_| invalid_signature_format())?;
            let decoded = String::from_utf8(decoded).map_err(|_| invalid_signature_format())?;
            let parsed = hl7v3::parse(&decoded).map_err(|_| invalid_signature_format())?;

            (Timestamp::minutes(when), SignatureText::Signed(parsed))
        }
        None => (
            Timestamp::minutes(Utc::now()),
            SignatureText::NotApplicable,
        ),
    };

    let role = resolve_practitioner_role(bundle, requester, "MedicationRequest.requester")?;

    Ok(PrescriptionAuthor {
        time,
        signature_text,
        agent_person: convert_practitioner_role(bundle, role, PersonIdStrategy::Author)?,
    })
}

pub fn convert_responsible_party(
    bundle: &Bundle,
    medication_request: &MedicationRequest,
) -> Result<AgentPerson, Error> {
    let responsible_party_extension = extension_by_url(
        &medication_request.extension,
        extensions::RESPONSIBLE_PRACTITIONER,
    );

    let reference = match responsible_party_extension {
        Some(extension) => match &extension.value {
            Some(ExtensionValue::Reference(reference)) => reference,
            _ => {
                return Err(Error::invalid_value(
                    "Responsible practitioner extension must carry a reference",
                    "MedicationRequest.extension",
                ))
            }
        },
        None => requester(medication_request)?,
    };

    let role = resolve_practitioner_role(bundle, reference, "MedicationRequest.requester")?;

    convert_practitioner_role(bundle, role, PersonIdStrategy::ResponsibleParty)
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum PersonIdStrategy {
    /// Exactly one professional code.
    Author,
    /// Spurious and DIN prescribing codes take precedence over the
    /// professional code.
    ResponsibleParty,
    /// Dispensing staff are identified by their SDS user id.
    Dispenser,
}

pub fn convert_practitioner_role(
    bundle: &Bundle,
    role: &PractitionerRole,
    strategy: PersonIdStrategy,
) -> Result<AgentPerson, Error> {
    let practitioner_reference = role.practitioner.as_ref().ok_or_else(|| {
        Error::invalid_value(
            "PractitionerRole has no practitioner",
            "PractitionerRole.practitioner",
        )
    })?;
    let practitioner =
        resolve_practitioner(bundle, practitioner_reference, "PractitionerRole.practitioner")?;

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

    let organization_reference = role.organization.as_ref().ok_or_else(|| {
        Error::invalid_value(
            "PractitionerRole has no organization",
            "PractitionerRole.organization",
        )
    })?;
    let organization =
        resolve_organization(bundle, organization_reference, "PractitionerRole.organization")?;

    let healthcare_service =
        only_element_or_null(&role.healthcare_service, "PractitionerRole.healthcareService")?
            .map(|reference| {
                resolve_healthcare_service(bundle, reference, "PractitionerRole.healthcareService")
            })
            .transpose()?;

    let person_id = match strategy {
        PersonIdStrategy::Author => author_person_id(practitioner)?,
        PersonIdStrategy::ResponsibleParty => responsible_party_person_id(role, practitioner)?,
        PersonIdStrategy::Dispenser => PersonId::SdsUser(
            identifier_value(
                &practitioner.identifier,
                systems::SDS_USER,
                "Practitioner.identifier",
            )?
            .to_owned(),
        ),
    };

    let name = only_element_or_null(&practitioner.name, "Practitioner.name")?
        .map(|name| convert_name(name, "Practitioner.name"))
        .transpose()?;

    Ok(AgentPerson {
        role_profile_id: role_profile_id.to_owned(),
        job_role_code: job_role_code.to_owned(),
        telecom: agent_person_telecom(role, practitioner)?,
        person: AgentPersonPerson {
            id: person_id,
            name,
        },
        organization: convert_organization_and_provider_license(
            bundle,
            organization,
            healthcare_service,
        )?,
    })
}

/// Role telecom wins over practitioner telecom.
fn agent_person_telecom(
    role: &PractitionerRole,
    practitioner: &Practitioner,
) -> Result<Vec<Telecom>, Error> {
    if !role.telecom.is_empty() {
        role.telecom
            .iter()
            .map(|t| convert_telecom(t, "PractitionerRole.telecom"))
            .collect()
    } else {
        practitioner
            .telecom
            .iter()
            .map(|t| convert_telecom(t, "Practitioner.telecom"))
            .collect()
    }
}

const PROFESSIONAL_CODE_SYSTEMS: &[&str] = &[
    systems::GMC_NUMBER,
    systems::GMP_NUMBER,
    systems::NMC_NUMBER,
    systems::GPHC_NUMBER,
    systems::HCPC_NUMBER,
    systems::PROFESSIONAL_CODE,
];

/// Exactly one of GMC|GMP|NMC|GPhC|HCPC|professional-code.
fn author_person_id(practitioner: &Practitioner) -> Result<PersonId, Error> {
    let mut codes = Vec::new();
    for system in PROFESSIONAL_CODE_SYSTEMS {
        if let Some(value) =
            identifier_value_or_null(&practitioner.identifier, system, "Practitioner.identifier")?
        {
            codes.push(value);
        }
    }

    let code = only_element(&codes, "Practitioner.identifier").map_err(|_| {
        let message = format!(
            "Expected exactly one professional code. One of GMC|GMP|NMC|GPhC|HCPC|unknown, got {}",
            codes.len()
        );
        if codes.len() > 1 {
            Error::too_many_values(message, "Practitioner.identifier")
        } else {
            Error::too_few_values(message, "Practitioner.identifier")
        }
    })?;

    Ok(PersonId::Professional((*code).to_owned()))
}

fn responsible_party_person_id(
    role: &PractitionerRole,
    practitioner: &Practitioner,
) -> Result<PersonId, Error> {
    if let Some(spurious) = identifier_value_or_null(
        &role.identifier,
        systems::SPURIOUS_CODE,
        "PractitionerRole.identifier",
    )? {
        return Ok(PersonId::Prescribing(spurious.to_owned()));
    }

    if let Some(din) = identifier_value_or_null(
        &practitioner.identifier,
        systems::DIN_NUMBER,
        "Practitioner.identifier",
    )? {
        return Ok(PersonId::Prescribing(din.to_owned()));
    }

    author_person_id(practitioner)
}

fn requester(medication_request: &MedicationRequest) -> Result<&Reference, Error> {
    medication_request.requester.as_ref().ok_or_else(|| {
        Error::invalid_value(
            "MedicationRequest has no requester",
            "MedicationRequest.requester",
        )
    })
}

/// The requester's signature from the bundle's Provenance resources, if
/// one was supplied.
fn find_requester_signature<'a>(
    bundle: &'a Bundle,
    requester: &Reference,
) -> Result<Option<&'a Signature>, Error> {
    let signatures: Vec<&Signature> = provenances(bundle)
        .into_iter()
        .flat_map(|provenance| provenance.signature.iter())
        .filter(|signature| signature.who.reference == requester.reference)
        .collect();

    only_element_or_null(&signatures, "Provenance.signature").map(|s| s.copied())
}

fn invalid_signature_format() -> Error {
    Error::invalid_value("Invalid signature format.", "Provenance.signature.data")
}
