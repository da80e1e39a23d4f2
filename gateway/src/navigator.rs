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

//! Lookups over a bundle's resource graph. Everything here is a pure
//! function, and every lookup that expects one value fails loudly on zero
//! or many: silently propagated absent values through deep optional chains
//! are precisely the mapping bugs this module exists to prevent.

use std::collections::HashSet;

use resources::bundle::{Bundle, Resource};
use resources::medication_dispense::MedicationDispense;
use resources::medication_request::MedicationRequest;
use resources::message_header::MessageHeader;
use resources::types::{CodeableConcept, Coding, Extension, Identifier, Reference};
use resources::{
    CommunicationRequest, HealthcareService, Organization, Patient, Practitioner,
    PractitionerRole, Provenance,
};

use super::error::Error;

/// Full-URLs must be unique within a bundle; a duplicate is a translation
/// error, not something to silently tolerate.
pub fn check_unique_full_urls(bundle: &Bundle) -> Result<(), Error> {
    let mut seen = HashSet::new();
    for entry in &bundle.entries {
        if let Some(url) = &entry.full_url {
            if !seen.insert(url.as_str()) {
                return Err(Error::invalid_value(
                    format!("Duplicate fullUrl '{}'", url),
                    "Bundle.entry.fullUrl",
                ));
            }
        }
    }

    Ok(())
}

macro_rules! resources_of_type {
    ($name:ident, $variant:ident, $type:ty) => {
        pub fn $name(bundle: &Bundle) -> Vec<&$type> {
            bundle
                .entries
                .iter()
                .filter_map(|entry| match &entry.resource {
                    Resource::$variant(resource) => Some(&**resource),
                    _ => None,
                })
                .collect()
        }
    };
}

resources_of_type!(medication_requests, MedicationRequest, MedicationRequest);
resources_of_type!(medication_dispenses, MedicationDispense, MedicationDispense);
resources_of_type!(communication_requests, CommunicationRequest, CommunicationRequest);
resources_of_type!(provenances, Provenance, Provenance);
resources_of_type!(patients, Patient, Patient);
resources_of_type!(message_headers, MessageHeader, MessageHeader);

/// Exactly one MessageHeader per inbound bundle.
pub fn message_header(bundle: &Bundle) -> Result<&MessageHeader, Error> {
    only_element(&message_headers(bundle), "Bundle.entry.ofType(MessageHeader)").map(|h| *h)
}

pub fn patient(bundle: &Bundle) -> Result<&Patient, Error> {
    only_element(&patients(bundle), "Bundle.entry.ofType(Patient)").map(|p| *p)
}

pub fn patient_or_null(bundle: &Bundle) -> Result<Option<&Patient>, Error> {
    only_element_or_null(&patients(bundle), "Bundle.entry.ofType(Patient)").map(|p| p.copied())
}

/// Resolves a URN-form reference to its bundle entry. The identifier form
/// is a structural contract violation here.
pub fn resolve_reference<'a>(
    bundle: &'a Bundle,
    reference: &Reference,
    path: &str,
) -> Result<&'a Resource, Error> {
    let target = reference.reference.as_deref().ok_or_else(|| {
        Error::invalid_value("Expected a resource reference, got an identifier reference", path)
    })?;

    let matches: Vec<_> = bundle
        .entries
        .iter()
        .filter(|entry| entry.full_url.as_deref() == Some(target))
        .map(|entry| &entry.resource)
        .collect();

    match matches.len() {
        0 => Err(Error::too_few_values(
            format!("No bundle entry found with fullUrl '{}'", target),
            path,
        )),
        1 => Ok(matches[0]),
        _ => Err(Error::too_many_values(
            format!("Multiple bundle entries found with fullUrl '{}'", target),
            path,
        )),
    }
}

pub fn resolve_practitioner_role<'a>(
    bundle: &'a Bundle,
    reference: &Reference,
    path: &str,
) -> Result<&'a PractitionerRole, Error> {
    match resolve_reference(bundle, reference, path)? {
        Resource::PractitionerRole(role) => Ok(role),
        other => Err(wrong_type(other, "PractitionerRole", path)),
    }
}

pub fn resolve_practitioner<'a>(
    bundle: &'a Bundle,
    reference: &Reference,
    path: &str,
) -> Result<&'a Practitioner, Error> {
    match resolve_reference(bundle, reference, path)? {
        Resource::Practitioner(practitioner) => Ok(practitioner),
        other => Err(wrong_type(other, "Practitioner", path)),
    }
}

pub fn resolve_organization<'a>(
    bundle: &'a Bundle,
    reference: &Reference,
    path: &str,
) -> Result<&'a Organization, Error> {
    match resolve_reference(bundle, reference, path)? {
        Resource::Organization(organization) => Ok(organization),
        other => Err(wrong_type(other, "Organization", path)),
    }
}

pub fn resolve_healthcare_service<'a>(
    bundle: &'a Bundle,
    reference: &Reference,
    path: &str,
) -> Result<&'a HealthcareService, Error> {
    match resolve_reference(bundle, reference, path)? {
        Resource::HealthcareService(service) => Ok(service),
        other => Err(wrong_type(other, "HealthcareService", path)),
    }
}

fn wrong_type(resource: &Resource, expected: &str, path: &str) -> Error {
    Error::invalid_value(
        format!(
            "Expected reference to a {}, got a {}",
            expected,
            resource.type_name()
        ),
        path,
    )
}

pub fn identifier_value<'a>(
    identifiers: &'a [Identifier],
    system: &str,
    path: &str,
) -> Result<&'a str, Error> {
    let matches: Vec<_> = identifiers
        .iter()
        .filter(|identifier| identifier.system.as_deref() == Some(system))
        .filter_map(|identifier| identifier.value.as_deref())
        .collect();

    exactly_one(matches, &format!("identifier with system '{}'", system), path)
}

pub fn identifier_value_or_null<'a>(
    identifiers: &'a [Identifier],
    system: &str,
    path: &str,
) -> Result<Option<&'a str>, Error> {
    let matches: Vec<_> = identifiers
        .iter()
        .filter(|identifier| identifier.system.as_deref() == Some(system))
        .filter_map(|identifier| identifier.value.as_deref())
        .collect();

    at_most_one(matches, &format!("identifier with system '{}'", system), path)
}

pub fn coding_for_system<'a>(
    concepts: &'a [CodeableConcept],
    system: &str,
    path: &str,
) -> Result<&'a Coding, Error> {
    let matches: Vec<_> = codings_for_system(concepts, system);

    exactly_one(matches, &format!("coding with system '{}'", system), path)
}

pub fn coding_for_system_or_null<'a>(
    concepts: &'a [CodeableConcept],
    system: &str,
    path: &str,
) -> Result<Option<&'a Coding>, Error> {
    let matches: Vec<_> = codings_for_system(concepts, system);

    at_most_one(matches, &format!("coding with system '{}'", system), path)
}

fn codings_for_system<'a>(concepts: &'a [CodeableConcept], system: &str) -> Vec<&'a Coding> {
    concepts
        .iter()
        .flat_map(|concept| concept.coding.iter())
        .filter(|coding| coding.system.as_deref() == Some(system))
        .collect()
}

/// First extension with the given URL, if any.
pub fn extension_by_url<'a>(extensions: &'a [Extension], url: &str) -> Option<&'a Extension> {
    extensions.iter().find(|extension| extension.url == url)
}

/// Strict variant: the extension must appear exactly once.
pub fn extension_by_url_strict<'a>(
    extensions: &'a [Extension],
    url: &str,
    path: &str,
) -> Result<&'a Extension, Error> {
    let matches: Vec<_> = extensions
        .iter()
        .filter(|extension| extension.url == url)
        .collect();

    exactly_one(matches, &format!("extension with url '{}'", url), path)
}

pub fn only_element<'a, T>(values: &'a [T], path: &str) -> Result<&'a T, Error> {
    match values.len() {
        0 => Err(Error::too_few_values("Expected exactly one value, got none", path)),
        1 => Ok(&values[0]),
        _ => Err(Error::too_many_values(
            format!("Expected exactly one value, got {}", values.len()),
            path,
        )),
    }
}

pub fn only_element_or_null<'a, T>(values: &'a [T], path: &str) -> Result<Option<&'a T>, Error> {
    match values.len() {
        0 => Ok(None),
        1 => Ok(Some(&values[0])),
        _ => Err(Error::too_many_values(
            format!("Expected at most one value, got {}", values.len()),
            path,
        )),
    }
}

fn exactly_one<T>(mut matches: Vec<T>, description: &str, path: &str) -> Result<T, Error> {
    match matches.len() {
        0 => Err(Error::too_few_values(
            format!("Expected exactly one {}, got none", description),
            path,
        )),
        1 => Ok(matches.remove(0)),
        n => Err(Error::too_many_values(
            format!("Expected exactly one {}, got {}", description, n),
            path,
        )),
    }
}

fn at_most_one<T>(mut matches: Vec<T>, description: &str, path: &str) -> Result<Option<T>, Error> {
    match matches.len() {
        0 => Ok(None),
        1 => Ok(Some(matches.remove(0))),
        n => Err(Error::too_many_values(
            format!("Expected at most one {}, got {}", description, n),
            path,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use resources::bundle::{Entry, Type};
    use resources::types::Reference;
    use resources::Practitioner;

    fn bundle_with(entries: Vec<(Option<&str>, Resource)>) -> Bundle {
        let mut bundle = Bundle::new(Type::Message);
        bundle.entries = entries
            .into_iter()
            .map(|(url, resource)| {
                let mut entry = Entry::new(resource);
                entry.full_url = url.map(str::to_owned);
                entry
            })
            .collect();

        bundle
    }

    fn practitioner() -> Resource {
        Resource::Practitioner(Box::new(Practitioner::default()))
    }

    #[test]
    fn resolving_zero_matches_is_too_few() {
        let bundle = bundle_with(vec![(Some("urn:uuid:a"), practitioner())]);

        let actual = resolve_reference(&bundle, &Reference::new("urn:uuid:b"), "path");

        assert!(matches!(actual, Err(Error::TooFewValues { .. })));
    }

    #[test]
    fn resolving_duplicate_matches_is_too_many() {
        let bundle = bundle_with(vec![
            (Some("urn:uuid:a"), practitioner()),
            (Some("urn:uuid:a"), practitioner()),
        ]);

        let actual = resolve_reference(&bundle, &Reference::new("urn:uuid:a"), "path");

        assert!(matches!(actual, Err(Error::TooManyValues { .. })));
    }

    #[test]
    fn identifier_reference_is_rejected_by_urn_resolver() {
        let bundle = bundle_with(vec![]);
        let reference = Reference::from_identifier(Identifier {
            system: Some("https://fhir.nhs.uk/Id/ods-organization-code".into()),
            value: Some("A83008".into()),
            ..Default::default()
        });

        let actual = resolve_reference(&bundle, &reference, "path");

        assert!(matches!(actual, Err(Error::InvalidValue { .. })));
    }

    #[test]
    fn duplicate_full_urls_are_a_translation_error() {
        let bundle = bundle_with(vec![
            (Some("urn:uuid:a"), practitioner()),
            (Some("urn:uuid:a"), practitioner()),
        ]);

        assert!(check_unique_full_urls(&bundle).is_err());
    }

    #[test]
    fn strict_extension_lookup_rejects_duplicates() {
        let extensions = vec![
            Extension { url: "x".into(), value: None },
            Extension { url: "x".into(), value: None },
        ];

        let actual = extension_by_url_strict(&extensions, "x", "path");

        assert!(matches!(actual, Err(Error::TooManyValues { .. })));
    }
}
