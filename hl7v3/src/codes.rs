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

//! Identifier and code element builders with their fixed OID roots.

use super::element::Element;

pub mod oid {
    pub const MESSAGE_TYPE: &str = "2.16.840.1.113883.2.1.3.2.4.12";
    pub const SNOMED: &str = "2.16.840.1.113883.2.1.3.2.4.15";
    pub const SHORT_FORM_PRESCRIPTION_ID: &str = "2.16.840.1.113883.2.1.3.2.4.18.8";
    pub const PRESCRIPTION_ANNOTATION: &str = "2.16.840.1.113883.2.1.3.2.4.17.30";
    pub const NHS_NUMBER: &str = "2.16.840.1.113883.2.1.4.1";
    pub const SEX: &str = "2.16.840.1.113883.2.1.3.2.4.16.25";
    pub const SDS_USER_ID: &str = "1.2.826.0.1285.0.2.0.65";
    pub const SDS_ROLE_PROFILE_ID: &str = "1.2.826.0.1285.0.2.0.67";
    pub const SDS_JOB_ROLE: &str = "1.2.826.0.1285.0.2.1.104";
    pub const SDS_ORGANIZATION: &str = "1.2.826.0.1285.0.1.10";
    pub const ACCREDITED_SYSTEM: &str = "1.2.826.0.1285.0.2.0.107";
    pub const PROFESSIONAL_CODE: &str = "1.2.826.0.1285.0.2.1.54";
    pub const PRESCRIBING_CODE: &str = "1.2.826.0.1285.0.2.0.216";
}

/// `<{name} root="{uuid}"/>`: long form identifiers are plain UUID roots.
pub fn global_identifier(name: &str, value: &str) -> Element {
    Element::new(name).attr("root", value.to_uppercase())
}

/// `<{name} root="{oid}" extension="{value}"/>`
pub fn rooted_identifier(name: &str, root: &str, value: &str) -> Element {
    Element::new(name).attr("root", root).attr("extension", value)
}

/// `<{name} codeSystem="{oid}" code="{value}"/>` with an optional display
/// name.
pub fn system_code(name: &str, system: &str, code: &str, display: Option<&str>) -> Element {
    let mut element = Element::new(name).attr("codeSystem", system).attr("code", code);
    if let Some(display) = display {
        element = element.attr("displayName", display);
    }

    element
}

pub fn snomed_code(name: &str, code: &str, display: Option<&str>) -> Element {
    system_code(name, oid::SNOMED, code, display)
}

pub fn short_form_id(name: &str, value: &str) -> Element {
    rooted_identifier(name, oid::SHORT_FORM_PRESCRIPTION_ID, value)
}

pub fn nhs_number(value: &str) -> Element {
    rooted_identifier("id", oid::NHS_NUMBER, value)
}

pub fn accredited_system_id(name: &str, asid: &str) -> Element {
    rooted_identifier(name, oid::ACCREDITED_SYSTEM, asid)
}

pub fn sds_role_profile_id(value: &str) -> Element {
    rooted_identifier("id", oid::SDS_ROLE_PROFILE_ID, value)
}

pub fn sds_job_role_code(value: &str) -> Element {
    system_code("code", oid::SDS_JOB_ROLE, value, None)
}

pub fn sds_organization_id(value: &str) -> Element {
    rooted_identifier("id", oid::SDS_ORGANIZATION, value)
}

pub fn sds_user_id(value: &str) -> Element {
    rooted_identifier("id", oid::SDS_USER_ID, value)
}

pub fn professional_code(value: &str) -> Element {
    rooted_identifier("id", oid::PROFESSIONAL_CODE, value)
}

pub fn prescribing_code(value: &str) -> Element {
    rooted_identifier("id", oid::PRESCRIBING_CODE, value)
}

/// Prescription annotation: `<code codeSystem="…17.30" code="{kind}"/>`
/// followed by a `<value/>` child built by the caller.
pub fn annotation_code(kind: &str) -> Element {
    system_code("code", oid::PRESCRIPTION_ANNOTATION, kind, None)
}

pub fn interaction_id(value: &str) -> Element {
    rooted_identifier("interactionId", oid::MESSAGE_TYPE, value)
}

pub fn sex_code(value: &str) -> Element {
    system_code("administrativeGenderCode", oid::SEX, value, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::c14n::canonicalize;

    #[test]
    fn global_identifiers_are_uppercased() {
        let actual = global_identifier("id", "a5b9dc81-ccf4-4dab-b887-3d88e557febb");

        assert_eq!(
            actual.attribute("root"),
            Some("A5B9DC81-CCF4-4DAB-B887-3D88E557FEBB")
        );
    }

    #[test]
    fn short_form_id_carries_the_fixed_root() {
        let actual = String::from_utf8(canonicalize(&short_form_id(
            "prescriptionID",
            "E3E6FA-A83008-41F09Y",
        )))
        .unwrap();

        assert_eq!(
            actual,
            "<prescriptionID extension=\"E3E6FA-A83008-41F09Y\" root=\"2.16.840.1.113883.2.1.3.2.4.18.8\"></prescriptionID>"
        );
    }
}
