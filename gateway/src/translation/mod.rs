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

pub mod additional_instructions;
pub mod request;
pub mod response;

#[cfg(test)]
pub mod test_data;

/// Identifier and code systems of the FHIR side of the translation.
pub mod systems {
    pub const NHS_NUMBER: &str = "https://fhir.nhs.uk/Id/nhs-number";
    pub const ODS_ORGANIZATION: &str = "https://fhir.nhs.uk/Id/ods-organization-code";
    pub const SDS_USER: &str = "https://fhir.nhs.uk/Id/sds-user-id";
    pub const SDS_ROLE_PROFILE: &str = "https://fhir.nhs.uk/Id/sds-role-profile-id";
    pub const SDS_JOB_ROLE: &str = "https://fhir.hl7.org.uk/CodeSystem/UKCore-SDSJobRoleName";

    pub const GMC_NUMBER: &str = "https://fhir.hl7.org.uk/Id/gmc-number";
    pub const GMP_NUMBER: &str = "https://fhir.hl7.org.uk/Id/gmp-number";
    pub const NMC_NUMBER: &str = "https://fhir.hl7.org.uk/Id/nmc-number";
    pub const GPHC_NUMBER: &str = "https://fhir.hl7.org.uk/Id/gphc-number";
    pub const HCPC_NUMBER: &str = "https://fhir.hl7.org.uk/Id/hcpc-number";
    pub const PROFESSIONAL_CODE: &str = "https://fhir.hl7.org.uk/Id/professional-code";
    pub const DIN_NUMBER: &str = "https://fhir.hl7.org.uk/Id/din-number";
    pub const SPURIOUS_CODE: &str = "https://fhir.hl7.org.uk/Id/nhsbsa-spurious-code";

    pub const PRESCRIPTION_ORDER_NUMBER: &str = "https://fhir.nhs.uk/Id/prescription-order-number";
    pub const PRESCRIPTION: &str = "https://fhir.nhs.uk/Id/prescription";
    pub const PRESCRIPTION_ORDER_ITEM: &str = "https://fhir.nhs.uk/Id/prescription-order-item-number";
    pub const PRESCRIPTION_DISPENSE_ITEM: &str =
        "https://fhir.nhs.uk/Id/prescription-dispense-item-number";
    pub const RFC4122: &str = "https://tools.ietf.org/html/rfc4122";

    pub const SNOMED: &str = "http://snomed.info/sct";
    pub const UCUM: &str = "http://unitsofmeasure.org";
    pub const COURSE_OF_THERAPY: &str =
        "http://terminology.hl7.org/CodeSystem/medicationrequest-course-of-therapy";
    pub const MEDICATION_DISPENSE_TYPE: &str =
        "https://fhir.nhs.uk/CodeSystem/medicationdispense-type";
    pub const PRESCRIPTION_CHARGE: &str = "https://fhir.nhs.uk/CodeSystem/DM-prescription-charge";
    pub const DISPENSE_ENDORSEMENT: &str =
        "https://fhir.nhs.uk/CodeSystem/medicationdispense-endorsement";
    pub const RETURN_REASON: &str =
        "https://fhir.nhs.uk/CodeSystem/EPS-task-dispense-return-status-reason";
    pub const WITHDRAW_REASON: &str =
        "https://fhir.nhs.uk/CodeSystem/EPS-task-dispense-withdraw-reason";
    pub const STATUS_HISTORY: &str =
        "https://fhir.nhs.uk/CodeSystem/medicationrequest-status-history";
    pub const ORGANISATION_ROLE: &str = "https://fhir.nhs.uk/CodeSystem/organisation-role";
    pub const SPINE_ERROR: &str = "https://fhir.nhs.uk/R4/CodeSystem/Spine-ErrorOrWarningCode";
}

/// Extension URLs of the FHIR side of the translation.
pub mod extensions {
    pub const PRESCRIPTION_ID: &str =
        "https://fhir.nhs.uk/R4/StructureDefinition/Extension-PrescriptionId";
    pub const GROUP_IDENTIFIER: &str =
        "https://fhir.nhs.uk/StructureDefinition/Extension-DM-GroupIdentifier";
    pub const RESPONSIBLE_PRACTITIONER: &str =
        "https://fhir.nhs.uk/StructureDefinition/Extension-DM-ResponsiblePractitioner";
    pub const PERFORMER_SITE_TYPE: &str =
        "https://fhir.nhs.uk/R4/StructureDefinition/Extension-performerSiteType";
    pub const PRESCRIPTION_TYPE: &str =
        "https://fhir.nhs.uk/R4/StructureDefinition/Extension-prescriptionType";
    pub const REPEAT_INFORMATION: &str =
        "https://fhir.nhs.uk/R4/StructureDefinition/Extension-UKCore-MedicationRepeatInformation";
    pub const TASK_BUSINESS_STATUS: &str =
        "https://fhir.nhs.uk/StructureDefinition/Extension-EPS-TaskBusinessStatus";
    pub const STATUS_HISTORY: &str =
        "https://fhir.nhs.uk/R4/StructureDefinition/Extension-DM-PrescriptionStatusHistory";
    pub const DISPENSING_PERFORMER: &str =
        "https://fhir.nhs.uk/StructureDefinition/Extension-DM-DispensingPerformer";
    pub const REPLACEMENT_OF: &str =
        "https://fhir.nhs.uk/StructureDefinition/Extension-replacementOf";
}
