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

use hl7v3::prescription::Organization as Hl7Organization;

use resources::bundle::Bundle;
use resources::{HealthcareService, Organization};

use super::demographics::{convert_address, convert_telecom};
use crate::error::Error;
use crate::navigator::{
    coding_for_system_or_null, identifier_value, only_element_or_null, resolve_organization,
};
use crate::translation::systems;

const DEFAULT_TYPE_CODE: &str = "008";

/// Converts the organization graph behind a practitioner role. Primary care
/// organizations carry their provider license in the parent (`partOf`)
/// organization; secondary care roles present a healthcare service as the
/// visible organization with the employing organization as license holder.
pub fn convert_organization_and_provider_license(
    bundle: &Bundle,
    organization: &Organization,
    healthcare_service: Option<&HealthcareService>,
) -> Result<Hl7Organization, Error> {
    match healthcare_service {
        Some(service) => {
            let license_holder = convert_organization(bundle, organization, false)?;

            convert_healthcare_service(service, license_holder)
        }
        None => convert_organization(bundle, organization, true),
    }
}

fn convert_organization(
    bundle: &Bundle,
    organization: &Organization,
    with_parent: bool,
) -> Result<Hl7Organization, Error> {
    let organization_code = identifier_value(
        &organization.identifier,
        systems::ODS_ORGANIZATION,
        "Organization.identifier",
    )?;

    let name = organization
        .name
        .as_deref()
        .ok_or_else(|| Error::invalid_value("Organization has no name", "Organization.name"))?;

    let telecom = only_element_or_null(&organization.telecom, "Organization.telecom")?
        .map(|t| convert_telecom(t, "Organization.telecom"))
        .transpose()?;

    let address = only_element_or_null(&organization.address, "Organization.address")?
        .map(|a| convert_address(a, "Organization.address"))
        .transpose()?;

    let provider_license = match &organization.part_of {
        Some(parent_reference) if with_parent => {
            let parent =
                resolve_organization(bundle, parent_reference, "Organization.partOf")?;
            Some(Box::new(convert_organization(bundle, parent, false)?))
        }
        _ => None,
    };

    Ok(Hl7Organization {
        organization_code: organization_code.to_owned(),
        type_code: type_code(organization)?.to_owned(),
        name: name.to_owned(),
        telecom,
        address,
        provider_license,
    })
}

fn convert_healthcare_service(
    service: &HealthcareService,
    license_holder: Hl7Organization,
) -> Result<Hl7Organization, Error> {
    let organization_code = identifier_value(
        &service.identifier,
        systems::ODS_ORGANIZATION,
        "HealthcareService.identifier",
    )?;

    let name = service.name.as_deref().ok_or_else(|| {
        Error::invalid_value("HealthcareService has no name", "HealthcareService.name")
    })?;

    let telecom = only_element_or_null(&service.telecom, "HealthcareService.telecom")?
        .map(|t| convert_telecom(t, "HealthcareService.telecom"))
        .transpose()?;

    Ok(Hl7Organization {
        organization_code: organization_code.to_owned(),
        type_code: DEFAULT_TYPE_CODE.to_owned(),
        name: name.to_owned(),
        telecom,
        address: None,
        provider_license: Some(Box::new(license_holder)),
    })
}

fn type_code(organization: &Organization) -> Result<&str, Error> {
    let coding = coding_for_system_or_null(
        &organization.type_,
        systems::ORGANISATION_ROLE,
        "Organization.type",
    )?;

    Ok(coding
        .and_then(|coding| coding.code.as_deref())
        .unwrap_or(DEFAULT_TYPE_CODE))
}

#[cfg(test)]
mod tests {
    use super::*;

    use resources::bundle::{Entry, Resource, Type};
    use resources::types::{Identifier, Reference};

    fn identifier(value: &str) -> Identifier {
        Identifier {
            system: Some(systems::ODS_ORGANIZATION.to_owned()),
            value: Some(value.to_owned()),
            ..Default::default()
        }
    }

    #[test]
    fn primary_care_parent_becomes_provider_license() {
        let parent = Organization {
            identifier: vec![identifier("84H")],
            name: Some("NHS COUNTY DURHAM CCG".into()),
            ..Default::default()
        };

        let child = Organization {
            identifier: vec![identifier("A83008")],
            name: Some("HALLGARTH SURGERY".into()),
            part_of: Some(Reference::new("urn:uuid:parent")),
            ..Default::default()
        };

        let mut bundle = Bundle::new(Type::Message);
        let mut entry = Entry::new(Resource::Organization(Box::new(parent)));
        entry.full_url = Some("urn:uuid:parent".into());
        bundle.entries.push(entry);

        let actual = convert_organization_and_provider_license(&bundle, &child, None).unwrap();

        assert_eq!(actual.organization_code, "A83008");
        let license = actual.provider_license.unwrap();
        assert_eq!(license.organization_code, "84H");
        assert!(license.provider_license.is_none());
    }

    #[test]
    fn secondary_care_uses_the_healthcare_service() {
        let organization = Organization {
            identifier: vec![identifier("RBA")],
            name: Some("TAUNTON AND SOMERSET NHS FOUNDATION TRUST".into()),
            ..Default::default()
        };
        let service = HealthcareService {
            identifier: vec![identifier("A99968")],
            name: Some("SOMERSET BOWEL CANCER SCREENING CENTRE".into()),
            ..Default::default()
        };

        let bundle = Bundle::new(Type::Message);
        let actual =
            convert_organization_and_provider_license(&bundle, &organization, Some(&service))
                .unwrap();

        assert_eq!(actual.organization_code, "A99968");
        assert_eq!(
            actual.provider_license.unwrap().organization_code,
            "RBA"
        );
    }
}
