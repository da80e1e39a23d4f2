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

use hl7v3::datatypes::{Address, AddressUse, Name, NameUse, Telecom, TelecomUse};

use resources::patient::Gender;
use resources::types::{Address as FhirAddress, ContactPoint, HumanName};

use crate::error::Error;

pub fn convert_name(name: &HumanName, path: &str) -> Result<Name, Error> {
    let use_ = match name.use_.as_deref() {
        None => None,
        Some("usual") | Some("official") => Some(NameUse::Usual),
        Some("nickname") => Some(NameUse::Alias),
        Some(other) => {
            return Err(Error::invalid_value(
                format!("Unhandled name use '{}'", other),
                format!("{}.use", path),
            ))
        }
    };

    Ok(Name {
        use_,
        prefix: name.prefix.clone(),
        given: name.given.clone(),
        family: name.family.clone(),
        suffix: name.suffix.clone(),
        text: None,
    })
}

pub fn convert_telecom(telecom: &ContactPoint, path: &str) -> Result<Telecom, Error> {
    let use_ = match telecom.use_.as_deref() {
        None => None,
        Some("home") => Some(TelecomUse::PermanentHome),
        Some("work") => Some(TelecomUse::Workplace),
        Some("temp") => Some(TelecomUse::Temporary),
        Some("mobile") => Some(TelecomUse::Mobile),
        Some(other) => {
            return Err(Error::invalid_value(
                format!("Unhandled telecom use '{}'", other),
                format!("{}.use", path),
            ))
        }
    };

    let value = telecom
        .value
        .as_deref()
        .ok_or_else(|| Error::invalid_value("Telecom has no value", path))?;

    Ok(Telecom {
        use_,
        value: value.to_owned(),
    })
}

pub fn convert_address(address: &FhirAddress, path: &str) -> Result<Address, Error> {
    let use_ = if address.type_.as_deref() == Some("postal") {
        Some(AddressUse::Postal)
    } else {
        match address.use_.as_deref() {
            None => None,
            Some("home") => Some(AddressUse::Home),
            Some("work") => Some(AddressUse::Work),
            Some("temp") => Some(AddressUse::Temporary),
            Some(other) => {
                return Err(Error::invalid_value(
                    format!("Unhandled address use '{}'", other),
                    format!("{}.use", path),
                ))
            }
        }
    };

    let mut lines = address.line.clone();
    lines.extend(address.city.iter().cloned());
    lines.extend(address.district.iter().cloned());
    lines.extend(address.state.iter().cloned());

    Ok(Address {
        use_,
        lines,
        postal_code: address.postal_code.clone(),
    })
}

pub fn convert_gender(gender: Gender) -> &'static str {
    match gender {
        Gender::Male => "1",
        Gender::Female => "2",
        Gender::Other => "9",
        Gender::Unknown => "0",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn official_name_use_maps_to_usual() {
        let name = HumanName {
            use_: Some("official".into()),
            family: Some("SMITH".into()),
            given: vec!["JANE".into()],
            ..Default::default()
        };

        let actual = convert_name(&name, "Patient.name").unwrap();

        assert_eq!(actual.use_, Some(NameUse::Usual));
        assert_eq!(actual.family.as_deref(), Some("SMITH"));
    }

    #[test]
    fn unknown_telecom_use_is_invalid() {
        let telecom = ContactPoint {
            system: Some("phone".into()),
            value: Some("01234567890".into()),
            use_: Some("pager".into()),
        };

        let actual = convert_telecom(&telecom, "Practitioner.telecom");

        assert!(matches!(actual, Err(Error::InvalidValue { .. })));
    }

    #[test]
    fn postal_type_wins_over_use() {
        let address = FhirAddress {
            use_: Some("home".into()),
            type_: Some("postal".into()),
            line: vec!["1 HIGH STREET".into()],
            city: Some("LEEDS".into()),
            postal_code: Some("LS1 1AB".into()),
            ..Default::default()
        };

        let actual = convert_address(&address, "Patient.address").unwrap();

        assert_eq!(actual.use_, Some(AddressUse::Postal));
        assert_eq!(actual.lines, vec!["1 HIGH STREET".to_owned(), "LEEDS".to_owned()]);
    }
}
