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

use std::convert::TryFrom;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::ops::Deref;

use regex::Regex;
use serde::{de::Error as DeError, Deserialize, Deserializer, Serialize, Serializer};

/// FHIR date: full date or a year/year-month partial.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct Date(String);

impl Date {
    /// Digits only, the way the HL7 V3 wire format writes partial dates.
    pub fn to_compact(&self) -> String {
        self.0.replace('-', "")
    }
}

impl TryFrom<&str> for Date {
    type Error = String;

    fn try_from(v: &str) -> Result<Self, Self::Error> {
        from_string(v.to_owned())
    }
}

impl TryFrom<String> for Date {
    type Error = String;

    fn try_from(v: String) -> Result<Self, Self::Error> {
        from_string(v)
    }
}

impl Deref for Date {
    type Target = String;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for Date {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        self.0.fmt(f)
    }
}

impl Serialize for Date {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Date {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;

        from_string(s).map_err(|err| D::Error::custom(format!("Invalid date: {}", err)))
    }
}

fn from_string(s: String) -> Result<Date, String> {
    lazy_static! {
        static ref RX: Regex =
            Regex::new(r#"^[0-9]{4}(-[0-9]{2}(-[0-9]{2})?)?$"#).unwrap();
    }

    if RX.is_match(&s) {
        Ok(Date(s))
    } else {
        Err(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_form_strips_separators() {
        let actual = Date::try_from("1973-04-21").unwrap().to_compact();

        assert_eq!(actual, "19730421");
    }

    #[test]
    fn accepts_partial_dates() {
        assert!(Date::try_from("1973").is_ok());
        assert!(Date::try_from("1973-04").is_ok());
        assert!(Date::try_from("21-04-1973").is_err());
    }
}
