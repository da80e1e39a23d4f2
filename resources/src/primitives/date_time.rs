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

use chrono::{DateTime as ChronoDateTime, TimeZone, Utc};
use regex::Regex;
use serde::{de::Error as DeError, Deserialize, Deserializer, Serialize, Serializer};

/// FHIR instant-precision dateTime. The original string is kept verbatim;
/// conversion to UTC is provided for the wire format, which normalizes any
/// input time zone.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct DateTime(String);

impl DateTime {
    pub fn to_utc(&self) -> Result<ChronoDateTime<Utc>, String> {
        ChronoDateTime::parse_from_rfc3339(&self.0)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|_| self.0.clone())
    }
}

impl<TZ> From<ChronoDateTime<TZ>> for DateTime
where
    TZ: TimeZone,
    <TZ as TimeZone>::Offset: Display,
{
    fn from(v: ChronoDateTime<TZ>) -> Self {
        Self(v.to_rfc3339())
    }
}

impl TryFrom<&str> for DateTime {
    type Error = String;

    fn try_from(v: &str) -> Result<Self, Self::Error> {
        from_string(v.to_owned())
    }
}

impl TryFrom<String> for DateTime {
    type Error = String;

    fn try_from(v: String) -> Result<Self, Self::Error> {
        from_string(v)
    }
}

impl Deref for DateTime {
    type Target = String;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for DateTime {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        self.0.fmt(f)
    }
}

impl Serialize for DateTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for DateTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;

        from_string(s).map_err(|err| D::Error::custom(format!("Invalid dateTime: {}", err)))
    }
}

fn from_string(s: String) -> Result<DateTime, String> {
    lazy_static! {
        static ref RX: Regex = Regex::new(
            r#"^[0-9]{4}-[0-9]{2}-[0-9]{2}T[0-9]{2}:[0-9]{2}:[0-9]{2}(\.[0-9]+)?(Z|(\+|-)[0-9]{2}:[0-9]{2})$"#
        )
        .unwrap();
    }

    if RX.is_match(&s) {
        Ok(DateTime(s))
    } else {
        Err(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_utc_and_offset_forms() {
        assert!(DateTime::try_from("2020-12-18T12:34:34Z").is_ok());
        assert!(DateTime::try_from("2020-12-18T12:34:34+01:00").is_ok());
        assert!(DateTime::try_from("2020-12-18").is_err());
    }

    #[test]
    fn normalizes_to_utc() {
        let actual = DateTime::try_from("2021-06-01T13:30:00+02:00")
            .unwrap()
            .to_utc()
            .unwrap();
        let expected = Utc.ymd(2021, 6, 1).and_hms(11, 30, 0);

        assert_eq!(actual, expected);
    }
}
