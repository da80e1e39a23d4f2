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
use std::str::FromStr;

use regex::Regex;
use serde::{de::Error as DeError, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Human readable short-form prescription identifier: three hyphenated
/// groups of six base-36 characters, the last character being a mod-37
/// check digit over the preceding seventeen.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct ShortFormId(String);

const CHARSET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ+";

#[derive(Debug, Error)]
pub enum FromStrError {
    #[error("Invalid Format")]
    InvalidFormat,

    #[error("Invalid Checksum")]
    InvalidChecksum,
}

impl FromStr for ShortFormId {
    type Err = FromStrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lazy_static! {
            static ref RX: Regex =
                Regex::new(r#"^[0-9A-Z]{6}-[0-9A-Z]{6}-[0-9A-Z]{5}[0-9A-Z\+]$"#).unwrap();
        }

        if !RX.is_match(s) {
            return Err(FromStrError::InvalidFormat);
        }

        let raw: Vec<u8> = s.bytes().filter(|b| *b != b'-').collect();
        let check = calc_check_digit(&raw[..17]).ok_or(FromStrError::InvalidFormat)?;
        if check != raw[17] {
            return Err(FromStrError::InvalidChecksum);
        }

        Ok(Self(s.to_owned()))
    }
}

impl TryFrom<String> for ShortFormId {
    type Error = FromStrError;

    fn try_from(v: String) -> Result<Self, Self::Error> {
        v.parse()
    }
}

impl Deref for ShortFormId {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for ShortFormId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.0)
    }
}

impl Serialize for ShortFormId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ShortFormId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;

        s.parse()
            .map_err(|err| D::Error::custom(format!("Invalid short-form id: {}", err)))
    }
}

fn calc_check_digit(body: &[u8]) -> Option<u8> {
    let mut total: u64 = 0;
    for b in body {
        let value = CHARSET.iter().position(|c| c == b)? as u64;
        total = (total + value) * 2;
    }

    let check = (38 - total % 37) % 37;

    Some(CHARSET[check as usize])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_id() {
        assert!("E3E6FA-A83008-41F09Y".parse::<ShortFormId>().is_ok());
    }

    #[test]
    fn rejects_invalid_checksum() {
        assert!(matches!(
            "E3E6FA-A83008-41F09A".parse::<ShortFormId>(),
            Err(FromStrError::InvalidChecksum)
        ));
    }

    #[test]
    fn rejects_invalid_format() {
        assert!(matches!(
            "E3E6FAA8300841F09Y".parse::<ShortFormId>(),
            Err(FromStrError::InvalidFormat)
        ));
    }
}
