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

use serde::{de::Error as DeError, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Ten digit patient identifier with a mod-11 check digit in the last
/// position.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct NhsNumber(String);

#[derive(Debug, Error)]
pub enum FromStrError {
    #[error("Invalid Format")]
    InvalidFormat,

    #[error("Invalid Checksum")]
    InvalidChecksum,
}

impl FromStr for NhsNumber {
    type Err = FromStrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 10 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(FromStrError::InvalidFormat);
        }

        let digits: Vec<u32> = s.bytes().map(|b| u32::from(b - b'0')).collect();
        match check_digit(&digits[..9]) {
            Some(check) if check == digits[9] => Ok(Self(s.to_owned())),
            _ => Err(FromStrError::InvalidChecksum),
        }
    }
}

impl TryFrom<String> for NhsNumber {
    type Error = FromStrError;

    fn try_from(v: String) -> Result<Self, Self::Error> {
        v.parse()
    }
}

impl Deref for NhsNumber {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for NhsNumber {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.0)
    }
}

impl Serialize for NhsNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for NhsNumber {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;

        s.parse()
            .map_err(|err| D::Error::custom(format!("Invalid NHS number: {}", err)))
    }
}

/// Weights 10..=2 over the first nine digits; 11 maps to 0, 10 means the
/// number is unusable.
fn check_digit(digits: &[u32]) -> Option<u32> {
    let sum: u32 = digits
        .iter()
        .enumerate()
        .map(|(i, d)| d * (10 - i as u32))
        .sum();

    match 11 - (sum % 11) {
        11 => Some(0),
        10 => None,
        check => Some(check),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_check_digit() {
        assert!("9990548609".parse::<NhsNumber>().is_ok());
    }

    #[test]
    fn rejects_invalid_check_digit() {
        assert!(matches!(
            "9990548608".parse::<NhsNumber>(),
            Err(FromStrError::InvalidChecksum)
        ));
    }

    #[test]
    fn rejects_invalid_format() {
        assert!(matches!(
            "99905486".parse::<NhsNumber>(),
            Err(FromStrError::InvalidFormat)
        ));
    }
}
