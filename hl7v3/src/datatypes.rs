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

use std::fmt::{Display, Formatter, Result as FmtResult};

use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc};

use super::element::{Element, ToElement};
use super::error::Error;

/// Wire timestamp: UTC, numeric, no separators. Inputs in any time zone are
/// normalized before formatting.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Timestamp {
    inner: DateTime<Utc>,
    precision: Precision,
}

#[derive(Clone, Copy, PartialEq, Debug)]
enum Precision {
    Day,
    Minute,
    Second,
}

impl Timestamp {
    /// `YYYYMMDDHHMMSS`
    pub fn seconds(inner: DateTime<Utc>) -> Self {
        Self {
            inner,
            precision: Precision::Second,
        }
    }

    /// `YYYYMMDDHHMM00`: signature and author times carry a fixed zero
    /// seconds field.
    pub fn minutes(inner: DateTime<Utc>) -> Self {
        Self {
            inner,
            precision: Precision::Minute,
        }
    }

    /// `YYYYMMDD`
    pub fn day(inner: DateTime<Utc>) -> Self {
        Self {
            inner,
            precision: Precision::Day,
        }
    }

    pub fn to_utc(&self) -> DateTime<Utc> {
        self.inner
    }

    /// Parses any of the wire forms back into a point in time.
    pub fn parse(value: &str) -> Result<Self, Error> {
        let invalid = || Error::InvalidTimestamp(value.to_owned());

        let digits: Vec<u32> = value
            .chars()
            .map(|c| c.to_digit(10).ok_or_else(invalid))
            .collect::<Result<_, _>>()?;

        let (precision, len) = match digits.len() {
            8 => (Precision::Day, 8),
            12 => (Precision::Minute, 12),
            14 => (Precision::Second, 14),
            _ => return Err(invalid()),
        };

        let number = |range: std::ops::Range<usize>| -> u32 {
            digits[range].iter().fold(0, |acc, d| acc * 10 + d)
        };

        let year = number(0..4) as i32;
        let month = number(4..6);
        let day = number(6..8);
        let (hour, min, sec) = if len > 8 {
            let sec = if len == 14 { number(12..14) } else { 0 };
            (number(8..10), number(10..12), sec)
        } else {
            (0, 0, 0)
        };

        let inner = Utc
            .ymd_opt(year, month, day)
            .single()
            .ok_or_else(invalid)?
            .and_hms_opt(hour, min, sec)
            .ok_or_else(invalid)?;

        Ok(Self { inner, precision })
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let t = &self.inner;
        match self.precision {
            Precision::Day => write!(f, "{:04}{:02}{:02}", t.year(), t.month(), t.day()),
            Precision::Minute => write!(
                f,
                "{:04}{:02}{:02}{:02}{:02}00",
                t.year(),
                t.month(),
                t.day(),
                t.hour(),
                t.minute()
            ),
            Precision::Second => write!(
                f,
                "{:04}{:02}{:02}{:02}{:02}{:02}",
                t.year(),
                t.month(),
                t.day(),
                t.hour(),
                t.minute(),
                t.second()
            ),
        }
    }
}

/// `nullFlavor` values this wire format uses.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Null {
    NotApplicable,
}

impl Null {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotApplicable => "NA",
        }
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct Telecom {
    pub use_: Option<TelecomUse>,
    pub value: String,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum TelecomUse {
    PermanentHome,
    Workplace,
    Temporary,
    Mobile,
}

impl TelecomUse {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PermanentHome => "HP",
            Self::Workplace => "WP",
            Self::Temporary => "TMP",
            Self::Mobile => "MC",
        }
    }
}

impl ToElement for Telecom {
    fn to_element(&self) -> Element {
        let mut element = Element::new("telecom");
        if let Some(use_) = &self.use_ {
            element = element.attr("use", use_.as_str());
        }

        element.attr("value", self.value.clone())
    }
}

#[derive(Clone, PartialEq, Debug, Default)]
pub struct Name {
    pub use_: Option<NameUse>,
    pub prefix: Vec<String>,
    pub given: Vec<String>,
    pub family: Option<String>,
    pub suffix: Vec<String>,
    /// Unstructured fallback written as plain text content.
    pub text: Option<String>,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum NameUse {
    Usual,
    Alias,
}

impl NameUse {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Usual => "L",
            Self::Alias => "A",
        }
    }
}

impl ToElement for Name {
    fn to_element(&self) -> Element {
        let mut element = Element::new("name");
        if let Some(use_) = &self.use_ {
            element = element.attr("use", use_.as_str());
        }
        if let Some(text) = &self.text {
            return element.text(text.clone());
        }

        for prefix in &self.prefix {
            element = element.child(Element::new("prefix").text(prefix.clone()));
        }
        for given in &self.given {
            element = element.child(Element::new("given").text(given.clone()));
        }
        if let Some(family) = &self.family {
            element = element.child(Element::new("family").text(family.clone()));
        }
        for suffix in &self.suffix {
            element = element.child(Element::new("suffix").text(suffix.clone()));
        }

        element
    }
}

#[derive(Clone, PartialEq, Debug, Default)]
pub struct Address {
    pub use_: Option<AddressUse>,
    pub lines: Vec<String>,
    pub postal_code: Option<String>,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum AddressUse {
    Home,
    Work,
    Temporary,
    Postal,
}

impl AddressUse {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Home => "H",
            Self::Work => "WP",
            Self::Temporary => "TMP",
            Self::Postal => "PST",
        }
    }
}

impl ToElement for Address {
    fn to_element(&self) -> Element {
        let mut element = Element::new("addr");
        if let Some(use_) = &self.use_ {
            element = element.attr("use", use_.as_str());
        }

        for line in &self.lines {
            element = element.child(Element::new("streetAddressLine").text(line.clone()));
        }
        if let Some(postal_code) = &self.postal_code {
            element = element.child(Element::new("postalCode").text(postal_code.clone()));
        }

        element
    }
}

/// `<{name} value="true|false"/>`
pub fn bool_value(name: &str, value: bool) -> Element {
    Element::new(name).attr("value", if value { "true" } else { "false" })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_precision_format() {
        let actual = Timestamp::seconds(Utc.ymd(2020, 9, 21).and_hms(14, 14, 46)).to_string();

        assert_eq!(actual, "20200921141446");
    }

    #[test]
    fn minute_precision_zeroes_seconds() {
        let actual = Timestamp::minutes(Utc.ymd(2020, 12, 18).and_hms(12, 34, 34)).to_string();

        assert_eq!(actual, "20201218123400");
    }

    #[test]
    fn parse_round_trip() {
        let parsed = Timestamp::parse("20201218123400").unwrap();

        assert_eq!(parsed.to_utc(), Utc.ymd(2020, 12, 18).and_hms(12, 34, 0));
        assert_eq!(parsed.to_string(), "20201218123400");
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(Timestamp::parse("2020-12-18").is_err());
        assert!(Timestamp::parse("20201318123400").is_err());
    }
}
