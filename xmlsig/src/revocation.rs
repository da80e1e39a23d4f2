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

//! Revocation checking against the CRL referenced by a certificate's
//! distribution point. Fetch and parse failures degrade to "not revoked":
//! an infrastructure outage must not retroactively invalidate previously
//! valid prescriptions.

use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{error, warn};
use openssl::x509::{X509Crl, X509RevokedRef, X509};
use reqwest::blocking::Client;

use super::error::Error;

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum RevocationStatus {
    NotRevoked,
    /// The serial is listed and the rules of `evaluate_revocation` make the
    /// signature invalid.
    Revoked(Reason),
    /// Listed, but the reason code does not invalidate a signature created
    /// before the revocation date.
    RevokedAfterSigning(Reason),
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Reason {
    Unspecified,
    KeyCompromise,
    CaCompromise,
    AffiliationChanged,
    Superseded,
    CessationOfOperation,
    CertificateHold,
    RemoveFromCrl,
    PrivilegeWithdrawn,
    AaCompromise,
}

impl Reason {
    fn from_code(code: i32) -> Self {
        match code {
            1 => Self::KeyCompromise,
            2 => Self::CaCompromise,
            3 => Self::AffiliationChanged,
            4 => Self::Superseded,
            5 => Self::CessationOfOperation,
            6 => Self::CertificateHold,
            8 => Self::RemoveFromCrl,
            9 => Self::PrivilegeWithdrawn,
            10 => Self::AaCompromise,
            _ => Self::Unspecified,
        }
    }

    /// Key and CA compromise invalidate signatures made before the
    /// revocation date; other reasons only affect later signatures.
    fn is_retroactive(&self) -> bool {
        matches!(self, Self::KeyCompromise | Self::CaCompromise | Self::AaCompromise)
    }
}

/// Full check for one certificate: resolve the distribution point, download
/// the CRL, and evaluate any matching entry against the signing time.
pub fn fetch_revocation_status(
    certificate: &X509,
    signing_time: DateTime<Utc>,
    timeout: Duration,
) -> RevocationStatus {
    let url = match distribution_point(certificate) {
        Some(url) => url,
        None => {
            warn!("Certificate has no CRL distribution point; reporting not revoked");
            return RevocationStatus::NotRevoked;
        }
    };

    let crl = match download_crl(&url, timeout) {
        Ok(crl) => crl,
        Err(err) => {
            error!("Unable to fetch CRL from {}: {}", url, err);
            return RevocationStatus::NotRevoked;
        }
    };

    match find_entry(&crl, certificate) {
        Some(entry) => evaluate_entry(entry, signing_time),
        None => RevocationStatus::NotRevoked,
    }
}

/// The decision rule, separated from I/O so it can be tested without a
/// distribution point.
pub fn evaluate_revocation(
    reason: Reason,
    revocation_date: DateTime<Utc>,
    signing_time: DateTime<Utc>,
) -> RevocationStatus {
    if signing_time >= revocation_date || reason.is_retroactive() {
        RevocationStatus::Revoked(reason)
    } else {
        RevocationStatus::RevokedAfterSigning(reason)
    }
}

impl RevocationStatus {
    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::Revoked(_))
    }
}

fn distribution_point(certificate: &X509) -> Option<String> {
    let points = certificate.crl_distribution_points()?;

    points
        .iter()
        .filter_map(|point| point.distpoint())
        .filter_map(|name| name.fullname())
        .flat_map(|names| names.iter())
        .filter_map(|name| name.uri())
        .map(str::to_owned)
        .next()
}

fn download_crl(url: &str, timeout: Duration) -> Result<X509Crl, String> {
    let client = Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|err| err.to_string())?;

    let response = client.get(url).send().map_err(|err| err.to_string())?;
    if !response.status().is_success() {
        return Err(format!("unexpected status {}", response.status()));
    }

    let body = response.bytes().map_err(|err| err.to_string())?;

    X509Crl::from_der(&body).map_err(|err| err.to_string())
}

/// Serial numbers are compared as case-insensitive hex strings.
fn find_entry<'a>(crl: &'a X509Crl, certificate: &X509) -> Option<&'a X509RevokedRef> {
    let serial = serial_hex(certificate.serial_number().to_bn().ok()?)?;

    crl.get_revoked()?.iter().find(|entry| {
        entry
            .serial_number()
            .to_bn()
            .ok()
            .and_then(serial_hex)
            .map(|entry_serial| entry_serial == serial)
            .unwrap_or(false)
    })
}

fn serial_hex(bn: openssl::bn::BigNum) -> Option<String> {
    bn.to_hex_str().ok().map(|hex| hex.to_lowercase())
}

fn evaluate_entry(entry: &X509RevokedRef, signing_time: DateTime<Utc>) -> RevocationStatus {
    let reason = entry_reason(entry);

    let revocation_date = match asn1_to_utc(entry.revocation_date()) {
        Ok(date) => date,
        Err(err) => {
            error!("Unable to read CRL entry revocation date: {}", err);
            return RevocationStatus::Revoked(reason);
        }
    };

    evaluate_revocation(reason, revocation_date, signing_time)
}

/// The reason code entry extension is an ASN.1 enumerated value per
/// RFC 5280 §5.3.1.
fn entry_reason(entry: &X509RevokedRef) -> Reason {
    use openssl::x509::ReasonCode;

    match entry.extension::<ReasonCode>() {
        Ok(Some((_, value))) => value
            .get_i64()
            .map(|code| Reason::from_code(code as i32))
            .unwrap_or(Reason::Unspecified),
        _ => Reason::Unspecified,
    }
}

/// ASN.1 times are compared through their offset from a known epoch.
pub(crate) fn asn1_to_utc(time: &openssl::asn1::Asn1TimeRef) -> Result<DateTime<Utc>, Error> {
    use chrono::TimeZone;

    let epoch = openssl::asn1::Asn1Time::from_unix(0)?;
    let diff = epoch.diff(time)?;
    let seconds = i64::from(diff.days) * 86_400 + i64::from(diff.secs);

    Ok(Utc.timestamp(seconds, 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::TimeZone;

    fn date(day: u32) -> DateTime<Utc> {
        Utc.ymd(2021, 3, day).and_hms(12, 0, 0)
    }

    #[test]
    fn signing_after_revocation_is_always_invalid() {
        let status = evaluate_revocation(Reason::CessationOfOperation, date(1), date(2));

        assert!(status.is_invalid());
    }

    #[test]
    fn key_compromise_is_retroactive() {
        let status = evaluate_revocation(Reason::KeyCompromise, date(2), date(1));

        assert!(status.is_invalid());
    }

    #[test]
    fn benign_reason_forgives_earlier_signatures() {
        let status = evaluate_revocation(Reason::Superseded, date(2), date(1));

        assert_eq!(status, RevocationStatus::RevokedAfterSigning(Reason::Superseded));
        assert!(!status.is_invalid());
    }

    #[test]
    fn asn1_conversion_round_trips() {
        let time = openssl::asn1::Asn1Time::from_unix(1_614_600_000).unwrap();

        let actual = asn1_to_utc(&time).unwrap();

        assert_eq!(actual.timestamp(), 1_614_600_000);
    }

    #[test]
    fn reason_codes_map_to_variants() {
        assert_eq!(Reason::from_code(1), Reason::KeyCompromise);
        assert_eq!(Reason::from_code(4), Reason::Superseded);
        assert_eq!(Reason::from_code(42), Reason::Unspecified);
    }
}
