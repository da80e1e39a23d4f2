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

use std::time::Duration;

use openssl::x509::X509;

use xmlsig::VerifyOptions;

/// Configuration injected into translator and verifier construction.
/// Nothing in the library reads process-wide state; callers build one of
/// these from wherever their configuration lives.
#[derive(Clone, Debug)]
pub struct Settings {
    /// Accredited system id of this gateway (message sender).
    pub from_asid: String,
    /// Accredited system id of the exchange (message receiver).
    pub to_asid: String,
    /// Authenticated user identity for messages that do not carry a
    /// clinical author graph (dispense and task flows).
    pub user: SdsUser,
    /// PEM encoded sub-CA certificates prescriber certificates must chain
    /// to.
    pub trusted_sub_ca_pems: Vec<String>,
    pub crl_timeout: Duration,
}

#[derive(Clone, Debug)]
pub struct SdsUser {
    pub user_id: String,
    pub role_profile_id: String,
    pub job_role_code: String,
}

impl Settings {
    pub fn verify_options(&self) -> Result<VerifyOptions, openssl::error::ErrorStack> {
        let trusted_sub_cas = self
            .trusted_sub_ca_pems
            .iter()
            .map(|pem| X509::from_pem(pem.as_bytes()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(VerifyOptions {
            trusted_sub_cas,
            crl_timeout: self.crl_timeout,
        })
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    pub fn example() -> Settings {
        Settings {
            from_asid: "200000001285".into(),
            to_asid: "567456789789".into(),
            user: SdsUser {
                user_id: "3415870201".into(),
                role_profile_id: "100102238986".into(),
                job_role_code: "R8000".into(),
            },
            trusted_sub_ca_pems: Vec::new(),
            crl_timeout: Duration::from_secs(10),
        }
    }

    #[test]
    fn invalid_pem_is_rejected() {
        let mut settings = example();
        settings.trusted_sub_ca_pems = vec!["not a certificate".into()];

        assert!(settings.verify_options().is_err());
    }
}
