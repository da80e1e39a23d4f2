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

use std::fs::{read, read_to_string, write};
use std::io::{stdin, stdout, Read, Write};
use std::path::PathBuf;
use std::time::Duration;

use structopt::StructOpt;

use gateway::{SdsUser, Settings};

pub fn read_input(input: &Option<PathBuf>) -> Vec<u8> {
    if let Some(input) = input {
        read(input).expect("Unable to read input file!")
    } else {
        let mut input = Vec::new();
        stdin()
            .lock()
            .read_to_end(&mut input)
            .expect("Unable to read from stdin");

        input
    }
}

pub fn write_output(output: &Option<PathBuf>, data: &[u8]) {
    if let Some(output) = output {
        write(output, data).expect("Unable to write to output file");
    } else {
        stdout().write_all(data).expect("Unable to write to stdout");
    }
}

/// Gateway configuration shared by the subcommands.
#[derive(StructOpt)]
pub struct SettingsOpts {
    /// Accredited system id of this gateway.
    #[structopt(long, default_value = "200000001285")]
    from_asid: String,

    /// Accredited system id of the exchange.
    #[structopt(long, default_value = "567456789789")]
    to_asid: String,

    /// SDS user id of the acting user.
    #[structopt(long, default_value = "3415870201")]
    user_id: String,

    /// SDS role profile id of the acting user.
    #[structopt(long, default_value = "100102238986")]
    role_profile_id: String,

    /// SDS job role code of the acting user.
    #[structopt(long, default_value = "R8000")]
    job_role_code: String,

    /// PEM files holding the trusted sub-CA certificates.
    #[structopt(long)]
    sub_ca: Vec<PathBuf>,

    /// Timeout for revocation list downloads, in seconds.
    #[structopt(long, default_value = "10")]
    crl_timeout: u64,
}

impl SettingsOpts {
    pub fn to_settings(&self) -> Settings {
        let trusted_sub_ca_pems = self
            .sub_ca
            .iter()
            .map(|path| read_to_string(path).expect("Unable to read sub-CA certificate"))
            .collect();

        Settings {
            from_asid: self.from_asid.clone(),
            to_asid: self.to_asid.clone(),
            user: SdsUser {
                user_id: self.user_id.clone(),
                role_profile_id: self.role_profile_id.clone(),
                job_role_code: self.job_role_code.clone(),
            },
            trusted_sub_ca_pems,
            crl_timeout: Duration::from_secs(self.crl_timeout),
        }
    }
}
