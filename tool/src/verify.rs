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

use std::path::PathBuf;

use structopt::StructOpt;

use gateway::verify_signature;

use super::misc::{read_input, SettingsOpts};

#[derive(StructOpt)]
/// Verify the digital signature of a signed prescription message.
pub struct Opts {
    /// File to read the signed HL7 V3 XML from (stdin if omitted).
    #[structopt(short, long)]
    input: Option<PathBuf>,

    #[structopt(flatten)]
    settings: SettingsOpts,
}

pub fn execute(opts: Opts) {
    let input = read_input(&opts.input);
    let input = String::from_utf8(input).expect("Input is not valid UTF-8");

    let message = hl7v3::parse(&input).expect("Unable to parse HL7 V3 message");

    let settings = opts.settings.to_settings();
    let errors = verify_signature(&message, &settings);

    if errors.is_empty() {
        println!("Signature is valid");
    } else {
        for error in &errors {
            println!("{}", error);
        }
        std::process::exit(1);
    }
}
