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

use gateway::translate_request;
use resources::bundle::Resource;

use super::misc::{read_input, write_output, SettingsOpts};

#[derive(StructOpt)]
/// Translate a FHIR Bundle or Task into its HL7 V3 wire message.
pub struct Opts {
    /// File to read the FHIR resource from (stdin if omitted).
    #[structopt(short, long)]
    input: Option<PathBuf>,

    /// File to write the wire XML to (stdout if omitted).
    #[structopt(short, long)]
    output: Option<PathBuf>,

    #[structopt(flatten)]
    settings: SettingsOpts,
}

pub fn execute(opts: Opts) {
    let input = read_input(&opts.input);
    let resource: Resource =
        serde_json::from_slice(&input).expect("Unable to parse FHIR resource");

    let settings = opts.settings.to_settings();
    let translated = match translate_request(&resource, &settings) {
        Ok(translated) => translated,
        Err(err) => {
            let outcome = Resource::OperationOutcome(Box::new(err.to_operation_outcome()));
            let outcome =
                serde_json::to_string_pretty(&outcome).expect("Unable to encode outcome");
            eprintln!("{}", outcome);
            std::process::exit(1);
        }
    };

    write_output(&opts.output, &translated.to_bytes());
}
