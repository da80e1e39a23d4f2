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

use gateway::prepare_digest;
use resources::bundle::Resource;

use super::misc::{read_input, write_output};

#[derive(StructOpt)]
/// Compute the signing digest of a prescription Bundle.
///
/// Outputs the FHIR Parameters resource carrying the canonical SignedInfo
/// that an external signer signs.
pub struct Opts {
    /// File to read the FHIR Bundle from (stdin if omitted).
    #[structopt(short, long)]
    input: Option<PathBuf>,

    /// File to write the Parameters JSON to (stdout if omitted).
    #[structopt(short, long)]
    output: Option<PathBuf>,
}

pub fn execute(opts: Opts) {
    let input = read_input(&opts.input);
    let resource: Resource =
        serde_json::from_slice(&input).expect("Unable to parse FHIR resource");

    let bundle = match resource {
        Resource::Bundle(bundle) => bundle,
        _ => {
            eprintln!("Expected a Bundle resource");
            std::process::exit(1);
        }
    };

    let parameters = match prepare_digest(&bundle) {
        Ok(parameters) => parameters,
        Err(err) => {
            let outcome = Resource::OperationOutcome(Box::new(err.to_operation_outcome()));
            let outcome =
                serde_json::to_string_pretty(&outcome).expect("Unable to encode outcome");
            eprintln!("{}", outcome);
            std::process::exit(1);
        }
    };

    let parameters = Resource::Parameters(Box::new(parameters));
    let parameters = serde_json::to_string_pretty(&parameters).expect("Unable to encode parameters");
    write_output(&opts.output, parameters.as_bytes());
}
