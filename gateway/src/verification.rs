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

use log::error;

use hl7v3::Element;

use super::settings::Settings;

/// Verifies a signed prescription against the configured trust anchors.
/// Returns one human readable entry per failed check; empty means valid.
pub fn verify_signature(message: &Element, settings: &Settings) -> Vec<String> {
    let options = match settings.verify_options() {
        Ok(options) => options,
        Err(err) => {
            error!("Unable to load trusted sub-CA certificates: {}", err);
            return vec!["Invalid verifier configuration".to_owned()];
        }
    };

    xmlsig::verify_signature(message, &options)
}

/// Revocation-only certificate check for a signed prescription.
pub fn is_certificate_valid(message: &Element, settings: &Settings) -> bool {
    let options = match settings.verify_options() {
        Ok(options) => options,
        Err(err) => {
            error!("Unable to load trusted sub-CA certificates: {}", err);
            return false;
        }
    };

    xmlsig::is_certificate_valid(message, &options)
}
