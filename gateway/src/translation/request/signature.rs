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

//! Prepare-to-sign: builds the unsigned prescription, computes its digest,
//! and hands the canonical SignedInfo to the external signer as a FHIR
//! Parameters resource.

use hl7v3::ToElement;

use resources::bundle::Bundle;
use resources::Parameters;

use super::prescribe::convert_parent_prescription;
use crate::error::Error;
use crate::navigator::check_unique_full_urls;

pub const DIGEST_PARAMETER: &str = "message-digest";

pub fn prepare_digest(bundle: &Bundle) -> Result<Parameters, Error> {
    check_unique_full_urls(bundle)?;

    // the signature time is part of the digest: when the bundle already
    // carries a signature its time is reused, otherwise signing time is now
    let parent_prescription = convert_parent_prescription(bundle, true)?;
    let element = parent_prescription.to_element();

    let prepared = xmlsig::prepare_digest(&element)
        .map_err(|err| Error::invalid_value(format!("Unable to prepare digest: {}", err), "Bundle"))?;

    Ok(Parameters::string_parameter(
        DIGEST_PARAMETER,
        prepared.signed_info,
    ))
}
