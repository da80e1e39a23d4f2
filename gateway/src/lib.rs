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

//! Translation core of the prescribing gateway: FHIR bundles and tasks in,
//! HL7 V3 wire messages out, plus the digital signature lifecycle of a
//! prescription (prepare-to-sign and verification of signed prescriptions).

#[macro_use]
extern crate lazy_static;

pub mod error;
pub mod navigator;
pub mod settings;
pub mod translation;
pub mod verification;

pub use error::Error;
pub use settings::{Settings, SdsUser};
pub use translation::request::{prepare_digest, translate_request, TranslatedRequest};
pub use translation::response::{translate_response, ResponseBody, TranslatedResponse};
pub use verification::{is_certificate_valid, verify_signature};
