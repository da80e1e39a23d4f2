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

mod digest;
mod error;
mod revocation;
mod verify;

pub use digest::{prepare_digest, PreparedDigest, EXC_C14N, RSA_SHA1, SHA1};
pub use error::Error;
pub use revocation::{evaluate_revocation, fetch_revocation_status, Reason, RevocationStatus};
pub use verify::{is_certificate_valid, verify_signature, VerifyOptions};
