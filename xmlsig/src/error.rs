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

use openssl::error::ErrorStack as OpenSslError;
use thiserror::Error;

use hl7v3::Error as Hl7V3Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HL7 V3 Error: {0}")]
    Hl7V3(Hl7V3Error),

    #[error("OpenSSL Error: {0}")]
    OpenSsl(OpenSslError),

    #[error("Invalid Base64: {0}")]
    Base64(base64::DecodeError),

    #[error("Invalid Signing Time: {0}")]
    InvalidSigningTime(String),
}

impl From<Hl7V3Error> for Error {
    fn from(v: Hl7V3Error) -> Self {
        Self::Hl7V3(v)
    }
}

impl From<OpenSslError> for Error {
    fn from(v: OpenSslError) -> Self {
        Self::OpenSsl(v)
    }
}

impl From<base64::DecodeError> for Error {
    fn from(v: base64::DecodeError) -> Self {
        Self::Base64(v)
    }
}
