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

use serde::{Deserialize, Serialize};

use super::primitives::{DateTime, Id, Instant};
use super::types::{Coding, Reference};

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Provenance {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub target: Vec<Reference>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recorded: Option<Instant>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub agent: Vec<Agent>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub signature: Vec<Signature>,
}

#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct Agent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub who: Option<Reference>,
}

/// The prescriber's detached signature: `data` carries the base64 encoded
/// XML-DSig `Signature` element, `who` points at the signing
/// PractitionerRole bundle entry.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Signature {
    #[serde(rename = "type", default, skip_serializing_if = "Vec::is_empty")]
    pub type_: Vec<Coding>,

    pub when: DateTime,

    pub who: Reference,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}
