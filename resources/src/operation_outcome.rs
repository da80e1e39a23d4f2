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

use super::types::CodeableConcept;

#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct OperationOutcome {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issue: Vec<Issue>,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Issue {
    pub severity: Severity,

    pub code: IssueType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<CodeableConcept>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub expression: Vec<String>,
}

#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub enum Severity {
    #[serde(rename = "fatal")]
    Fatal,
    #[serde(rename = "error")]
    Error,
    #[serde(rename = "warning")]
    Warning,
    #[serde(rename = "information")]
    Information,
}

#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub enum IssueType {
    #[serde(rename = "invalid")]
    Invalid,
    #[serde(rename = "structure")]
    Structure,
    #[serde(rename = "value")]
    Value,
    #[serde(rename = "not-supported")]
    NotSupported,
    #[serde(rename = "processing")]
    Processing,
    #[serde(rename = "business-rule")]
    BusinessRule,
    #[serde(rename = "informational")]
    Informational,
}
