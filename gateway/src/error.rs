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

use thiserror::Error;

use resources::operation_outcome::{Issue, IssueType, OperationOutcome, Severity};
use resources::types::{CodeableConcept, Coding};

use crate::translation::systems;

/// Translation errors. Raised immediately and abort the translation; no
/// partial wire message is ever produced. Each carries the FHIR path of the
/// offending value where one exists.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("{message} ({path})")]
    InvalidValue { message: String, path: String },

    #[error("{message} ({path})")]
    TooFewValues { message: String, path: String },

    #[error("{message} ({path})")]
    TooManyValues { message: String, path: String },

    #[error("Unsupported message type")]
    UnsupportedMessageType,
}

impl Error {
    pub fn invalid_value<M: Into<String>, P: Into<String>>(message: M, path: P) -> Self {
        Self::InvalidValue {
            message: message.into(),
            path: path.into(),
        }
    }

    pub fn too_few_values<M: Into<String>, P: Into<String>>(message: M, path: P) -> Self {
        Self::TooFewValues {
            message: message.into(),
            path: path.into(),
        }
    }

    pub fn too_many_values<M: Into<String>, P: Into<String>>(message: M, path: P) -> Self {
        Self::TooManyValues {
            message: message.into(),
            path: path.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidValue { .. } => "INVALID_VALUE",
            Self::TooFewValues { .. } => "TOO_FEW_VALUES_SUBMITTED",
            Self::TooManyValues { .. } => "TOO_MANY_VALUES_SUBMITTED",
            Self::UnsupportedMessageType => "UNSUPPORTED_MESSAGE_TYPE",
        }
    }

    fn path(&self) -> Option<&str> {
        match self {
            Self::InvalidValue { path, .. }
            | Self::TooFewValues { path, .. }
            | Self::TooManyValues { path, .. } => Some(path),
            Self::UnsupportedMessageType => None,
        }
    }

    /// The user facing outcome the routing layer responds with.
    pub fn to_operation_outcome(&self) -> OperationOutcome {
        OperationOutcome {
            issue: vec![Issue {
                severity: Severity::Fatal,
                code: IssueType::Invalid,
                details: Some(CodeableConcept {
                    coding: vec![Coding {
                        system: Some(systems::SPINE_ERROR.to_owned()),
                        code: Some(self.code().to_owned()),
                        display: Some(self.to_string()),
                    }],
                    text: None,
                }),
                diagnostics: None,
                expression: self.path().map(str::to_owned).into_iter().collect(),
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_carries_code_and_path() {
        let error = Error::too_many_values("Expected exactly one Patient", "Bundle.entry");

        let outcome = error.to_operation_outcome();

        let coding = &outcome.issue[0].details.as_ref().unwrap().coding[0];
        assert_eq!(coding.code.as_deref(), Some("TOO_MANY_VALUES_SUBMITTED"));
        assert_eq!(outcome.issue[0].expression, vec!["Bundle.entry".to_owned()]);
    }
}
