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

//! Inbound translation: classify a raw exchange response by structural
//! pattern and map it to an HTTP-style status plus a FHIR body.

pub mod cancellation;

use log::error;

use hl7v3::messaging::{Acknowledgement, AcknowledgementType};
use hl7v3::Element;

use resources::bundle::{Bundle, Resource};
use resources::operation_outcome::{Issue, IssueType, OperationOutcome, Severity};
use resources::types::{CodeableConcept, Coding};

use crate::translation::systems;

#[derive(Clone, PartialEq, Debug)]
pub struct TranslatedResponse {
    pub status_code: u16,
    pub body: ResponseBody,
}

#[derive(Clone, PartialEq, Debug)]
pub enum ResponseBody {
    Bundle(Box<Bundle>),
    OperationOutcome(OperationOutcome),
}

/// Classifies and translates a raw response body. This never fails:
/// unrecognized payloads map to a server-error outcome.
pub fn translate_response(raw: &str) -> TranslatedResponse {
    let trimmed = raw.trim_start();

    if trimmed.starts_with('{') {
        return translate_structured(trimmed);
    }

    let root = match hl7v3::parse(raw) {
        Ok(root) => root,
        Err(err) => {
            error!("Unable to parse response body: {}", err);
            return server_error_response();
        }
    };

    if root.find_descendant("CancellationResponse").is_some() {
        return cancellation::translate_cancel_response(&root);
    }

    match Acknowledgement::from_element(&root) {
        Some(acknowledgement) => translate_acknowledgement(&root, &acknowledgement),
        None => {
            error!("Unhandled response message '{}'", root.name);
            server_error_response()
        }
    }
}

/// Bodies that are already FHIR are passed through unchanged.
fn translate_structured(raw: &str) -> TranslatedResponse {
    match serde_json::from_str::<Resource>(raw) {
        Ok(Resource::Bundle(bundle)) => TranslatedResponse {
            status_code: 200,
            body: ResponseBody::Bundle(bundle),
        },
        Ok(Resource::OperationOutcome(outcome)) => {
            let failed = outcome
                .issue
                .iter()
                .any(|issue| matches!(issue.severity, Severity::Fatal | Severity::Error));

            TranslatedResponse {
                status_code: if failed { 400 } else { 200 },
                body: ResponseBody::OperationOutcome(*outcome),
            }
        }
        Ok(_) | Err(_) => server_error_response(),
    }
}

/// Synchronous and asynchronous acknowledgements share the status mapping:
/// accepted is success, error and rejected are failures with one issue per
/// reported detail.
fn translate_acknowledgement(
    root: &Element,
    acknowledgement: &Acknowledgement,
) -> TranslatedResponse {
    let status_code = acknowledgement_status(acknowledgement.type_);

    if acknowledgement.type_ == AcknowledgementType::Accepted {
        return TranslatedResponse {
            status_code,
            body: ResponseBody::OperationOutcome(informational_outcome()),
        };
    }

    let mut issues: Vec<Issue> = acknowledgement
        .details
        .iter()
        .map(|detail| error_issue(detail.code.clone(), detail.display.clone()))
        .collect();

    // asynchronous responses justify the rejection in the control act wrapper
    for event in root.find_all_descendants("justifyingDetectedIssueEvent") {
        if let Some(code) = event.find("code") {
            issues.push(error_issue(
                code.attribute("code").map(str::to_owned),
                code.attribute("displayName").map(str::to_owned),
            ));
        }
    }

    if issues.is_empty() {
        issues.push(error_issue(None, Some("Unknown acknowledgement failure".to_owned())));
    }

    TranslatedResponse {
        status_code,
        body: ResponseBody::OperationOutcome(OperationOutcome { issue: issues }),
    }
}

fn acknowledgement_status(type_: AcknowledgementType) -> u16 {
    match type_ {
        AcknowledgementType::Accepted => 200,
        AcknowledgementType::Error => 400,
        AcknowledgementType::Rejected => 500,
    }
}

fn error_issue(code: Option<String>, display: Option<String>) -> Issue {
    Issue {
        severity: Severity::Error,
        code: IssueType::Invalid,
        details: Some(CodeableConcept {
            coding: vec![Coding {
                system: Some(systems::SPINE_ERROR.to_owned()),
                code,
                display,
            }],
            text: None,
        }),
        diagnostics: None,
        expression: Vec::new(),
    }
}

fn informational_outcome() -> OperationOutcome {
    OperationOutcome {
        issue: vec![Issue {
            severity: Severity::Information,
            code: IssueType::Informational,
            details: None,
            diagnostics: None,
            expression: Vec::new(),
        }],
    }
}

pub(crate) fn server_error_response() -> TranslatedResponse {
    TranslatedResponse {
        status_code: 500,
        body: ResponseBody::OperationOutcome(OperationOutcome {
            issue: vec![Issue {
                severity: Severity::Fatal,
                code: IssueType::Processing,
                details: None,
                diagnostics: Some("Unhandled response".to_owned()),
                expression: Vec::new(),
            }],
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SYNC_ACCEPTED: &str = r#"<hl7:MCCI_IN010000UK13 xmlns:hl7="urn:hl7-org:v3">
        <hl7:id root="A7B86F8D-1DBD-FC28-E050-D20AE3AFFFFF"/>
        <hl7:acknowledgement typeCode="AA">
            <hl7:messageRef><hl7:id root="6B2192E2-D069-4FB7-A086-C1328D2B54AE"/></hl7:messageRef>
        </hl7:acknowledgement>
    </hl7:MCCI_IN010000UK13>"#;

    const SYNC_ERROR: &str = r#"<hl7:MCCI_IN010000UK13 xmlns:hl7="urn:hl7-org:v3">
        <hl7:acknowledgement typeCode="AE">
            <hl7:acknowledgementDetail typeCode="ER">
                <hl7:code codeSystem="2.16.840.1.113883.2.1.3.2.4.17.32" code="5000" displayName="Unable to process message"/>
            </hl7:acknowledgementDetail>
        </hl7:acknowledgement>
    </hl7:MCCI_IN010000UK13>"#;

    #[test]
    fn accepted_acknowledgement_is_success() {
        let actual = translate_response(SYNC_ACCEPTED);

        assert_eq!(actual.status_code, 200);
    }

    #[test]
    fn error_acknowledgement_reports_each_detail() {
        let actual = translate_response(SYNC_ERROR);

        assert_eq!(actual.status_code, 400);
        match actual.body {
            ResponseBody::OperationOutcome(outcome) => {
                assert_eq!(outcome.issue.len(), 1);
                let coding = &outcome.issue[0].details.as_ref().unwrap().coding[0];
                assert_eq!(coding.code.as_deref(), Some("5000"));
            }
            body => panic!("unexpected body: {:?}", body),
        }
    }

    #[test]
    fn garbage_maps_to_server_error() {
        let actual = translate_response("not xml at all");

        assert_eq!(actual.status_code, 500);
    }

    #[test]
    fn structured_bundle_passes_through() {
        let raw = r#"{"resourceType":"Bundle","type":"message"}"#;

        let actual = translate_response(raw);

        assert_eq!(actual.status_code, 200);
        assert!(matches!(actual.body, ResponseBody::Bundle(_)));
    }
}
