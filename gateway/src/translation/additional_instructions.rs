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

//! The additional-instructions sub-grammar. The first line item of a
//! prescription embeds medication-list entries and patient-info texts as
//! ordered `<medication>`/`<patientInfo>` fragments ahead of free text; a
//! leading `CD: <words>` line carries controlled drug wording.

use regex::Regex;

const CONTROLLED_DRUG_PREFIX: &str = "CD: ";

#[derive(Clone, PartialEq, Debug, Default)]
pub struct AdditionalInstructions {
    pub medication: Vec<String>,
    pub patient_info: Vec<String>,
    pub controlled_drug_words: String,
    pub additional_instructions: String,
}

/// Assembles the embedded form: medication entries first, then patient
/// info, then controlled drug wording and free text.
pub fn embed(value: &AdditionalInstructions) -> String {
    let mut out = String::new();
    for medication in &value.medication {
        out.push_str("<medication>");
        out.push_str(medication);
        out.push_str("</medication>");
    }
    for patient_info in &value.patient_info {
        out.push_str("<patientInfo>");
        out.push_str(patient_info);
        out.push_str("</patientInfo>");
    }
    if !value.controlled_drug_words.is_empty() {
        out.push_str(CONTROLLED_DRUG_PREFIX);
        out.push_str(&value.controlled_drug_words);
        if !value.additional_instructions.is_empty() {
            out.push('\n');
        }
    }
    out.push_str(&value.additional_instructions);

    out
}

/// Parses the embedded form back apart, preserving the order of the
/// leading tagged fragments.
pub fn parse(text: &str) -> AdditionalInstructions {
    lazy_static! {
        static ref MEDICATION: Regex = Regex::new(r#"^<medication>(.*?)</medication>"#).unwrap();
        static ref PATIENT_INFO: Regex = Regex::new(r#"^<patientInfo>(.*?)</patientInfo>"#).unwrap();
    }

    let mut remaining = text;
    let mut medication = Vec::new();
    let mut patient_info = Vec::new();

    loop {
        if let Some(captures) = MEDICATION.captures(remaining) {
            medication.push(captures[1].to_owned());
            remaining = &remaining[captures[0].len()..];
        } else if let Some(captures) = PATIENT_INFO.captures(remaining) {
            patient_info.push(captures[1].to_owned());
            remaining = &remaining[captures[0].len()..];
        } else {
            break;
        }
    }

    let (controlled_drug_words, additional_instructions) = parse_controlled_drug(remaining);

    AdditionalInstructions {
        medication,
        patient_info,
        controlled_drug_words,
        additional_instructions,
    }
}

fn parse_controlled_drug(text: &str) -> (String, String) {
    match text.strip_prefix(CONTROLLED_DRUG_PREFIX) {
        Some(rest) => match rest.find('\n') {
            Some(separator) => (
                rest[..separator].to_owned(),
                rest[separator + 1..].to_owned(),
            ),
            None => (rest.to_owned(), String::new()),
        },
        None => (String::new(), text.to_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tagged_fragments_in_order() {
        let actual = parse(
            "<medication>Morphine 10mg</medication><patientInfo>Take with food</patientInfo>Some advice",
        );

        assert_eq!(actual.medication, vec!["Morphine 10mg".to_owned()]);
        assert_eq!(actual.patient_info, vec!["Take with food".to_owned()]);
        assert_eq!(actual.additional_instructions, "Some advice");
    }

    #[test]
    fn parses_controlled_drug_words() {
        let actual = parse("CD: twenty eight\nTake as directed");

        assert_eq!(actual.controlled_drug_words, "twenty eight");
        assert_eq!(actual.additional_instructions, "Take as directed");
    }

    #[test]
    fn controlled_drug_words_without_instructions() {
        let actual = parse("CD: twenty eight");

        assert_eq!(actual.controlled_drug_words, "twenty eight");
        assert_eq!(actual.additional_instructions, "");
    }

    #[test]
    fn embed_then_parse_round_trips() {
        let expected = AdditionalInstructions {
            medication: vec!["Morphine 10mg".into(), "Paracetamol 500mg".into()],
            patient_info: vec!["Take with food".into()],
            controlled_drug_words: "twenty eight".into(),
            additional_instructions: "Take as directed".into(),
        };

        let actual = parse(&embed(&expected));

        assert_eq!(actual, expected);
    }
}
