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

//! Canonical serialization of an element tree, following the exclusive
//! canonicalization rules that matter for this wire format:
//!
//! - no XML declaration, no insignificant whitespace
//! - namespace declarations before other attributes, attributes sorted
//!   lexicographically by name
//! - empty elements written as start/end tag pairs
//! - `&`, `<`, `>` and CR escaped in text; `&`, `<`, `"`, TAB, LF, CR
//!   escaped in attribute values
//!
//! The output bytes feed cryptographic digests; any change here changes
//! every signature this system produces or verifies.

use super::element::{Element, Node};

pub fn canonicalize(element: &Element) -> Vec<u8> {
    let mut out = String::new();
    write_element(element, &mut out);

    out.into_bytes()
}

/// Copy of a fragment with an explicit namespace declaration on its root.
/// Extracted sub-trees lose their ancestor's namespace context and must
/// regain it before hashing.
pub fn namespaced(element: &Element, ns: &str) -> Element {
    let mut element = element.clone();
    element.set_attribute("xmlns", ns);

    element
}

fn write_element(element: &Element, out: &mut String) {
    out.push('<');
    out.push_str(&element.name);

    for (key, value) in sorted_attributes(element) {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        escape_attribute(value, out);
        out.push('"');
    }
    out.push('>');

    for child in &element.children {
        match child {
            Node::Element(e) => write_element(e, out),
            Node::Text(t) => escape_text(t, out),
        }
    }

    out.push_str("</");
    out.push_str(&element.name);
    out.push('>');
}

fn sorted_attributes(element: &Element) -> Vec<(&String, &String)> {
    let mut attributes: Vec<_> = element
        .attributes
        .iter()
        .map(|(key, value)| (key, value))
        .collect();

    attributes.sort_by(|(a, _), (b, _)| {
        let a_ns = is_namespace_decl(a);
        let b_ns = is_namespace_decl(b);

        b_ns.cmp(&a_ns).then_with(|| a.cmp(b))
    });

    attributes
}

fn is_namespace_decl(name: &str) -> bool {
    name == "xmlns" || name.starts_with("xmlns:")
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\r' => out.push_str("&#xD;"),
            c => out.push(c),
        }
    }
}

fn escape_attribute(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '"' => out.push_str("&quot;"),
            '\t' => out.push_str("&#x9;"),
            '\n' => out.push_str("&#xA;"),
            '\r' => out.push_str("&#xD;"),
            c => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::HL7_V3_NS;

    fn example() -> Element {
        Element::new("author")
            .attr("typeCode", "AUT")
            .attr("contextControlCode", "OP")
            .child(Element::new("time").attr("value", "20201218123400"))
            .child(Element::new("note").text("5 < 6 & \"quotes\""))
    }

    #[test]
    fn output_is_idempotent() {
        let element = example();

        let first = canonicalize(&element);
        let second = canonicalize(&element);

        assert_eq!(first, second);
    }

    #[test]
    fn attributes_are_sorted_and_namespace_comes_first() {
        let element = namespaced(&example(), HL7_V3_NS);

        let actual = String::from_utf8(canonicalize(&element)).unwrap();

        assert!(actual.starts_with(
            "<author xmlns=\"urn:hl7-org:v3\" contextControlCode=\"OP\" typeCode=\"AUT\">"
        ));
    }

    #[test]
    fn empty_elements_use_start_end_pairs() {
        let actual =
            String::from_utf8(canonicalize(&Element::new("time").attr("value", "x"))).unwrap();

        assert_eq!(actual, "<time value=\"x\"></time>");
    }

    #[test]
    fn text_and_attributes_are_escaped() {
        let actual = String::from_utf8(canonicalize(&example())).unwrap();

        assert!(actual.contains("5 &lt; 6 &amp; \"quotes\""));
    }

    #[test]
    fn namespaced_overrides_existing_declaration() {
        let element = Element::new("x").attr("xmlns", "urn:other");

        let actual = namespaced(&element, HL7_V3_NS);

        assert_eq!(actual.attribute("xmlns"), Some(HL7_V3_NS));
        assert_eq!(actual.attributes.len(), 1);
    }
}
