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

//! Reader for inbound wire XML. Element and attribute names are reduced to
//! their local part and namespace declarations are dropped: consumers match
//! on local names, and fragments are re-namespaced explicitly before any
//! canonicalization (`c14n::namespaced`).

use quick_xml::{events::Event, Reader};

use super::element::{Element, Node};
use super::error::Error;

pub fn parse(input: &str) -> Result<Element, Error> {
    let mut reader = Reader::from_str(input);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut stack: Vec<Element> = Vec::new();

    loop {
        match reader.read_event(&mut buf)? {
            Event::Start(start) => {
                let element = element_from_tag(&reader, start.name(), start.attributes())?;
                stack.push(element);
            }
            Event::Empty(start) => {
                let element = element_from_tag(&reader, start.name(), start.attributes())?;
                if stack.is_empty() {
                    return Ok(element);
                }

                push_child(&mut stack, element)?;
            }
            Event::Text(text) => {
                let text = text.unescape_and_decode(&reader)?;
                if !text.is_empty() {
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(Node::Text(text)),
                        None => return Err(Error::MissingRoot),
                    }
                }
            }
            Event::CData(data) => {
                let text = reader.decode(&data)?.to_owned();
                match stack.last_mut() {
                    Some(parent) => parent.children.push(Node::Text(text)),
                    None => return Err(Error::MissingRoot),
                }
            }
            Event::End(_) => {
                let element = stack.pop().ok_or(Error::UnexpectedEof)?;
                if stack.is_empty() {
                    return Ok(element);
                }

                push_child(&mut stack, element)?;
            }
            Event::Eof => {
                return if stack.is_empty() {
                    Err(Error::MissingRoot)
                } else {
                    Err(Error::UnexpectedEof)
                };
            }
            _ => (),
        }

        buf.clear();
    }
}

fn element_from_tag(
    reader: &Reader<&[u8]>,
    name: &[u8],
    attributes: quick_xml::events::attributes::Attributes,
) -> Result<Element, Error> {
    let mut element = Element::new(local_name(reader.decode(name)?));

    for attribute in attributes {
        let attribute = attribute?;
        let key = reader.decode(attribute.key)?;
        if key == "xmlns" || key.starts_with("xmlns:") {
            continue;
        }

        let value = attribute.unescape_and_decode_value(reader)?;
        element.attributes.push((local_name(key).to_owned(), value));
    }

    Ok(element)
}

fn push_child(stack: &mut Vec<Element>, element: Element) -> Result<(), Error> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(Node::Element(element));

            Ok(())
        }
        None => Ok(stack.push(element)),
    }
}

fn local_name(name: &str) -> &str {
    match name.find(':') {
        Some(pos) => &name[pos + 1..],
        None => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_prefixes_and_namespace_declarations() {
        let actual = parse(
            r#"<hl7:MCCI_IN010000UK13 xmlns:hl7="urn:hl7-org:v3"><hl7:id root="A"/></hl7:MCCI_IN010000UK13>"#,
        )
        .unwrap();

        assert_eq!(actual.name, "MCCI_IN010000UK13");
        assert!(actual.attributes.is_empty());
        assert_eq!(actual.find("id").unwrap().attribute("root"), Some("A"));
    }

    #[test]
    fn preserves_text_content() {
        let actual = parse("<name><family>SMITH &amp; SON</family></name>").unwrap();

        assert_eq!(
            actual.find("family").unwrap().text_content(),
            "SMITH & SON"
        );
    }

    #[test]
    fn rejects_truncated_documents() {
        assert!(matches!(parse("<a><b></b>"), Err(Error::UnexpectedEof)));
    }

    #[test]
    fn parse_then_canonicalize_is_stable() {
        let input = r#"<root b="2" a="1"><child/>text</root>"#;

        let first = crate::canonicalize(&parse(input).unwrap());
        let second = crate::canonicalize(&parse(input).unwrap());

        assert_eq!(first, second);
    }
}
