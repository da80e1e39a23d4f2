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

pub const HL7_V3_NS: &str = "urn:hl7-org:v3";
pub const XML_DSIG_NS: &str = "http://www.w3.org/2000/09/xmldsig#";

/// Generic XML element tree. The typed wire structs render into this form;
/// serialization of equal trees is byte-identical (see `c14n`).
#[derive(Clone, PartialEq, Debug)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

#[derive(Clone, PartialEq, Debug)]
pub enum Node {
    Element(Element),
    Text(String),
}

pub trait ToElement {
    fn to_element(&self) -> Element;
}

impl<'a, T: ToElement> ToElement for &'a T {
    fn to_element(&self) -> Element {
        (**self).to_element()
    }
}

impl Element {
    pub fn new<T: Into<String>>(name: T) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    pub fn child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    pub fn child_opt(mut self, child: Option<Element>) -> Self {
        if let Some(child) = child {
            self.children.push(Node::Element(child));
        }
        self
    }

    pub fn children<I: IntoIterator<Item = Element>>(mut self, children: I) -> Self {
        for child in children {
            self.children.push(Node::Element(child));
        }
        self
    }

    pub fn text<T: Into<String>>(mut self, text: T) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn set_attribute<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        let key = key.into();
        if let Some(entry) = self.attributes.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = value.into();
        } else {
            self.attributes.push((key, value.into()));
        }
    }

    /// Direct child element with the given local name.
    pub fn find(&self, name: &str) -> Option<&Element> {
        self.elements().find(|e| e.name == name)
    }

    pub fn find_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.elements().filter(move |e| e.name == name)
    }

    /// First element with the given local name anywhere beneath (and
    /// including) this one, depth first.
    pub fn find_descendant(&self, name: &str) -> Option<&Element> {
        if self.name == name {
            return Some(self);
        }

        self.elements().find_map(|e| e.find_descendant(name))
    }

    /// Every element with the given local name beneath (and including)
    /// this one, in document order.
    pub fn find_all_descendants<'a>(&'a self, name: &str) -> Vec<&'a Element> {
        let mut found = Vec::new();
        self.collect_descendants(name, &mut found);

        found
    }

    fn collect_descendants<'a>(&'a self, name: &str, found: &mut Vec<&'a Element>) {
        if self.name == name {
            found.push(self);
        }
        for child in self.elements() {
            child.collect_descendants(name, found);
        }
    }

    /// Walks a chain of direct children by local name.
    pub fn find_path(&self, path: &[&str]) -> Option<&Element> {
        let mut current = self;
        for name in path {
            current = current.find(name)?;
        }

        Some(current)
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    /// Concatenated text content of this element's direct text nodes.
    pub fn text_content(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                Node::Text(t) => Some(t.as_str()),
                Node::Element(_) => None,
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_path_walks_direct_children() {
        let tree = Element::new("root")
            .child(Element::new("a").child(Element::new("b").text("leaf")));

        let actual = tree.find_path(&["a", "b"]).unwrap().text_content();

        assert_eq!(actual, "leaf");
    }

    #[test]
    fn find_descendant_is_depth_first() {
        let tree = Element::new("root")
            .child(Element::new("x").child(Element::new("target").attr("n", "1")))
            .child(Element::new("target").attr("n", "2"));

        let actual = tree.find_descendant("target").unwrap();

        assert_eq!(actual.attribute("n"), Some("1"));
    }
}
