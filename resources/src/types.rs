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
use serde_json::Number;

use super::primitives::DateTime;

#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct Identifier {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<Extension>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct Coding {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct CodeableConcept {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub coding: Vec<Coding>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct Quantity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Number>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct Period {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<DateTime>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime>,
}

/// Reference to another resource. Either the URN form (`reference` points at
/// a bundle entry full-URL) or the identifier form (`identifier` carries a
/// system/value pair); the two forms are mutually exclusive per field and
/// resolving code states which one it expects.
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct Reference {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<Extension>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<Identifier>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl Reference {
    pub fn new<T: Into<String>>(reference: T) -> Self {
        Self {
            reference: Some(reference.into()),
            ..Default::default()
        }
    }

    pub fn from_identifier(identifier: Identifier) -> Self {
        Self {
            identifier: Some(identifier),
            ..Default::default()
        }
    }
}

#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct HumanName {
    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub use_: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub given: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prefix: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suffix: Vec<String>,
}

#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct ContactPoint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub use_: Option<String>,
}

#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct Address {
    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub use_: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub line: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    #[serde(rename = "postalCode", default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
}

/// Polymorphic extension value keyed by URL. Exactly one of the value forms
/// is populated; nested extension lists model the group-identifier style
/// extensions with shortForm/UUID sub-entries.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(from = "ExtensionRepr", into = "ExtensionRepr")]
pub struct Extension {
    pub url: String,
    pub value: Option<ExtensionValue>,
}

#[derive(Clone, PartialEq, Debug)]
pub enum ExtensionValue {
    Identifier(Identifier),
    Coding(Coding),
    String(String),
    Boolean(bool),
    UnsignedInt(u64),
    DateTime(DateTime),
    Reference(Reference),
    Quantity(Quantity),
    Nested(Vec<Extension>),
}

/// Wire form of an extension: one optional field per value type.
#[derive(Serialize, Deserialize)]
struct ExtensionRepr {
    url: String,

    #[serde(rename = "valueIdentifier", default, skip_serializing_if = "Option::is_none")]
    value_identifier: Option<Identifier>,

    #[serde(rename = "valueCoding", default, skip_serializing_if = "Option::is_none")]
    value_coding: Option<Coding>,

    #[serde(rename = "valueString", default, skip_serializing_if = "Option::is_none")]
    value_string: Option<String>,

    #[serde(rename = "valueBoolean", default, skip_serializing_if = "Option::is_none")]
    value_boolean: Option<bool>,

    #[serde(rename = "valueUnsignedInt", default, skip_serializing_if = "Option::is_none")]
    value_unsigned_int: Option<u64>,

    #[serde(rename = "valueDateTime", default, skip_serializing_if = "Option::is_none")]
    value_date_time: Option<DateTime>,

    #[serde(rename = "valueReference", default, skip_serializing_if = "Option::is_none")]
    value_reference: Option<Reference>,

    #[serde(rename = "valueQuantity", default, skip_serializing_if = "Option::is_none")]
    value_quantity: Option<Quantity>,

    #[serde(rename = "extension", default, skip_serializing_if = "Vec::is_empty")]
    extension: Vec<Extension>,
}

impl From<ExtensionRepr> for Extension {
    fn from(repr: ExtensionRepr) -> Self {
        let value = if let Some(v) = repr.value_identifier {
            Some(ExtensionValue::Identifier(v))
        } else if let Some(v) = repr.value_coding {
            Some(ExtensionValue::Coding(v))
        } else if let Some(v) = repr.value_string {
            Some(ExtensionValue::String(v))
        } else if let Some(v) = repr.value_boolean {
            Some(ExtensionValue::Boolean(v))
        } else if let Some(v) = repr.value_unsigned_int {
            Some(ExtensionValue::UnsignedInt(v))
        } else if let Some(v) = repr.value_date_time {
            Some(ExtensionValue::DateTime(v))
        } else if let Some(v) = repr.value_reference {
            Some(ExtensionValue::Reference(v))
        } else if let Some(v) = repr.value_quantity {
            Some(ExtensionValue::Quantity(v))
        } else if !repr.extension.is_empty() {
            Some(ExtensionValue::Nested(repr.extension))
        } else {
            None
        };

        Self {
            url: repr.url,
            value,
        }
    }
}

impl From<Extension> for ExtensionRepr {
    fn from(extension: Extension) -> Self {
        let mut repr = Self {
            url: extension.url,
            value_identifier: None,
            value_coding: None,
            value_string: None,
            value_boolean: None,
            value_unsigned_int: None,
            value_date_time: None,
            value_reference: None,
            value_quantity: None,
            extension: Vec::new(),
        };

        match extension.value {
            Some(ExtensionValue::Identifier(v)) => repr.value_identifier = Some(v),
            Some(ExtensionValue::Coding(v)) => repr.value_coding = Some(v),
            Some(ExtensionValue::String(v)) => repr.value_string = Some(v),
            Some(ExtensionValue::Boolean(v)) => repr.value_boolean = Some(v),
            Some(ExtensionValue::UnsignedInt(v)) => repr.value_unsigned_int = Some(v),
            Some(ExtensionValue::DateTime(v)) => repr.value_date_time = Some(v),
            Some(ExtensionValue::Reference(v)) => repr.value_reference = Some(v),
            Some(ExtensionValue::Quantity(v)) => repr.value_quantity = Some(v),
            Some(ExtensionValue::Nested(v)) => repr.extension = v,
            None => (),
        }

        repr
    }
}

impl Extension {
    pub fn new<T: Into<String>>(url: T, value: ExtensionValue) -> Self {
        Self {
            url: url.into(),
            value: Some(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn extension_value_forms() {
        let value = json!({
            "url": "https://fhir.nhs.uk/StructureDefinition/Extension-DM-GroupIdentifier",
            "extension": [
                {
                    "url": "shortForm",
                    "valueIdentifier": {
                        "system": "https://fhir.nhs.uk/Id/prescription-order-number",
                        "value": "E3E6FA-A83008-41F09Y"
                    }
                },
                {
                    "url": "UUID",
                    "valueIdentifier": {
                        "system": "https://fhir.nhs.uk/Id/prescription",
                        "value": "a5b9dc81-ccf4-4dab-b887-3d88e557febb"
                    }
                }
            ]
        });

        let actual: Extension = serde_json::from_value(value.clone()).unwrap();
        match &actual.value {
            Some(ExtensionValue::Nested(nested)) => {
                assert_eq!(nested.len(), 2);
                assert_eq!(nested[0].url, "shortForm");
            }
            x => panic!("unexpected extension value: {:?}", x),
        }

        let encoded = serde_json::to_value(&actual).unwrap();
        assert_eq!(encoded, value);
    }

    #[test]
    fn extension_without_value() {
        let actual: Extension = serde_json::from_value(json!({ "url": "x" })).unwrap();

        assert_eq!(actual.value, None);
    }
}
