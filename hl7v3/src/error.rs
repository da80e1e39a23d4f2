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

use quick_xml::Error as XmlError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("XML Error: {0}")]
    Xml(String),

    #[error("Unexpected End of Document")]
    UnexpectedEof,

    #[error("Document has no Root Element")]
    MissingRoot,

    #[error("Missing Element: {0}")]
    MissingElement(String),

    #[error("Missing Attribute: {0}")]
    MissingAttribute(String),

    #[error("Invalid Timestamp: {0}")]
    InvalidTimestamp(String),
}

impl From<XmlError> for Error {
    fn from(v: XmlError) -> Self {
        Self::Xml(v.to_string())
    }
}
