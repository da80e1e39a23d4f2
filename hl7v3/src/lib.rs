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

pub mod c14n;
pub mod codes;
pub mod datatypes;
pub mod dispense;
pub mod element;
pub mod error;
pub mod fragments;
pub mod messaging;
pub mod prescription;
pub mod read;
pub mod withdraw;

pub use c14n::{canonicalize, namespaced};
pub use element::{Element, Node, ToElement, HL7_V3_NS, XML_DSIG_NS};
pub use error::Error;
pub use read::parse;
