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

use super::primitives::Id;
use super::types::{Coding, Reference};

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct MessageHeader {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,

    #[serde(rename = "eventCoding")]
    pub event_coding: Coding,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<Reference>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Source>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub destination: Vec<Destination>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<Response>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub focus: Vec<Reference>,
}

#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct Source {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct Destination {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver: Option<Reference>,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Response {
    pub identifier: String,

    pub code: ResponseCode,
}

#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub enum ResponseCode {
    #[serde(rename = "ok")]
    Ok,
    #[serde(rename = "transient-error")]
    TransientError,
    #[serde(rename = "fatal-error")]
    FatalError,
}

/// Message events this gateway understands. The event code on the one
/// MessageHeader of an inbound bundle selects the translation pipeline.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Event {
    PrescriptionOrder,
    PrescriptionOrderUpdate,
    PrescriptionOrderResponse,
    DispenseNotification,
    DispenseClaim,
}

impl Event {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "prescription-order" => Some(Self::PrescriptionOrder),
            "prescription-order-update" => Some(Self::PrescriptionOrderUpdate),
            "prescription-order-response" => Some(Self::PrescriptionOrderResponse),
            "dispense-notification" => Some(Self::DispenseNotification),
            "dispense-claim" => Some(Self::DispenseClaim),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::PrescriptionOrder => "prescription-order",
            Self::PrescriptionOrderUpdate => "prescription-order-update",
            Self::PrescriptionOrderResponse => "prescription-order-response",
            Self::DispenseNotification => "dispense-notification",
            Self::DispenseClaim => "dispense-claim",
        }
    }
}

impl MessageHeader {
    pub fn event(&self) -> Option<Event> {
        self.event_coding.code.as_deref().and_then(Event::from_code)
    }
}
