// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use iasign_core::{Error, ErrorKind, Result};
use serde::{Deserialize, Serialize};

use crate::operation::*;

/// Request to fulfill or regrant a purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRequest {
    pub reason: PurchaseReason,
    pub product_id: String,
    pub user_id: String,
    pub purchase_token: String,
}

/// Response to a [`PurchaseRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseResponse {
    pub response: PurchaseResponseValue,
}

/// Request to revoke a purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevokeRequest {
    pub reason: RevokeReason,
    pub product_id: String,
    pub user_id: String,
    pub purchase_token: String,
}

/// Response to a [`RevokeRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevokeResponse {
    pub response: RevokeResponseValue,
}

/// Request to activate a subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionActivateRequest {
    pub subscription_id: String,
    pub product_id: String,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_subscriptions_in_group: Option<u32>,
}

/// Response to a [`SubscriptionActivateRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionActivateResponse {
    pub response: SubscriptionActivateResponseValue,
}

/// Request to deactivate a subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionDeactivateRequest {
    pub subscription_id: String,
    pub reason: SubscriptionDeactivateReason,
    pub period: SubscriptionDeactivatePeriod,
}

/// Response to a [`SubscriptionDeactivateRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionDeactivateResponse {
    pub response: SubscriptionDeactivateResponseValue,
}

/// Request to look up the user id of a linked account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetUserIdRequest {
    pub info_field1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info_field2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info_field3: Option<String>,
}

/// Response to a [`GetUserIdRequest`].
///
/// `userId` is written before `response` and left out when unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetUserIdResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub response: GetUserIdResponseValue,
}

impl GetUserIdResponse {
    /// A successful lookup for `user_id`.
    pub fn ok(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            response: GetUserIdResponseValue::Ok,
        }
    }

    /// A failed lookup.
    pub fn fail(response: GetUserIdResponseValue) -> Self {
        Self {
            user_id: None,
            response,
        }
    }
}

/// A decoded request body, tagged by its `operation` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "operation")]
pub enum OperationRequest {
    Purchase(PurchaseRequest),
    Revoke(RevokeRequest),
    SubscriptionActivate(SubscriptionActivateRequest),
    SubscriptionDeactivate(SubscriptionDeactivateRequest),
    GetUserId(GetUserIdRequest),
}

impl OperationRequest {
    /// Read the operation tag of a request body without decoding the rest.
    pub fn extract_operation(body: &[u8]) -> Result<Operation> {
        #[derive(Deserialize)]
        struct Envelope {
            operation: String,
        }

        let envelope: Envelope = serde_json::from_slice(body).map_err(|e| {
            Error::new(ErrorKind::MalformedRequestBody, "invalid request envelope").with_source(e)
        })?;

        envelope.operation.parse().map_err(|e| {
            Error::new(
                ErrorKind::UnsupportedOperation,
                format!("unsupported operation: {}", envelope.operation),
            )
            .with_source(e)
        })
    }

    /// Decode a request body.
    pub fn from_json(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body).map_err(|e| {
            Error::new(ErrorKind::MalformedRequestBody, "invalid request body").with_source(e)
        })
    }

    /// Encode the request, `operation` field included.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| {
            Error::unexpected("failed to serialize request").with_source(e)
        })
    }

    /// The operation of this request.
    pub fn operation(&self) -> Operation {
        match self {
            OperationRequest::Purchase(_) => Operation::Purchase,
            OperationRequest::Revoke(_) => Operation::Revoke,
            OperationRequest::SubscriptionActivate(_) => Operation::SubscriptionActivate,
            OperationRequest::SubscriptionDeactivate(_) => Operation::SubscriptionDeactivate,
            OperationRequest::GetUserId(_) => Operation::GetUserId,
        }
    }
}

/// A response produced by a handler.
///
/// Serialized as the inner record, without any tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum OperationResponse {
    Purchase(PurchaseResponse),
    Revoke(RevokeResponse),
    SubscriptionActivate(SubscriptionActivateResponse),
    SubscriptionDeactivate(SubscriptionDeactivateResponse),
    GetUserId(GetUserIdResponse),
}

impl OperationResponse {
    /// The operation this response answers.
    pub fn operation(&self) -> Operation {
        match self {
            OperationResponse::Purchase(_) => Operation::Purchase,
            OperationResponse::Revoke(_) => Operation::Revoke,
            OperationResponse::SubscriptionActivate(_) => Operation::SubscriptionActivate,
            OperationResponse::SubscriptionDeactivate(_) => Operation::SubscriptionDeactivate,
            OperationResponse::GetUserId(_) => Operation::GetUserId,
        }
    }

    /// Encode the response body.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| {
            Error::unexpected("failed to serialize response").with_source(e)
        })
    }
}

macro_rules! impl_from_response {
    ($($variant:ident($ty:ty)),+ $(,)?) => {
        $(
            impl From<$ty> for OperationResponse {
                fn from(v: $ty) -> Self {
                    OperationResponse::$variant(v)
                }
            }
        )+
    };
}

impl_from_response!(
    Purchase(PurchaseResponse),
    Revoke(RevokeResponse),
    SubscriptionActivate(SubscriptionActivateResponse),
    SubscriptionDeactivate(SubscriptionDeactivateResponse),
    GetUserId(GetUserIdResponse),
);
