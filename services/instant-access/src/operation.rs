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

//! Closed string value sets used on the wire.

/// Declare an enum whose variants map one to one to fixed wire strings.
///
/// The generated type exposes `ALL`, `as_str`, `is_valid` and implements
/// `Display`, `FromStr`, `Serialize` and `Deserialize` through the wire string.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $value:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $( $(#[$vmeta])* $variant, )+
        }

        impl $name {
            /// Every value, in declaration order.
            pub const ALL: &'static [$name] = &[$( $name::$variant ),+];

            /// The wire string of this value.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $value, )+
                }
            }

            /// Check if `s` is the wire string of one of the values.
            pub fn is_valid(s: &str) -> bool {
                Self::ALL.iter().any(|v| v.as_str() == s)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = iasign_core::Error;

            fn from_str(s: &str) -> iasign_core::Result<Self> {
                match s {
                    $( $value => Ok($name::$variant), )+
                    _ => Err(iasign_core::Error::invalid_argument(format!(
                        concat!("invalid ", stringify!($name), " value: {}"),
                        s
                    ))),
                }
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                struct ValueVisitor;

                impl serde::de::Visitor<'_> for ValueVisitor {
                    type Value = $name;

                    fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                        f.write_str(concat!("one of", $(" ", $value),+))
                    }

                    fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Self::Value, E> {
                        v.parse().map_err(|_| E::invalid_value(serde::de::Unexpected::Str(v), &self))
                    }
                }

                deserializer.deserialize_str(ValueVisitor)
            }
        }
    };
}

string_enum! {
    /// Operation carried by the `operation` field of every request body.
    pub enum Operation {
        /// Fulfill or regrant a purchase.
        Purchase => "Purchase",
        /// Revoke a purchase.
        Revoke => "Revoke",
        /// Activate a subscription.
        SubscriptionActivate => "SubscriptionActivate",
        /// Deactivate a subscription.
        SubscriptionDeactivate => "SubscriptionDeactivate",
        /// Look up the user id of a linked account.
        GetUserId => "GetUserId",
    }
}

string_enum! {
    /// Why a purchase is sent.
    pub enum PurchaseReason {
        Fulfill => "FULFILL",
        Regrant => "REGRANT",
    }
}

string_enum! {
    /// Outcome of a purchase.
    pub enum PurchaseResponseValue {
        Ok => "OK",
        FailUserNotEligible => "FAIL_USER_NOT_ELIGIBLE",
        FailUserInvalid => "FAIL_USER_INVALID",
        FailOther => "FAIL_OTHER",
    }
}

string_enum! {
    /// Why a purchase is revoked.
    pub enum RevokeReason {
        CustomerServiceRequest => "CUSTOMER_SERVICE_REQUEST",
        PaymentProblem => "PAYMENT_PROBLEM",
    }
}

string_enum! {
    /// Outcome of a revoke.
    pub enum RevokeResponseValue {
        Ok => "OK",
        FailUserInvalid => "FAIL_USER_INVALID",
        FailInvalidPurchaseToken => "FAIL_INVALID_PURCHASE_TOKEN",
        FailOther => "FAIL_OTHER",
    }
}

string_enum! {
    /// Outcome of a subscription activation.
    pub enum SubscriptionActivateResponseValue {
        Ok => "OK",
        FailUserInvalid => "FAIL_USER_INVALID",
        FailUserNotEligible => "FAIL_USER_NOT_ELIGIBLE",
        FailOther => "FAIL_OTHER",
    }
}

string_enum! {
    /// Why a subscription is deactivated.
    pub enum SubscriptionDeactivateReason {
        NotRenewed => "NOT_RENEWED",
        UserRequest => "USER_REQUEST",
        CustomerServiceRequest => "CUSTOMER_SERVICE_REQUEST",
        PaymentProblem => "PAYMENT_PROBLEM",
        UnableToFulfill => "UNABLE_TO_FULFILL",
        Testing => "TESTING",
    }
}

string_enum! {
    /// Period the subscription was in when deactivated.
    pub enum SubscriptionDeactivatePeriod {
        FreeTrial => "FREE_TRIAL",
        GracePeriod => "GRACE_PERIOD",
        NotStarted => "NOT_STARTED",
        Regular => "REGULAR",
    }
}

string_enum! {
    /// Outcome of a subscription deactivation.
    pub enum SubscriptionDeactivateResponseValue {
        Ok => "OK",
        FailInvalidSubscription => "FAIL_INVALID_SUBSCRIPTION",
        FailOther => "FAIL_OTHER",
    }
}

string_enum! {
    /// Outcome of a user id lookup.
    pub enum GetUserIdResponseValue {
        Ok => "OK",
        FailAccountInvalid => "FAIL_ACCOUNT_INVALID",
    }
}
