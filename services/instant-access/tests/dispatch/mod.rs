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

use std::sync::Arc;

use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::StatusCode;
use iasign_instant_access::*;
use pretty_assertions::assert_eq;

use super::*;

const GET_USER_ID: &str =
    r#"{"operation":"GetUserId","infoField1":"nobody@amazon.com","infoField2":"amazon"}"#;

fn dispatcher(sink: &MemorySink) -> Dispatcher {
    let mut dispatcher = Dispatcher::new(store())
        .with_signer(signer())
        .with_log_sink(sink.clone());
    dispatcher.on_get_user_id(|req| {
        assert_eq!(req.info_field1, "nobody@amazon.com");
        Ok(GetUserIdResponse::ok("1234"))
    });
    dispatcher
}

fn assert_failed(resp: &http::Response<bytes::Bytes>) {
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(resp.headers()[CONTENT_TYPE], "text/plain");
    assert!(resp.body().is_empty());
}

#[test]
fn test_get_user_id() {
    init_logger();
    let sink = MemorySink::default();

    let resp = dispatcher(&sink).process(signed_request(GET_USER_ID));

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[CONTENT_TYPE], "application/json");
    assert_eq!(
        std::str::from_utf8(resp.body()).unwrap(),
        r#"{"userId":"1234","response":"OK"}"#
    );
    assert!(sink.messages(Level::Error).is_empty());
}

#[test]
fn test_every_operation() {
    init_logger();
    let sink = MemorySink::default();
    let mut dispatcher = dispatcher(&sink);
    dispatcher
        .on_purchase(|req| {
            assert_eq!(req.reason, PurchaseReason::Fulfill);
            Ok(PurchaseResponse {
                response: PurchaseResponseValue::Ok,
            })
        })
        .on_revoke(|_| {
            Ok(RevokeResponse {
                response: RevokeResponseValue::FailInvalidPurchaseToken,
            })
        })
        .on_subscription_activate(|_| {
            Ok(SubscriptionActivateResponse {
                response: SubscriptionActivateResponseValue::Ok,
            })
        })
        .on_subscription_deactivate(|req| {
            assert_eq!(req.period, SubscriptionDeactivatePeriod::GracePeriod);
            Ok(SubscriptionDeactivateResponse {
                response: SubscriptionDeactivateResponseValue::FailOther,
            })
        });

    let cases = [
        (
            r#"{"operation":"Purchase","reason":"FULFILL","productId":"GamePack1","userId":"123456","purchaseToken":"6f3092e5-0326-42b7-a107-416234d548d8"}"#,
            r#"{"response":"OK"}"#,
        ),
        (
            r#"{"operation":"Revoke","reason":"PAYMENT_PROBLEM","productId":"GamePack1","userId":"123456","purchaseToken":"6f3092e5-0326-42b7-a107-416234d548d8"}"#,
            r#"{"response":"FAIL_INVALID_PURCHASE_TOKEN"}"#,
        ),
        (
            r#"{"operation":"SubscriptionActivate","subscriptionId":"subscriptionId","productId":"GamePack1","userId":"1234"}"#,
            r#"{"response":"OK"}"#,
        ),
        (
            r#"{"operation":"SubscriptionDeactivate","subscriptionId":"subscriptionId","reason":"NOT_RENEWED","period":"GRACE_PERIOD"}"#,
            r#"{"response":"FAIL_OTHER"}"#,
        ),
    ];

    for (body, expected) in cases {
        let resp = dispatcher.process(signed_request(body));
        assert_eq!(resp.status(), StatusCode::OK, "request {body} must succeed");
        assert_eq!(std::str::from_utf8(resp.body()).unwrap(), expected);
    }
}

#[test]
fn test_no_handler_registered() {
    init_logger();
    let sink = MemorySink::default();
    let dispatcher = Dispatcher::new(store())
        .with_signer(signer())
        .with_log_sink(sink.clone());
    assert!(!dispatcher.is_registered(Operation::GetUserId));

    assert_failed(&dispatcher.process(signed_request(GET_USER_ID)));

    let errors = sink.messages(Level::Error);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("request failed while routing"));
}

#[test]
fn test_tampered_signature() {
    init_logger();
    let sink = MemorySink::default();

    let mut req = signed_request(GET_USER_ID);
    let authorization = req.headers()[AUTHORIZATION].to_str().unwrap().to_string();
    let (head, signature) = authorization.rsplit_once('=').unwrap();
    let flipped = if signature.starts_with('0') { '1' } else { '0' };
    let tampered = format!("{head}={flipped}{}", &signature[1..]);
    req.headers_mut()
        .insert(AUTHORIZATION, tampered.parse().unwrap());

    assert_failed(&dispatcher(&sink).process(req));
    assert!(sink.messages(Level::Error)[0].starts_with("request failed while verifying"));
}

#[test]
fn test_tampered_body() {
    init_logger();
    let sink = MemorySink::default();

    let req = signed_request(GET_USER_ID).map(|_| {
        bytes::Bytes::from_static(br#"{"operation":"GetUserId","infoField1":"root@amazon.com"}"#)
    });

    assert_failed(&dispatcher(&sink).process(req));
}

#[test]
fn test_unsigned_request() {
    init_logger();
    let sink = MemorySink::default();

    let mut req = signed_request(GET_USER_ID);
    req.headers_mut().remove(AUTHORIZATION);

    assert_failed(&dispatcher(&sink).process(req));
}

#[test]
fn test_unsupported_operation() {
    init_logger();
    let sink = MemorySink::default();

    let resp = dispatcher(&sink).process(signed_request(r#"{"operation":"Refund"}"#));

    assert_failed(&resp);
    let errors = sink.messages(Level::Error);
    assert!(errors[0].starts_with("request failed while extracting operation"));
    assert!(errors[0].contains("unsupported operation: Refund"));
}

#[test]
fn test_malformed_body() {
    init_logger();
    let sink = MemorySink::default();

    let resp = dispatcher(&sink).process(signed_request(
        r#"{"operation":"GetUserId","infoField2":"amazon"}"#,
    ));

    assert_failed(&resp);
    assert!(sink.messages(Level::Error)[0].starts_with("request failed while executing"));
}

#[test]
fn test_handler_failed() {
    init_logger();
    let sink = MemorySink::default();
    let mut dispatcher = dispatcher(&sink);
    dispatcher.on_get_user_id(|_| anyhow::bail!("account database is down"));

    assert_failed(&dispatcher.process(signed_request(GET_USER_ID)));

    let errors = sink.messages(Level::Error);
    assert!(errors[0].contains("handler of GetUserId failed: account database is down"));
}

#[test]
fn test_invalid_response_type() {
    init_logger();
    let sink = MemorySink::default();
    let mut dispatcher = dispatcher(&sink);
    dispatcher.register(Operation::GetUserId, |_req: OperationRequest| {
        Ok(OperationResponse::from(PurchaseResponse {
            response: PurchaseResponseValue::Ok,
        }))
    });

    assert_failed(&dispatcher.process(signed_request(GET_USER_ID)));
    assert!(sink.messages(Level::Error)[0].starts_with("request failed while validating response"));
}

#[test]
fn test_empty_credential_store() {
    init_logger();
    let sink = MemorySink::default();
    let mut dispatcher = Dispatcher::new(Arc::new(CredentialStore::new()))
        .with_signer(signer())
        .with_log_sink(sink.clone());
    dispatcher.on_get_user_id(|_| Ok(GetUserIdResponse::ok("1234")));

    assert_failed(&dispatcher.process(signed_request(GET_USER_ID)));
    assert!(sink.messages(Level::Error)[0].contains("empty credential store"));
}

#[test]
fn test_concurrent_requests() {
    init_logger();
    let sink = MemorySink::default();
    let dispatcher = dispatcher(&sink);

    std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| s.spawn(|| dispatcher.process(signed_request(GET_USER_ID))))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap().status(), StatusCode::OK);
        }
    });
    assert_eq!(sink.messages(Level::Info).len(), 4);
}
