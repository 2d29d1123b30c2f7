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

use std::fmt::Write as _;
use std::io::Write as _;
use std::time::Duration;

use bytes::Bytes;
use http::request::Parts;
use http::{header, HeaderValue};
use iasign_core::hash::{hex_hmac_sha256, hex_sha256, hmac_sha256};
use iasign_core::time::{format_date, format_iso8601, now, parse_iso8601, DateTime};
use iasign_core::{normalize_path, Error, ErrorKind, Result, SigningRequest};
use log::{debug, warn};

use crate::constants::{ALGORITHM_ID, TIME_TOLERANCE, X_AMZ_DATE};
use crate::{AuthorizationHeader, Config, Credential, CredentialScope, CredentialStore};

/// RequestSigner signs and verifies requests with `DTA1-HMAC-SHA256`.
///
/// The signing key is derived per day from the credential's secret key, and
/// the signature covers the method, the normalized path, every header present
/// at signing time and a hash of the body. The query string is never signed.
#[derive(Debug, Clone)]
pub struct RequestSigner {
    time: Option<DateTime>,
    time_tolerance: Duration,
}

impl Default for RequestSigner {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestSigner {
    /// Create a new signer using the default time tolerance.
    pub fn new() -> Self {
        Self {
            time: None,
            time_tolerance: TIME_TOLERANCE,
        }
    }

    /// Create a new signer from config.
    pub fn from_config(config: &Config) -> Self {
        Self::new().with_time_tolerance(config.time_tolerance())
    }

    /// Specify the signing and verifying time.
    ///
    /// # Note
    ///
    /// We should always take current time to sign requests.
    /// Only use this function for testing.
    pub fn with_time(mut self, time: DateTime) -> Self {
        self.time = Some(time);
        self
    }

    /// Specify the maximum distance between a request's `x-amz-date` and now.
    pub fn with_time_tolerance(mut self, tolerance: Duration) -> Self {
        self.time_tolerance = tolerance;
        self
    }

    /// Sign the request in place.
    ///
    /// `x-amz-date` is set to the signing time and any previous `authorization`
    /// header is dropped before signing, so signing twice is fine.
    pub fn sign(&self, req: &mut SigningRequest, cred: &Credential) -> Result<()> {
        let now = self.time.unwrap_or_else(now);
        let (short_date, iso_date) = (format_date(now), format_iso8601(now));

        req.headers
            .insert(X_AMZ_DATE, HeaderValue::from_str(&iso_date)?);
        req.headers.remove(header::AUTHORIZATION);

        let authorization = self.authorization_header(req, cred, &short_date, &iso_date)?;
        debug!("signing request with header: {authorization}");

        let mut value = HeaderValue::from_str(&authorization.to_string())?;
        value.set_sensitive(true);
        req.headers.insert(header::AUTHORIZATION, value);

        Ok(())
    }

    /// Sign an http request in place.
    pub fn sign_parts(&self, parts: &mut Parts, body: &[u8], cred: &Credential) -> Result<()> {
        let mut req = SigningRequest::build(parts, Bytes::copy_from_slice(body));
        let signed = self.sign(&mut req, cred);
        req.apply(parts);
        signed
    }

    /// Verify the request against the credentials in `store`.
    ///
    /// Returns `Ok(false)` for every request that fails authentication. The
    /// only error is an empty `store`, which is a misconfiguration.
    pub fn verify(&self, req: &SigningRequest, store: &CredentialStore) -> Result<bool> {
        match self.authenticate(req, store) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == ErrorKind::EmptyCredentialStore => Err(err),
            Err(err) => {
                warn!("{err}, aborting request verification");
                Ok(false)
            }
        }
    }

    /// Authenticate the request against the credentials in `store`.
    ///
    /// Same checks as [`RequestSigner::verify`], but the error tells why the
    /// request was rejected.
    pub fn authenticate(&self, req: &SigningRequest, store: &CredentialStore) -> Result<()> {
        if store.is_empty() {
            return Err(Error::new(
                ErrorKind::EmptyCredentialStore,
                "empty credential store",
            ));
        }

        let now = self.time.unwrap_or_else(now);

        let Some(request_iso_date) = req.header_get(X_AMZ_DATE) else {
            return Err(missing_header(X_AMZ_DATE));
        };
        let Some(actual) = req.header_get(header::AUTHORIZATION.as_str()) else {
            return Err(missing_header(header::AUTHORIZATION.as_str()));
        };
        let authorization = AuthorizationHeader::parse(actual)?;

        // Headers added after signing don't take part in the signature.
        let mut signed_req = req.clone();
        let signed_headers = authorization.signed_headers();
        signed_req.header_retain(|k| signed_headers.iter().any(|h| h == k));

        let request_time = parse_iso8601(request_iso_date).map_err(|e| {
            Error::new(
                ErrorKind::MalformedRequestDate,
                format!("invalid {X_AMZ_DATE}: {request_iso_date}"),
            )
            .with_source(e)
        })?;
        let delta = (request_time - now).num_seconds().unsigned_abs();
        if delta > self.time_tolerance.as_secs() {
            return Err(Error::new(
                ErrorKind::ClockSkewExceeded,
                format!("time tolerance exceeded by request dated {request_iso_date}"),
            ));
        }

        let scope = authorization.credential();
        let Some(cred) = store.get(&scope.key_id) else {
            return Err(Error::new(
                ErrorKind::UnknownCredential,
                format!("public key not found: {}", scope.key_id),
            ));
        };

        if format_date(request_time) != scope.date {
            return Err(Error::new(
                ErrorKind::CredentialDateMismatch,
                "request date and credential date don't match",
            ));
        }

        if signed_req.headers.is_empty() {
            return Err(Error::new(
                ErrorKind::SignatureMismatch,
                "none of the signed headers is present",
            ));
        }

        // The signing key is derived from the verifier's date, not the request's.
        let expected = self
            .authorization_header(&signed_req, cred, &format_date(now), request_iso_date)?
            .to_string();
        debug!("verifying request with header: {actual}, against expected header: {expected}");

        if expected != actual {
            return Err(Error::new(
                ErrorKind::SignatureMismatch,
                "authorization signature doesn't match",
            ));
        }

        Ok(())
    }

    /// Compute the authorization header of `req` for the given dates.
    pub fn authorization_header(
        &self,
        req: &SigningRequest,
        cred: &Credential,
        short_date: &str,
        iso_date: &str,
    ) -> Result<AuthorizationHeader> {
        if short_date.is_empty() || iso_date.is_empty() {
            return Err(Error::invalid_argument("invalid dates"));
        }

        let timed_key = hmac_sha256(cred.secret_key().as_bytes(), short_date.as_bytes());

        let creq = canonical_request(req)?;
        debug!(
            "calculated canonical request: {}",
            String::from_utf8_lossy(&creq)
        );

        // StringToSign:
        //
        // DTA1-HMAC-SHA256
        // 20110909T233600Z
        // <empty scope>
        // <hashed_canonical_request>
        let string_to_sign = {
            let mut f = String::new();
            writeln!(f, "{ALGORITHM_ID}")?;
            writeln!(f, "{iso_date}")?;
            writeln!(f)?;
            write!(f, "{}", hex_sha256(&creq))?;
            f
        };
        debug!("calculated string to sign: {string_to_sign}");

        let signature = hex_hmac_sha256(&timed_key, string_to_sign.as_bytes());

        AuthorizationHeader::new(
            ALGORITHM_ID,
            req.header_name_to_vec_sorted()
                .into_iter()
                .map(String::from)
                .collect(),
            CredentialScope::new(cred.public_key(), short_date),
            signature,
        )
    }
}

fn missing_header(name: &str) -> Error {
    Error::new(
        ErrorKind::MissingRequiredHeader,
        format!("header {name} not found"),
    )
}

/// Build the canonical form of `req`:
///
/// ```text
/// POST
/// /service/linking
///
/// content-type:application/json
/// x-amz-date:20110909T233600Z
///
/// content-type;x-amz-date
/// <hex_sha256_of_body>
/// ```
///
/// Header values are kept as raw bytes, so the result is not always UTF-8.
pub fn canonical_request(req: &SigningRequest) -> Result<Vec<u8>> {
    // 256 is specially chosen to avoid reallocation for most requests.
    let mut f = Vec::with_capacity(256);

    writeln!(f, "{}", req.method)?;
    writeln!(f, "{}", normalize_path(&req.path))?;
    // Query is not part of the canonical request.
    writeln!(f)?;
    for (k, v) in req.header_to_vec_normalized() {
        write!(f, "{k}:")?;
        f.extend_from_slice(&v);
        writeln!(f)?;
    }
    writeln!(f)?;
    writeln!(f, "{}", req.header_name_to_vec_sorted().join(";"))?;
    write!(f, "{}", hex_sha256(&req.body))?;

    Ok(f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone, Utc};
    use http::Method;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    const SECRET_KEY: &str = "e2c4905c-83ba-41e7-9c1b-af8014a334cb";
    const PUBLIC_KEY: &str = "367caa91-cde5-48f2-91fe-bb95f546e9f0";
    const BODY: &str = r#"{"operation":"GetUserId","infoField1":"nobody@amazon.com","infoField2":"amazon"}"#;

    fn test_time() -> DateTime {
        Utc.with_ymd_and_hms(2011, 9, 9, 12, 36, 0).unwrap()
    }

    fn credential() -> Credential {
        Credential::new(SECRET_KEY, PUBLIC_KEY).unwrap()
    }

    fn store() -> CredentialStore {
        let mut store = CredentialStore::new();
        store.add(credential());
        store
    }

    fn request() -> SigningRequest {
        SigningRequest::new(Method::POST, "/service/linking")
            .with_header("Content-Type", "application/json")
            .unwrap()
            .with_header("X-Amz-Dta-Version", "1.0")
            .unwrap()
            .with_body(BODY)
    }

    fn signed_request() -> SigningRequest {
        let mut req = request();
        RequestSigner::new()
            .with_time(test_time())
            .sign(&mut req, &credential())
            .unwrap();
        req
    }

    fn verify_at(req: &SigningRequest, time: DateTime) -> bool {
        RequestSigner::new()
            .with_time(time)
            .verify(req, &store())
            .unwrap()
    }

    #[test]
    fn test_canonical_request() {
        let req = SigningRequest::new(Method::POST, "/a//b/../c")
            .with_header("Content-Type", "  application/json;   charset=utf-8 ")
            .unwrap()
            .with_header("x-amz-date", "20110909T123600Z")
            .unwrap()
            .with_body("body");

        let expected = format!(
            "POST\n/a/c\n\ncontent-type:application/json; charset=utf-8\nx-amz-date:20110909T123600Z\n\ncontent-type;x-amz-date\n{}",
            hex_sha256(b"body")
        );
        assert_eq!(canonical_request(&req).unwrap(), expected.as_bytes());
    }

    #[test]
    fn test_canonical_request_raw_header_bytes() {
        let mut req = SigningRequest::new(Method::GET, "/");
        req.headers
            .insert("x-amz-customer", HeaderValue::from_bytes(b"caf\xe9").unwrap());

        let creq = canonical_request(&req).unwrap();
        let mut expected = b"GET\n/\n\nx-amz-customer:caf\xe9\n\nx-amz-customer\n".to_vec();
        expected.extend_from_slice(hex_sha256(b"").as_bytes());
        assert_eq!(creq, expected);
    }

    #[test]
    fn test_sign() {
        let req = signed_request();

        assert_eq!(req.header_get(X_AMZ_DATE), Some("20110909T123600Z"));

        let authorization = AuthorizationHeader::parse(
            req.header_get(header::AUTHORIZATION.as_str()).unwrap(),
        )
        .unwrap();
        assert_eq!(authorization.algorithm(), ALGORITHM_ID);
        assert_eq!(
            authorization.signed_headers(),
            ["content-type", "x-amz-date", "x-amz-dta-version"]
        );
        assert_eq!(
            authorization.credential(),
            &CredentialScope::new(PUBLIC_KEY, "20110909")
        );
        assert_eq!(authorization.signature().len(), 64);
    }

    #[test]
    fn test_sign_matches_manual_computation() {
        let req = signed_request();

        let mut unsigned = req.clone();
        unsigned.headers.remove(header::AUTHORIZATION);
        let creq = canonical_request(&unsigned).unwrap();
        let string_to_sign = format!(
            "DTA1-HMAC-SHA256\n20110909T123600Z\n\n{}",
            hex_sha256(&creq)
        );
        let timed_key = hmac_sha256(SECRET_KEY.as_bytes(), b"20110909");
        let signature = hex_hmac_sha256(&timed_key, string_to_sign.as_bytes());

        assert_eq!(
            req.header_get("authorization").unwrap(),
            format!("DTA1-HMAC-SHA256 SignedHeaders=content-type;x-amz-date;x-amz-dta-version, Credential={PUBLIC_KEY}/20110909, Signature={signature}")
        );
    }

    #[test]
    fn test_sign_is_idempotent() {
        let mut req = signed_request();
        let first = req.header_get("authorization").unwrap().to_string();

        RequestSigner::new()
            .with_time(test_time())
            .sign(&mut req, &credential())
            .unwrap();
        assert_eq!(req.header_get("authorization").unwrap(), first);
    }

    #[test]
    fn test_sign_parts() {
        let mut req = http::Request::new(());
        *req.method_mut() = Method::POST;
        *req.uri_mut() = "https://example.com/service/linking?ignored=1"
            .parse()
            .unwrap();
        req.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        let (mut parts, _) = req.into_parts();

        let signer = RequestSigner::new().with_time(test_time());
        signer
            .sign_parts(&mut parts, BODY.as_bytes(), &credential())
            .unwrap();
        assert!(parts.headers.contains_key(header::AUTHORIZATION));

        let mut signed = SigningRequest::build(&mut parts, Bytes::from_static(BODY.as_bytes()));
        assert!(signer.verify(&signed, &store()).unwrap());

        signed.path = "/service/other".to_string();
        assert!(!signer.verify(&signed, &store()).unwrap());
    }

    #[test]
    fn test_verify() {
        let req = signed_request();
        assert!(verify_at(&req, test_time()));
    }

    #[test]
    fn test_verify_empty_store() {
        let err = RequestSigner::new()
            .verify(&signed_request(), &CredentialStore::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmptyCredentialStore);
    }

    #[test_case("content-type", "text/plain"; "signed header")]
    #[test_case("x-amz-date", "20110909T123601Z"; "request date")]
    fn test_verify_altered_signed_header(name: &str, value: &str) {
        let req = signed_request().with_header(name, value).unwrap();
        assert!(!verify_at(&req, test_time()));
    }

    #[test]
    fn test_verify_appended_signed_header_value() {
        let mut req = signed_request();
        req.headers
            .append(header::CONTENT_TYPE, HeaderValue::from_static("text/html"));
        assert!(!verify_at(&req, test_time()));

        let err = RequestSigner::new()
            .with_time(test_time())
            .authenticate(&req, &store())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SignatureMismatch);
    }

    #[test]
    fn test_verify_repeated_header_signed_as_sent() {
        let mut req = request();
        req.headers
            .append(header::ACCEPT, HeaderValue::from_static("text/html"));
        req.headers
            .append(header::ACCEPT, HeaderValue::from_static("application/json"));
        RequestSigner::new()
            .with_time(test_time())
            .sign(&mut req, &credential())
            .unwrap();
        assert!(verify_at(&req, test_time()));

        let mut reordered = req.clone();
        reordered.headers.remove(header::ACCEPT);
        reordered
            .headers
            .append(header::ACCEPT, HeaderValue::from_static("application/json"));
        reordered
            .headers
            .append(header::ACCEPT, HeaderValue::from_static("text/html"));
        assert!(!verify_at(&reordered, test_time()));
    }

    #[test]
    fn test_verify_altered_obs_text_header() {
        let mut req = request();
        req.headers.insert(
            "x-amz-customer",
            HeaderValue::from_bytes(b"caf\xe9").unwrap(),
        );
        RequestSigner::new()
            .with_time(test_time())
            .sign(&mut req, &credential())
            .unwrap();
        assert!(verify_at(&req, test_time()));

        req.headers.insert(
            "x-amz-customer",
            HeaderValue::from_bytes(b"caf\xe8").unwrap(),
        );
        assert!(!verify_at(&req, test_time()));
    }

    #[test]
    fn test_verify_altered_body() {
        let req = signed_request().with_body(BODY.replace("amazon", "Amazon"));
        assert!(!verify_at(&req, test_time()));
    }

    #[test]
    fn test_verify_altered_path() {
        let mut req = signed_request();
        req.path = "/service/linking/".to_string();
        assert!(!verify_at(&req, test_time()));
    }

    #[test]
    fn test_verify_ignores_unsigned_header() {
        let req = signed_request()
            .with_header("x-forwarded-for", "10.0.0.1")
            .unwrap();
        assert!(verify_at(&req, test_time()));
    }

    #[test]
    fn test_verify_ignores_equivalent_whitespace() {
        let req = signed_request()
            .with_header("content-type", "  application/json ")
            .unwrap();
        assert!(verify_at(&req, test_time()));
    }

    #[test_case(899, true; "inside tolerance")]
    #[test_case(900, true; "at tolerance")]
    #[test_case(901, false; "past tolerance")]
    #[test_case(-899, true; "inside tolerance before signing")]
    #[test_case(-901, false; "past tolerance before signing")]
    fn test_verify_time_tolerance(offset: i64, expected: bool) {
        let req = signed_request();
        let at = test_time() + TimeDelta::try_seconds(offset).unwrap();
        assert_eq!(verify_at(&req, at), expected);
    }

    #[test]
    fn test_verify_custom_time_tolerance() {
        let req = signed_request();
        let signer = RequestSigner::new()
            .with_time(test_time() + TimeDelta::try_seconds(61).unwrap())
            .with_time_tolerance(Duration::from_secs(60));
        assert!(!signer.verify(&req, &store()).unwrap());
    }

    #[test]
    fn test_verify_across_date_rollover() {
        let signed_at = Utc.with_ymd_and_hms(2011, 9, 9, 23, 59, 0).unwrap();
        let mut req = request();
        RequestSigner::new()
            .with_time(signed_at)
            .sign(&mut req, &credential())
            .unwrap();

        // The verifier derives the key from its own date.
        let verified_at = signed_at + TimeDelta::try_minutes(2).unwrap();
        assert!(!verify_at(&req, verified_at));
    }

    #[test]
    fn test_authenticate_reasons() {
        let signer = RequestSigner::new().with_time(test_time());
        let kind = |req: &SigningRequest| signer.authenticate(req, &store()).unwrap_err().kind();

        let mut req = signed_request();
        req.headers.remove(X_AMZ_DATE);
        assert_eq!(kind(&req), ErrorKind::MissingRequiredHeader);

        let mut req = signed_request();
        req.headers.remove(header::AUTHORIZATION);
        assert_eq!(kind(&req), ErrorKind::MissingRequiredHeader);

        let req = signed_request().with_header("authorization", "").unwrap();
        assert_eq!(kind(&req), ErrorKind::EmptyAuthorizationHeader);

        let req = signed_request()
            .with_header("authorization", "Bearer token")
            .unwrap();
        assert_eq!(kind(&req), ErrorKind::MalformedAuthorizationHeader);

        let req = signed_request()
            .with_header("x-amz-date", "2011-09-09T12:36:00Z")
            .unwrap();
        assert_eq!(kind(&req), ErrorKind::MalformedRequestDate);

        let req = signed_request()
            .with_header("x-amz-date", "20110908T123600Z")
            .unwrap();
        assert_eq!(kind(&req), ErrorKind::ClockSkewExceeded);

        let mut other = CredentialStore::new();
        other.add(Credential::new(SECRET_KEY, "other").unwrap());
        let err = signer.authenticate(&signed_request(), &other).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownCredential);

        let req = signed_request().with_body("{}");
        assert_eq!(kind(&req), ErrorKind::SignatureMismatch);

        let authorization = signed_request()
            .header_get("authorization")
            .unwrap()
            .replace("content-type;x-amz-date;x-amz-dta-version", "x-absent");
        let req = signed_request()
            .with_header("authorization", &authorization)
            .unwrap();
        assert_eq!(kind(&req), ErrorKind::SignatureMismatch);
    }

    #[test]
    fn test_authenticate_credential_date_mismatch() {
        let req = signed_request();
        let authorization = req
            .header_get("authorization")
            .unwrap()
            .replace("/20110909", "/20110908");
        let req = req.with_header("authorization", &authorization).unwrap();

        let err = RequestSigner::new()
            .with_time(test_time())
            .authenticate(&req, &store())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CredentialDateMismatch);
    }

    #[test]
    fn test_verify_wrong_secret() {
        let mut store = CredentialStore::new();
        store.add(Credential::new("another-secret", PUBLIC_KEY).unwrap());

        let ok = RequestSigner::new()
            .with_time(test_time())
            .verify(&signed_request(), &store)
            .unwrap();
        assert!(!ok);
    }
}
