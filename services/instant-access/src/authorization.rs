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

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use iasign_core::{Error, ErrorKind, Result};
use once_cell::sync::Lazy;
use regex::Regex;

static AUTHORIZATION_HEADER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\S+) SignedHeaders=(\S+), Credential=(\S+), Signature=(\S+)$")
        .expect("authorization header pattern must be valid")
});

/// The credential reference carried by an authorization header: `KEYID/DATE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialScope {
    /// Public key of the credential used to sign.
    pub key_id: String,
    /// Short date (`20110909`) of the signing time.
    pub date: String,
}

impl CredentialScope {
    /// Create a new credential scope.
    pub fn new(key_id: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            key_id: key_id.into(),
            date: date.into(),
        }
    }
}

/// AuthorizationHeader is the signature envelope sent in the `authorization` header:
///
/// ```text
/// DTA1-HMAC-SHA256 SignedHeaders=content-type;x-amz-date, Credential=KEYID/20110909, Signature=<hex>
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationHeader {
    algorithm: String,
    signed_headers: Vec<String>,
    credential: CredentialScope,
    signature: String,
}

impl AuthorizationHeader {
    /// Create a new authorization header.
    ///
    /// `signed_headers` is rendered in the given order, callers must sort it.
    /// Names are folded to lowercase. Every part must be a single token that
    /// survives [`AuthorizationHeader::parse`] unchanged: no whitespace, no `;`
    /// or `,` in header names, no `/` in the credential.
    pub fn new(
        algorithm: impl Into<String>,
        signed_headers: Vec<String>,
        credential: CredentialScope,
        signature: impl Into<String>,
    ) -> Result<Self> {
        let (algorithm, signature) = (algorithm.into(), signature.into());

        check_token("algorithm", &algorithm, &[])?;
        if signed_headers.is_empty() {
            return Err(Error::invalid_argument("empty signed headers"));
        }
        let signed_headers = signed_headers
            .into_iter()
            .map(|h| check_token("signed header", &h, &[';', ',']).map(|_| h.to_lowercase()))
            .collect::<Result<Vec<_>>>()?;
        check_token("credential key id", &credential.key_id, &['/', ','])?;
        check_token("credential date", &credential.date, &['/', ','])?;
        check_token("signature", &signature, &[])?;

        Ok(Self {
            algorithm,
            signed_headers,
            credential,
            signature,
        })
    }

    /// Parse an authorization header value.
    ///
    /// Signed header names are folded to lowercase. Anything after the date
    /// in the credential token is ignored.
    pub fn parse(value: &str) -> Result<Self> {
        if value.is_empty() {
            return Err(Error::new(
                ErrorKind::EmptyAuthorizationHeader,
                "invalid authorization header",
            ));
        }

        let Some(caps) = AUTHORIZATION_HEADER_PATTERN.captures(value) else {
            return Err(Error::new(
                ErrorKind::MalformedAuthorizationHeader,
                "unable to parse authorization header",
            ));
        };

        let signed_headers = caps[2].split(';').map(|h| h.to_lowercase()).collect();

        let mut credential = caps[3].split('/');
        let credential = match (credential.next(), credential.next()) {
            (Some(key_id), Some(date)) if !key_id.is_empty() && !date.is_empty() => {
                CredentialScope::new(key_id, date)
            }
            _ => {
                return Err(Error::new(
                    ErrorKind::InvalidCredentialFormat,
                    "invalid credential format",
                ))
            }
        };

        Self::new(&caps[1], signed_headers, credential, &caps[4]).map_err(|err| {
            Error::new(
                ErrorKind::MalformedAuthorizationHeader,
                "unable to parse authorization header",
            )
            .with_source(err)
        })
    }

    /// Algorithm used to compute the signature.
    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    /// Names of the headers covered by the signature.
    pub fn signed_headers(&self) -> &[String] {
        &self.signed_headers
    }

    /// Credential reference.
    pub fn credential(&self) -> &CredentialScope {
        &self.credential
    }

    /// Hex encoded signature.
    pub fn signature(&self) -> &str {
        &self.signature
    }
}

fn check_token(field: &str, value: &str, reserved: &[char]) -> Result<()> {
    if value.is_empty() {
        return Err(Error::invalid_argument(format!("empty {field}")));
    }
    if value
        .chars()
        .any(|c| c.is_whitespace() || reserved.contains(&c))
    {
        return Err(Error::invalid_argument(format!(
            "invalid character in {field}: {value:?}"
        )));
    }
    Ok(())
}

impl FromStr for AuthorizationHeader {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Display for AuthorizationHeader {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} SignedHeaders={}, Credential={}/{}, Signature={}",
            self.algorithm,
            self.signed_headers.join(";"),
            self.credential.key_id,
            self.credential.date,
            self.signature
        )
    }
}
