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

use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::str::FromStr;

use iasign_core::utils::Redact;
use iasign_core::{Context, Error, ErrorKind, Result};
use log::debug;

/// Credential that holds the secret key and the public key identifying it.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    secret_key: String,
    public_key: String,
}

impl Credential {
    /// Create a new credential.
    ///
    /// Both keys must be non-empty.
    pub fn new(secret_key: impl Into<String>, public_key: impl Into<String>) -> Result<Self> {
        let (secret_key, public_key) = (secret_key.into(), public_key.into());
        if secret_key.is_empty() || public_key.is_empty() {
            return Err(Error::invalid_argument("invalid credential data"));
        }

        Ok(Self {
            secret_key,
            public_key,
        })
    }

    /// The secret key used to derive signing keys.
    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }

    /// The public key sent on the wire as the key id.
    pub fn public_key(&self) -> &str {
        &self.public_key
    }
}

impl Debug for Credential {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("secret_key", &Redact::from(&self.secret_key))
            .field("public_key", &self.public_key)
            .finish()
    }
}

/// CredentialStore maps public keys to credentials.
///
/// The store is meant to be populated once at startup and then shared
/// read-only between requests. It does no locking of its own: mutating it
/// while requests are verified against it needs external synchronization.
///
/// Credentials can be loaded from a string or a file where each line holds a
/// secret key and a public key separated by whitespace:
///
/// ```text
/// 69b2048d-8bf8-4c1c-b49d-e6114897a9a5 dce53190-1f70-4206-ad28-0e1ab3683161
/// ```
#[derive(Clone, Default)]
pub struct CredentialStore {
    store: HashMap<String, Credential>,
}

impl CredentialStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the credential for a public key.
    ///
    /// Returns `None` for an empty or unknown key.
    pub fn get(&self, public_key: &str) -> Option<&Credential> {
        if public_key.is_empty() {
            return None;
        }
        self.store.get(public_key)
    }

    /// All credentials keyed by public key.
    pub fn get_all(&self) -> &HashMap<String, Credential> {
        &self.store
    }

    /// Iterate over all credentials.
    pub fn iter(&self) -> impl Iterator<Item = &Credential> {
        self.store.values()
    }

    /// Number of credentials in the store.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Check if the store holds no credential.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Add a credential, replacing any credential with the same public key.
    pub fn add(&mut self, credential: Credential) {
        self.store
            .insert(credential.public_key.clone(), credential);
    }

    /// Remove the credential for a public key.
    pub fn remove(&mut self, public_key: &str) -> Option<Credential> {
        self.store.remove(public_key)
    }

    /// Load credentials from `contents`.
    ///
    /// Blank lines are skipped. Every other line must carry a secret key and a
    /// public key; tokens after the second are ignored. When a public key shows
    /// up more than once, the last line wins. Nothing is added to the store
    /// unless every line is valid.
    pub fn load(&mut self, contents: &str) -> Result<()> {
        if contents.trim().is_empty() {
            return Err(Error::new(
                ErrorKind::EmptyCredentialInput,
                "empty key container",
            ));
        }

        let mut credentials = Vec::new();
        for (idx, line) in contents.split('\n').enumerate() {
            if line.trim().is_empty() {
                continue;
            }

            let mut keys = line.split_whitespace();
            let (Some(secret_key), Some(public_key)) = (keys.next(), keys.next()) else {
                return Err(Error::new(
                    ErrorKind::MalformedCredentialLine,
                    format!("invalid credentials format found on line {idx}"),
                ));
            };
            credentials.push(Credential::new(secret_key, public_key)?);
        }

        debug!("loaded {} credentials", credentials.len());
        for credential in credentials {
            self.add(credential);
        }
        Ok(())
    }

    /// Load credentials from the file at `path` through the context's file reader.
    pub async fn load_from_file(&mut self, ctx: &Context, path: &str) -> Result<()> {
        if path.is_empty() {
            return Err(Error::new(
                ErrorKind::CredentialFileNotFound,
                "invalid keys file path",
            ));
        }

        let contents = ctx.file_read_as_string(path).await.map_err(|e| {
            Error::new(
                ErrorKind::CredentialFileNotFound,
                format!("failed to read keys file: {path}"),
            )
            .with_source(e)
        })?;

        self.load(&contents)
    }
}

impl FromStr for CredentialStore {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut store = CredentialStore::new();
        store.load(s)?;
        Ok(store)
    }
}

impl Debug for CredentialStore {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.store.values()).finish()
    }
}
