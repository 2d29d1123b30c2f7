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

use iasign_core::{Context, Error, ErrorKind, Result};
use log::debug;

use crate::{Config, CredentialStore};

/// Build the credential store described by `config`.
///
/// Inline [`Config::credentials`] win over [`Config::credentials_file`].
pub async fn load_credential_store(ctx: &Context, config: &Config) -> Result<CredentialStore> {
    let mut store = CredentialStore::new();

    match (&config.credentials, &config.credentials_file) {
        (Some(contents), _) => {
            debug!("loading credentials from config");
            store.load(contents)?;
        }
        (None, Some(path)) => {
            debug!("loading credentials from file {path}");
            store.load_from_file(ctx, path).await?;
        }
        (None, None) => {
            return Err(Error::new(
                ErrorKind::EmptyCredentialInput,
                "neither credentials nor credentials file is configured",
            ))
        }
    }

    Ok(store)
}
