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

use std::fmt::{Debug, Formatter};
use std::time::Duration;

use iasign_core::utils::Redact;
use iasign_core::Context;
use log::warn;

use crate::constants::*;

/// Config carries all the configuration for the Instant Access service.
#[derive(Clone, Default)]
pub struct Config {
    /// `credentials` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`INSTANT_ACCESS_CREDENTIALS`]
    ///
    /// The value uses the credential file format, one `secret public` pair per line.
    pub credentials: Option<String>,
    /// `credentials_file` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`INSTANT_ACCESS_CREDENTIALS_FILE`]
    pub credentials_file: Option<String>,
    /// `time_tolerance` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`INSTANT_ACCESS_TIME_TOLERANCE`], in seconds
    ///
    /// Falls back to [`TIME_TOLERANCE`] when unset.
    pub time_tolerance: Option<Duration>,
}

impl Debug for Config {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field(
                "credentials",
                &self.credentials.as_ref().map(Redact::from),
            )
            .field("credentials_file", &self.credentials_file)
            .field("time_tolerance", &self.time_tolerance)
            .finish()
    }
}

impl Config {
    /// Set inline credentials.
    pub fn with_credentials(mut self, credentials: impl Into<String>) -> Self {
        self.credentials = Some(credentials.into());
        self
    }

    /// Set the credential file path.
    pub fn with_credentials_file(mut self, path: impl Into<String>) -> Self {
        self.credentials_file = Some(path.into());
        self
    }

    /// Set the accepted clock skew.
    pub fn with_time_tolerance(mut self, tolerance: Duration) -> Self {
        self.time_tolerance = Some(tolerance);
        self
    }

    /// Load config from env.
    pub fn from_env(mut self, ctx: &Context) -> Self {
        if let Some(v) = ctx.env_var(INSTANT_ACCESS_CREDENTIALS) {
            self.credentials.get_or_insert(v);
        }
        if let Some(v) = ctx.env_var(INSTANT_ACCESS_CREDENTIALS_FILE) {
            self.credentials_file.get_or_insert(v);
        }
        if let Some(v) = ctx.env_var(INSTANT_ACCESS_TIME_TOLERANCE) {
            match v.trim().parse::<u64>() {
                Ok(secs) => {
                    self.time_tolerance.get_or_insert(Duration::from_secs(secs));
                }
                Err(err) => {
                    warn!("ignoring invalid {INSTANT_ACCESS_TIME_TOLERANCE} {v:?}: {err}");
                }
            }
        }

        self
    }

    /// The accepted clock skew, defaulting to [`TIME_TOLERANCE`].
    pub fn time_tolerance(&self) -> Duration {
        self.time_tolerance.unwrap_or(TIME_TOLERANCE)
    }
}
