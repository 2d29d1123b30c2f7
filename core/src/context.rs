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
use std::fmt;
use std::sync::Arc;

use crate::{Error, Result};

/// Context gives loaders access to the outside world.
///
/// Credential files are read through [`FileRead`] and configuration comes
/// from [`Env`]. A fresh context can do neither: plug in the implementations
/// the application needs.
///
/// ```
/// use iasign_core::{Context, OsEnv};
///
/// let ctx = Context::new().with_env(OsEnv);
/// assert!(ctx.env_var("INSTANT_ACCESS_UNSET_VARIABLE").is_none());
/// ```
#[derive(Clone)]
pub struct Context {
    file_read: Arc<dyn FileRead>,
    env: Arc<dyn Env>,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("file_read", &self.file_read)
            .field("env", &self.env)
            .finish()
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    /// Create a context that can't read files and sees an empty environment.
    pub fn new() -> Self {
        Self {
            file_read: Arc::new(NoopFileRead),
            env: Arc::new(NoopEnv),
        }
    }

    /// Use `file_read` to read files.
    pub fn with_file_read(mut self, file_read: impl FileRead) -> Self {
        self.file_read = Arc::new(file_read);
        self
    }

    /// Use `env` to look up variables.
    pub fn with_env(mut self, env: impl Env) -> Self {
        self.env = Arc::new(env);
        self
    }

    /// Read the whole file at `path`.
    pub async fn file_read(&self, path: &str) -> Result<Vec<u8>> {
        self.file_read.file_read(path).await
    }

    /// Read the whole file at `path` as utf-8 text.
    pub async fn file_read_as_string(&self, path: &str) -> Result<String> {
        let content = self.file_read(path).await?;
        String::from_utf8(content).map_err(|e| {
            Error::unexpected(format!("file is not valid utf-8: {path}")).with_source(e)
        })
    }

    /// Look up the variable `key`.
    ///
    /// Unset variables and values that are not utf-8 are both `None`.
    pub fn env_var(&self, key: &str) -> Option<String> {
        self.env.var(key)
    }
}

/// FileRead reads a whole file into memory.
#[async_trait::async_trait]
pub trait FileRead: fmt::Debug + Send + Sync + 'static {
    /// Read the whole file at `path`.
    async fn file_read(&self, path: &str) -> Result<Vec<u8>>;
}

/// Env looks up environment variables.
pub trait Env: fmt::Debug + Send + Sync + 'static {
    /// Look up the variable `key`, `None` when unset or not utf-8.
    fn var(&self, key: &str) -> Option<String>;
}

/// Env of the current process.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsEnv;

impl Env for OsEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Env backed by a fixed set of variables.
///
/// ```
/// use iasign_core::{Env, StaticEnv};
///
/// let env: StaticEnv = [("INSTANT_ACCESS_TIME_TOLERANCE", "60")].into_iter().collect();
/// assert_eq!(env.var("INSTANT_ACCESS_TIME_TOLERANCE").as_deref(), Some("60"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticEnv {
    /// Variables visible through this env.
    pub envs: HashMap<String, String>,
}

impl Env for StaticEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.envs.get(key).cloned()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for StaticEnv {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            envs: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// FileRead used until one is configured, every read fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopFileRead;

#[async_trait::async_trait]
impl FileRead for NoopFileRead {
    async fn file_read(&self, path: &str) -> Result<Vec<u8>> {
        Err(Error::unexpected(format!(
            "can't read {path}: no file reader configured"
        )))
    }
}

/// Env used until one is configured, every variable is unset.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEnv;

impl Env for NoopEnv {
    fn var(&self, _: &str) -> Option<String> {
        None
    }
}
