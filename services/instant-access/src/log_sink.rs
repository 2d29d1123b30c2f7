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

use log::Level;

/// Target used by [`LogFacade`].
pub const DISPATCH_LOG_TARGET: &str = "iasign::dispatch";

/// LogSink receives the diagnostics of a [`Dispatcher`](crate::Dispatcher).
///
/// Failure reasons only ever reach the sink, never the wire response.
pub trait LogSink: Send + Sync + 'static {
    /// Record a message at `level`.
    fn log(&self, level: Level, message: &str);
}

/// LogSink that forwards to the `log` facade under [`DISPATCH_LOG_TARGET`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LogFacade;

impl LogSink for LogFacade {
    fn log(&self, level: Level, message: &str) {
        log::log!(target: DISPATCH_LOG_TARGET, level, "{message}");
    }
}

/// LogSink that drops every message.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogSink;

impl LogSink for NoopLogSink {
    fn log(&self, _: Level, _: &str) {}
}
