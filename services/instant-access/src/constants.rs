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

use std::time::Duration;

/// Algorithm id carried by every authorization header.
pub const ALGORITHM_ID: &str = "DTA1-HMAC-SHA256";

/// Maximum distance between the request timestamp and the verifier's clock.
pub const TIME_TOLERANCE: Duration = Duration::from_secs(15 * 60);

/// Header carrying the ISO 8601 signing time.
pub const X_AMZ_DATE: &str = "x-amz-date";

// Env values used to configure the service.
pub const INSTANT_ACCESS_CREDENTIALS: &str = "INSTANT_ACCESS_CREDENTIALS";
pub const INSTANT_ACCESS_CREDENTIALS_FILE: &str = "INSTANT_ACCESS_CREDENTIALS_FILE";
pub const INSTANT_ACCESS_TIME_TOLERANCE: &str = "INSTANT_ACCESS_TIME_TOLERANCE";
