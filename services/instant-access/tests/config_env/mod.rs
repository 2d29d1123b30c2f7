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

use std::io::Write;

use http::StatusCode;
use iasign_core::{Context, OsEnv};
use iasign_file_read_tokio::TokioFileRead;
use iasign_instant_access::constants::*;
use iasign_instant_access::{load_credential_store, Config, Dispatcher, GetUserIdResponse};

use super::*;

#[tokio::test]
async fn test_dispatch_with_credentials_file_from_env() {
    init_logger();

    let mut f = tempfile::NamedTempFile::new().unwrap();
    writeln!(f, "ANOTHER_SECRET ANOTHER_PUBLIC").unwrap();
    writeln!(f).unwrap();
    writeln!(f, "{SECRET_KEY} {PUBLIC_KEY}").unwrap();
    let path = f.path().to_string_lossy().to_string();

    let ctx = Context::new().with_file_read(TokioFileRead).with_env(OsEnv);
    let cfg = temp_env::with_vars(
        [
            (INSTANT_ACCESS_CREDENTIALS, None),
            (INSTANT_ACCESS_CREDENTIALS_FILE, Some(path.as_str())),
            (INSTANT_ACCESS_TIME_TOLERANCE, Some("300")),
        ],
        || Config::default().from_env(&ctx),
    );
    assert_eq!(cfg.time_tolerance(), std::time::Duration::from_secs(300));

    let store = load_credential_store(&ctx, &cfg).await.unwrap();
    assert_eq!(store.len(), 2);

    let mut dispatcher = Dispatcher::new(Arc::new(store))
        .with_signer(RequestSigner::from_config(&cfg).with_time(test_time()));
    dispatcher.on_get_user_id(|_| Ok(GetUserIdResponse::ok("1234")));

    let resp = dispatcher.process(signed_request(
        r#"{"operation":"GetUserId","infoField1":"nobody@amazon.com"}"#,
    ));
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_missing_credentials_file() {
    init_logger();

    let dir = tempfile::tempdir().unwrap();
    let ctx = Context::new().with_file_read(TokioFileRead);
    let cfg = Config::default().with_credentials_file(dir.path().join("keys").to_string_lossy());

    let err = load_credential_store(&ctx, &cfg).await.unwrap_err();
    assert_eq!(err.kind(), iasign_core::ErrorKind::CredentialFileNotFound);
}
