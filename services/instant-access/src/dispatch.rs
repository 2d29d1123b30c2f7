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
use std::fmt::{self, Debug, Display, Formatter, Write};
use std::sync::Arc;

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderValue, Request, Response, StatusCode};
use iasign_core::{Error, ErrorKind, Result, SigningRequest};
use log::Level;

use crate::model::*;
use crate::operation::Operation;
use crate::{CredentialStore, LogFacade, LogSink, RequestSigner};

/// Handle processes one verified, decoded request.
///
/// Implemented for every `Fn(OperationRequest) -> anyhow::Result<OperationResponse>`.
pub trait Handle: Send + Sync + 'static {
    /// Produce the response for `req`.
    fn handle(&self, req: OperationRequest) -> anyhow::Result<OperationResponse>;
}

impl<F> Handle for F
where
    F: Fn(OperationRequest) -> anyhow::Result<OperationResponse> + Send + Sync + 'static,
{
    fn handle(&self, req: OperationRequest) -> anyhow::Result<OperationResponse> {
        self(req)
    }
}

/// The steps a request goes through in [`Dispatcher::process`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    /// Nothing happened yet.
    Idle,
    /// Checking the signature.
    Verifying,
    /// Reading the operation tag.
    ExtractingOperation,
    /// Looking up the handler.
    Routing,
    /// Decoding the request and running the handler.
    Executing,
    /// Checking the handler answered the right operation.
    ValidatingResponse,
    /// Encoding the response.
    Serializing,
    /// The request succeeded.
    Done,
    /// The request failed.
    Failed,
}

impl Display for DispatchState {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let s = match self {
            DispatchState::Idle => "idle",
            DispatchState::Verifying => "verifying",
            DispatchState::ExtractingOperation => "extracting operation",
            DispatchState::Routing => "routing",
            DispatchState::Executing => "executing",
            DispatchState::ValidatingResponse => "validating response",
            DispatchState::Serializing => "serializing",
            DispatchState::Done => "done",
            DispatchState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Dispatcher verifies signed requests and routes them to handlers by operation.
///
/// Every failure, from a bad signature to a failing handler, produces the same
/// empty `500` response. The reason is only reported to the [`LogSink`].
///
/// ```
/// use std::sync::Arc;
///
/// use iasign_instant_access::{CredentialStore, Dispatcher, GetUserIdResponse};
///
/// let store: CredentialStore = "SECRET PUBLIC".parse().unwrap();
/// let mut dispatcher = Dispatcher::new(Arc::new(store));
/// dispatcher.on_get_user_id(|req| Ok(GetUserIdResponse::ok(req.info_field1)));
/// ```
pub struct Dispatcher {
    signer: RequestSigner,
    store: Arc<CredentialStore>,
    handlers: HashMap<Operation, Box<dyn Handle>>,
    sink: Arc<dyn LogSink>,
}

impl Debug for Dispatcher {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("signer", &self.signer)
            .field("store", &self.store)
            .field("operations", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Dispatcher {
    /// Create a dispatcher verifying against `store`, without any handler.
    pub fn new(store: Arc<CredentialStore>) -> Self {
        Self {
            signer: RequestSigner::new(),
            store,
            handlers: HashMap::new(),
            sink: Arc::new(LogFacade),
        }
    }

    /// Replace the signer used to verify requests.
    pub fn with_signer(mut self, signer: RequestSigner) -> Self {
        self.signer = signer;
        self
    }

    /// Replace the log sink.
    pub fn with_log_sink(mut self, sink: impl LogSink) -> Self {
        self.sink = Arc::new(sink);
        self
    }

    /// Register the handler of `op`, replacing any previous one.
    pub fn register(&mut self, op: Operation, handler: impl Handle) -> &mut Self {
        self.handlers.insert(op, Box::new(handler));
        self
    }

    /// Check if a handler is registered for `op`.
    pub fn is_registered(&self, op: Operation) -> bool {
        self.handlers.contains_key(&op)
    }

    /// Process a request into the response to send back.
    pub fn process(&self, req: Request<Bytes>) -> Response<Bytes> {
        let mut state = DispatchState::Idle;

        match self.run(req, &mut state) {
            Ok(body) => {
                let mut resp = Response::new(Bytes::from(body));
                resp.headers_mut()
                    .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                resp
            }
            Err(err) => {
                self.sink.log(
                    Level::Error,
                    &format!("request failed while {state}: {}", error_chain(&err)),
                );
                state = DispatchState::Failed;
                self.sink.log(Level::Debug, &format!("dispatch {state}"));

                let mut resp = Response::new(Bytes::new());
                *resp.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                resp.headers_mut()
                    .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
                resp
            }
        }
    }

    fn run(&self, req: Request<Bytes>, state: &mut DispatchState) -> Result<Vec<u8>> {
        *state = DispatchState::Verifying;
        let (mut parts, body) = req.into_parts();
        let req = SigningRequest::build(&mut parts, body);
        self.sink.log(Level::Debug, &format!("received request: {req}"));
        self.signer.authenticate(&req, &self.store)?;

        *state = DispatchState::ExtractingOperation;
        let op = OperationRequest::extract_operation(&req.body)?;

        *state = DispatchState::Routing;
        let Some(handler) = self.handlers.get(&op) else {
            return Err(Error::new(
                ErrorKind::NoHandlerRegistered,
                format!("no handler registered for {op}"),
            ));
        };

        *state = DispatchState::Executing;
        let resp = handler
            .handle(OperationRequest::from_json(&req.body)?)
            .map_err(|e| {
                Error::new(ErrorKind::HandlerFailed, format!("handler of {op} failed"))
                    .with_source(e)
            })?;

        *state = DispatchState::ValidatingResponse;
        if resp.operation() != op {
            return Err(Error::new(
                ErrorKind::InvalidResponseType,
                format!(
                    "handler of {op} answered with a {} response",
                    resp.operation()
                ),
            ));
        }

        *state = DispatchState::Serializing;
        let body = resp.to_json()?;

        *state = DispatchState::Done;
        self.sink.log(Level::Info, &format!("processed {op} request"));
        Ok(body)
    }
}

fn error_chain(err: &Error) -> String {
    let mut s = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(e) = source {
        let _ = write!(s, ": {e}");
        source = e.source();
    }
    s
}

macro_rules! typed_handlers {
    ($( $(#[$meta:meta])* $fn_name:ident => $variant:ident($req:ty) -> $resp:ty; )+) => {
        impl Dispatcher {
            $(
                $(#[$meta])*
                pub fn $fn_name<F>(&mut self, f: F) -> &mut Self
                where
                    F: Fn($req) -> anyhow::Result<$resp> + Send + Sync + 'static,
                {
                    self.register(Operation::$variant, move |req: OperationRequest| match req {
                        OperationRequest::$variant(req) => f(req).map(OperationResponse::from),
                        other => Err(anyhow::anyhow!(
                            "unexpected {} request",
                            other.operation()
                        )),
                    })
                }
            )+
        }
    };
}

typed_handlers! {
    /// Register the handler of `Purchase`.
    on_purchase => Purchase(PurchaseRequest) -> PurchaseResponse;
    /// Register the handler of `Revoke`.
    on_revoke => Revoke(RevokeRequest) -> RevokeResponse;
    /// Register the handler of `SubscriptionActivate`.
    on_subscription_activate => SubscriptionActivate(SubscriptionActivateRequest) -> SubscriptionActivateResponse;
    /// Register the handler of `SubscriptionDeactivate`.
    on_subscription_deactivate => SubscriptionDeactivate(SubscriptionDeactivateRequest) -> SubscriptionDeactivateResponse;
    /// Register the handler of `GetUserId`.
    on_get_user_id => GetUserId(GetUserIdRequest) -> GetUserIdResponse;
}
