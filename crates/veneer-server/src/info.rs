//! Static application info endpoint.
//!
//! Serves the `web.info.params` table as-is. The route runs through the
//! pipeline like any other handler; it is enveloped only when its module
//! path falls under one of the configured packages.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use veneer_core::{HandlerMeta, PipelineError};

use crate::handler::{BoxedHandler, Call};

/// Marker type naming the info handler in logs and envelope matching.
#[derive(Debug)]
pub struct InfoEndpoint;

/// Returns the handler metadata of the info endpoint.
#[must_use]
pub fn info_meta() -> HandlerMeta {
    HandlerMeta::of::<InfoEndpoint>("info")
}

/// Builds a handler returning `params` on every call.
#[must_use]
pub fn info_handler(params: BTreeMap<String, Value>) -> BoxedHandler {
    let params = Arc::new(params);
    Arc::new(move |_call: Call| {
        let params = Arc::clone(&params);
        async move { Ok::<_, PipelineError>(params.as_ref().clone()) }
    })
}
