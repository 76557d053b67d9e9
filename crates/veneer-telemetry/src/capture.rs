//! Argument capture shared by both instrumentation concerns.
//!
//! Each argument is keyed by the short name of its type. Null values are
//! dropped, and a later argument of the same type replaces an earlier one,
//! so the captured map is a best-effort snapshot rather than a full argument
//! list.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use veneer_core::short_type_name;

/// Captured parameters of one call, keyed by short type name.
pub type Params = BTreeMap<String, Value>;

/// One captured argument.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedArg {
    /// Short type name of the argument.
    pub type_name: &'static str,
    /// JSON snapshot of the value.
    pub value: Value,
}

impl CapturedArg {
    /// Captures `value` under the short name of `T`.
    ///
    /// Values that cannot be represented as JSON are captured as a
    /// placeholder string.
    pub fn of<T: Serialize + ?Sized>(value: &T) -> Self {
        Self {
            type_name: short_type_name::<T>(),
            value: serde_json::to_value(value)
                .unwrap_or_else(|err| Value::String(format!("<unserializable: {err}>"))),
        }
    }
}

/// Builds [`Params`] from captured arguments in call order.
pub fn to_params<'a>(args: impl IntoIterator<Item = &'a CapturedArg>) -> Params {
    let mut params = Params::new();
    for arg in args {
        if arg.value.is_null() {
            continue;
        }
        params.insert(arg.type_name.to_string(), arg.value.clone());
    }
    params
}

/// Positional argument list for a generic instrumented call.
///
/// ```rust
/// use veneer_telemetry::Args;
///
/// let password = "secret".to_string();
/// let args = Args::new().arg(&42_i64).ignored(&password).arg(&Option::<u8>::None);
/// let params = args.to_params();
/// assert_eq!(params.len(), 1);
/// assert_eq!(params["i64"], 42);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Args(Vec<CapturedArg>);

impl Args {
    /// Creates an empty argument list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Captures an argument.
    pub fn arg<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        self.0.push(CapturedArg::of(value));
        self
    }

    /// Captures an optional argument under the name of `T`, skipping `None`.
    pub fn optional<T: Serialize>(mut self, value: &Option<T>) -> Self {
        if let Some(value) = value {
            self.0.push(CapturedArg::of(value));
        }
        self
    }

    /// Marks an argument position as excluded from capture.
    pub fn ignored<T: ?Sized>(self, _value: &T) -> Self {
        self
    }

    /// Returns the captured parameters.
    pub fn to_params(&self) -> Params {
        to_params(&self.0)
    }
}

/// Shared, append-only capture for arguments extracted during a request.
///
/// Cloning yields another handle to the same list.
#[derive(Debug, Clone, Default)]
pub struct ArgCapture(Arc<Mutex<Vec<CapturedArg>>>);

impl ArgCapture {
    /// Creates an empty capture.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an argument.
    pub fn record(&self, arg: CapturedArg) {
        self.0.lock().push(arg);
    }

    /// Captures `value` under the short name of `T`.
    pub fn record_value<T: Serialize + ?Sized>(&self, value: &T) {
        self.record(CapturedArg::of(value));
    }

    /// Returns the arguments captured so far.
    pub fn snapshot(&self) -> Vec<CapturedArg> {
        self.0.lock().clone()
    }

    /// Returns the captured parameters.
    pub fn to_params(&self) -> Params {
        to_params(self.0.lock().iter())
    }
}
