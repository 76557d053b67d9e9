//! Generic method instrumentation.
//!
//! [`Instrumentation`] wraps any call the caller marks with a [`CallSite`] and
//! emits one [`LogRecord`] per invocation. The wrapped call's result, error
//! included, is returned unchanged.
//!
//! ```rust
//! use std::sync::Arc;
//! use veneer_middleware::aspect::Instrumentation;
//! use veneer_telemetry::{Args, CallSite, TimePattern, TracingSink};
//!
//! struct UserRepository;
//!
//! let aspect = Instrumentation::new(Arc::new(TracingSink), TimePattern::default());
//! let site = CallSite::of::<UserRepository>("find").description("load one user");
//! let id = 1_i64;
//! let found: Result<String, std::io::Error> =
//!     aspect.invoke(&site, Args::new().arg(&id), || Ok(format!("user {id}")));
//! assert_eq!(found.unwrap(), "user 1");
//! ```

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use veneer_telemetry::{deliver, Args, CallSite, LogRecord, LogSink, Stopwatch, TimePattern};

/// Records invocations of marked calls.
#[derive(Clone)]
pub struct Instrumentation {
    sink: Arc<dyn LogSink<LogRecord>>,
    pattern: TimePattern,
    enabled: bool,
}

impl std::fmt::Debug for Instrumentation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instrumentation")
            .field("pattern", &self.pattern)
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

impl Instrumentation {
    /// Creates an enabled instrumentation over `sink`.
    #[must_use]
    pub fn new(sink: Arc<dyn LogSink<LogRecord>>, pattern: TimePattern) -> Self {
        Self {
            sink,
            pattern,
            enabled: true,
        }
    }

    /// Turns recording on or off. Disabled instrumentation only runs the call.
    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Returns whether records are emitted.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Runs `f` and records it.
    pub fn invoke<T, E, F>(&self, site: &CallSite, args: Args, f: F) -> Result<T, E>
    where
        T: Serialize,
        E: Display,
        F: FnOnce() -> Result<T, E>,
    {
        if !self.enabled {
            return f();
        }
        let stopwatch = Stopwatch::start();
        let outcome = f();
        self.record(site, &args, stopwatch, &outcome);
        outcome
    }

    /// Awaits `fut` and records it.
    pub async fn invoke_async<T, E, Fut>(&self, site: &CallSite, args: Args, fut: Fut) -> Result<T, E>
    where
        T: Serialize,
        E: Display,
        Fut: Future<Output = Result<T, E>>,
    {
        if !self.enabled {
            return fut.await;
        }
        let stopwatch = Stopwatch::start();
        let outcome = fut.await;
        self.record(site, &args, stopwatch, &outcome);
        outcome
    }

    fn record<T: Serialize, E: Display>(
        &self,
        site: &CallSite,
        args: &Args,
        stopwatch: Stopwatch,
        outcome: &Result<T, E>,
    ) {
        let params = args.to_params();
        let record = match outcome {
            Ok(value) => {
                let timing = stopwatch.finish(&self.pattern);
                let result = serde_json::to_value(value).unwrap_or(Value::Null);
                LogRecord::success(site, params, result, timing)
            }
            Err(err) => LogRecord::failure(site, params, err.to_string()),
        };
        deliver(self.sink.as_ref(), &record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;

    struct OrderService;

    #[derive(Default)]
    struct Collect(Mutex<Vec<LogRecord>>);

    impl LogSink<LogRecord> for Collect {
        fn handle(&self, record: &LogRecord) -> anyhow::Result<()> {
            self.0.lock().push(record.clone());
            Ok(())
        }
    }

    fn aspect(sink: &Arc<Collect>) -> Instrumentation {
        Instrumentation::new(sink.clone(), TimePattern::default())
    }

    #[test]
    fn test_success_records_result_and_timing() {
        let sink = Arc::new(Collect::default());
        let site = CallSite::of::<OrderService>("total").description("sum an order");
        let out: Result<i64, String> =
            aspect(&sink).invoke(&site, Args::new().arg(&2_i64).arg(&"eur"), || Ok(42));
        assert_eq!(out, Ok(42));

        let records = sink.0.lock();
        let record = &records[0];
        assert_eq!(record.class_name, "OrderService");
        assert_eq!(record.method_name, "total");
        assert_eq!(record.description, "sum an order");
        assert_eq!(record.result, Some(json!(42)));
        assert_eq!(record.params.get("i64"), Some(&json!(2)));
        assert!(record.start_time.is_some() && record.end_time.is_some());
    }

    #[test]
    fn test_failure_returns_original_error() {
        let sink = Arc::new(Collect::default());
        let site = CallSite::of::<OrderService>("total");
        let out: Result<i64, String> =
            aspect(&sink).invoke(&site, Args::new(), || Err("boom".to_string()));
        assert_eq!(out, Err("boom".to_string()));

        let records = sink.0.lock();
        assert_eq!(records[0].throwable.as_deref(), Some("boom"));
        assert!(records[0].elapsed_millis.is_none());
    }

    #[test]
    fn test_same_type_overwrites() {
        let sink = Arc::new(Collect::default());
        let site = CallSite::of::<OrderService>("pair");
        let _: Result<(), String> =
            aspect(&sink).invoke(
            &site,
            Args::new().arg(&"first".to_string()).arg(&"second".to_string()),
            || Ok(()),
        );
        assert_eq!(sink.0.lock()[0].params.get("String"), Some(&json!("second")));
    }

    #[test]
    fn test_disabled_passes_through() {
        let sink = Arc::new(Collect::default());
        let site = CallSite::of::<OrderService>("total");
        let out: Result<u8, String> = aspect(&sink).enabled(false).invoke(&site, Args::new(), || Ok(1));
        assert_eq!(out, Ok(1));
        assert!(sink.0.lock().is_empty());
    }

    #[test]
    fn test_panicking_sink_is_isolated() {
        let sink: Arc<dyn LogSink<LogRecord>> =
            Arc::new(|_: &LogRecord| -> anyhow::Result<()> { panic!("sink exploded") });
        let aspect = Instrumentation::new(sink, TimePattern::default());
        let out: Result<u8, String> =
            aspect.invoke(&CallSite::of::<OrderService>("total"), Args::new(), || Ok(3));
        assert_eq!(out, Ok(3));
    }

    #[test]
    fn test_broken_sink_keeps_original_error() {
        let failing: Arc<dyn LogSink<LogRecord>> =
            Arc::new(|_: &LogRecord| -> anyhow::Result<()> { anyhow::bail!("disk full") });
        let panicking: Arc<dyn LogSink<LogRecord>> =
            Arc::new(|_: &LogRecord| -> anyhow::Result<()> { panic!("sink exploded") });
        let site = CallSite::of::<OrderService>("total");

        for sink in [failing, panicking] {
            let aspect = Instrumentation::new(sink, TimePattern::default());
            let out: Result<u8, String> =
                aspect.invoke(&site, Args::new().arg(&9_i64), || Err("order 9 missing".to_string()));
            assert_eq!(out, Err("order 9 missing".to_string()));
        }
    }

    #[tokio::test]
    async fn test_broken_sink_keeps_async_error() {
        let sink: Arc<dyn LogSink<LogRecord>> =
            Arc::new(|_: &LogRecord| -> anyhow::Result<()> { panic!("sink exploded") });
        let aspect = Instrumentation::new(sink, TimePattern::default());
        let out: Result<u8, std::io::Error> = aspect
            .invoke_async(&CallSite::of::<OrderService>("load"), Args::new(), async {
                Err(std::io::Error::new(std::io::ErrorKind::NotFound, "no order"))
            })
            .await;
        let err = out.unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
        assert_eq!(err.to_string(), "no order");
    }

    #[tokio::test]
    async fn test_invoke_async() {
        let sink = Arc::new(Collect::default());
        let site = CallSite::of::<OrderService>("load");
        let out: Result<&str, String> = aspect(&sink)
            .invoke_async(&site, Args::new(), async { Ok("loaded") })
            .await;
        assert_eq!(out, Ok("loaded"));
        assert_eq!(sink.0.lock()[0].result, Some(json!("loaded")));
    }
}
