//! Pluggable consumers of instrumentation records.
//!
//! Sinks are side-effect only. [`deliver`] is the single entry point the
//! instrumentation uses: a sink that errors or panics is reported with a
//! warning and otherwise ignored, so the instrumented call is never affected.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

use tokio::sync::mpsc;

use crate::error::TelemetryError;
use crate::record::{LogRecord, WebLogRecord};

/// Consumer of one record type.
pub trait LogSink<R>: Send + Sync {
    /// Handles one record.
    fn handle(&self, record: &R) -> anyhow::Result<()>;
}

impl<R, F> LogSink<R> for F
where
    F: Fn(&R) -> anyhow::Result<()> + Send + Sync,
{
    fn handle(&self, record: &R) -> anyhow::Result<()> {
        self(record)
    }
}

/// Hands `record` to `sink`, downgrading any failure to a warning.
pub fn deliver<R>(sink: &dyn LogSink<R>, record: &R) {
    match catch_unwind(AssertUnwindSafe(|| sink.handle(record))) {
        Ok(Ok(())) => {}
        Ok(Err(err)) => {
            tracing::warn!(error = %err, "failed to emit instrumentation record");
        }
        Err(payload) => {
            tracing::warn!(
                panic = panic_message(payload.as_ref()),
                "instrumentation sink panicked"
            );
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&'static str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string panic>")
}

/// Default sink: renders records to the operational log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink<LogRecord> for TracingSink {
    fn handle(&self, record: &LogRecord) -> anyhow::Result<()> {
        let params = serde_json::to_string(&record.params)?;
        match &record.throwable {
            None => {
                let result = serde_json::to_string(&record.result)?;
                tracing::info!(
                    target: "veneer::aspect",
                    class_name = %record.class_name,
                    method_name = %record.method_name,
                    description = %record.description,
                    params = %params,
                    result = %result,
                    start_time = record.start_time.as_deref().unwrap_or_default(),
                    end_time = record.end_time.as_deref().unwrap_or_default(),
                    elapsed_ms = record.elapsed_millis.unwrap_or_default(),
                    "{record}"
                );
            }
            Some(throwable) => {
                tracing::warn!(
                    target: "veneer::aspect",
                    class_name = %record.class_name,
                    method_name = %record.method_name,
                    description = %record.description,
                    params = %params,
                    throwable = %throwable,
                    "{record}"
                );
            }
        }
        Ok(())
    }
}

impl LogSink<WebLogRecord> for TracingSink {
    fn handle(&self, record: &WebLogRecord) -> anyhow::Result<()> {
        let params = serde_json::to_string(&record.params)?;
        let result = serde_json::to_string(&record.result)?;
        tracing::info!(target: "veneer::web", "==================== Request Start ====================");
        tracing::info!(
            target: "veneer::web",
            url = record.url.as_deref().unwrap_or_default(),
            class_name = %record.class_name,
            method_name = %record.method_name,
            params = %params,
            result = %result,
            throwable = record.throwable.as_deref().unwrap_or_default(),
            start_time = record.start_time.as_deref().unwrap_or_default(),
            end_time = record.end_time.as_deref().unwrap_or_default(),
            elapsed_ms = record.elapsed_millis.unwrap_or_default(),
            "{record}"
        );
        tracing::info!(target: "veneer::web", "===================== Request End =====================");
        Ok(())
    }
}

/// Fire-and-forget sink that queues records for another task.
///
/// The queue is bounded; when it is full the record is dropped and the
/// rejection surfaces as a warning through [`deliver`].
#[derive(Debug, Clone)]
pub struct ChannelSink<R> {
    tx: mpsc::Sender<R>,
}

impl<R: Clone + Send + 'static> ChannelSink<R> {
    /// Creates a sink with room for `capacity` pending records.
    #[must_use]
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<R>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

impl<R: Clone + Send + 'static> LogSink<R> for ChannelSink<R> {
    fn handle(&self, record: &R) -> anyhow::Result<()> {
        self.tx.try_send(record.clone()).map_err(|err| {
            TelemetryError::Sink(match err {
                mpsc::error::TrySendError::Full(_) => "queue full".to_string(),
                mpsc::error::TrySendError::Closed(_) => "receiver closed".to_string(),
            })
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::Params;
    use crate::record::CallSite;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn record() -> LogRecord {
        LogRecord::failure(&CallSite::named("Probe", "run"), Params::new(), "x".to_string())
    }

    #[test]
    fn test_failing_sink_is_contained() {
        let sink = |_: &LogRecord| -> anyhow::Result<()> { anyhow::bail!("disk full") };
        deliver(&sink, &record());
    }

    #[test]
    fn test_panicking_sink_is_contained() {
        let sink = |_: &LogRecord| -> anyhow::Result<()> { panic!("sink exploded") };
        deliver(&sink, &record());
    }

    #[test]
    fn test_closure_sink_receives_record() {
        let seen = AtomicUsize::new(0);
        let sink = |r: &LogRecord| -> anyhow::Result<()> {
            assert_eq!(r.method_name, "run");
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(())
        };
        deliver(&sink, &record());
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_tracing_sink_renders() {
        assert!(TracingSink.handle(&record()).is_ok());
    }

    #[tokio::test]
    async fn test_channel_sink_queues_and_rejects_when_full() {
        let (sink, mut rx) = ChannelSink::<LogRecord>::new(1);
        assert!(sink.handle(&record()).is_ok());
        assert!(sink.handle(&record()).is_err());
        deliver(&sink, &record());
        assert_eq!(rx.recv().await.map(|r| r.method_name), Some("run".to_string()));
    }
}
