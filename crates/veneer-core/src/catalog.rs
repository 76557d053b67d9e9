//! Code to message lookup.
//!
//! The catalog is the only process-wide state the pipeline reads. Components
//! receive it as an `Arc<dyn MessageSource>`; replacing its contents is left to
//! whoever owns the configuration (see [`MessageCatalog::reload`]).

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::MESSAGE_NOT_DEFINED;

/// Read-only message lookup by code.
pub trait MessageSource: Send + Sync {
    /// Returns the message registered for `code`.
    fn message(&self, code: &str) -> Option<String>;

    /// Returns the message for `code`, or [`MESSAGE_NOT_DEFINED`].
    ///
    /// Blank catalog entries count as missing.
    fn message_or_default(&self, code: &str) -> String {
        self.message(code)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| MESSAGE_NOT_DEFINED.to_string())
    }
}

/// In-memory catalog backed by a snapshot map.
///
/// Lookups clone the current snapshot pointer under a short read lock, so a
/// concurrent [`reload`](Self::reload) never blocks readers for long and
/// readers never observe a half-written map.
///
/// # Example
///
/// ```
/// use veneer_core::{MessageCatalog, MessageSource};
///
/// let catalog = MessageCatalog::from_entries([("USER_1001", "user already exists")]);
/// assert_eq!(catalog.message("USER_1001").as_deref(), Some("user already exists"));
///
/// catalog.reload([("USER_1001", "duplicate user")]);
/// assert_eq!(catalog.message("USER_1001").as_deref(), Some("duplicate user"));
/// ```
#[derive(Debug, Default)]
pub struct MessageCatalog {
    entries: RwLock<Arc<HashMap<String, String>>>,
}

impl MessageCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalog from `(code, message)` pairs.
    #[must_use]
    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: RwLock::new(Arc::new(collect(entries))),
        }
    }

    /// Replaces every entry at once.
    pub fn reload<I, K, V>(&self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let next = Arc::new(collect(entries));
        *self.entries.write() = next;
        tracing::debug!(entries = self.len(), "message catalog reloaded");
    }

    /// Returns the current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<HashMap<String, String>> {
        Arc::clone(&self.entries.read())
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns `true` if the catalog has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl MessageSource for MessageCatalog {
    fn message(&self, code: &str) -> Option<String> {
        self.snapshot().get(code).cloned()
    }
}

impl<S: MessageSource + ?Sized> MessageSource for Arc<S> {
    fn message(&self, code: &str) -> Option<String> {
        (**self).message(code)
    }
}

fn collect<I, K, V>(entries: I) -> HashMap<String, String>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    entries
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_missing_code_defaults() {
        let catalog = MessageCatalog::new();
        assert_eq!(catalog.message("NOPE"), None);
        assert_eq!(catalog.message_or_default("NOPE"), MESSAGE_NOT_DEFINED);
    }

    #[test]
    fn test_blank_entry_counts_as_missing() {
        let catalog = MessageCatalog::from_entries([("EMPTY", " ")]);
        assert_eq!(catalog.message_or_default("EMPTY"), MESSAGE_NOT_DEFINED);
    }

    #[test]
    fn test_reload_replaces_all_entries() {
        let catalog = MessageCatalog::from_entries([("A", "a"), ("B", "b")]);
        catalog.reload([("C", "c")]);
        assert_eq!(catalog.len(), 1);
        assert!(catalog.message("A").is_none());
        assert_eq!(catalog.message("C").as_deref(), Some("c"));
    }

    #[test]
    fn test_snapshot_survives_reload() {
        let catalog = MessageCatalog::from_entries([("A", "a")]);
        let before = catalog.snapshot();
        catalog.reload([("A", "changed")]);
        assert_eq!(before.get("A").map(String::as_str), Some("a"));
    }

    #[test]
    fn test_shared_source() {
        let shared: Arc<dyn MessageSource> =
            Arc::new(MessageCatalog::from_entries([("USER_1001", "用户信息已存在")]));
        assert_eq!(shared.message_or_default("USER_1001"), "用户信息已存在");
    }

    proptest! {
        #[test]
        fn prop_lookup_returns_registered_message(
            code in "[A-Z_]{1,12}",
            message in "[a-z ]{1,24}[a-z]",
        ) {
            let catalog = MessageCatalog::from_entries([(code.clone(), message.clone())]);
            prop_assert_eq!(catalog.message_or_default(&code), message);
        }
    }
}
