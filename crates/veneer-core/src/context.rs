//! Request identity and handler metadata.
//!
//! [`RequestId`] correlates log lines of one exchange. [`HandlerMeta`] names
//! the handler a request was dispatched to; the response enveloper gates on
//! its type path and the web instrumentation logs its short name.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A unique identifier for each request, using UUID v7.
///
/// # Example
///
/// ```
/// use veneer_core::RequestId;
///
/// let id = RequestId::new();
/// println!("Request ID: {}", id);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new unique request ID using UUID v7.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a `RequestId` from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Identity of the handler a request is dispatched to.
///
/// `type_path` is the fully qualified Rust path of the declaring type, as
/// reported by [`std::any::type_name`].
///
/// # Example
///
/// ```
/// use veneer_core::HandlerMeta;
///
/// mod controller {
///     pub struct UserController;
/// }
///
/// let meta = HandlerMeta::of::<controller::UserController>("find");
/// assert_eq!(meta.class_name(), "UserController");
/// assert!(meta.type_path().ends_with("controller::UserController"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerMeta {
    type_path: &'static str,
    method: &'static str,
}

impl HandlerMeta {
    /// Describes method `method` declared on type `T`.
    #[must_use]
    pub fn of<T: ?Sized>(method: &'static str) -> Self {
        Self {
            type_path: std::any::type_name::<T>(),
            method,
        }
    }

    /// Describes a handler by an explicit type path.
    #[must_use]
    pub const fn named(type_path: &'static str, method: &'static str) -> Self {
        Self { type_path, method }
    }

    /// Returns the fully qualified type path.
    #[must_use]
    pub const fn type_path(&self) -> &'static str {
        self.type_path
    }

    /// Returns the method name.
    #[must_use]
    pub const fn method(&self) -> &'static str {
        self.method
    }

    /// Returns the unqualified type name.
    #[must_use]
    pub fn class_name(&self) -> &'static str {
        short_name(self.type_path)
    }
}

/// Strips module path and generic arguments from a type path.
///
/// `alloc::vec::Vec<app::User>` becomes `Vec`, `app::model::User` becomes
/// `User`. References and primitives are returned unchanged.
#[must_use]
pub fn short_name(type_path: &str) -> &str {
    let base = type_path
        .find('<')
        .map_or(type_path, |idx| &type_path[..idx]);
    base.rsplit("::").next().unwrap_or(base)
}

/// Short name of type `T`, see [`short_name`].
#[must_use]
pub fn short_type_name<T: ?Sized>() -> &'static str {
    short_name(std::any::type_name::<T>())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Probe;

    #[test]
    fn test_request_id_unique() {
        assert_ne!(RequestId::new(), RequestId::new());
    }

    #[test]
    fn test_short_name() {
        assert_eq!(short_name("app::model::User"), "User");
        assert_eq!(short_name("alloc::vec::Vec<app::User>"), "Vec");
        assert_eq!(short_name("i64"), "i64");
        assert_eq!(short_name("&str"), "&str");
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name::<Probe>(), "Probe");
        assert_eq!(short_type_name::<String>(), "String");
        assert_eq!(short_type_name::<Vec<Probe>>(), "Vec");
    }

    #[test]
    fn test_handler_meta() {
        let meta = HandlerMeta::of::<Probe>("find");
        assert_eq!(meta.class_name(), "Probe");
        assert_eq!(meta.method(), "find");
        assert!(meta.type_path().starts_with("veneer_core::"));
    }
}
