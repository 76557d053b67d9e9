//! Core extractor trait.
//!
//! The [`FromRequest`] trait is the foundation for all extractors.

use crate::{ExtractionContext, ExtractionError};

/// Trait for types that can be extracted from an HTTP request.
///
/// # Implementing `FromRequest`
///
/// ```rust
/// use veneer_extract::{FromRequest, ExtractionContext, ExtractionError, ExtractionSource};
///
/// struct Tenant(String);
///
/// impl FromRequest for Tenant {
///     fn from_request(ctx: &ExtractionContext) -> Result<Self, ExtractionError> {
///         ctx.header("x-tenant")
///             .map(|t| Tenant(t.to_string()))
///             .ok_or_else(|| ExtractionError::missing(ExtractionSource::Query, "x-tenant"))
///     }
/// }
/// ```
pub trait FromRequest: Sized {
    /// Extracts this type from the request context.
    fn from_request(ctx: &ExtractionContext) -> Result<Self, ExtractionError>;
}

// None when extraction fails
impl<T: FromRequest> FromRequest for Option<T> {
    fn from_request(ctx: &ExtractionContext) -> Result<Self, ExtractionError> {
        Ok(T::from_request(ctx).ok())
    }
}

macro_rules! impl_from_request_for_tuple {
    ($($T:ident),*) => {
        impl<$($T: FromRequest),*> FromRequest for ($($T,)*) {
            fn from_request(ctx: &ExtractionContext) -> Result<Self, ExtractionError> {
                Ok(($($T::from_request(ctx)?,)*))
            }
        }
    };
}

impl_from_request_for_tuple!(T1);
impl_from_request_for_tuple!(T1, T2);
impl_from_request_for_tuple!(T1, T2, T3);

/// Marks an extracted argument as excluded from instrumentation capture.
///
/// Extraction is delegated to `E` unchanged.
///
/// ```rust
/// use veneer_extract::{FromRequest, LogIgnore, Query, ExtractionContextBuilder};
/// use http::Uri;
/// use std::collections::HashMap;
///
/// let ctx = ExtractionContextBuilder::new()
///     .uri(Uri::from_static("/?token=secret"))
///     .build();
/// let LogIgnore(Query(q)) = LogIgnore::<Query<HashMap<String, String>>>::from_request(&ctx).unwrap();
/// assert_eq!(q["token"], "secret");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogIgnore<E>(pub E);

impl<E> LogIgnore<E> {
    /// Returns the wrapped extractor.
    pub fn into_inner(self) -> E {
        self.0
    }
}

impl<E: FromRequest> FromRequest for LogIgnore<E> {
    fn from_request(ctx: &ExtractionContext) -> Result<Self, ExtractionError> {
        E::from_request(ctx).map(LogIgnore)
    }
}
