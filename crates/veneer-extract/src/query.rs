//! Query string extractor.

use crate::{ExtractionContext, ExtractionError, ExtractionSource, FromRequest};
use serde::de::DeserializeOwned;
use std::ops::Deref;

/// Extractor for URL query string parameters.
///
/// `Query<T>` deserializes the whole query string into `T`. For a single
/// parameter carrying JSON use [`JsonParam`](crate::JsonParam) instead.
///
/// # Example
///
/// ```rust
/// use veneer_extract::{Query, FromRequest, ExtractionContextBuilder};
/// use http::Uri;
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Page {
///     #[serde(default)]
///     limit: Option<u32>,
/// }
///
/// let ctx = ExtractionContextBuilder::new()
///     .uri(Uri::from_static("/user/list?limit=10"))
///     .build();
/// let Query(page) = Query::<Page>::from_request(&ctx).unwrap();
/// assert_eq!(page.limit, Some(10));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query<T>(pub T);

impl<T> Query<T> {
    /// Consumes the Query and returns the inner value.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Query<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T: DeserializeOwned> FromRequest for Query<T> {
    fn from_request(ctx: &ExtractionContext) -> Result<Self, ExtractionError> {
        let query_string = ctx.query_string().unwrap_or("");

        let value: T = serde_urlencoded::from_str(query_string).map_err(|e| {
            ExtractionError::deserialization_failed(ExtractionSource::Query, e.to_string())
        })?;

        Ok(Query(value))
    }
}
