//! Path parameter extractor.

use crate::{ExtractionContext, ExtractionError, ExtractionSource, FromRequest};
use serde::de::DeserializeOwned;
use std::ops::Deref;

/// Extractor for URL path parameters.
///
/// `T` is either a struct whose fields name the parameters, or, for routes
/// with exactly one parameter, the parameter's own type.
///
/// # Example
///
/// ```rust
/// use veneer_extract::{Path, FromRequest, ExtractionContextBuilder};
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct OrderPath {
///     user_id: u64,
///     order_id: u64,
/// }
///
/// let ctx = ExtractionContextBuilder::new()
///     .path_param("user_id", "42")
///     .path_param("order_id", "7")
///     .build();
/// let Path(path) = Path::<OrderPath>::from_request(&ctx).unwrap();
/// assert_eq!((path.user_id, path.order_id), (42, 7));
///
/// let ctx = ExtractionContextBuilder::new().path_param("id", "-1").build();
/// let Path(id) = Path::<i64>::from_request(&ctx).unwrap();
/// assert_eq!(id, -1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path<T>(pub T);

impl<T> Path<T> {
    /// Consumes the Path and returns the inner value.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Path<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T: DeserializeOwned> FromRequest for Path<T> {
    fn from_request(ctx: &ExtractionContext) -> Result<Self, ExtractionError> {
        let params = ctx.path_params();
        if params.is_empty() {
            return Err(ExtractionError::missing(
                ExtractionSource::Path,
                "<path parameters>",
            ));
        }

        // serde_urlencoded handles string-to-number coercion for struct fields
        let encoded = serde_urlencoded::to_string(params.iter().collect::<Vec<_>>())
            .map_err(|e| ExtractionError::deserialization_failed(ExtractionSource::Path, e.to_string()))?;
        let as_struct = serde_urlencoded::from_str::<T>(&encoded);

        match as_struct {
            Ok(value) => Ok(Path(value)),
            Err(struct_err) if params.len() == 1 => {
                let (name, raw) = params.iter().next().unwrap_or_default();
                single_value(raw).map(Path).ok_or_else(|| {
                    ExtractionError::invalid_type(ExtractionSource::Path, name, struct_err.to_string())
                })
            }
            Err(e) => Err(ExtractionError::deserialization_failed(
                ExtractionSource::Path,
                e.to_string(),
            )),
        }
    }
}

/// Reads a lone path segment as a JSON scalar, then as a plain string.
fn single_value<T: DeserializeOwned>(raw: &str) -> Option<T> {
    serde_json::from_str(raw)
        .ok()
        .or_else(|| serde_json::from_value(serde_json::Value::String(raw.to_string())).ok())
}
