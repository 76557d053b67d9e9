//! Extraction context providing access to request data.
//!
//! The [`ExtractionContext`] is the interface extractors and the JSON
//! parameter resolver read a request through.

use bytes::Bytes;
use http::{HeaderMap, Method, Uri};

/// Path parameters captured by the router, in template order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams(Vec<(String, String)>);

impl PathParams {
    /// Creates an empty parameter list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a parameter.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push((name.into(), value.into()));
    }

    /// Returns the value of `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Iterates over `(name, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns the number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PathParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Context providing access to all parts of an HTTP request.
///
/// # Example
///
/// ```rust
/// use veneer_extract::{ExtractionContext, PathParams};
/// use http::{HeaderMap, Method, Uri};
/// use bytes::Bytes;
///
/// let mut params = PathParams::new();
/// params.push("id", "123");
///
/// let ctx = ExtractionContext::new(
///     Method::GET,
///     Uri::from_static("/user/123?query=%7B%7D&query=ignored"),
///     HeaderMap::new(),
///     Bytes::new(),
///     params,
/// );
///
/// assert_eq!(ctx.path_params().get("id"), Some("123"));
/// assert_eq!(ctx.first_query_value("query").as_deref(), Some("{}"));
/// ```
#[derive(Debug, Clone)]
pub struct ExtractionContext {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    path_params: PathParams,
}

impl ExtractionContext {
    /// Creates a new extraction context.
    #[must_use]
    pub fn new(
        method: Method,
        uri: Uri,
        headers: HeaderMap,
        body: Bytes,
        path_params: PathParams,
    ) -> Self {
        Self {
            method,
            uri,
            headers,
            body,
            path_params,
        }
    }

    /// Returns the HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request URI.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Returns the path portion of the URI.
    #[must_use]
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Returns the query string if present.
    #[must_use]
    pub fn query_string(&self) -> Option<&str> {
        self.uri.query()
    }

    /// Returns every decoded value of query parameter `name`, in order.
    ///
    /// A malformed query string yields no values.
    #[must_use]
    pub fn query_values(&self, name: &str) -> Vec<String> {
        let Some(query) = self.query_string() else {
            return Vec::new();
        };
        serde_urlencoded::from_str::<Vec<(String, String)>>(query)
            .unwrap_or_default()
            .into_iter()
            .filter(|(k, _)| k == name)
            .map(|(_, v)| v)
            .collect()
    }

    /// Returns the first decoded value of query parameter `name`.
    ///
    /// Later values under the same name are ignored.
    #[must_use]
    pub fn first_query_value(&self, name: &str) -> Option<String> {
        self.query_values(name).into_iter().next()
    }

    /// Returns the request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a specific header value as a string.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the request body as bytes.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the extracted path parameters.
    #[must_use]
    pub fn path_params(&self) -> &PathParams {
        &self.path_params
    }
}

/// Builder for constructing an `ExtractionContext`.
///
/// Method defaults to `GET` and URI to `/`.
#[derive(Debug, Default)]
pub struct ExtractionContextBuilder {
    method: Option<Method>,
    uri: Option<Uri>,
    headers: HeaderMap,
    body: Bytes,
    path_params: PathParams,
}

impl ExtractionContextBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the HTTP method.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Sets the URI.
    #[must_use]
    pub fn uri(mut self, uri: Uri) -> Self {
        self.uri = Some(uri);
        self
    }

    /// Adds a single header. Invalid values are skipped.
    #[must_use]
    pub fn header(mut self, name: &'static str, value: &str) -> Self {
        if let Ok(value) = value.parse() {
            self.headers.insert(name, value);
        }
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Adds a single path parameter.
    #[must_use]
    pub fn path_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_params.push(name, value);
        self
    }

    /// Builds the extraction context.
    #[must_use]
    pub fn build(self) -> ExtractionContext {
        ExtractionContext {
            method: self.method.unwrap_or(Method::GET),
            uri: self.uri.unwrap_or_else(|| Uri::from_static("/")),
            headers: self.headers,
            body: self.body,
            path_params: self.path_params,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_context_builder() {
        let ctx = ExtractionContextBuilder::new()
            .method(Method::POST)
            .uri(Uri::from_static("/user?active=true"))
            .header("content-type", "application/json")
            .path_param("id", "7")
            .build();

        assert_eq!(ctx.method(), &Method::POST);
        assert_eq!(ctx.path(), "/user");
        assert_eq!(ctx.query_string(), Some("active=true"));
        assert_eq!(ctx.header("content-type"), Some("application/json"));
        assert_eq!(ctx.path_params().get("id"), Some("7"));
    }

    #[test]
    fn test_query_values_are_decoded_in_order() {
        let ctx = ExtractionContextBuilder::new()
            .uri(Uri::from_static("/?q=%7B%22a%22%3A1%7D&other=x&q=second"))
            .build();
        assert_eq!(ctx.query_values("q"), vec![r#"{"a":1}"#, "second"]);
        assert_eq!(ctx.first_query_value("q").as_deref(), Some(r#"{"a":1}"#));
        assert_eq!(ctx.first_query_value("missing"), None);
    }

    #[test]
    fn test_no_query_string() {
        let ctx = ExtractionContextBuilder::new().build();
        assert!(ctx.query_values("q").is_empty());
    }

    #[test]
    fn test_path_params_collect() {
        let params: PathParams = [("a", "1"), ("b", "2")].into_iter().collect();
        assert_eq!(params.len(), 2);
        assert_eq!(params.iter().last(), Some(("b", "2")));
    }
}
