//! Path-template routing.
//!
//! Templates use `{name}` segments (`/user/{id}`). Routes are matched in
//! registration order and the first match wins.
//!
//! # Example
//!
//! ```rust
//! use veneer_server::Router;
//! use http::Method;
//!
//! let mut router = Router::new();
//! router.add_route(Method::GET, "/user/{id}", "find");
//! router.add_route(Method::POST, "/user", "save");
//!
//! let matched = router.match_route(&Method::GET, "/user/42").unwrap();
//! assert_eq!(*matched.value(), "find");
//! assert_eq!(matched.params().get("id"), Some("42"));
//! assert!(router.match_route(&Method::DELETE, "/user/42").is_none());
//! ```

use http::Method;
use veneer_extract::PathParams;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

#[derive(Debug, Clone)]
struct Route<T> {
    method: Method,
    pattern: String,
    segments: Vec<Segment>,
    value: T,
}

impl<T> Route<T> {
    fn new(method: Method, pattern: &str, value: T) -> Self {
        Self {
            method,
            pattern: pattern.to_string(),
            segments: parse_segments(pattern),
            value,
        }
    }

    fn match_path(&self, path: &str) -> Option<PathParams> {
        let mut actual = path.split('/').filter(|s| !s.is_empty());
        let mut params = PathParams::new();

        for segment in &self.segments {
            let part = actual.next()?;
            match segment {
                Segment::Literal(expected) if expected == part => {}
                Segment::Literal(_) => return None,
                Segment::Param(name) => params.push(name.as_str(), part),
            }
        }

        actual.next().is_none().then_some(params)
    }
}

fn parse_segments(pattern: &str) -> Vec<Segment> {
    pattern
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| match s.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            Some(name) => Segment::Param(name.to_string()),
            None => Segment::Literal(s.to_string()),
        })
        .collect()
}

/// A successful match: the registered value plus the captured parameters.
#[derive(Debug)]
pub struct RouteMatch<'r, T> {
    value: &'r T,
    pattern: &'r str,
    params: PathParams,
}

impl<'r, T> RouteMatch<'r, T> {
    /// Returns the value registered for the route.
    #[must_use]
    pub fn value(&self) -> &'r T {
        self.value
    }

    /// Returns the template that matched.
    #[must_use]
    pub fn pattern(&self) -> &'r str {
        self.pattern
    }

    /// Returns the captured path parameters.
    #[must_use]
    pub fn params(&self) -> &PathParams {
        &self.params
    }

    /// Consumes the match, returning the captured path parameters.
    #[must_use]
    pub fn into_params(self) -> PathParams {
        self.params
    }
}

/// Maps `(method, path)` to a registered value.
#[derive(Debug, Clone)]
pub struct Router<T> {
    routes: Vec<Route<T>>,
}

impl<T> Router<T> {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Registers `value` under `method` and `pattern`.
    pub fn add_route(&mut self, method: Method, pattern: impl AsRef<str>, value: T) {
        self.routes.push(Route::new(method, pattern.as_ref(), value));
    }

    /// Finds the first route matching the request.
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> Option<RouteMatch<'_, T>> {
        self.routes
            .iter()
            .filter(|route| route.method == *method)
            .find_map(|route| {
                route.match_path(path).map(|params| RouteMatch {
                    value: &route.value,
                    pattern: &route.pattern,
                    params,
                })
            })
    }

    /// Returns `true` if some route is registered for `pattern` under any method.
    #[must_use]
    pub fn has_pattern(&self, pattern: &str) -> bool {
        self.routes.iter().any(|route| route.pattern == pattern)
    }

    /// Returns the number of registered routes.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Returns `(method, pattern)` for every route in registration order.
    pub fn routes(&self) -> impl Iterator<Item = (&Method, &str)> {
        self.routes.iter().map(|r| (&r.method, r.pattern.as_str()))
    }
}

impl<T> Default for Router<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router() -> Router<&'static str> {
        let mut router = Router::new();
        router.add_route(Method::GET, "/user/{id}", "find");
        router.add_route(Method::GET, "/user/list", "list");
        router.add_route(Method::POST, "/user", "save");
        router.add_route(Method::PUT, "/user", "update");
        router.add_route(Method::GET, "/org/{org}/member/{member}", "member");
        router
    }

    #[test]
    fn test_literal_match() {
        let router = router();
        let matched = router.match_route(&Method::POST, "/user").unwrap();
        assert_eq!(*matched.value(), "save");
        assert!(matched.params().is_empty());
    }

    #[test]
    fn test_param_capture() {
        let router = router();
        let matched = router.match_route(&Method::GET, "/user/-1").unwrap();
        assert_eq!(*matched.value(), "find");
        assert_eq!(matched.pattern(), "/user/{id}");
        assert_eq!(matched.params().get("id"), Some("-1"));
    }

    #[test]
    fn test_first_registered_wins() {
        let router = router();
        let matched = router.match_route(&Method::GET, "/user/list").unwrap();
        assert_eq!(*matched.value(), "find");
    }

    #[test]
    fn test_multiple_params_in_order() {
        let router = router();
        let params = router
            .match_route(&Method::GET, "/org/acme/member/7")
            .unwrap()
            .into_params();
        let pairs: Vec<_> = params.iter().collect();
        assert_eq!(pairs, vec![("org", "acme"), ("member", "7")]);
    }

    #[test]
    fn test_method_and_length_must_match() {
        let router = router();
        assert!(router.match_route(&Method::DELETE, "/user/1").is_none());
        assert!(router.match_route(&Method::GET, "/user/1/extra").is_none());
        assert!(router.match_route(&Method::GET, "/user").is_none());
        assert!(router.match_route(&Method::GET, "/unknown").is_none());
    }

    #[test]
    fn test_trailing_slash_is_ignored() {
        let router = router();
        assert!(router.match_route(&Method::POST, "/user/").is_some());
    }

    #[test]
    fn test_introspection() {
        let router = router();
        assert_eq!(router.route_count(), 5);
        assert!(router.has_pattern("/user"));
        assert!(!router.has_pattern("/users"));
        assert_eq!(router.routes().next(), Some((&Method::GET, "/user/{id}")));
    }
}
