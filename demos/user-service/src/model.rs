//! User records and request shapes.

use serde::{Deserialize, Serialize};

/// A stored user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Assigned on save when absent.
    #[serde(default)]
    pub id: Option<i64>,
    /// Display name.
    pub name: String,
    /// Age in years.
    #[serde(default)]
    pub age: Option<u32>,
    /// Set on save.
    #[serde(default)]
    pub create_time: Option<String>,
    /// Set on save and update.
    #[serde(default)]
    pub modify_time: Option<String>,
}

impl User {
    /// Creates an unsaved user.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            age: None,
            create_time: None,
            modify_time: None,
        }
    }

    /// Sets the id.
    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    /// Sets the age.
    pub fn with_age(mut self, age: u32) -> Self {
        self.age = Some(age);
        self
    }
}

/// Filter for condition listing, passed as a JSON query parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCondition {
    /// Substring of the user name.
    #[serde(default)]
    pub name: Option<String>,
    /// Inclusive lower age bound.
    #[serde(default)]
    pub min_age: Option<u32>,
    /// Inclusive upper age bound.
    #[serde(default)]
    pub max_age: Option<u32>,
}

impl UserCondition {
    /// Returns `true` if `user` passes every set bound.
    pub fn matches(&self, user: &User) -> bool {
        let name_ok = self
            .name
            .as_deref()
            .map_or(true, |name| user.name.contains(name));
        let min_ok = self
            .min_age
            .map_or(true, |min| user.age.is_some_and(|age| age >= min));
        let max_ok = self
            .max_age
            .map_or(true, |max| user.age.is_some_and(|age| age <= max));
        name_ok && min_ok && max_ok
    }
}

/// Paging query of the plain list route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageQuery {
    /// One-based page number.
    #[serde(default = "default_page_num")]
    pub page_num: usize,
    /// Page size.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page_num: default_page_num(),
            page_size: default_page_size(),
        }
    }
}

fn default_page_num() -> usize {
    1
}

fn default_page_size() -> usize {
    10
}

/// One page of users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Total number of stored items.
    pub total: usize,
    /// Page number served.
    pub page_num: usize,
    /// Requested page size.
    pub page_size: usize,
    /// Items on this page.
    pub items: Vec<T>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_condition_matches_everything() {
        assert!(UserCondition::default().matches(&User::new("kim")));
    }

    #[test]
    fn test_condition_bounds() {
        let condition = UserCondition {
            name: Some("ki".into()),
            min_age: Some(18),
            max_age: Some(30),
        };
        assert!(condition.matches(&User::new("kim").with_age(20)));
        assert!(!condition.matches(&User::new("kim").with_age(31)));
        assert!(!condition.matches(&User::new("kim")));
        assert!(!condition.matches(&User::new("lee").with_age(20)));
    }

    #[test]
    fn test_page_query_defaults() {
        let query: PageQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query, PageQuery::default());
    }
}
