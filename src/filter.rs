use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// A category pattern a target subscribes with.
///
/// * `"*"` matches every category.
/// * `"net.socket.*"` matches every category starting with `"net.socket."`
///   (the text before the first `*`; anything after it is ignored).
/// * `"net.socket"` matches that category only.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CategoryFilter {
    Any,
    Prefix(String),
    Exact(String),
}

impl CategoryFilter {
    pub fn parse(pattern: &str) -> Result<Self, Error> {
        if pattern.is_empty() {
            return Err(Error::InvalidFilter(pattern.to_string()));
        }

        Ok(match pattern.find('*') {
            Some(0) => CategoryFilter::Any,
            Some(index) => CategoryFilter::Prefix(pattern[..index].to_string()),
            None => CategoryFilter::Exact(pattern.to_string()),
        })
    }

    pub fn matches(&self, category: &str) -> bool {
        match self {
            CategoryFilter::Any => true,
            CategoryFilter::Prefix(prefix) => category.starts_with(prefix.as_str()),
            CategoryFilter::Exact(exact) => category == exact,
        }
    }
}

/// True if at least one filter accepts `category`.
pub fn matches_any(filters: &[CategoryFilter], category: &str) -> bool {
    filters.iter().any(|filter| filter.matches(category))
}

impl FromStr for CategoryFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CategoryFilter::parse(s)
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryFilter::Any => f.write_str("*"),
            CategoryFilter::Prefix(prefix) => write!(f, "{}*", prefix),
            CategoryFilter::Exact(exact) => f.write_str(exact),
        }
    }
}
