//! Request parameters and their validation
//!
//! Services describe the values their remote API accepts with
//! [`ParamSpec`] tables; values are checked before a request is built so
//! that a typo never costs a round trip.

use crate::error::{Result, ServiceError};
use std::fmt::Display;

/// A named request parameter and the values the remote API accepts.
///
/// An empty `allowed` list means the parameter is free-form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub allowed: &'static [&'static str],
}

impl ParamSpec {
    /// A parameter accepting any value
    pub const fn free(name: &'static str) -> Self {
        Self { name, allowed: &[] }
    }

    /// A parameter restricted to an enumerated set
    pub const fn one_of(name: &'static str, allowed: &'static [&'static str]) -> Self {
        Self { name, allowed }
    }

    pub fn accepts(&self, value: &str) -> bool {
        self.allowed.is_empty() || self.allowed.contains(&value)
    }

    /// Membership check
    pub fn check(&self, value: &str) -> Result<()> {
        if self.accepts(value) {
            Ok(())
        } else {
            Err(ServiceError::invalid_parameter(self.name, value, self.allowed))
        }
    }

    /// Check every value of a list parameter
    pub fn check_all<'a, I>(&self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a str>,
    {
        values.into_iter().try_for_each(|value| self.check(value))
    }
}

/// Membership check against a list only known at runtime (registries)
pub fn check_in<S: AsRef<str>>(name: &str, value: &str, allowed: &[S]) -> Result<()> {
    if allowed.iter().any(|a| a.as_ref() == value) {
        Ok(())
    } else {
        Err(ServiceError::invalid_parameter(name, value, allowed))
    }
}

/// Inclusive range check
pub fn check_range<T>(name: &str, value: T, min: T, max: T) -> Result<()>
where
    T: PartialOrd + Display,
{
    if value < min || value > max {
        return Err(ServiceError::OutOfRange {
            name: name.to_string(),
            value: value.to_string(),
            min: min.to_string(),
            max: max.to_string(),
        });
    }
    Ok(())
}

/// Split a user supplied list ("a,b c") into its items
pub fn to_list(input: &str) -> Vec<String> {
    input
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Join list items with a separator
pub fn join_list<S: AsRef<str>>(items: &[S], sep: &str) -> String {
    items
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(sep)
}

/// Ordered query string or form parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from literal pairs
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        Self {
            pairs: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl ToString) -> &mut Self {
        self.pairs.push((key.into(), value.to_string()));
        self
    }

    /// Push only when a value is present
    pub fn push_opt<V: ToString>(&mut self, key: impl Into<String>, value: Option<V>) -> &mut Self {
        if let Some(value) = value {
            self.push(key, value);
        }
        self
    }

    /// Validate against a [`ParamSpec`] and push under its parameter name
    pub fn push_checked(&mut self, spec: &ParamSpec, value: &str) -> Result<&mut Self> {
        spec.check(value)?;
        Ok(self.push(spec.name, value))
    }

    /// First value stored under `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, String)> {
        self.pairs.iter()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn extend(&mut self, other: &QueryParams) -> &mut Self {
        self.pairs.extend(other.pairs.iter().cloned());
        self
    }
}
