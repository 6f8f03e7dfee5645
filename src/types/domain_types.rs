// src/types/domain_types.rs
//! Small validated value types shared by the site and request layers.

use crate::error::WikiError;
use std::fmt;
use std::str::FromStr;

/// HTTP Basic credentials attached to every request of a site.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    user: String,
    password: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Redact the password
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

/// Value of the `assert` parameter added to write requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assertion {
    User,
    Bot,
    True,
    False,
    Exists,
    Test,
}

impl Assertion {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Bot => "bot",
            Self::True => "true",
            Self::False => "false",
            Self::Exists => "exists",
            Self::Test => "test",
        }
    }
}

impl fmt::Display for Assertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Assertion {
    type Err = WikiError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "user" => Ok(Self::User),
            "bot" => Ok(Self::Bot),
            "true" => Ok(Self::True),
            "false" => Ok(Self::False),
            "exists" => Ok(Self::Exists),
            "test" => Ok(Self::Test),
            other => Err(WikiError::InvalidValue(format!("Invalid assertion: {}", other))),
        }
    }
}

/// Listing direction for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Older,
    Newer,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Older => "older",
            Self::Newer => "newer",
        }
    }
}

impl FromStr for Direction {
    type Err = WikiError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "older" => Ok(Self::Older),
            "newer" => Ok(Self::Newer),
            other => Err(WikiError::InvalidValue(format!(
                "direction must be 'newer' or 'older', got '{}'",
                other
            ))),
        }
    }
}
