// src/types/namespace.rs
//! Namespace numbers and `|`-joined namespace lists.

use super::ParamValue;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::BitOr;

/// A wiki namespace number.
///
/// `Namespace::MAIN | Namespace::USER` builds a [`NamespaceList`] that is sent
/// as `0|2`, the form list queries expect for `*namespace` parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Namespace(i64);

impl Namespace {
    pub const MEDIA: Namespace = Namespace(-2);
    pub const SPECIAL: Namespace = Namespace(-1);
    pub const MAIN: Namespace = Namespace(0);
    pub const TALK: Namespace = Namespace(1);
    pub const USER: Namespace = Namespace(2);
    pub const USER_TALK: Namespace = Namespace(3);
    pub const PROJECT: Namespace = Namespace(4);
    pub const PROJECT_TALK: Namespace = Namespace(5);
    pub const FILE: Namespace = Namespace(6);
    pub const FILE_TALK: Namespace = Namespace(7);
    pub const MEDIAWIKI: Namespace = Namespace(8);
    pub const TEMPLATE: Namespace = Namespace(10);
    pub const HELP: Namespace = Namespace(12);
    pub const CATEGORY: Namespace = Namespace(14);

    pub const fn new(id: i64) -> Self {
        Namespace(id)
    }

    pub const fn id(self) -> i64 {
        self.0
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Namespace> for ParamValue {
    fn from(value: Namespace) -> Self {
        ParamValue::Int(value.0)
    }
}

/// Several namespaces, sent as one `|`-joined value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceList(Vec<Namespace>);

impl NamespaceList {
    pub fn namespaces(&self) -> &[Namespace] {
        &self.0
    }
}

impl fmt::Display for NamespaceList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<String> = self.0.iter().map(Namespace::to_string).collect();
        write!(f, "{}", joined.join("|"))
    }
}

impl BitOr for Namespace {
    type Output = NamespaceList;

    fn bitor(self, rhs: Namespace) -> NamespaceList {
        NamespaceList(vec![self, rhs])
    }
}

impl BitOr<Namespace> for NamespaceList {
    type Output = NamespaceList;

    fn bitor(mut self, rhs: Namespace) -> NamespaceList {
        self.0.push(rhs);
        self
    }
}

impl From<NamespaceList> for ParamValue {
    fn from(value: NamespaceList) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl FromIterator<Namespace> for NamespaceList {
    fn from_iter<I: IntoIterator<Item = Namespace>>(iter: I) -> Self {
        NamespaceList(iter.into_iter().collect())
    }
}
