use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::ops::Deref;

/// Identifies a theme. Import files carry these explicitly, so they are not
/// always store generated.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Copy, Clone)]
#[repr(transparent)]
#[serde(transparent)]
pub struct ThemeId(i64);

impl ThemeId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }
}

impl Deref for ThemeId {
    type Target = i64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<i64> for ThemeId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Display for ThemeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Copy, Clone)]
#[repr(transparent)]
#[serde(transparent)]
pub struct SetId(i64);

impl SetId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }
}

impl Deref for SetId {
    type Target = i64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<i64> for SetId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Display for SetId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
