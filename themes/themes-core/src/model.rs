use chrono::{DateTime, Utc};
use ids::ThemeId;
use optional_field::Field;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Theme {
    pub id: ThemeId,
    pub name: String,
    pub parent_id: Option<ThemeId>,
    pub created: DateTime<Utc>,
    pub updated: Option<DateTime<Utc>>,
}

impl Theme {
    pub fn create(id: ThemeId, name: String, parent_id: Option<ThemeId>) -> Self {
        Self::new(id, name, parent_id, Utc::now(), None)
    }

    pub fn new(
        id: ThemeId,
        name: String,
        parent_id: Option<ThemeId>,
        created: DateTime<Utc>,
        updated: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            name,
            parent_id,
            created,
            updated,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTheme {
    pub name: String,
    pub parent_id: Option<ThemeId>,
}

impl NewTheme {
    pub fn new(name: impl Into<String>, parent_id: Option<ThemeId>) -> Self {
        Self {
            name: name.into(),
            parent_id,
        }
    }

    pub fn root(name: impl Into<String>) -> Self {
        Self::new(name, None)
    }
}

/// `parent_id`: missing leaves the parent alone, null makes the theme a root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchTheme {
    pub name: Option<String>,
    pub parent_id: Field<ThemeId>,
}

impl PatchTheme {
    pub fn new(name: Option<String>, parent_id: Field<ThemeId>) -> Self {
        Self { name, parent_id }
    }

    /// The parent the theme will point at after the patch, if the patch changes it.
    pub fn new_parent(&self) -> Option<ThemeId> {
        match self.parent_id {
            Field::Present(Some(parent)) => Some(parent),
            Field::Present(None) | Field::Missing => None,
        }
    }

    pub fn apply(self, mut theme: Theme) -> Theme {
        if let Some(name) = self.name {
            theme.name = name;
        }
        if let Field::Present(parent_id) = self.parent_id {
            theme.parent_id = parent_id;
        }
        theme.updated = Some(Utc::now());
        theme
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn theme() -> Theme {
        Theme::create(ThemeId::new(2), "Supercar".into(), Some(ThemeId::new(1)))
    }

    #[test]
    fn missing_fields_are_left_alone() {
        let patched = PatchTheme::new(None, Field::Missing).apply(theme());

        assert_eq!("Supercar", patched.name);
        assert_eq!(Some(ThemeId::new(1)), patched.parent_id);
        assert!(patched.updated.is_some());
    }

    #[test]
    fn null_parent_makes_a_root() {
        let patched = PatchTheme::new(Some("Cars".into()), Field::Present(None)).apply(theme());

        assert_eq!("Cars", patched.name);
        assert_eq!(None, patched.parent_id);
    }

    #[test]
    fn present_parent_reparents() {
        let patch = PatchTheme::new(None, Field::Present(Some(ThemeId::new(9))));

        assert_eq!(Some(ThemeId::new(9)), patch.new_parent());
        assert_eq!(Some(ThemeId::new(9)), patch.apply(theme()).parent_id);
    }
}
