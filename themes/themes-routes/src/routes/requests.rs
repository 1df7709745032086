use ids::ThemeId;
use optional_field::{Field, serde_optional_fields};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CreateThemeRequest {
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<ThemeId>,
}

#[serde_optional_fields]
#[derive(Debug, Deserialize)]
pub struct ThemePatchRequest {
    /// Cannot be null. Not specified means no update.
    pub name: Field<String>,
    /// Null turns the theme into a root. Not specified means no update.
    pub parent_id: Field<ThemeId>,
}

/// `parent_id` wins over `roots` when both are given.
#[derive(Debug, Deserialize)]
pub struct ThemeListQuery {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub name: Option<String>,
    pub parent_id: Option<ThemeId>,
    #[serde(default)]
    pub roots: bool,
}
