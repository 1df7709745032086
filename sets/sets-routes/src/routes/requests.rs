use ids::ThemeId;
use serde::Deserialize;
use sets_core::model::{NewSet, PatchSet};

#[derive(Debug, Deserialize)]
pub struct CreateSetRequest {
    pub num: String,
    pub name: String,
    pub year: i32,
    pub num_parts: i32,
    pub img_url: String,
    pub theme_id: ThemeId,
}

impl From<CreateSetRequest> for NewSet {
    fn from(req: CreateSetRequest) -> Self {
        NewSet::new(
            req.num,
            req.name,
            req.year,
            req.num_parts,
            req.img_url,
            req.theme_id,
        )
    }
}

/// Missing or null fields are left unchanged.
#[derive(Debug, Deserialize)]
pub struct SetPatchRequest {
    #[serde(default)]
    pub num: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub num_parts: Option<i32>,
    #[serde(default)]
    pub img_url: Option<String>,
    #[serde(default)]
    pub theme_id: Option<ThemeId>,
}

impl From<SetPatchRequest> for PatchSet {
    fn from(req: SetPatchRequest) -> Self {
        PatchSet {
            num: req.num,
            name: req.name,
            year: req.year,
            num_parts: req.num_parts,
            img_url: req.img_url,
            theme_id: req.theme_id,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SetListQuery {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub name: Option<String>,
    pub theme_id: Option<ThemeId>,
}
