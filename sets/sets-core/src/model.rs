use bulk_loader::Hierarchical;
use chrono::{DateTime, Utc};
use ids::{SetId, ThemeId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Set {
    pub id: SetId,
    pub num: String,
    pub name: String,
    pub year: i32,
    pub num_parts: i32,
    pub img_url: String,
    pub theme_id: ThemeId,
    pub created: DateTime<Utc>,
    pub updated: Option<DateTime<Utc>>,
}

impl Set {
    pub fn create(id: SetId, new_set: NewSet) -> Self {
        Self {
            id,
            num: new_set.num,
            name: new_set.name,
            year: new_set.year,
            num_parts: new_set.num_parts,
            img_url: new_set.img_url,
            theme_id: new_set.theme_id,
            created: Utc::now(),
            updated: None,
        }
    }
}

/// Import files name the `num` column `set_num`.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct NewSet {
    #[serde(alias = "set_num")]
    pub num: String,
    pub name: String,
    pub year: i32,
    pub num_parts: i32,
    pub img_url: String,
    pub theme_id: ThemeId,
}

impl NewSet {
    pub fn new(
        num: impl Into<String>,
        name: impl Into<String>,
        year: i32,
        num_parts: i32,
        img_url: impl Into<String>,
        theme_id: ThemeId,
    ) -> Self {
        Self {
            num: num.into(),
            name: name.into(),
            year,
            num_parts,
            img_url: img_url.into(),
            theme_id,
        }
    }
}

// The theme a set points at is a different entity, so sets always plan as a
// single batch keyed by `num`.
impl Hierarchical for NewSet {
    type Key = String;

    fn key(&self) -> &Self::Key {
        &self.num
    }

    fn parent_key(&self) -> Option<&Self::Key> {
        None
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchSet {
    pub num: Option<String>,
    pub name: Option<String>,
    pub year: Option<i32>,
    pub num_parts: Option<i32>,
    pub img_url: Option<String>,
    pub theme_id: Option<ThemeId>,
}

impl PatchSet {
    pub fn apply(self, mut set: Set) -> Set {
        if let Some(num) = self.num {
            set.num = num;
        }
        if let Some(name) = self.name {
            set.name = name;
        }
        if let Some(year) = self.year {
            set.year = year;
        }
        if let Some(num_parts) = self.num_parts {
            set.num_parts = num_parts;
        }
        if let Some(img_url) = self.img_url {
            set.img_url = img_url;
        }
        if let Some(theme_id) = self.theme_id {
            set.theme_id = theme_id;
        }
        set.updated = Some(Utc::now());
        set
    }
}
