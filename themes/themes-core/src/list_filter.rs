use ids::ThemeId;
use routing::list_criteria::{ListCriteria, ListFilter, Tag};
use routing::pagination::Pagination;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThemeFilter {
    /// Case insensitive substring match
    Name(String),
    /// `None` lists roots only
    Parent(Option<ThemeId>),
}

impl ListFilter for ThemeFilter {
    const MAX_FILTER_COUNT: usize = MAX_FILTER_COUNT;
    type Criteria = ThemeListCriteria;

    fn tag(&self) -> Tag {
        match self {
            ThemeFilter::Name(_) => Tag::One,
            ThemeFilter::Parent(_) => Tag::Two,
        }
    }

    fn criteria(pagination: Pagination) -> Self::Criteria {
        ThemeListCriteria::new(pagination)
    }
}

pub type ThemeListCriteria = ListCriteria<ThemeFilter, MAX_FILTER_COUNT>;

const MAX_FILTER_COUNT: usize = 2;
