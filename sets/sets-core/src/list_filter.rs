use ids::ThemeId;
use routing::list_criteria::{ListCriteria, ListFilter, Tag};
use routing::pagination::Pagination;

const MAX_FILTER_COUNT: usize = 2;
pub type SetListCriteria = ListCriteria<SetFilter, MAX_FILTER_COUNT>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetFilter {
    /// Case insensitive substring match
    Name(String),
    /// Sets directly under the theme, not under its descendants
    Theme(ThemeId),
}

impl ListFilter for SetFilter {
    const MAX_FILTER_COUNT: usize = MAX_FILTER_COUNT;
    type Criteria = SetListCriteria;

    fn tag(&self) -> Tag {
        match self {
            SetFilter::Name(_) => Tag::One,
            SetFilter::Theme(_) => Tag::Two,
        }
    }

    fn criteria(pagination: Pagination) -> Self::Criteria {
        ListCriteria::new(pagination)
    }
}
