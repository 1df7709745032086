use crate::pagination::Pagination;
use const_format::formatcp;

type AppliedTags = u8;
const MAX_FILTERS: usize = AppliedTags::BITS as usize;

#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Tag {
    One = 1,
    Two = 2,
    Four = 4,
    Eight = 8,
    Sixteen = 16,
    ThirtyTwo = 32,
    SixtyFour = 64,
    OneTwentyEight = 128,
}

pub trait ListFilter: Sized {
    const MAX_FILTER_COUNT: usize;
    type Criteria;

    /// Filters sharing a tag are mutually exclusive.
    fn tag(&self) -> Tag;
    fn criteria(pagination: Pagination) -> Self::Criteria;
}

/// Pagination plus at most one filter per [`Tag`].
///
/// `N` cannot be larger than the number of tags
/// ```compile_fail
/// use routing::list_criteria::ListCriteria;
/// use routing::pagination::Pagination;
/// let _ = ListCriteria::<(), 9>::new(Pagination::default());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListCriteria<T, const N: usize> {
    pagination: Pagination,
    filters: Vec<T>,
    applied: AppliedTags,
}

impl<T, const N: usize> ListCriteria<T, N> {
    pub fn new(pagination: Pagination) -> Self {
        const {
            assert!(
                N <= MAX_FILTERS,
                "{}",
                formatcp!("ListCriteria only supports up to {} filters", MAX_FILTERS)
            )
        };
        Self {
            pagination,
            filters: Vec::with_capacity(N),
            applied: 0,
        }
    }

    pub fn limit(&self) -> u64 {
        self.pagination.limit()
    }

    pub fn offset(&self) -> u64 {
        self.pagination.offset()
    }

    pub fn filters(&self) -> &[T] {
        &self.filters
    }
}

impl<T, const N: usize> ListCriteria<T, N>
where
    T: ListFilter,
{
    /// The first filter added for a tag wins; later ones are ignored.
    pub fn add(&mut self, filter: T) -> &mut Self {
        let tag = filter.tag() as AppliedTags;

        if tag & self.applied == 0 {
            self.applied |= tag;
            self.filters.push(filter);
        }

        self
    }

    pub fn with(mut self, filter: T) -> Self {
        self.add(filter);
        self
    }

    pub fn with_opt(self, filter: Option<T>) -> Self {
        match filter {
            Some(filter) => self.with(filter),
            None => self,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Copy, Clone, PartialEq, Debug, Eq)]
    enum TestFilter {
        Test1(u8),
        Test2,
        Test3,
    }

    impl ListFilter for TestFilter {
        const MAX_FILTER_COUNT: usize = 3;
        type Criteria = ListCriteria<Self, { Self::MAX_FILTER_COUNT }>;

        fn tag(&self) -> Tag {
            match self {
                TestFilter::Test1(_) => Tag::One,
                TestFilter::Test2 => Tag::Two,
                TestFilter::Test3 => Tag::Four,
            }
        }

        fn criteria(pagination: Pagination) -> Self::Criteria {
            ListCriteria::new(pagination)
        }
    }

    #[test]
    fn each_filter_can_only_be_applied_once() {
        let mut criteria = TestFilter::criteria(Pagination::default());
        for i in 0..10 {
            criteria.add(TestFilter::Test1(i));
        }

        for _ in 0..10 {
            criteria.add(TestFilter::Test2);
        }

        criteria.add(TestFilter::Test3);

        assert_eq!(
            &[TestFilter::Test1(0), TestFilter::Test2, TestFilter::Test3],
            criteria.filters()
        );
    }

    #[test]
    fn missing_optional_filter_is_skipped() {
        let criteria = TestFilter::criteria(Pagination::new(5, 10))
            .with_opt(None)
            .with_opt(Some(TestFilter::Test3));

        assert_eq!(&[TestFilter::Test3], criteria.filters());
        assert_eq!(5, criteria.limit());
        assert_eq!(10, criteria.offset());
    }
}
