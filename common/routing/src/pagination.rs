use serde::Deserialize;

pub const DEFAULT_LIMIT: u64 = 25;
pub const MAX_LIMIT: u64 = 1000;

/// `limit`/`offset` paging. A missing limit falls back to [`DEFAULT_LIMIT`],
/// and no limit goes past [`MAX_LIMIT`].
#[derive(Debug, Deserialize, PartialEq, Eq, Copy, Clone, Default)]
pub struct Pagination {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl Pagination {
    pub const fn new(limit: u64, offset: u64) -> Self {
        Self {
            limit: Some(limit),
            offset: Some(offset),
        }
    }

    /// As sent by a caller, where either value may be absent.
    pub const fn from_query(limit: Option<u64>, offset: Option<u64>) -> Self {
        Self { limit, offset }
    }

    pub fn limit(&self) -> u64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT)
    }

    pub fn offset(&self) -> u64 {
        self.offset.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::defaults(Pagination::default(), DEFAULT_LIMIT, 0)]
    #[case::explicit(Pagination::new(10, 30), 10, 30)]
    #[case::capped(Pagination::new(5000, 0), MAX_LIMIT, 0)]
    #[case::offset_only(Pagination::from_query(None, Some(50)), DEFAULT_LIMIT, 50)]
    #[case::query_over_cap(Pagination::from_query(Some(1001), None), MAX_LIMIT, 0)]
    fn limit_and_offset(#[case] pagination: Pagination, #[case] limit: u64, #[case] offset: u64) {
        assert_eq!(limit, pagination.limit());
        assert_eq!(offset, pagination.offset());
    }
}
