use error_stack::Report;

pub type RepoResult<T> = Result<T, Report<ThemeRepoError>>;
pub type OptRepoResult<T> = Result<Option<T>, Report<ThemeRepoError>>;

#[derive(Debug, thiserror::Error, PartialEq, Eq, Copy, Clone)]
pub enum ThemeRepoError {
    #[error("failed to get theme: {0}")]
    Get(Reason),
    #[error("failed to list themes: {0}")]
    List(Reason),
    #[error("failed to create theme: {0}")]
    Create(Reason),
    #[error("failed to patch theme: {0}")]
    Patch(Reason),
    #[error("failed to delete theme: {0}")]
    Delete(Reason),
}

impl ThemeRepoError {
    pub fn reason(&self) -> Reason {
        match self {
            ThemeRepoError::Get(r)
            | ThemeRepoError::List(r)
            | ThemeRepoError::Create(r)
            | ThemeRepoError::Patch(r)
            | ThemeRepoError::Delete(r) => *r,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq, Copy, Clone)]
pub enum Reason {
    #[error("parent theme was not found")]
    ParentNotFound,
    #[error("a theme cannot be its own ancestor")]
    CyclicParent,
    #[error("database call failed")]
    Db,
    #[error("input failed validation")]
    Validation,
}
