use error_stack::Report;

pub type RepoResult<T> = Result<T, Report<SetRepoError>>;
pub type OptRepoResult<T> = Result<Option<T>, Report<SetRepoError>>;

#[derive(Debug, thiserror::Error, PartialEq, Eq, Copy, Clone)]
pub enum SetRepoError {
    #[error("failed to get set: {0}")]
    Get(Reason),
    #[error("failed to create set: {0}")]
    Create(Reason),
    #[error("failed to get list of sets: {0}")]
    List(Reason),
    #[error("failed to patch set: {0}")]
    Patch(Reason),
    #[error("failed to delete set: {0}")]
    Delete(Reason),
}

impl SetRepoError {
    pub fn reason(&self) -> Reason {
        match self {
            SetRepoError::Get(r)
            | SetRepoError::Create(r)
            | SetRepoError::List(r)
            | SetRepoError::Patch(r)
            | SetRepoError::Delete(r) => *r,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq, Copy, Clone)]
pub enum Reason {
    #[error("theme associated with set was not found")]
    ThemeNotFound,
    #[error("a set with the same num already exists")]
    DuplicateNum,
    #[error("database call failed")]
    Db,
    #[error("input failed validation")]
    Validation,
}
