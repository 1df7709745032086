#[derive(Debug, thiserror::Error)]
#[error("theme service failed")]
pub struct ThemeServiceError;
