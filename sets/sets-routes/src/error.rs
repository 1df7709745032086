#[derive(Debug, thiserror::Error)]
#[error("set service failed")]
pub struct SetServiceError;
