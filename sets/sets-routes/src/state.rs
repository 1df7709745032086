use crate::service::SetService;
use axum::extract::FromRef;
use sets_core::SetEngine;
use tracing::info;

#[derive(Clone)]
pub struct SetAppState<T: SetEngine> {
    pub service: SetService<T>,
}

impl<T: SetEngine> SetAppState<T> {
    pub fn new(engine: T) -> Self {
        info!("creating new set state");
        Self {
            service: SetService::new(engine),
        }
    }
}

impl<T: SetEngine> FromRef<SetAppState<T>> for SetService<T> {
    fn from_ref(input: &SetAppState<T>) -> Self {
        input.service.clone()
    }
}
