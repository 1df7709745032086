use crate::service::ThemeService;
use axum::extract::FromRef;
use themes_core::ThemeEngine;
use tracing::info;

#[derive(Clone)]
pub struct ThemeAppState<T: ThemeEngine> {
    pub service: ThemeService<T>,
}

impl<T: ThemeEngine> ThemeAppState<T> {
    pub fn new(engine: T) -> Self {
        info!("creating new theme state");
        Self {
            service: ThemeService::new(engine),
        }
    }
}

impl<T: ThemeEngine> FromRef<ThemeAppState<T>> for ThemeService<T> {
    fn from_ref(input: &ThemeAppState<T>) -> Self {
        input.service.clone()
    }
}
