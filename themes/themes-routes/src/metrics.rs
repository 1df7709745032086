use tracing::error;

const THEMES_RETRIEVED_METRIC_NAME: &str = "themes_retrieved";
const THEMES_CREATED_METRIC_NAME: &str = "themes_created";
const THEMES_IMPORTED_METRIC_NAME: &str = "themes_imported";
const THEMES_PATCHED_METRIC_NAME: &str = "themes_patched";
const THEMES_DELETED_METRIC_NAME: &str = "themes_deleted";

fn increment_by(name: &'static str, amt: usize) {
    match u64::try_from(amt) {
        Ok(amt) => metrics::counter!(name).increment(amt),
        Err(e) => error!("could not increment {name} metric: {e}"),
    }
}

#[inline]
pub fn increment_themes_retrieved() {
    increment_themes_retrieved_by(1);
}

#[inline]
pub fn increment_themes_retrieved_by(amt: usize) {
    increment_by(THEMES_RETRIEVED_METRIC_NAME, amt);
}

#[inline]
pub fn increment_themes_created() {
    metrics::counter!(THEMES_CREATED_METRIC_NAME).increment(1);
}

#[inline]
pub fn increment_themes_imported_by(amt: usize) {
    increment_by(THEMES_IMPORTED_METRIC_NAME, amt);
}

#[inline]
pub fn increment_themes_patched() {
    metrics::counter!(THEMES_PATCHED_METRIC_NAME).increment(1);
}

#[inline]
pub fn increment_themes_deleted() {
    metrics::counter!(THEMES_DELETED_METRIC_NAME).increment(1);
}
