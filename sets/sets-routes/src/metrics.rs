use tracing::error;

const SETS_RETRIEVED_METRIC_NAME: &str = "sets_retrieved";
const SETS_CREATED_METRIC_NAME: &str = "sets_created";
const SETS_IMPORTED_METRIC_NAME: &str = "sets_imported";
const SETS_PATCHED_METRIC_NAME: &str = "sets_patched";
const SETS_DELETED_METRIC_NAME: &str = "sets_deleted";

fn increment_by(name: &'static str, amt: usize) {
    match u64::try_from(amt) {
        Ok(amt) => metrics::counter!(name).increment(amt),
        Err(e) => error!("could not increment {name} metric: {e}"),
    }
}

#[inline]
pub fn increment_sets_retrieved() {
    increment_sets_retrieved_by(1);
}

#[inline]
pub fn increment_sets_retrieved_by(amt: usize) {
    increment_by(SETS_RETRIEVED_METRIC_NAME, amt);
}

#[inline]
pub fn increment_sets_created() {
    metrics::counter!(SETS_CREATED_METRIC_NAME).increment(1);
}

#[inline]
pub fn increment_sets_imported_by(amt: usize) {
    increment_by(SETS_IMPORTED_METRIC_NAME, amt);
}

#[inline]
pub fn increment_sets_patched() {
    metrics::counter!(SETS_PATCHED_METRIC_NAME).increment(1);
}

#[inline]
pub fn increment_sets_deleted() {
    metrics::counter!(SETS_DELETED_METRIC_NAME).increment(1);
}
