use sets_core::model::{NewSet, PatchSet};
use std::fmt::{Display, Formatter};
use url::Url;

const MAX_NUM_LEN: usize = 50;
const MAX_NAME_LEN: usize = 100;

/// The first field of a set that failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidField {
    pub field: &'static str,
    pub reason: &'static str,
}

impl Display for InvalidField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.field, self.reason)
    }
}

fn invalid(field: &'static str, reason: &'static str) -> Result<(), InvalidField> {
    Err(InvalidField { field, reason })
}

fn text(
    field: &'static str,
    value: &str,
    max: usize,
    too_long: &'static str,
) -> Result<(), InvalidField> {
    if value.trim().is_empty() {
        invalid(field, "cannot be blank")
    } else if value.chars().count() > max {
        invalid(field, too_long)
    } else {
        Ok(())
    }
}

fn num(value: &str) -> Result<(), InvalidField> {
    text("num", value, MAX_NUM_LEN, "cannot be longer than 50 characters")
}

fn name(value: &str) -> Result<(), InvalidField> {
    text("name", value, MAX_NAME_LEN, "cannot be longer than 100 characters")
}

fn non_negative(field: &'static str, value: i32) -> Result<(), InvalidField> {
    if value < 0 {
        invalid(field, "cannot be negative")
    } else {
        Ok(())
    }
}

fn image_url(value: &str) -> Result<(), InvalidField> {
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        _ => invalid("img_url", "must be an absolute http or https URL"),
    }
}

pub fn new_set(set: &NewSet) -> Result<(), InvalidField> {
    num(&set.num)?;
    name(&set.name)?;
    non_negative("year", set.year)?;
    non_negative("num_parts", set.num_parts)?;
    image_url(&set.img_url)
}

pub fn patch(patch: &PatchSet) -> Result<(), InvalidField> {
    if let Some(value) = &patch.num {
        num(value)?;
    }
    if let Some(value) = &patch.name {
        name(value)?;
    }
    if let Some(year) = patch.year {
        non_negative("year", year)?;
    }
    if let Some(num_parts) = patch.num_parts {
        non_negative("num_parts", num_parts)?;
    }
    if let Some(img_url) = &patch.img_url {
        image_url(img_url)?;
    }
    Ok(())
}
