//! Tag name normalization.
//!
//! Resolution of names to stored tags lives in `db::tags`; this module only
//! decides which names a free-form input refers to.

use crate::error::{AppError, AppResult};
use crate::models::tag::TagInput;

/// Maximum length of a tag name, in characters.
pub const MAX_TAG_NAME_LEN: usize = 50;

/// Trim, drop empties and de-duplicate tag names, keeping first-seen order.
///
/// `"a, b, a"` and `["a", "b"]` normalize to the same list.
pub fn normalize_tag_names(input: &TagInput) -> AppResult<Vec<String>> {
    let raw: Vec<&str> = match input {
        TagInput::Csv(s) => s.split(',').collect(),
        TagInput::List(items) => items.iter().map(String::as_str).collect(),
    };

    let mut names: Vec<String> = Vec::with_capacity(raw.len());
    for name in raw.into_iter().map(str::trim).filter(|s| !s.is_empty()) {
        if name.chars().count() > MAX_TAG_NAME_LEN {
            return Err(AppError::Validation(format!(
                "tag name '{}' exceeds {} characters",
                name, MAX_TAG_NAME_LEN
            )));
        }
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    Ok(names)
}
