use serde::{Deserialize, Deserializer, Serialize};

use crate::error::AppError;

/// Pagination metadata included in list responses.
#[derive(Serialize, utoipa::ToSchema)]
pub struct Pagination {
    /// Current page number (1-based).
    #[schema(example = 1)]
    pub page: u64,
    /// Number of items per page.
    #[schema(example = 20)]
    pub per_page: u64,
    /// Total number of matching items across all pages.
    #[schema(example = 47)]
    pub total: u64,
    /// Total number of pages.
    #[schema(example = 3)]
    pub total_pages: u64,
}

/// Hard ceiling on requested page size.
pub const MAX_PAGE_SIZE: u64 = 100;

/// Largest accepted source payload (solution, stub or candidate code).
pub const MAX_CODE_SIZE: usize = 64 * 1024;

/// Clamp requested paging: page is at least 1, limit falls back to
/// `default_limit` and stays within `1..=MAX_PAGE_SIZE`. Pages past the end
/// are left alone — they simply select an empty window.
pub fn page_window(page: Option<u64>, limit: Option<u64>, default_limit: u64) -> (u64, u64) {
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(default_limit).clamp(1, MAX_PAGE_SIZE);
    (page, limit)
}

/// Escape LIKE wildcard characters in a search string.
pub fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Serde helper for PATCH semantics on nullable fields.
///
/// * JSON field absent  => `None`          (don't update)
/// * JSON field = null  => `Some(None)`    (set to NULL)
/// * JSON field = value => `Some(Some(v))` (set to value)
pub fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Some(Option::deserialize(deserializer)?))
}

/// Read a JSONB string-array column into a `Vec<String>`.
pub fn string_array(value: &serde_json::Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_owned))
                .collect()
        })
        .unwrap_or_default()
}

/// Store a string list as a JSONB array column value.
pub fn to_json_array(items: &[String]) -> serde_json::Value {
    serde_json::Value::Array(
        items
            .iter()
            .map(|s| serde_json::Value::String(s.clone()))
            .collect(),
    )
}

/// Validate a trimmed title (1-256 Unicode characters).
pub fn validate_title(title: &str) -> Result<(), AppError> {
    let title = title.trim();
    if title.is_empty() || title.chars().count() > 256 {
        return Err(AppError::Validation(
            "Title must be 1-256 characters".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_window_defaults_and_clamps() {
        assert_eq!(page_window(None, None, 20), (1, 20));
        assert_eq!(page_window(Some(0), Some(0), 20), (1, 1));
        assert_eq!(page_window(Some(3), Some(500), 20), (3, MAX_PAGE_SIZE));
    }

    #[test]
    fn test_total_pages_is_ceiling_division() {
        assert_eq!(47u64.div_ceil(20), 3);
        assert_eq!(40u64.div_ceil(20), 2);
        assert_eq!(0u64.div_ceil(20), 0);
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_\\"), "50\\%\\_\\\\");
    }

    #[test]
    fn test_string_array_roundtrip() {
        let tags = vec!["Loop".to_string(), "Array".to_string()];
        assert_eq!(string_array(&to_json_array(&tags)), tags);
        // Non-array values read as empty.
        assert!(string_array(&serde_json::json!("Loop")).is_empty());
    }
}
