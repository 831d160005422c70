use super::error::ActionError;

/// Trimmed, non-empty, length-bounded text field.
pub fn required_text(field: &str, value: &str, max_len: usize) -> Result<String, ActionError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ActionError::validation(format!("{field} is required")));
    }
    if trimmed.chars().count() > max_len {
        return Err(ActionError::validation(format!(
            "{field} must be at most {max_len} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Optional text field; blank becomes `None`.
pub fn optional_text(
    field: &str,
    value: Option<&str>,
    max_len: usize,
) -> Result<Option<String>, ActionError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) if v.chars().count() > max_len => Err(ActionError::validation(format!(
            "{field} must be at most {max_len} characters"
        ))),
        Some(v) => Ok(Some(v.to_string())),
    }
}

pub fn email(value: &str) -> Result<String, ActionError> {
    let normalized = value.trim().to_lowercase();
    if !utils::text::is_valid_email(&normalized) {
        return Err(ActionError::validation("Enter a valid email address"));
    }
    Ok(normalized)
}

pub fn optional_email(value: Option<&str>) -> Result<Option<String>, ActionError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => email(v).map(Some),
    }
}

pub fn percentage(field: &str, value: i64) -> Result<i64, ActionError> {
    if !(0..=100).contains(&value) {
        return Err(ActionError::validation(format!(
            "{field} must be between 0 and 100"
        )));
    }
    Ok(value)
}

pub fn time_window(
    start: Option<chrono::NaiveTime>,
    end: Option<chrono::NaiveTime>,
) -> Result<(), ActionError> {
    match (start, end) {
        (Some(start), Some(end)) if end <= start => Err(ActionError::validation(
            "End time must be after start time",
        )),
        _ => Ok(()),
    }
}
