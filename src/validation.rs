//! Field rules shared by account and listing input.

/// Length check counted in chars, not bytes.
pub fn check_length(value: &str, field: &str, min: usize, max: usize) -> Result<(), String> {
    let len = value.chars().count();
    if len < min {
        return Err(format!(
            "{field} is too short: must be between {min} and {max} characters"
        ));
    }
    if len > max {
        return Err(format!(
            "{field} is too long: must be between {min} and {max} characters"
        ));
    }
    Ok(())
}
