//! Field checks shared by the form steps
//!
//! Each check either passes or yields a `SillError::Validation` naming the
//! offending field.

use sill_core::{Environments, Result, SillError};

/// Field must contain something besides whitespace
pub fn require_text(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(SillError::validation(field, "must not be empty"));
    }
    Ok(())
}

/// Absolute http(s) url
pub fn require_url(field: &'static str, value: &str) -> Result<()> {
    let rest = value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"))
        .ok_or_else(|| SillError::validation(field, format!("'{}' is not an http(s) url", value)))?;
    if rest.is_empty() || rest.starts_with('/') || rest.contains(char::is_whitespace) {
        return Err(SillError::validation(field, format!("'{}' has no host", value)));
    }
    Ok(())
}

pub fn optional_url(field: &'static str, value: Option<&str>) -> Result<()> {
    match value {
        Some(url) => require_url(field, url),
        None => Ok(()),
    }
}

/// A desktop software supports at least one operating system
pub fn require_desktop_os(os: &Environments) -> Result<()> {
    if os.linux || os.windows || os.mac || os.smartphone {
        return Ok(());
    }
    Err(SillError::validation("os", "select at least one operating system"))
}

/// Every external id is non-blank and appears once
pub fn require_distinct_ids(field: &'static str, ids: &[String]) -> Result<()> {
    for (i, id) in ids.iter().enumerate() {
        require_text(field, id)?;
        if ids[..i].contains(id) {
            return Err(SillError::validation(field, format!("'{}' listed twice", id)));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sill_core::Environment;

    #[test]
    fn test_require_text() {
        assert!(require_text("name", "GIMP").is_ok());
        let err = require_text("name", "   ").unwrap_err();
        assert_eq!(err.to_string(), "VALIDATION/name: must not be empty");
    }

    #[test]
    fn test_urls() {
        assert!(require_url("logoUrl", "https://example.org/logo.png").is_ok());
        assert!(require_url("logoUrl", "http://intranet").is_ok());
        assert!(require_url("logoUrl", "ftp://example.org").is_err());
        assert!(require_url("logoUrl", "https://").is_err());
        assert!(require_url("logoUrl", "https://exa mple.org").is_err());
        assert!(optional_url("publicUrl", None).is_ok());
    }

    #[test]
    fn test_desktop_os() {
        assert!(require_desktop_os(&Environments::default()).is_err());
        assert!(require_desktop_os(&Environments::default().with(Environment::Mac)).is_ok());
        // browser alone is a cloud software, not a desktop one
        assert!(require_desktop_os(&Environments::default().with(Environment::Browser)).is_err());
    }

    #[test]
    fn test_distinct_ids() {
        assert!(require_distinct_ids("similar", &["Q1".into(), "Q2".into()]).is_ok());
        assert!(require_distinct_ids("similar", &["Q1".into(), "Q1".into()]).is_err());
        assert!(require_distinct_ids("similar", &["".into()]).is_err());
    }
}
