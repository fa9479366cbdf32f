use crate::utils::error::{Result, WisherError};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(WisherError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(WisherError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(WisherError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.trim().is_empty() {
        return Err(WisherError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(WisherError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| WisherError::MissingConfigError {
        field: field_name.to_string(),
    })
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(WisherError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(WisherError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("channel.endpoint", "https://example.com/send").is_ok());
        assert!(validate_url("channel.endpoint", "http://localhost:8080").is_ok());
        assert!(validate_url("channel.endpoint", "").is_err());
        assert!(validate_url("channel.endpoint", "invalid-url").is_err());
        assert!(validate_url("channel.endpoint", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_path() {
        assert!(validate_path("store.path", "birthdays.json").is_ok());
        assert!(validate_path("store.path", "  ").is_err());
        assert!(validate_path("store.path", "bad\0path").is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("notifier.post_send_delay_seconds", 15u64, 0, 3600).is_ok());
        assert!(validate_range("notifier.post_send_delay_seconds", 7200u64, 0, 3600).is_err());
    }

    #[test]
    fn test_validate_required_field() {
        let program: Option<String> = None;
        let err = validate_required_field("channel.program", &program).unwrap_err();
        assert!(matches!(err, WisherError::MissingConfigError { field } if field == "channel.program"));

        let program = Some("notify.sh".to_string());
        assert_eq!(
            validate_required_field("channel.program", &program).unwrap(),
            "notify.sh"
        );
    }
}
