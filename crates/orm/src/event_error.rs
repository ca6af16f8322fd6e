use std::fmt;

/// Failure raised by a model observer
#[derive(Debug, Clone)]
pub enum EventError {
    Validation {
        message: String,
        hint: Option<String>,
    },
    Observer {
        message: String,
    },
}

impl EventError {
    pub fn validation(message: &str) -> Self {
        Self::Validation {
            message: message.to_string(),
            hint: None,
        }
    }

    pub fn validation_with_hint(message: &str, hint: &str) -> Self {
        Self::Validation {
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    pub fn observer(message: &str) -> Self {
        Self::Observer {
            message: message.to_string(),
        }
    }
}

impl fmt::Display for EventError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventError::Validation { message, hint } => {
                write!(f, "Validation error: {}", message)?;
                if let Some(hint) = hint {
                    write!(f, " (hint: {})", hint)?;
                }
                Ok(())
            }
            EventError::Observer { message } => write!(f, "Observer error: {}", message),
        }
    }
}

impl std::error::Error for EventError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_error_validation_with_hint() {
        let error = EventError::validation_with_hint("Invalid email format", "Use user@domain.com");

        match &error {
            EventError::Validation { message, hint } => {
                assert_eq!(message, "Invalid email format");
                assert_eq!(hint.as_deref(), Some("Use user@domain.com"));
            }
            _ => panic!("Expected validation error"),
        }
        assert_eq!(
            error.to_string(),
            "Validation error: Invalid email format (hint: Use user@domain.com)"
        );
    }

    #[test]
    fn test_event_error_observer_display() {
        let error = EventError::observer("mailer unavailable");
        assert_eq!(error.to_string(), "Observer error: mailer unavailable");
    }
}
