use thiserror::Error;

use crate::signature::SignatureError;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Signature(#[from] SignatureError),
    #[error("response rendering failure: {0}")]
    Rendering(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("forbidden: {message}")]
    Forbidden { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Forbidden { .. } => "Request signature could not be verified.",
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Self::Forbidden { .. } => 403,
            Self::Internal { .. } => 500,
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::Forbidden { correlation_id, .. } | Self::Internal { correlation_id, .. } => {
                correlation_id
            }
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::Forbidden { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        match value {
            ApplicationError::Signature(error) => Self::Forbidden {
                message: error.to_string(),
                correlation_id: "unassigned".to_owned(),
            },
            ApplicationError::Rendering(message) => {
                Self::Internal { message, correlation_id: "unassigned".to_owned() }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::{ApplicationError, InterfaceError};
    use crate::signature::SignatureError;

    #[test]
    fn signature_error_maps_to_forbidden_interface_error() {
        let interface =
            ApplicationError::from(SignatureError::Mismatch).into_interface("req-1");

        assert!(matches!(
            interface,
            InterfaceError::Forbidden {
                ref correlation_id,
                ..
            } if correlation_id == "req-1"
        ));
        assert_eq!(interface.status_code(), 403);
    }

    #[test]
    fn forbidden_has_user_safe_message() {
        let interface = ApplicationError::from(SignatureError::Missing).into_interface("req-2");

        assert_eq!(interface.user_message(), "Request signature could not be verified.");
        assert_eq!(interface.correlation_id(), "req-2");
    }

    #[test]
    fn rendering_error_maps_to_internal() {
        let interface =
            ApplicationError::Rendering("template missing".to_owned()).into_interface("req-3");

        assert!(matches!(interface, InterfaceError::Internal { .. }));
        assert_eq!(interface.status_code(), 500);
        assert_eq!(interface.user_message(), "An unexpected internal error occurred.");
    }
}
