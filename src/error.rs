//! Error types shared by the loader, dispatcher, export engine and forms.

use thiserror::Error;

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, DeskError>;

/// Generic message shown when the backend gives no usable error text.
pub fn fallback_message(status: u16) -> String {
    format!("Une erreur est survenue (HTTP {status})")
}

/// Everything that can go wrong between a page action and its outcome.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DeskError {
    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The backend answered with a non-2xx status.
    #[error("HTTP {status}: {message}")]
    Http {
        /// Response status code.
        status: u16,
        /// Message read from the body, or the generic fallback.
        message: String,
    },

    /// Export was requested on an empty list.
    #[error("nothing to export for {resource}")]
    EmptyExport {
        /// Resource whose list was empty.
        resource: String,
    },

    /// Required form fields are still empty.
    #[error("missing required fields: {}", fields.join(", "))]
    Validation {
        /// Names of the empty required fields.
        fields: Vec<String>,
    },

    /// A response body could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// A document backend failed while building the file.
    #[error("export error: {0}")]
    Export(String),

    /// File system failure.
    #[error("I/O error: {0}")]
    Io(String),

    /// Configuration could not be read or parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// The current role is not allowed to open this resource.
    #[error("role {actual} cannot access a {expected} resource")]
    Forbidden {
        /// Role the resource belongs to.
        expected: String,
        /// Role of the current profile.
        actual: String,
    },

    /// No registry entry with this name.
    #[error("unknown resource: {0}")]
    UnknownResource(String),

    /// The resource does not offer this inline action.
    #[error("action {action} is not available on {resource}")]
    UnsupportedAction {
        /// Resource name.
        resource: String,
        /// Requested action.
        action: String,
    },
}

impl DeskError {
    /// Text suitable for a notification or an inline error banner.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Transport(_) => {
                "Impossible de joindre le serveur. Vérifiez votre connexion.".to_string()
            }
            Self::Http { message, .. } => message.clone(),
            Self::EmptyExport { .. } => "Aucune donnée à exporter.".to_string(),
            Self::Validation { fields } => {
                format!("Veuillez remplir les champs obligatoires : {}", fields.join(", "))
            }
            Self::Forbidden { .. } => "Accès non autorisé pour ce rôle.".to_string(),
            Self::UnknownResource(name) => format!("Ressource inconnue : {name}"),
            Self::UnsupportedAction { action, .. } => {
                format!("Action « {action} » indisponible sur cette page.")
            }
            Self::Decode(_) | Self::Export(_) | Self::Io(_) | Self::Config(_) => {
                "Une erreur inattendue est survenue.".to_string()
            }
        }
    }

    /// Whether re-running the same call could plausibly succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for DeskError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for DeskError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

impl From<std::io::Error> for DeskError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<csv::Error> for DeskError {
    fn from(err: csv::Error) -> Self {
        Self::Export(format!("csv: {err}"))
    }
}

impl From<rust_xlsxwriter::XlsxError> for DeskError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        Self::Export(format!("xlsx: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_errors_surface_server_message() {
        let err = DeskError::Http {
            status: 409,
            message: "Email déjà utilisé".to_string(),
        };
        assert_eq!(err.user_message(), "Email déjà utilisé");
        assert!(!err.is_retryable());
    }

    #[test]
    fn server_errors_and_transport_are_retryable() {
        let err = DeskError::Http {
            status: 503,
            message: fallback_message(503),
        };
        assert!(err.is_retryable());
        assert!(DeskError::Transport("connection refused".into()).is_retryable());
    }

    #[test]
    fn validation_lists_fields() {
        let err = DeskError::Validation {
            fields: vec!["module".into(), "vague".into()],
        };
        assert_eq!(err.to_string(), "missing required fields: module, vague");
        assert!(err.user_message().ends_with("module, vague"));
    }
}
