//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`SwitchyardError`] via `#[from]` or an explicit `From` impl.

/// Top-level error shared by the domain and application layers.
#[derive(Debug, thiserror::Error)]
pub enum SwitchyardError {
    /// A domain invariant was violated.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// A referenced record does not exist.
    #[error("not found")]
    NotFound(#[from] NotFoundError),

    /// A contract violation that cannot be recovered at runtime.
    #[error("configuration error")]
    Configuration(#[from] ConfigurationError),

    /// A remote external-service call failed.
    #[error("remote service error")]
    Remote(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A persistence adapter failed.
    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Domain invariant violations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A required name is empty.
    #[error("name must not be empty")]
    EmptyName,

    /// An external service has no type discriminator.
    #[error("service type must not be empty")]
    EmptyServiceType,

    /// A recipe trigger has no kind.
    #[error("trigger kind must not be empty")]
    EmptyTriggerKind,

    /// A recipe action has no handler identifier.
    #[error("action id must not be empty")]
    EmptyActionId,
}

/// A lookup that found nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    /// Kind of record (e.g. `"Recipe"`).
    pub entity: &'static str,
    /// Identifier that was looked up.
    pub id: String,
}

/// Contract violations between collaborators.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    /// A registry notification carried an action outside the known set.
    #[error("unknown change action {0:?}")]
    UnknownChangeAction(String),

    /// A checkpoint stored for a service cannot be read by its watcher.
    #[error("malformed checkpoint for service {service_id}: {reason}")]
    MalformedCheckpoint {
        /// Owning service.
        service_id: String,
        /// Decoder message.
        reason: String,
    },

    /// A service configuration cannot be read by its watcher or client.
    #[error("malformed config for service {service_id}: {reason}")]
    MalformedServiceConfig {
        /// Owning service.
        service_id: String,
        /// Decoder message.
        reason: String,
    },

    /// An action's configuration cannot be decoded into its handler's
    /// typed settings (e.g. an unknown toggle option).
    #[error("malformed config for action {action_id}: {reason}")]
    MalformedActionConfig {
        /// Handler identifier.
        action_id: String,
        /// Decoder message.
        reason: String,
    },
}

impl SwitchyardError {
    /// Wrap any error coming from a remote client.
    pub fn remote(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Remote(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_display_not_found_error() {
        let err = NotFoundError {
            entity: "Recipe",
            id: "abc".to_string(),
        };
        assert_eq!(err.to_string(), "Recipe abc not found");
    }

    #[test]
    fn should_convert_validation_error() {
        let err: SwitchyardError = ValidationError::EmptyName.into();
        assert!(matches!(
            err,
            SwitchyardError::Validation(ValidationError::EmptyName)
        ));
    }

    #[test]
    fn should_display_unknown_change_action() {
        let err = ConfigurationError::UnknownChangeAction("Renamed".to_string());
        assert_eq!(err.to_string(), "unknown change action \"Renamed\"");
    }

    #[test]
    fn should_keep_remote_source() {
        let io = std::io::Error::other("connection reset");
        let err = SwitchyardError::remote(io);
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "connection reset");
    }
}
