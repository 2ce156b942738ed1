//! External service: one configured remote account the system watches or
//! acts against (a mailbox, an invoice feed, an exchange account).
//!
//! The `config` blob holds credentials and connection settings and is opaque
//! to the core. The `checkpoint` blob is owned by the watcher of the
//! service's type and records what was last observed remotely.

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigurationError, SwitchyardError, ValidationError};
use crate::id::ServiceId;

/// Well-known service type discriminators.
pub mod service_type {
    /// Mailbox polled for received emails.
    pub const MAILBOX: &str = "mailbox";
    /// Payment-processor store whose invoices are polled for status changes.
    pub const INVOICE_FEED: &str = "invoice_feed";
    /// Exchange account orders are placed against.
    pub const EXCHANGE: &str = "exchange";
}

/// A configured external service instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalService {
    pub id: ServiceId,
    pub name: String,
    pub service_type: String,
    /// Credentials and settings, opaque to the core.
    #[serde(default)]
    pub config: serde_json::Value,
    /// Watcher-owned state; `null` until the first scan completes.
    #[serde(default)]
    pub checkpoint: serde_json::Value,
}

impl ExternalService {
    /// Create a builder for constructing an [`ExternalService`].
    #[must_use]
    pub fn builder() -> ExternalServiceBuilder {
        ExternalServiceBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`SwitchyardError::Validation`] when the name or the service
    /// type is empty.
    pub fn validate(&self) -> Result<(), SwitchyardError> {
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        if self.service_type.is_empty() {
            return Err(ValidationError::EmptyServiceType.into());
        }
        Ok(())
    }

    /// Decode the configuration blob into a typed settings struct.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::MalformedServiceConfig`] when the blob
    /// does not match `T`.
    pub fn config_as<T: DeserializeOwned>(&self) -> Result<T, SwitchyardError> {
        serde_json::from_value(self.config.clone()).map_err(|err| {
            ConfigurationError::MalformedServiceConfig {
                service_id: self.id.to_string(),
                reason: err.to_string(),
            }
            .into()
        })
    }

    /// Decode the checkpoint blob; a `null` checkpoint yields `T::default()`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::MalformedCheckpoint`] when the blob
    /// does not match `T`.
    pub fn checkpoint_as<T: DeserializeOwned + Default>(&self) -> Result<T, SwitchyardError> {
        if self.checkpoint.is_null() {
            return Ok(T::default());
        }
        serde_json::from_value(self.checkpoint.clone()).map_err(|err| {
            ConfigurationError::MalformedCheckpoint {
                service_id: self.id.to_string(),
                reason: err.to_string(),
            }
            .into()
        })
    }

    /// Return a copy carrying `checkpoint` instead of the current one.
    #[must_use]
    pub fn with_checkpoint(&self, checkpoint: serde_json::Value) -> Self {
        Self {
            checkpoint,
            ..self.clone()
        }
    }
}

/// Step-by-step builder for [`ExternalService`].
#[derive(Debug, Default)]
pub struct ExternalServiceBuilder {
    id: Option<ServiceId>,
    name: Option<String>,
    service_type: Option<String>,
    config: Option<serde_json::Value>,
    checkpoint: Option<serde_json::Value>,
}

impl ExternalServiceBuilder {
    #[must_use]
    pub fn id(mut self, id: ServiceId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn service_type(mut self, service_type: impl Into<String>) -> Self {
        self.service_type = Some(service_type.into());
        self
    }

    #[must_use]
    pub fn config(mut self, config: serde_json::Value) -> Self {
        self.config = Some(config);
        self
    }

    #[must_use]
    pub fn checkpoint(mut self, checkpoint: serde_json::Value) -> Self {
        self.checkpoint = Some(checkpoint);
        self
    }

    /// Consume the builder, validate, and return an [`ExternalService`].
    ///
    /// # Errors
    ///
    /// Returns [`SwitchyardError::Validation`] if required fields are missing or empty.
    pub fn build(self) -> Result<ExternalService, SwitchyardError> {
        let service = ExternalService {
            id: self.id.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            service_type: self.service_type.unwrap_or_default(),
            config: self.config.unwrap_or(serde_json::Value::Null),
            checkpoint: self.checkpoint.unwrap_or(serde_json::Value::Null),
        };
        service.validate()?;
        Ok(service)
    }
}

/// What happened to a registry record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeAction {
    Added,
    Removed,
    Updated,
}

impl ChangeAction {
    /// Stable textual name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Added => "Added",
            Self::Removed => "Removed",
            Self::Updated => "Updated",
        }
    }
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeAction {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Added" => Ok(Self::Added),
            "Removed" => Ok(Self::Removed),
            "Updated" => Ok(Self::Updated),
            other => Err(ConfigurationError::UnknownChangeAction(other.to_string())),
        }
    }
}

/// A registry change notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceChange {
    pub action: ChangeAction,
    pub item: ExternalService,
}

impl ServiceChange {
    #[must_use]
    pub fn added(item: ExternalService) -> Self {
        Self {
            action: ChangeAction::Added,
            item,
        }
    }

    #[must_use]
    pub fn removed(item: ExternalService) -> Self {
        Self {
            action: ChangeAction::Removed,
            item,
        }
    }

    #[must_use]
    pub fn updated(item: ExternalService) -> Self {
        Self {
            action: ChangeAction::Updated,
            item,
        }
    }
}
