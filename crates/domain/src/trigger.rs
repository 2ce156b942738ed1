//! Triggers: typed notifications that something changed remotely, and the
//! subscriptions recipes declare to receive them.

use serde::{Deserialize, Serialize};

use crate::id::ServiceId;

/// Trigger kinds produced by the built-in watchers.
pub mod trigger_kind {
    /// An invoice appeared or changed status on an invoice feed.
    pub const INVOICE_STATUS_CHANGED: &str = "InvoiceStatusChanged";
    /// A new email arrived in a watched mailbox.
    pub const RECEIVED_EMAIL: &str = "ReceivedEmail";
}

/// Key under which every trigger records the originating service.
pub const EXTERNAL_SERVICE_ID_KEY: &str = "ExternalServiceId";

/// Event data: the context recipes are executed against.
pub type EventData = serde_json::Map<String, serde_json::Value>;

/// One detected change, consumed once by the trigger dispatcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerEvent {
    pub kind: String,
    pub data: EventData,
}

impl TriggerEvent {
    #[must_use]
    pub fn new(kind: impl Into<String>, data: EventData) -> Self {
        Self {
            kind: kind.into(),
            data,
        }
    }

    /// Build an event raised by `service_id`, storing `payload` under `key`.
    #[must_use]
    pub fn from_service(
        kind: impl Into<String>,
        service_id: ServiceId,
        key: &str,
        payload: serde_json::Value,
    ) -> Self {
        let mut data = EventData::new();
        data.insert(
            EXTERNAL_SERVICE_ID_KEY.to_string(),
            serde_json::Value::String(service_id.to_string()),
        );
        data.insert(key.to_string(), payload);
        Self::new(kind, data)
    }

    /// The service that raised this event, if recorded.
    #[must_use]
    pub fn service_id(&self) -> Option<ServiceId> {
        self.data
            .get(EXTERNAL_SERVICE_ID_KEY)
            .and_then(serde_json::Value::as_str)
            .and_then(|s| s.parse().ok())
    }
}

/// A recipe's subscription to one trigger kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeTrigger {
    pub kind: String,
    /// Only accept events raised by this service.
    #[serde(default)]
    pub external_service_id: Option<ServiceId>,
    /// Kind-specific narrowing, see [`RecipeTrigger::matches`].
    #[serde(default)]
    pub filter: serde_json::Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct InvoiceFilter {
    statuses: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EmailFilter {
    from_contains: Option<String>,
    subject_contains: Option<String>,
}

impl RecipeTrigger {
    #[must_use]
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            external_service_id: None,
            filter: serde_json::Value::Null,
        }
    }

    #[must_use]
    pub fn for_service(mut self, service_id: ServiceId) -> Self {
        self.external_service_id = Some(service_id);
        self
    }

    #[must_use]
    pub fn with_filter(mut self, filter: serde_json::Value) -> Self {
        self.filter = filter;
        self
    }

    /// Check whether this subscription accepts `event`.
    ///
    /// - `InvoiceStatusChanged` honours `{"statuses": [..]}` (case-insensitive).
    /// - `ReceivedEmail` honours `{"from_contains": .., "subject_contains": ..}`.
    ///
    /// A filter that cannot be decoded rejects every event.
    #[must_use]
    pub fn matches(&self, event: &TriggerEvent) -> bool {
        if self.kind != event.kind {
            return false;
        }
        if let Some(expected) = self.external_service_id {
            if event.service_id() != Some(expected) {
                return false;
            }
        }
        if self.filter.is_null() {
            return true;
        }
        match self.kind.as_str() {
            trigger_kind::INVOICE_STATUS_CHANGED => self.matches_invoice(event),
            trigger_kind::RECEIVED_EMAIL => self.matches_email(event),
            _ => true,
        }
    }

    fn matches_invoice(&self, event: &TriggerEvent) -> bool {
        let Ok(filter) = serde_json::from_value::<InvoiceFilter>(self.filter.clone()) else {
            return false;
        };
        if filter.statuses.is_empty() {
            return true;
        }
        let status = event
            .data
            .get("Invoice")
            .and_then(|invoice| invoice.get("status"))
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default();
        filter
            .statuses
            .iter()
            .any(|s| s.eq_ignore_ascii_case(status))
    }

    fn matches_email(&self, event: &TriggerEvent) -> bool {
        let Ok(filter) = serde_json::from_value::<EmailFilter>(self.filter.clone()) else {
            return false;
        };
        let field = |name: &str| {
            event
                .data
                .get("Email")
                .and_then(|email| email.get(name))
                .and_then(serde_json::Value::as_str)
                .unwrap_or_default()
                .to_lowercase()
        };
        let contains = |needle: &Option<String>, name: &str| {
            needle
                .as_ref()
                .is_none_or(|n| field(name).contains(&n.to_lowercase()))
        };
        contains(&filter.from_contains, "from") && contains(&filter.subject_contains, "subject")
    }
}

impl std::fmt::Display for RecipeTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.external_service_id {
            Some(id) => write!(f, "{}({id})", self.kind),
            None => f.write_str(&self.kind),
        }
    }
}
