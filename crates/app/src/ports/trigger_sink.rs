//! Trigger sink port: where watchers hand detected trigger events.

use std::future::Future;
use std::sync::Arc;

use switchyard_domain::trigger::TriggerEvent;

/// Consumes trigger events. Implementations must not fail: whatever goes
/// wrong downstream is captured and logged there.
pub trait TriggerSink: Send + Sync {
    /// Route one event to every interested recipe and wait for them.
    fn dispatch_trigger(&self, event: TriggerEvent) -> impl Future<Output = ()> + Send;
}

impl<T: TriggerSink> TriggerSink for Arc<T> {
    fn dispatch_trigger(&self, event: TriggerEvent) -> impl Future<Output = ()> + Send {
        (**self).dispatch_trigger(event)
    }
}
