//! Port definitions: traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that both the use-case layer and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod invocation_store;
pub mod recipe_repo;
pub mod remote;
pub mod service_registry;
pub mod service_repo;
pub mod trigger_sink;

pub use invocation_store::InvocationStore;
pub use recipe_repo::RecipeRepository;
pub use remote::{
    ExchangeClient, InvoiceClient, MailSender, MailboxClient, MailboxSession, OrderRequest,
    OrderResult, OrderSide, OrderType, OutgoingEmail,
};
pub use service_registry::ServiceRegistry;
pub use service_repo::ExternalServiceRepository;
pub use trigger_sink::TriggerSink;
