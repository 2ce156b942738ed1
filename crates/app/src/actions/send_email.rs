//! `SendEmail`: sends a templated email through a mailbox service.

use serde::{Deserialize, Serialize};

use switchyard_domain::action_result::ActionHandlerResult;
use switchyard_domain::error::SwitchyardError;
use switchyard_domain::recipe::RecipeAction;
use switchyard_domain::trigger::EventData;

use super::{ActionContext, TypedActionHandler, describe};
use crate::ports::{MailSender, OutgoingEmail};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendEmailConfig {
    pub to: String,
    pub subject: String,
    #[serde(default)]
    pub body: String,
}

/// Handler for the `SendEmail` action.
pub struct SendEmailHandler<M> {
    sender: M,
}

impl<M> SendEmailHandler<M> {
    pub const ACTION_ID: &'static str = "SendEmail";

    pub fn new(sender: M) -> Self {
        Self { sender }
    }
}

impl<M: MailSender + 'static> TypedActionHandler for SendEmailHandler<M> {
    type Config = SendEmailConfig;

    fn action_id(&self) -> &'static str {
        Self::ACTION_ID
    }

    async fn execute(
        &self,
        _data: &EventData,
        action: &RecipeAction,
        config: SendEmailConfig,
        context: &ActionContext,
    ) -> Result<ActionHandlerResult, SwitchyardError> {
        let service = context.require_service(action)?;
        let to = config.to.clone();
        let email = OutgoingEmail {
            to: config.to,
            subject: config.subject,
            body: config.body,
        };

        match self.sender.send(service, email).await {
            Ok(message_id) => Ok(ActionHandlerResult::success(format!("Sent email to {to}"))
                .with_data(serde_json::json!({"message_id": message_id, "to": to}))),
            Err(err) => Ok(ActionHandlerResult::failure(format!(
                "Could not send email because {}",
                describe(&err)
            ))),
        }
    }
}
