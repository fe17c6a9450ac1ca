use crate::api::{self, Backend, Mode};
use crate::commands::Out;
use crate::conversation::{ConversationController, APOLOGY};
use crate::error::Error;
use crate::model::Message;
use crate::{render, Config, Result};

/// Sends `text` to the coach as the start of a new conversation and prints the answer.
pub async fn chat(config: Config, mode: Mode, text: &str) -> Result<Out<Message>> {
    let backend = api::backend(&config, mode)?;
    chat_with(backend.as_ref(), text).await
}

async fn chat_with(backend: &dyn Backend, text: &str) -> Result<Out<Message>> {
    let mut conversation = ConversationController::new();
    let request = conversation.send_message(text)?;
    let result = backend.chat(request).await;
    let failed = result.is_err();
    let reply = conversation
        .on_reply(result)
        .cloned()
        .ok_or_else(|| Error::protocol("The conversation did not record a reply"))?;
    if failed {
        return Err(Error::transport(APOLOGY));
    }
    Ok(Out::new(render::message(&reply), reply))
}
