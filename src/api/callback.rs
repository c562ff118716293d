use std::sync::Arc;

use axum::{Extension, extract::Query, response::Html};
use tokio::sync::{Mutex, oneshot};

use crate::{Error, types::CallbackParams, warning};

/// The one callback the listener is waiting for.
#[derive(Debug)]
pub struct PendingCallback {
    pub sender: oneshot::Sender<CallbackParams>,
    pub expected_state: Option<String>,
}

/// Single-slot result channel shared with the callback handler.
pub type CallbackSlot = Arc<Mutex<Option<PendingCallback>>>;

const RECEIVED: &str = "<h1>Authorization received! You can close this tab.</h1>";
const DENIED: &str = "<h1>Authorization failed.</h1><p>No authorization code was received. You can close this tab.</p>";
const STATE_MISMATCH: &str = "<h1>Authorization failed.</h1><p>The request did not match the pending authorization. You can close this tab.</p>";
const ALREADY_HANDLED: &str = "<h4>Authorization was already handled.</h4>";

pub async fn callback(
    Query(params): Query<CallbackParams>,
    Extension(slot): Extension<CallbackSlot>,
) -> Html<&'static str> {
    let Some(pending) = slot.lock().await.take() else {
        return Html(ALREADY_HANDLED);
    };

    let page = match params.validate(pending.expected_state.as_deref()) {
        Ok(_) => RECEIVED,
        Err(Error::AuthorizationStateMismatch) => STATE_MISMATCH,
        Err(_) => DENIED,
    };

    if pending.sender.send(params).is_err() {
        warning!("Authorization callback arrived after the wait was abandoned");
    }

    Html(page)
}
