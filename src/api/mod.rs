//! # API Module
//!
//! HTTP handlers for the local listener that receives the OAuth redirect.
//!
//! The listener exists for exactly one request: the provider redirects the
//! user's browser to the configured `redirect_uri` with a `code` (or an
//! `error`) and a `state` query parameter. [`callback`] publishes those
//! parameters into a single-slot channel and answers with a static HTML
//! page that reflects whether the code and `state` were acceptable. Every later request finds the slot empty and gets a notice that the
//! authorization was already handled.
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use axum::{Extension, Router, routing::get};
//! use spotcollect::api::{CallbackSlot, PendingCallback, callback};
//!
//! let (sender, rx) = tokio::sync::oneshot::channel();
//! let slot: CallbackSlot = Arc::new(Mutex::new(Some(PendingCallback {
//!     sender,
//!     expected_state: Some(state.clone()),
//! })));
//! let app = Router::new().route("/callback", get(callback).layer(Extension(slot)));
//! ```
//!
//! ## Related Modules
//!
//! - [`crate::server`] - Binds the listener and awaits the slot
//! - [`crate::spotify::auth`] - Drives the authorization flow

mod callback;

pub use callback::{CallbackSlot, PendingCallback};
pub use callback::callback;
