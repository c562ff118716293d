use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{Extension, Router, routing::get};
use tokio::{
    net::TcpListener,
    sync::{Mutex, oneshot},
};

use crate::{Error, Res, api, types::CallbackParams};

/// Local listener that captures the single OAuth redirect.
///
/// The server task is started by [`CallbackServer::bind`] and shut down by
/// [`CallbackServer::wait_for_code`] once the callback arrived or the wait
/// timed out.
pub struct CallbackServer {
    addr: SocketAddr,
    expected_state: Option<String>,
    receiver: oneshot::Receiver<CallbackParams>,
    shutdown: oneshot::Sender<()>,
}

impl CallbackServer {
    /// Starts the listener on `addr`, serving `path`.
    ///
    /// When `expected_state` is given, only a callback echoing it back is
    /// accepted.
    pub async fn bind(addr: &str, path: &str, expected_state: Option<String>) -> Res<Self> {
        let (sender, receiver) = oneshot::channel();
        let slot: api::CallbackSlot = Arc::new(Mutex::new(Some(api::PendingCallback {
            sender,
            expected_state: expected_state.clone(),
        })));

        let app = Router::new().route(path, get(api::callback).layer(Extension(slot)));

        let listener = TcpListener::bind(addr).await.map_err(|e| {
            Error::Config(format!("cannot bind callback listener on {addr}: {e}"))
        })?;
        let addr = listener.local_addr()?;

        let (shutdown, shutdown_rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            let served = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await;
            if let Err(e) = served {
                tracing::warn!(error = %e, "callback listener stopped with an error");
            }
        });

        tracing::debug!(%addr, path, "callback listener started");
        Ok(Self {
            addr,
            expected_state,
            receiver,
            shutdown,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Blocks until the callback arrives, at most `timeout`.
    pub async fn wait_for_code(self, timeout: Duration) -> Res<String> {
        let received = tokio::time::timeout(timeout, self.receiver).await;
        let _ = self.shutdown.send(());

        let params = match received {
            Err(_) => return Err(Error::AuthorizationTimedOut(timeout.as_secs())),
            Ok(Err(_)) => {
                return Err(Error::MissingAuthorizationCode(
                    "callback listener stopped".to_string(),
                ));
            }
            Ok(Ok(params)) => params,
        };

        params
            .validate(self.expected_state.as_deref())
            .map(str::to_string)
    }
}
