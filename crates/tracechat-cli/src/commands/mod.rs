pub mod ask;
pub mod chat;
pub mod query;
pub mod render;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Cancels `token` on Ctrl-C until the returned handle is aborted.
pub fn cancel_on_ctrl_c(token: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("[tracechat] Ctrl-C received, cancelling turn");
            token.cancel();
        }
    })
}
