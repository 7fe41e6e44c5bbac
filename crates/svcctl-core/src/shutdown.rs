//! Blocking wait for an interactive shutdown request (Ctrl-C, SIGTERM).

use tracing::info;

pub fn wait_for_shutdown() -> std::io::Result<()> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    rt.block_on(async {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let mut term = signal(SignalKind::terminate())?;
            tokio::select! {
                res = tokio::signal::ctrl_c() => res?,
                _ = term.recv() => {}
            }
        }
        #[cfg(not(unix))]
        tokio::signal::ctrl_c().await?;

        info!("shutdown signal received");
        Ok(())
    })
}
