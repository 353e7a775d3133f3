//! OS signal and fault handling.
//!
//! SIGINT, SIGTERM and SIGUSR2 all request the same graceful shutdown.
//! Signals that arrive after the first are logged and ignored by [`Shutdown`].

use tokio::task::JoinHandle;

use crate::lifecycle::shutdown::{Shutdown, ShutdownReason};

/// Register signal handlers and forward every delivery to `shutdown`.
#[cfg(unix)]
pub fn spawn_signal_listener(shutdown: Shutdown) -> std::io::Result<JoinHandle<()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigusr2 = signal(SignalKind::user_defined2())?;

    Ok(tokio::spawn(async move {
        loop {
            let name = tokio::select! {
                _ = sigint.recv() => "SIGINT",
                _ = sigterm.recv() => "SIGTERM",
                _ = sigusr2.recv() => "SIGUSR2",
            };
            tracing::info!(signal = name, "Received signal");
            shutdown.trigger(ShutdownReason::Signal(name));
        }
    }))
}

/// Register the Ctrl+C handler and forward every delivery to `shutdown`.
#[cfg(not(unix))]
pub fn spawn_signal_listener(shutdown: Shutdown) -> std::io::Result<JoinHandle<()>> {
    Ok(tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!(signal = "ctrl-c", "Received signal");
            shutdown.trigger(ShutdownReason::Signal("ctrl-c"));
        }
    }))
}

/// Escalate any panic in the process to a shutdown request.
///
/// The previous hook still runs first, so the panic message is printed as usual.
pub fn install_panic_hook(shutdown: Shutdown) {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        previous(info);
        shutdown.trigger(ShutdownReason::Fault(info.to_string()));
    }));
}
