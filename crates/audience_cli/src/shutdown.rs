use audience::Shutdown;
use console::Term;

/// Install the Ctrl+C handler and return the cancellation flag to thread
/// through collection.
///
/// The first Ctrl+C requests a graceful stop; a second one force-quits.
pub(crate) fn install() -> Shutdown {
    let shutdown = Shutdown::new();
    let flag = shutdown.clone();

    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");

        let is_tty = Term::stdout().is_term();
        if is_tty {
            eprintln!("\n\nShutdown requested, finishing current operations...");
            eprintln!("Press Ctrl+C again to force quit.");
        } else {
            tracing::warn!("Shutdown requested, finishing current operations");
        }

        flag.cancel();

        // Wait for second Ctrl+C for force quit
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install second Ctrl+C handler");

        if is_tty {
            eprintln!("Force quit!");
        }
        std::process::exit(130);
    });

    shutdown
}
