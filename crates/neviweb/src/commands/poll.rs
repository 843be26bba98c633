//! Polling handler: one cycle, or the background loop until Ctrl-C.

use neviweb_core::{Controller, RefreshSummary};
use tokio_util::sync::CancellationToken;

use crate::cli::{GlobalOpts, PollArgs};
use crate::error::CliError;
use crate::output;

fn summary_detail(s: &RefreshSummary) -> String {
    format!(
        "Updated:      {}\n\
         Unchanged:    {}\n\
         Skipped:      {}\n\
         Timed out:    {}\n\
         Deactivated:  {}\n\
         Rejected:     {}\n\
         Failed:       {}",
        s.updated, s.unchanged, s.skipped, s.timed_out, s.deactivated, s.rejected, s.failed
    )
}

fn print_summary(summary: &RefreshSummary, global: &GlobalOpts) -> Result<(), CliError> {
    let out = output::render_single(&global.output, summary, summary_detail, |s| {
        s.updated.to_string()
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn handle(
    controller: &Controller,
    args: PollArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let summary = controller.refresh_all().await;
    print_summary(&summary, global)?;
    if args.once {
        return Ok(());
    }

    let interval = controller.config().scan_interval;
    if !global.quiet {
        eprintln!(
            "Polling every {}s, press Ctrl-C to stop",
            interval.as_secs()
        );
    }

    let cancel = CancellationToken::new();
    let handle = controller.start(cancel.clone());
    let mut last_refresh = controller.store().last_refresh();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = last_refresh.changed() => {
                if changed.is_err() {
                    break;
                }
                let at = *last_refresh.borrow_and_update();
                if let Some(at) = at {
                    tracing::info!(at = %at.format("%H:%M:%S"), "poll cycle complete");
                }
            }
        }
    }

    cancel.cancel();
    if let Err(e) = handle.await {
        tracing::warn!(error = %e, "refresh task ended abnormally");
    }
    Ok(())
}
