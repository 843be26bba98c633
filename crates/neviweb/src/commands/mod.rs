//! Command dispatch: bridges CLI args -> controller calls -> output formatting.

pub mod attributes;
pub mod config_cmd;
pub mod devices;
pub mod networks;
pub mod poll;
pub mod stats;
pub mod util;

use neviweb_core::Controller;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a session-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    controller: &Controller,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Networks(args) => networks::handle(controller, args, global).await,
        Command::Devices(args) => devices::handle(controller, args, global).await,
        Command::Attributes(args) => attributes::handle(controller, args, global).await,
        Command::Stats(args) => stats::handle(controller, args, global).await,
        Command::Poll(args) => poll::handle(controller, args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
