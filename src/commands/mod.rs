pub mod render;
pub mod serve;

pub use render::print_output;
pub use serve::execute_serve;

use crate::core::{command::GitCommand, error::Result};
use crate::service::Dispatcher;
use log::debug;
use std::path::Path;
use std::time::Duration;

/// Run a single command through `dispatcher` and print its result.
///
/// With `json` set the typed output is written as one JSON document,
/// otherwise it is rendered for a terminal.
pub async fn execute_command(
    dispatcher: &Dispatcher,
    repo: &Path,
    command: GitCommand,
    timeout: Option<Duration>,
    json: bool,
) -> Result<()> {
    debug!("{}: {command}", repo.display());
    let output = dispatcher.dispatch(repo, command.clone(), timeout).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_output(&command, &output);
    }
    Ok(())
}
