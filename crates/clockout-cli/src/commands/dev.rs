use clap::Subcommand;

use super::{open_timer, print_outcome, CliResult};

#[derive(Subcommand)]
pub enum DevAction {
    /// Move the end of the running shift one minute out
    EndSoon,
}

pub fn run(action: DevAction) -> CliResult {
    let mut timer = open_timer()?;

    match action {
        DevAction::EndSoon => {
            let event = timer.end_soon()?;
            print_outcome(&timer, event)?;
        }
    }
    Ok(())
}
