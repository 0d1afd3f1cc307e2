//! Line commands the terminal host accepts while a session is open, and their
//! dispatch onto a [`SessionController`].

use std::str::FromStr;

use thiserror::Error;

use super::{controller::SessionController, SessionSnapshot};
use crate::{db::SessionRecord, error::SessionResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostCommand {
    Start,
    Pause,
    /// Asks for confirmation before anything happens.
    Stop,
    Confirm,
    ToggleCountUp,
    Restart,
    Status,
    Help,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown command `{0}`; type `help` for the list")]
pub struct UnknownCommand(pub String);

impl FromStr for HostCommand {
    type Err = UnknownCommand;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_ascii_lowercase().as_str() {
            "s" | "start" | "resume" => Ok(HostCommand::Start),
            "p" | "pause" => Ok(HostCommand::Pause),
            "q" | "stop" | "quit" => Ok(HostCommand::Stop),
            "y" | "yes" => Ok(HostCommand::Confirm),
            "t" | "toggle" => Ok(HostCommand::ToggleCountUp),
            "r" | "restart" => Ok(HostCommand::Restart),
            "?" | "status" => Ok(HostCommand::Status),
            "h" | "help" => Ok(HostCommand::Help),
            other => Err(UnknownCommand(other.to_string())),
        }
    }
}

pub const HELP: &str = "\
s, start     start or resume
p, pause     pause
q, stop      stop early (asks to confirm)
t, toggle    switch between count-up and count-down
r, restart   fresh session after a stop or finish
?, status    show the timer
h, help      this list";

/// What running a command produced, for the host to print.
#[derive(Debug, Clone)]
pub enum CommandOutcome {
    Snapshot(SessionSnapshot),
    AwaitingConfirmation,
    Stopped(SessionRecord),
    CountUp(bool),
    Help,
    Ignored,
}

/// Holds the one piece of host-side state: whether a stop is waiting for `y`.
#[derive(Debug, Default)]
pub struct CommandDispatcher {
    stop_pending: bool,
}

impl CommandDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop_pending(&self) -> bool {
        self.stop_pending
    }

    pub async fn dispatch(
        &mut self,
        controller: &SessionController,
        command: HostCommand,
    ) -> SessionResult<CommandOutcome> {
        // Anything other than a confirmation cancels a pending stop.
        let confirmed = std::mem::take(&mut self.stop_pending) && command == HostCommand::Confirm;

        match command {
            HostCommand::Start => controller.start().await.map(CommandOutcome::Snapshot),
            HostCommand::Pause => controller.pause().await.map(CommandOutcome::Snapshot),
            HostCommand::Stop => {
                if controller.status().await.is_finished() {
                    return Ok(CommandOutcome::Ignored);
                }
                self.stop_pending = true;
                Ok(CommandOutcome::AwaitingConfirmation)
            }
            HostCommand::Confirm if confirmed => {
                controller.stop().await.map(CommandOutcome::Stopped)
            }
            HostCommand::Confirm => Ok(CommandOutcome::Ignored),
            HostCommand::ToggleCountUp => {
                Ok(CommandOutcome::CountUp(controller.toggle_count_up().await))
            }
            HostCommand::Restart => controller.restart().await.map(CommandOutcome::Snapshot),
            HostCommand::Status => Ok(CommandOutcome::Snapshot(controller.snapshot().await)),
            HostCommand::Help => Ok(CommandOutcome::Help),
        }
    }
}
