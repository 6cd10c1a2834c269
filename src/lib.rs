//! Declare Discord slash commands with typed options and subcommands, and
//! dispatch each interaction to the command's handler along with the bot
//! that owns it.

use std::time::{Duration, Instant};

use config::Config;

pub mod command;
pub mod commands;
pub mod config;
pub mod errors;
pub mod interaction;
pub mod options;
pub mod registry;

pub use command::{CommandBuilder, CommandDefinition, SlashHandler};
pub use errors::CommandError;
pub use interaction::{
    CommandInteraction, CustomReply, InteractionReplies, InteractionResponder, ReplyEmbed,
    Responder, SerenityResponder, SlashEvent,
};
pub use options::{OptionDescriptor, OptionType, OptionValue};
pub use registry::CommandRegistry;

/// The bot owning the demo commands, handed to every interaction
#[derive(Debug)]
pub struct Bot {
    pub config: Config,
    started_at: Instant,
}

impl Bot {
    pub fn new(config: Config) -> Self {
        Bot {
            config,
            started_at: Instant::now(),
        }
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }
}
