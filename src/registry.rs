use std::{collections::HashMap, sync::Arc};

use anyhow::{bail, Context, Result};
use serenity::{
    builder::CreateApplicationCommand,
    http::Http,
    model::{application::command::Command, id::GuildId},
};
use tracing::{debug, info};

use crate::{
    command::CommandDefinition,
    errors::CommandError,
    interaction::{Responder, SlashEvent},
};

/// The commands a bot serves, keyed by name
///
/// Filled once at startup, then only read while dispatching interactions.
pub struct CommandRegistry<B> {
    commands: HashMap<String, CommandDefinition<B>>,
}

impl<B> Default for CommandRegistry<B> {
    fn default() -> Self {
        CommandRegistry {
            commands: HashMap::new(),
        }
    }
}

impl<B: Send + Sync + 'static> CommandRegistry<B> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a command, failing fast if Discord would refuse it
    pub fn register(&mut self, command: CommandDefinition<B>) -> Result<(), CommandError> {
        command.validate()?;
        if self.commands.contains_key(command.name()) {
            return Err(CommandError::DuplicateCommand(command.name().to_owned()));
        }
        debug!("Registered /{}", command.name());
        self.commands.insert(command.name().to_owned(), command);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&CommandDefinition<B>> {
        self.commands.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Registered command names, sorted
    pub fn command_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Find the command the event targets and run it
    pub async fn dispatch(&self, event: SlashEvent, responder: Arc<dyn Responder>) -> Result<()> {
        let Some(command) = self.commands.get(&event.command_name) else {
            bail!(CommandError::UnknownCommand(event.command_name));
        };
        command.dispatch(event, responder).await
    }

    /// Serenity builders for every registered command
    pub fn application_commands(&self) -> Result<Vec<CreateApplicationCommand>, CommandError> {
        self.command_names()
            .into_iter()
            .filter_map(|name| self.commands.get(name))
            .map(CommandDefinition::to_application_command)
            .collect()
    }

    /// Replace the global commands of the application with the registered ones
    pub async fn register_global(&self, http: &Http) -> Result<()> {
        let commands = self.application_commands()?;
        let count = commands.len();
        Command::set_global_application_commands(http, |c| c.set_application_commands(commands))
            .await
            .context("Failed to register global commands")?;
        info!("Registered {count} global commands");
        Ok(())
    }

    /// Replace the commands of one guild, they are available immediately unlike global ones
    pub async fn register_guild(&self, http: &Http, guild_id: GuildId) -> Result<()> {
        let commands = self.application_commands()?;
        let count = commands.len();
        guild_id
            .set_application_commands(http, |c| c.set_application_commands(commands))
            .await
            .context(format!("Failed to register commands for guild {guild_id}"))?;
        info!("Registered {count} commands for guild {guild_id}");
        Ok(())
    }
}
