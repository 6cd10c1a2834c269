use std::sync::Arc;

use anyhow::{Context, Result};

use crate::{registry::CommandRegistry, Bot};

pub mod dice;
pub mod info;
pub mod ping;

/// Build the registry holding every command of the bot
pub fn create_registry(bot: Arc<Bot>) -> Result<CommandRegistry<Bot>> {
    let mut registry = CommandRegistry::new();
    for command in [
        ping::definition(Arc::clone(&bot)),
        dice::definition(Arc::clone(&bot)),
        info::definition(Arc::clone(&bot)),
    ] {
        let command = command.context("Invalid command definition")?;
        let name = command.name().to_owned();
        registry
            .register(command)
            .context(format!("Could not register /{name}"))?;
    }
    Ok(registry)
}
