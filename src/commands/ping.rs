use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::{
    command::{CommandDefinition, SlashHandler},
    errors::CommandError,
    interaction::CommandInteraction,
    Bot,
};

/// Used for checking the bot is up and running
pub struct Ping;

#[async_trait]
impl SlashHandler<Bot> for Ping {
    async fn on_slash_command(&self, interaction: &CommandInteraction<Bot>) -> Result<()> {
        interaction.reply("pong!").await
    }
}

pub fn definition(bot: Arc<Bot>) -> Result<CommandDefinition<Bot>, CommandError> {
    CommandDefinition::builder()
        .owner(bot)
        .name("ping")
        .description("Check that the bot is up and running")
        .handler(Ping)
        .build()
}
