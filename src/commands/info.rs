use std::{sync::Arc, time::Duration};

use anyhow::Result;
use async_trait::async_trait;

use crate::{
    command::{CommandDefinition, SlashHandler},
    errors::CommandError,
    interaction::{CommandInteraction, CustomReply, ReplyEmbed},
    options::OptionType,
    Bot,
};

fn format_uptime(uptime: Duration) -> String {
    let seconds = uptime.as_secs();
    format!(
        "{}d {}h {}m {}s",
        seconds / 86_400,
        seconds % 86_400 / 3600,
        seconds % 3600 / 60,
        seconds % 60
    )
}

pub struct BotInfo;

#[async_trait]
impl SlashHandler<Bot> for BotInfo {
    async fn on_slash_command(&self, interaction: &CommandInteraction<Bot>) -> Result<()> {
        let bot = interaction.bot();
        interaction
            .reply_custom(
                CustomReply::new().ephemeral(true).embed(
                    ReplyEmbed::new()
                        .title("Bot")
                        .field("Version", env!("CARGO_PKG_VERSION"), true)
                        .field("Uptime", format_uptime(bot.uptime()), true),
                ),
            )
            .await
    }
}

pub struct UserInfo;

#[async_trait]
impl SlashHandler<Bot> for UserInfo {
    async fn on_slash_command(&self, interaction: &CommandInteraction<Bot>) -> Result<()> {
        let event = interaction.event();
        // Defaults to the user who ran the command
        let user_id = interaction
            .option("user")
            .and_then(|value| value.as_snowflake())
            .unwrap_or(event.user_id);
        interaction
            .reply_custom(
                CustomReply::new().ephemeral(true).embed(
                    ReplyEmbed::new()
                        .title("User")
                        .description(format!("<@{user_id}>"))
                        .field("Id", user_id.to_string(), true),
                ),
            )
            .await
    }
}

/// `/info bot` and `/info user`
pub fn definition(bot: Arc<Bot>) -> Result<CommandDefinition<Bot>, CommandError> {
    let mut bot_info = CommandDefinition::new(Arc::clone(&bot), "bot", "Version and uptime")?;
    bot_info.set_handler(BotInfo);

    let mut user_info = CommandDefinition::new(Arc::clone(&bot), "user", "Show a user's id")?;
    user_info
        .add_option(OptionType::User, "user", "The user to look up, yourself by default")
        .set_handler(UserInfo);

    let mut info = CommandDefinition::new(bot, "info", "Information about the bot or a user")?;
    info.add_subcommands([bot_info, user_info]);
    Ok(info)
}
