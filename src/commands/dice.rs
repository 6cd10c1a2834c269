use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::info;

use crate::{
    command::{CommandDefinition, SlashHandler},
    errors::CommandError,
    interaction::{CommandInteraction, CustomReply, ReplyEmbed},
    options::OptionType,
    Bot,
};

const MIN_FACES: i64 = 2;

/// Roll a dice with the given number of faces, following a uniform distribution
pub fn roll<R: Rng>(rng: &mut R, faces: i64) -> i64 {
    rng.gen_range(1..=faces)
}

pub struct Dice;

#[async_trait]
impl SlashHandler<Bot> for Dice {
    async fn on_slash_command(&self, interaction: &CommandInteraction<Bot>) -> Result<()> {
        let faces = interaction
            .option("faces")
            .and_then(|value| value.as_i64())
            .context("Expected a number of faces")?;

        let max_faces = interaction.bot().config.max_dice_faces;
        if !(MIN_FACES..=max_faces).contains(&faces) {
            return interaction
                .reply_custom(
                    CustomReply::text(format!(
                        "A dice has between {MIN_FACES} and {max_faces} faces"
                    ))
                    .ephemeral(true),
                )
                .await;
        }

        info!("Rolling a dice with {faces} faces");
        let result = roll(&mut StdRng::from_entropy(), faces);
        info!("Rolled {result}/{faces}");

        interaction
            .reply_custom(
                CustomReply::new().embed(
                    ReplyEmbed::new()
                        .title(format!("**{}**", interaction.user_name()))
                        .description(format!("d{faces}: **{result}**")),
                ),
            )
            .await
    }
}

pub fn definition(bot: Arc<Bot>) -> Result<CommandDefinition<Bot>, CommandError> {
    let mut command = CommandDefinition::new(bot, "dice", "Roll a dice")?;
    command
        .add_required_option(OptionType::Integer, "faces", "The number of faces of the dice")
        .set_handler(Dice);
    Ok(command)
}
