use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serenity::{
    builder::CreateEmbed,
    http::Http,
    model::prelude::{
        command::CommandOptionType,
        interaction::{
            application_command::{ApplicationCommandInteraction, CommandDataOption},
            InteractionResponseType,
        },
    },
};
use tracing::debug;

use crate::options::OptionValue;

/// Platform independent snapshot of one slash command invocation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlashEvent {
    pub command_name: String,
    pub subcommand: Option<String>,
    pub options: Vec<(String, OptionValue)>,
    pub user_id: u64,
    pub user_name: String,
    pub channel_id: u64,
    pub guild_id: Option<u64>,
}

impl SlashEvent {
    pub fn new(command_name: impl Into<String>) -> Self {
        SlashEvent {
            command_name: command_name.into(),
            ..Default::default()
        }
    }

    pub fn with_subcommand(mut self, subcommand: impl Into<String>) -> Self {
        self.subcommand = Some(subcommand.into());
        self
    }

    pub fn with_option(mut self, name: impl Into<String>, value: OptionValue) -> Self {
        self.options.push((name.into(), value));
        self
    }

    pub fn with_user(mut self, user_id: u64, user_name: impl Into<String>) -> Self {
        self.user_id = user_id;
        self.user_name = user_name.into();
        self
    }

    /// Get the value supplied for the given option, if any
    pub fn option(&self, name: &str) -> Option<&OptionValue> {
        self.options
            .iter()
            .find(|(option_name, _)| option_name == name)
            .map(|(_, value)| value)
    }
}

fn collect_options(options: &[CommandDataOption]) -> Vec<(String, OptionValue)> {
    options
        .iter()
        .filter_map(|option| {
            let value = OptionValue::from_json(option.kind, option.value.as_ref()?)?;
            Some((option.name.to_string(), value))
        })
        .collect()
}

impl From<&ApplicationCommandInteraction> for SlashEvent {
    fn from(command: &ApplicationCommandInteraction) -> Self {
        let data_options = &command.data.options;
        // A subcommand invocation arrives as a single option holding the real arguments
        let (subcommand, options) = match data_options.first() {
            Some(first) if first.kind == CommandOptionType::SubCommand => {
                (Some(first.name.to_string()), collect_options(&first.options))
            }
            _ => (None, collect_options(data_options)),
        };
        SlashEvent {
            command_name: command.data.name.to_string(),
            subcommand,
            options,
            user_id: command.user.id.0,
            user_name: command.user.name.to_string(),
            channel_id: command.channel_id.0,
            guild_id: command.guild_id.map(|id| id.0),
        }
    }
}

/// An embed attached to a custom reply
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplyEmbed {
    pub title: Option<String>,
    pub description: Option<String>,
    pub fields: Vec<(String, String, bool)>,
}

impl ReplyEmbed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push((name.into(), value.into(), inline));
        self
    }
}

/// A rich reply, plain text replies are the special case with only `content`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomReply {
    pub content: Option<String>,
    pub embed: Option<ReplyEmbed>,
    pub ephemeral: bool,
}

impl CustomReply {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(content: impl Into<String>) -> Self {
        CustomReply {
            content: Some(content.into()),
            ..Default::default()
        }
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn embed(mut self, embed: ReplyEmbed) -> Self {
        self.embed = Some(embed);
        self
    }

    pub fn ephemeral(mut self, ephemeral: bool) -> Self {
        self.ephemeral = ephemeral;
        self
    }
}

/// Sends replies for one interaction
#[async_trait]
pub trait Responder: Send + Sync {
    async fn send(&self, reply: CustomReply) -> Result<()>;
}

/// What a command handler receives for each invocation
pub struct CommandInteraction<B> {
    owner: Arc<B>,
    event: SlashEvent,
    responder: Arc<dyn Responder>,
}

impl<B> CommandInteraction<B> {
    pub fn new(owner: Arc<B>, event: SlashEvent, responder: Arc<dyn Responder>) -> Self {
        CommandInteraction {
            owner,
            event,
            responder,
        }
    }

    /// The bot owning the command that was invoked
    pub fn bot(&self) -> &B {
        &self.owner
    }

    pub fn owner(&self) -> &Arc<B> {
        &self.owner
    }

    pub fn event(&self) -> &SlashEvent {
        &self.event
    }

    pub fn user_name(&self) -> &str {
        &self.event.user_name
    }

    pub fn option(&self, name: &str) -> Option<&OptionValue> {
        self.event.option(name)
    }

    /// Reply with plain text
    pub async fn reply(&self, content: impl Into<String>) -> Result<()> {
        self.responder.send(CustomReply::text(content)).await
    }

    /// Reply with embeds, ephemeral messages and the like
    pub async fn reply_custom(&self, reply: CustomReply) -> Result<()> {
        self.responder.send(reply).await
    }
}

fn fill_embed<'a>(e: &'a mut CreateEmbed, embed: &ReplyEmbed) -> &'a mut CreateEmbed {
    if let Some(title) = &embed.title {
        e.title(title);
    }
    if let Some(description) = &embed.description {
        e.description(description);
    }
    e.fields(embed.fields.iter().map(|(n, v, i)| (n, v, *i)))
}

/// The two ways Discord lets a bot answer an interaction
#[async_trait]
pub trait InteractionReplies: Send + Sync {
    /// Answer the interaction, only one answer is accepted
    async fn create_response(&self, reply: &CustomReply) -> Result<()>;

    /// Send another message once the interaction was answered
    async fn create_followup(&self, reply: &CustomReply) -> Result<()>;
}

/// Sends the first reply as the answer to the interaction and the following
/// ones as followup messages
///
/// The interaction only counts as answered once the answer went through, so
/// a reply sent after a failed answer tries to answer again.
pub struct InteractionResponder<R> {
    replies: R,
    responded: AtomicBool,
}

impl<R: InteractionReplies> InteractionResponder<R> {
    pub fn with_replies(replies: R) -> Self {
        InteractionResponder {
            replies,
            responded: AtomicBool::new(false),
        }
    }

    pub fn has_responded(&self) -> bool {
        self.responded.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<R: InteractionReplies> Responder for InteractionResponder<R> {
    async fn send(&self, reply: CustomReply) -> Result<()> {
        if self.responded.swap(true, Ordering::SeqCst) {
            return self.replies.create_followup(&reply).await;
        }
        let result = self.replies.create_response(&reply).await;
        if result.is_err() {
            self.responded.store(false, Ordering::SeqCst);
        }
        result
    }
}

/// Replies through the Discord API
pub struct SerenityReplies {
    http: Arc<Http>,
    command: ApplicationCommandInteraction,
}

#[async_trait]
impl InteractionReplies for SerenityReplies {
    async fn create_response(&self, reply: &CustomReply) -> Result<()> {
        debug!("Answering interaction for /{}", self.command.data.name);
        self.command
            .create_interaction_response(&self.http, |r| {
                r.kind(InteractionResponseType::ChannelMessageWithSource)
                    .interaction_response_data(|m| {
                        if let Some(content) = &reply.content {
                            m.content(content);
                        }
                        if let Some(embed) = &reply.embed {
                            m.embed(|e| fill_embed(e, embed));
                        }
                        m.ephemeral(reply.ephemeral)
                    })
            })
            .await
            .context("Failed to write message")
    }

    async fn create_followup(&self, reply: &CustomReply) -> Result<()> {
        debug!("Sending followup for /{}", self.command.data.name);
        self.command
            .create_followup_message(&self.http, |m| {
                if let Some(content) = &reply.content {
                    m.content(content);
                }
                if let Some(embed) = &reply.embed {
                    m.embed(|e| fill_embed(e, embed));
                }
                m.ephemeral(reply.ephemeral)
            })
            .await
            .map(|_| ())
            .context("Failed to write followup message")
    }
}

pub type SerenityResponder = InteractionResponder<SerenityReplies>;

impl InteractionResponder<SerenityReplies> {
    pub fn new(http: Arc<Http>, command: ApplicationCommandInteraction) -> Self {
        Self::with_replies(SerenityReplies { http, command })
    }
}
