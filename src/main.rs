use std::env;
use std::process::exit;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serenity::client::{Context, EventHandler};
use serenity::model::application::interaction::Interaction;
use serenity::model::prelude::{GuildId, Ready};
use serenity::prelude::GatewayIntents;
use serenity::{async_trait, Client};
use slash_kit::commands::create_registry;
use slash_kit::config::Config;
use slash_kit::{
    Bot, CommandError, CommandRegistry, CustomReply, Responder, SerenityResponder, SlashEvent,
};
use tracing::{error, info, warn};

struct Handler {
    bot: Arc<Bot>,
    registry: Arc<CommandRegistry<Bot>>,
    commands_pushed: AtomicBool,
}

impl Handler {
    fn new(bot: Arc<Bot>, registry: CommandRegistry<Bot>) -> Self {
        Handler {
            bot,
            registry: Arc::new(registry),
            commands_pushed: AtomicBool::new(false),
        }
    }

    /// `ready` fires again on every reconnect, the commands only need pushing once
    fn claim_command_push(&self) -> bool {
        !self.commands_pushed.swap(true, Ordering::SeqCst)
    }

    fn release_command_push(&self) {
        self.commands_pushed.store(false, Ordering::SeqCst);
    }
}

#[async_trait]
impl EventHandler for Handler {
    /// Handler for the `ready` event
    /// Pushes the commands to Discord once connected
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("{} is connected!", ready.user.name);
        if !self.claim_command_push() {
            info!("Commands already registered, skipping");
            return;
        }
        let result = match self.bot.config.guild_id {
            Some(id) => self.registry.register_guild(&ctx.http, GuildId(id)).await,
            None => self.registry.register_global(&ctx.http).await,
        };
        if let Err(e) = result {
            error!("Failed to register commands: {e:#}");
            self.release_command_push();
        }
    }

    /// Handler for the `interaction_create` event
    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        let Interaction::ApplicationCommand(command) = interaction else {
            return;
        };
        let event = SlashEvent::from(&command);
        let name = event.command_name.clone();
        info!("Received '/{name}' command from {}", &event.user_name);

        let responder = Arc::new(SerenityResponder::new(Arc::clone(&ctx.http), command));
        match self.registry.dispatch(event, responder.clone()).await {
            Ok(()) => info!("Executed /{name} command successfully"),
            Err(e) => {
                if let Some(CommandError::UnknownCommand(_)) = e.downcast_ref::<CommandError>() {
                    warn!("Received unknown command /{name}, commands may be out of date");
                } else {
                    error!("Failed to execute /{name} command: {e:#}");
                }
                if self.bot.config.reply_on_error {
                    let reply =
                        CustomReply::text("Something went wrong with this command").ephemeral(true);
                    responder
                        .send(reply)
                        .await
                        .unwrap_or_else(|e| error!("Failed to report error: {e:#}"));
                }
            }
        }
    }
}

#[tokio::main]
async fn main() {
    // Setup tracing
    let subscriber = tracing_subscriber::FmtSubscriber::new();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| eprintln!("Unable to set global default subscriber: {e}"))
        .ok();

    // Get the discord token from a .env file
    dotenv::dotenv().ok();
    let token = env::var("DISCORD_TOKEN").unwrap_or_else(|e| {
        error!("Expected a discord token in the .env file: {e}");
        exit(1);
    });
    info!("Found discord token in .env file");

    let config = Config::from_file("./config/config.json").unwrap_or_else(|e| {
        error!("An error occurred while parsing your config file: {e:#}");
        exit(1);
    });
    info!("Config file loaded successfully");

    let bot = Arc::new(Bot::new(config));
    let registry = create_registry(Arc::clone(&bot)).unwrap_or_else(|e| {
        error!("Invalid command setup: {e:#}");
        exit(1);
    });
    info!("{} commands ready: {:?}", registry.len(), registry.command_names());

    // Slash commands don't need any privileged intent
    let intents = GatewayIntents::GUILDS;

    let mut client = Client::builder(&token, intents)
        .event_handler(Handler::new(bot, registry))
        .await
        .unwrap_or_else(|e| {
            error!("Error creating client: {e}");
            exit(1);
        });
    info!("Client is setup");

    // Finally, start a single shard, and start listening to events.
    if let Err(err) = client.start().await {
        error!("Client error: {:?}", err);
        exit(1);
    }
}
