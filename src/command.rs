use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;
use serenity::{
    builder::{CreateApplicationCommand, CreateApplicationCommandOption},
    model::prelude::command::CommandOptionType,
};
use tracing::info;

use crate::{
    errors::{CommandError, MAX_OPTIONS},
    interaction::{CommandInteraction, Responder, SlashEvent},
    options::{OptionDescriptor, OptionType},
};

const MAX_NAME_LENGTH: usize = 32;
const MAX_DESCRIPTION_LENGTH: usize = 100;

/// Handles one triggered slash command
///
/// `reply` returns the same type, so a handler can answer and return in one
/// expression: `return interaction.reply("done").await;`
#[async_trait]
pub trait SlashHandler<B>: Send + Sync {
    async fn on_slash_command(&self, interaction: &CommandInteraction<B>) -> Result<()>;
}

/// Check that a name is 1 to 32 lowercase alphanumeric characters or dashes
pub fn validate_name(name: &str) -> Result<(), CommandError> {
    let length = name.chars().count();
    if length == 0 || length > MAX_NAME_LENGTH {
        return Err(CommandError::InvalidArgument {
            field: "name",
            reason: format!("'{name}' must be 1 to {MAX_NAME_LENGTH} characters long"),
        });
    }
    if let Some(c) = name
        .chars()
        .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-'))
    {
        return Err(CommandError::InvalidArgument {
            field: "name",
            reason: format!("'{name}' contains '{c}', only lowercase letters, digits and dashes are allowed"),
        });
    }
    Ok(())
}

/// Check that a description is 1 to 100 characters long
pub fn validate_description(description: &str) -> Result<(), CommandError> {
    let length = description.chars().count();
    if length == 0 || length > MAX_DESCRIPTION_LENGTH {
        return Err(CommandError::InvalidArgument {
            field: "description",
            reason: format!("must be 1 to {MAX_DESCRIPTION_LENGTH} characters long, got {length}"),
        });
    }
    Ok(())
}

/// A slash command: its identity, its options or subcommands, and what runs
/// when a user triggers it
///
/// A command with subcommands can't be invoked directly, Discord only lets
/// users pick one of its subcommands.
pub struct CommandDefinition<B> {
    owner: Arc<B>,
    name: String,
    description: String,
    options: Vec<OptionDescriptor>,
    subcommands: Vec<CommandDefinition<B>>,
    handler: Option<Arc<dyn SlashHandler<B>>>,
}

impl<B: Send + Sync + 'static> CommandDefinition<B> {
    pub fn new(
        owner: Arc<B>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Self, CommandError> {
        Self::builder()
            .owner(owner)
            .name(name)
            .description(description)
            .build()
    }

    pub fn builder() -> CommandBuilder<B> {
        CommandBuilder::default()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn owner(&self) -> &Arc<B> {
        &self.owner
    }

    pub fn options(&self) -> &[OptionDescriptor] {
        &self.options
    }

    pub fn subcommands(&self) -> &[CommandDefinition<B>] {
        &self.subcommands
    }

    /// Commands with subcommands can only be invoked through them
    pub fn is_invokable(&self) -> bool {
        self.subcommands.is_empty()
    }

    /// Add an optional option without autocompletion
    pub fn add_option(
        &mut self,
        kind: OptionType,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> &mut Self {
        self.push_option(OptionDescriptor::new(kind, name, description))
    }

    pub fn add_required_option(
        &mut self,
        kind: OptionType,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> &mut Self {
        self.push_option(OptionDescriptor::new(kind, name, description).required(true))
    }

    /// Duplicate names are not checked here, Discord rejects them on registration
    pub fn push_option(&mut self, option: OptionDescriptor) -> &mut Self {
        self.options.push(option);
        self
    }

    /// Add subcommands in the given order, this command is no longer invokable afterwards
    pub fn add_subcommands(
        &mut self,
        subcommands: impl IntoIterator<Item = CommandDefinition<B>>,
    ) -> &mut Self {
        self.subcommands.extend(subcommands);
        self
    }

    pub fn set_handler(&mut self, handler: impl SlashHandler<B> + 'static) -> &mut Self {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// Check the constraints Discord enforces when the command is registered
    pub fn validate(&self) -> Result<(), CommandError> {
        if !self.options.is_empty() && !self.subcommands.is_empty() {
            return Err(CommandError::MixedOptionsAndSubcommands(self.name.clone()));
        }
        if self.options.len() > MAX_OPTIONS {
            return Err(CommandError::TooManyOptions {
                name: self.name.clone(),
                count: self.options.len(),
            });
        }
        if self.subcommands.len() > MAX_OPTIONS {
            return Err(CommandError::TooManySubcommands {
                name: self.name.clone(),
                count: self.subcommands.len(),
            });
        }
        if self.is_invokable() && self.handler.is_none() {
            return Err(CommandError::MissingValue("handler"));
        }
        for subcommand in &self.subcommands {
            if !subcommand.is_invokable() {
                return Err(CommandError::NestedSubcommands(subcommand.name.clone()));
            }
            subcommand.validate()?;
        }
        Ok(())
    }

    /// Build the serenity command used to register this command with Discord
    pub fn to_application_command(&self) -> Result<CreateApplicationCommand, CommandError> {
        self.validate()?;
        let mut command = CreateApplicationCommand::default();
        command.name(&self.name).description(&self.description);
        for option in &self.options {
            command.add_option(option.to_builder());
        }
        for subcommand in &self.subcommands {
            command.add_option(subcommand.to_subcommand_option());
        }
        Ok(command)
    }

    fn to_subcommand_option(&self) -> CreateApplicationCommandOption {
        let mut option = CreateApplicationCommandOption::default();
        option
            .kind(CommandOptionType::SubCommand)
            .name(&self.name)
            .description(&self.description);
        for sub_option in &self.options {
            option.add_sub_option(sub_option.to_builder());
        }
        option
    }

    /// Run the handler for one interaction, routing to the invoked subcommand if any
    pub async fn dispatch(&self, event: SlashEvent, responder: Arc<dyn Responder>) -> Result<()> {
        if !self.is_invokable() {
            let Some(subcommand_name) = event.subcommand.as_deref() else {
                bail!(CommandError::MissingValue("subcommand"));
            };
            let Some(subcommand) = self.subcommands.iter().find(|s| s.name == subcommand_name)
            else {
                bail!(CommandError::UnknownSubcommand {
                    command: self.name.clone(),
                    subcommand: subcommand_name.to_owned(),
                });
            };
            return subcommand.run(event, responder).await;
        }
        self.run(event, responder).await
    }

    async fn run(&self, event: SlashEvent, responder: Arc<dyn Responder>) -> Result<()> {
        let Some(handler) = &self.handler else {
            bail!(CommandError::MissingValue("handler"));
        };
        info!("Running /{} for {}", self.name, event.user_name);
        let interaction = CommandInteraction::new(Arc::clone(&self.owner), event, responder);
        handler.on_slash_command(&interaction).await
    }
}

/// Builds a [`CommandDefinition`], reporting absent fields as [`CommandError::MissingValue`]
pub struct CommandBuilder<B> {
    owner: Option<Arc<B>>,
    name: Option<String>,
    description: Option<String>,
    options: Vec<OptionDescriptor>,
    subcommands: Vec<CommandDefinition<B>>,
    handler: Option<Arc<dyn SlashHandler<B>>>,
}

impl<B> Default for CommandBuilder<B> {
    fn default() -> Self {
        CommandBuilder {
            owner: None,
            name: None,
            description: None,
            options: Vec::new(),
            subcommands: Vec::new(),
            handler: None,
        }
    }
}

impl<B: Send + Sync + 'static> CommandBuilder<B> {
    pub fn owner(mut self, owner: Arc<B>) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn option(mut self, option: OptionDescriptor) -> Self {
        self.options.push(option);
        self
    }

    pub fn subcommand(mut self, subcommand: CommandDefinition<B>) -> Self {
        self.subcommands.push(subcommand);
        self
    }

    pub fn handler(mut self, handler: impl SlashHandler<B> + 'static) -> Self {
        self.handler = Some(Arc::new(handler));
        self
    }

    pub fn build(self) -> Result<CommandDefinition<B>, CommandError> {
        let owner = self.owner.ok_or(CommandError::MissingValue("owner"))?;
        let name = self.name.ok_or(CommandError::MissingValue("name"))?;
        let description = self
            .description
            .ok_or(CommandError::MissingValue("description"))?;
        validate_name(&name)?;
        validate_description(&description)?;
        Ok(CommandDefinition {
            owner,
            name,
            description,
            options: self.options,
            subcommands: self.subcommands,
            handler: self.handler,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    };

    use anyhow::Result;
    use async_trait::async_trait;

    use super::{CommandDefinition, SlashHandler};
    use crate::{
        errors::CommandError,
        interaction::{testing::RecordingResponder, CommandInteraction, SlashEvent},
        options::{OptionDescriptor, OptionType},
    };

    struct Bot {
        name: String,
    }

    fn bot() -> Arc<Bot> {
        Arc::new(Bot {
            name: "tester".to_owned(),
        })
    }

    fn command(name: &str) -> CommandDefinition<Bot> {
        CommandDefinition::new(bot(), name, "A command").unwrap()
    }

    struct Pong;

    #[async_trait]
    impl SlashHandler<Bot> for Pong {
        async fn on_slash_command(&self, interaction: &CommandInteraction<Bot>) -> Result<()> {
            interaction.reply("pong").await
        }
    }

    /// Counts calls and keeps the owner it was handed
    #[derive(Default)]
    struct Spy {
        calls: Arc<AtomicUsize>,
        owner: Arc<Mutex<Option<Arc<Bot>>>>,
    }

    #[async_trait]
    impl SlashHandler<Bot> for Spy {
        async fn on_slash_command(&self, interaction: &CommandInteraction<Bot>) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.owner.lock().unwrap() = Some(Arc::clone(interaction.owner()));
            Ok(())
        }
    }

    #[test]
    fn valid_identity_is_kept() {
        let longest_name = "x".repeat(32);
        let longest_description = "é".repeat(100);
        for (name, description) in [
            ("ping", "Replies with pong"),
            ("a", "d"),
            ("roll-20", "Roll a d20"),
            (longest_name.as_str(), longest_description.as_str()),
        ] {
            let command = CommandDefinition::new(bot(), name, description).unwrap();
            assert_eq!(command.name(), name);
            assert_eq!(command.description(), description);
            assert!(command.options().is_empty());
            assert!(command.subcommands().is_empty());
        }
    }

    #[test]
    fn invalid_names_are_rejected() {
        let too_long = "x".repeat(33);
        for name in ["", "PING", "Ping", "two words", too_long.as_str(), "under_score", "pïng"] {
            let result = CommandDefinition::new(bot(), name, "A command");
            assert!(
                matches!(result, Err(CommandError::InvalidArgument { field: "name", .. })),
                "{name} should be rejected"
            );
        }
    }

    #[test]
    fn invalid_descriptions_are_rejected() {
        for description in ["".to_owned(), "x".repeat(101)] {
            let result = CommandDefinition::new(bot(), "ping", description);
            assert!(matches!(
                result,
                Err(CommandError::InvalidArgument {
                    field: "description",
                    ..
                })
            ));
        }
    }

    #[test]
    fn uppercase_description_is_fine_but_uppercase_name_is_not() {
        assert!(CommandDefinition::new(bot(), "ping", "PING").is_ok());
        assert!(matches!(
            CommandDefinition::new(bot(), "PING", "Replies with pong"),
            Err(CommandError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn missing_values_are_reported() {
        let missing_owner = CommandDefinition::<Bot>::builder()
            .name("ping")
            .description("Replies with pong")
            .build();
        assert_eq!(missing_owner.err(), Some(CommandError::MissingValue("owner")));

        let missing_name = CommandDefinition::builder()
            .owner(bot())
            .description("Replies with pong")
            .build();
        assert_eq!(missing_name.err(), Some(CommandError::MissingValue("name")));

        let missing_description = CommandDefinition::builder().owner(bot()).name("ping").build();
        assert_eq!(
            missing_description.err(),
            Some(CommandError::MissingValue("description"))
        );
    }

    #[test]
    fn options_keep_call_order() {
        let mut command = command("search");
        command
            .add_option(OptionType::String, "query", "What to look for")
            .add_required_option(OptionType::Integer, "limit", "How many results")
            .push_option(
                OptionDescriptor::new(OptionType::User, "author", "Filter by author")
                    .autocomplete(true),
            )
            .add_option(OptionType::String, "query", "Duplicates are forwarded as is");

        let names: Vec<&str> = command.options().iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, ["query", "limit", "author", "query"]);
        assert!(!command.options()[0].required);
        assert!(command.options()[1].required);
        assert!(command.options()[2].autocomplete);
    }

    #[test]
    fn subcommands_keep_order_and_make_parent_non_invokable() {
        let mut first = command("sub-a");
        first.add_option(OptionType::Boolean, "flag", "A flag");
        let second = command("sub-b");
        let third = command("sub-c");

        let mut parent = command("parent");
        assert!(parent.is_invokable());
        parent.add_subcommands([first, second]).add_subcommands([third]);

        assert!(!parent.is_invokable());
        let names: Vec<&str> = parent.subcommands().iter().map(|s| s.name()).collect();
        assert_eq!(names, ["sub-a", "sub-b", "sub-c"]);
        assert_eq!(parent.subcommands()[0].options().len(), 1);
        assert_eq!(parent.subcommands()[0].description(), "A command");
    }

    #[test]
    fn mixing_options_and_subcommands_fails_validation() {
        let mut sub = command("sub");
        sub.set_handler(Pong);
        let mut parent = command("parent");
        parent
            .add_option(OptionType::String, "text", "Some text")
            .add_subcommands([sub]);
        assert_eq!(
            parent.validate(),
            Err(CommandError::MixedOptionsAndSubcommands("parent".to_owned()))
        );
    }

    #[test]
    fn too_many_subcommands_fail_validation() {
        let mut parent = command("parent");
        parent.add_subcommands((0..26).map(|i| {
            let mut sub = command(&format!("sub-{i}"));
            sub.set_handler(Pong);
            sub
        }));
        assert_eq!(
            parent.validate(),
            Err(CommandError::TooManySubcommands {
                name: "parent".to_owned(),
                count: 26
            })
        );
    }

    #[test]
    fn subcommands_up_to_the_cap_are_accepted() {
        let mut parent = command("parent");
        parent.add_subcommands((0..25).map(|i| {
            let mut sub = command(&format!("sub-{i}"));
            sub.set_handler(Pong);
            sub
        }));
        assert_eq!(parent.validate(), Ok(()));
    }

    #[test]
    fn options_are_capped_at_twenty_five() {
        let mut many = command("many");
        many.set_handler(Pong);
        for i in 0..25 {
            many.add_option(OptionType::String, format!("option-{i}"), "An option");
        }
        assert_eq!(many.validate(), Ok(()));

        many.add_option(OptionType::String, "option-25", "One too many");
        assert_eq!(
            many.validate(),
            Err(CommandError::TooManyOptions {
                name: "many".to_owned(),
                count: 26
            })
        );
    }

    #[test]
    fn nested_subcommands_fail_validation() {
        let mut leaf = command("leaf");
        leaf.set_handler(Pong);
        let mut middle = command("middle");
        middle.add_subcommands([leaf]);
        let mut parent = command("parent");
        parent.add_subcommands([middle]);
        assert_eq!(
            parent.validate(),
            Err(CommandError::NestedSubcommands("middle".to_owned()))
        );
    }

    #[test]
    fn invokable_command_needs_a_handler() {
        assert_eq!(
            command("ping").validate(),
            Err(CommandError::MissingValue("handler"))
        );
    }

    #[test]
    fn application_command_contains_subcommands() {
        let mut sub = command("sub-a");
        sub.set_handler(Pong)
            .add_required_option(OptionType::Integer, "count", "How many");
        let mut parent = command("parent");
        parent.add_subcommands([sub]);

        let built = parent.to_application_command().unwrap();
        assert_eq!(built.0.get("name").unwrap().as_str().unwrap(), "parent");
        let options = built.0.get("options").unwrap().as_array().unwrap();
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].get("name").unwrap().as_str().unwrap(), "sub-a");
        assert_eq!(options[0].get("type").unwrap().as_u64().unwrap(), 1);
        let sub_options = options[0].get("options").unwrap().as_array().unwrap();
        assert_eq!(sub_options[0].get("name").unwrap().as_str().unwrap(), "count");
    }

    #[tokio::test]
    async fn dispatch_invokes_handler_once_with_owner() {
        let owner = bot();
        let spy = Spy::default();
        let calls = Arc::clone(&spy.calls);
        let seen_owner = Arc::clone(&spy.owner);
        let command = CommandDefinition::builder()
            .owner(Arc::clone(&owner))
            .name("spy")
            .description("Watches")
            .handler(spy)
            .build()
            .unwrap();

        command
            .dispatch(
                SlashEvent::new("spy"),
                Arc::new(RecordingResponder::default()),
            )
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let seen = seen_owner.lock().unwrap().clone().unwrap();
        assert!(Arc::ptr_eq(&seen, &owner));
        assert_eq!(seen.name, "tester");
    }

    #[tokio::test]
    async fn ping_replies_pong_exactly_once() {
        let mut ping = CommandDefinition::new(bot(), "ping", "Replies with pong").unwrap();
        ping.set_handler(Pong);
        let responder = Arc::new(RecordingResponder::default());

        ping.dispatch(SlashEvent::new("ping"), responder.clone())
            .await
            .unwrap();

        let replies = responder.replies();
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].content.as_deref(), Some("pong"));
    }

    #[tokio::test]
    async fn dispatch_routes_to_subcommand() {
        let spy = Spy::default();
        let calls = Arc::clone(&spy.calls);
        let mut sub_a = command("sub-a");
        sub_a.set_handler(spy);
        let mut sub_b = command("sub-b");
        sub_b.set_handler(Pong);
        let mut parent = command("parent");
        parent.add_subcommands([sub_a, sub_b]);
        let responder = Arc::new(RecordingResponder::default());

        parent
            .dispatch(
                SlashEvent::new("parent").with_subcommand("sub-b"),
                responder.clone(),
            )
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(responder.replies().len(), 1);

        let error = parent
            .dispatch(
                SlashEvent::new("parent").with_subcommand("sub-z"),
                responder.clone(),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            error.downcast_ref::<CommandError>(),
            Some(CommandError::UnknownSubcommand { subcommand, .. }) if subcommand == "sub-z"
        ));
    }

    #[tokio::test]
    async fn parent_dispatched_without_subcommand_reports_it_missing() {
        let mut sub = command("sub-a");
        sub.set_handler(Pong);
        let mut parent = command("parent");
        parent.add_subcommands([sub]);
        let responder = Arc::new(RecordingResponder::default());

        let error = parent
            .dispatch(SlashEvent::new("parent"), responder.clone())
            .await
            .unwrap_err();
        assert_eq!(
            error.downcast_ref::<CommandError>(),
            Some(&CommandError::MissingValue("subcommand"))
        );
        assert!(responder.replies().is_empty());
    }
}
