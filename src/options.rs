use serenity::{
    builder::CreateApplicationCommandOption, model::prelude::command::CommandOptionType,
};
use strum_macros::{Display, EnumIter, EnumString};

/// The kinds of argument a slash command option can accept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum OptionType {
    String,
    Integer,
    Boolean,
    User,
    Channel,
    Role,
    Mentionable,
    Number,
    Attachment,
}

impl From<OptionType> for CommandOptionType {
    fn from(kind: OptionType) -> Self {
        match kind {
            OptionType::String => CommandOptionType::String,
            OptionType::Integer => CommandOptionType::Integer,
            OptionType::Boolean => CommandOptionType::Boolean,
            OptionType::User => CommandOptionType::User,
            OptionType::Channel => CommandOptionType::Channel,
            OptionType::Role => CommandOptionType::Role,
            OptionType::Mentionable => CommandOptionType::Mentionable,
            OptionType::Number => CommandOptionType::Number,
            OptionType::Attachment => CommandOptionType::Attachment,
        }
    }
}

/// One typed, named argument slot of a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionDescriptor {
    pub kind: OptionType,
    pub name: String,
    pub description: String,
    pub required: bool,
    pub autocomplete: bool,
}

impl OptionDescriptor {
    pub fn new(kind: OptionType, name: impl Into<String>, description: impl Into<String>) -> Self {
        OptionDescriptor {
            kind,
            name: name.into(),
            description: description.into(),
            required: false,
            autocomplete: false,
        }
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn autocomplete(mut self, autocomplete: bool) -> Self {
        self.autocomplete = autocomplete;
        self
    }

    /// Build the serenity option, values are forwarded as is
    pub fn to_builder(&self) -> CreateApplicationCommandOption {
        let mut option = CreateApplicationCommandOption::default();
        option
            .kind(self.kind.into())
            .name(&self.name)
            .description(&self.description)
            .required(self.required);
        if self.autocomplete {
            option.set_autocomplete(true);
        }
        option
    }
}

/// A value supplied by the user for an option
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    String(String),
    Integer(i64),
    Boolean(bool),
    Number(f64),
    /// Id of a user, channel, role, mentionable or attachment
    Snowflake(u64),
}

impl OptionValue {
    /// Read a raw json value according to the kind the platform reported
    pub fn from_json(kind: CommandOptionType, value: &serde_json::Value) -> Option<Self> {
        match kind {
            CommandOptionType::String => value.as_str().map(|s| OptionValue::String(s.to_owned())),
            CommandOptionType::Integer => value.as_i64().map(OptionValue::Integer),
            CommandOptionType::Boolean => value.as_bool().map(OptionValue::Boolean),
            CommandOptionType::Number => value.as_f64().map(OptionValue::Number),
            CommandOptionType::User
            | CommandOptionType::Channel
            | CommandOptionType::Role
            | CommandOptionType::Mentionable
            | CommandOptionType::Attachment => value
                .as_str()
                .and_then(|id| id.parse().ok())
                .or_else(|| value.as_u64())
                .map(OptionValue::Snowflake),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            OptionValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            OptionValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OptionValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            OptionValue::Number(n) => Some(*n),
            OptionValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_snowflake(&self) -> Option<u64> {
        match self {
            OptionValue::Snowflake(id) => Some(*id),
            _ => None,
        }
    }
}
