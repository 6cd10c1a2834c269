use thiserror::Error;

/// Discord caps both options and subcommands at 25 per command
pub const MAX_OPTIONS: usize = 25;

/// Returned when a command could not be built, registered or dispatched
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Missing value for {0}")]
    MissingValue(&'static str),
    #[error("Invalid {field}: {reason}")]
    InvalidArgument { field: &'static str, reason: String },
    #[error("Command '{0}' mixes options and subcommands")]
    MixedOptionsAndSubcommands(String),
    #[error("Command '{name}' has {count} subcommands, at most 25 are allowed")]
    TooManySubcommands { name: String, count: usize },
    #[error("Command '{name}' has {count} options, at most 25 are allowed")]
    TooManyOptions { name: String, count: usize },
    #[error("Subcommand '{0}' cannot have subcommands of its own")]
    NestedSubcommands(String),
    #[error("Command '{0}' is already registered")]
    DuplicateCommand(String),
    #[error("Unknown command '{0}'")]
    UnknownCommand(String),
    #[error("Unknown subcommand '{subcommand}' for command '{command}'")]
    UnknownSubcommand { command: String, subcommand: String },
}
