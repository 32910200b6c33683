//! Classification of chat lines into commands and free text.

/// Commands understood in game chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatCommand {
    Help,
    Wait,
    Name,
    Eval,
    Queue,
}

impl ChatCommand {
    /// Match the text after the command prefix. Matching is case-insensitive;
    /// any text starting with `eval` counts as an eval request.
    pub fn parse(body: &str) -> Option<Self> {
        let body = body.to_lowercase();
        match body.as_str() {
            "commands" | "help" => Some(Self::Help),
            "wait" => Some(Self::Wait),
            "name" => Some(Self::Name),
            "queue" => Some(Self::Queue),
            _ if body.starts_with("eval") => Some(Self::Eval),
            _ => None,
        }
    }
}

/// What a chat line turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatInput {
    Empty,
    Command(ChatCommand),
    /// Prefixed text that matches no known command.
    UnknownCommand(String),
    FreeText(String),
}

impl ChatInput {
    pub fn parse(text: &str, prefix: char) -> Self {
        if text.is_empty() {
            return Self::Empty;
        }
        match text.strip_prefix(prefix) {
            Some(body) => match ChatCommand::parse(body) {
                Some(command) => Self::Command(command),
                None => Self::UnknownCommand(body.to_lowercase()),
            },
            None => Self::FreeText(text.to_string()),
        }
    }
}
