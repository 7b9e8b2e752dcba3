//! Terminal input parsing. One stdin line is one command.

/// What a line of input asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Plain text: send it as a chat message.
    Message(String),
    /// `/read <message-id>`
    Read(String),
    /// `/typing`: count as a keystroke for the typing indicator.
    Typing,
    Help,
    Quit,
    /// Blank line.
    Nothing,
    Unknown(String),
}

pub const USAGE: &str = "commands: <text> send | /read <id> mark read | /typing | /help | /quit";

pub fn parse(line: &str) -> Command {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Command::Nothing;
    }
    if !trimmed.starts_with('/') {
        return Command::Message(line.to_string());
    }

    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let name = parts.next().unwrap_or("");
    let rest = parts.next().map(str::trim).unwrap_or("");
    match (name, rest) {
        ("/quit" | "/exit", _) => Command::Quit,
        ("/help", _) => Command::Help,
        ("/typing", _) => Command::Typing,
        ("/read", id) if !id.is_empty() => Command::Read(id.to_string()),
        _ => Command::Unknown(trimmed.to_string()),
    }
}
