//! Top-level command surface: `/start`, `/add`, `/delete <id>`,
//! `/update <id>`, `/see`, `/cancel`. The argument is the literal
//! remainder of the command line, interior spaces preserved.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Add,
    Delete(Option<String>),
    Update(Option<String>),
    See,
    Cancel,
}

/// Parse a `/verb [argument]` message. Returns None for text that is not
/// a command or names an unknown verb; such messages fall through to the
/// active conversation (or are ignored when there is none).
pub fn parse(text: &str) -> Option<Command> {
    let rest = text.strip_prefix('/')?;
    let (verb, arg) = match rest.split_once(char::is_whitespace) {
        // Separator whitespace is consumed; interior spaces stay intact.
        Some((verb, arg)) => (verb, arg.trim_start()),
        None => (rest, ""),
    };
    let arg = if arg.is_empty() {
        None
    } else {
        Some(arg.to_string())
    };
    match verb {
        "start" => Some(Command::Start),
        "add" => Some(Command::Add),
        "delete" => Some(Command::Delete(arg)),
        "update" => Some(Command::Update(arg)),
        "see" => Some(Command::See),
        "cancel" => Some(Command::Cancel),
        _ => None,
    }
}
