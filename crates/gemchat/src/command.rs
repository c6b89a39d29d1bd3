//! Parsing of the lines typed at the prompt.

use std::path::PathBuf;

use gemchat_core::ModelVariant;

/// A line typed at the prompt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Plain text, or `/send [text]`, submitted with the attached images.
    Send(String),
    /// `/new`: starts a new conversation.
    NewConversation,
    /// `/model pro|vision`: selects a model.
    SelectModel(ModelVariant),
    /// `/key <key>`: sets the API key of the selected model.
    SetKey(String),
    /// `/attach <path>`: attaches an image file to the draft.
    Attach(PathBuf),
    /// `/detach <n>`: removes the n-th attached image, counting from 1.
    Detach(usize),
    /// `/summarize <text>`: summarizes a piece of text.
    Summarize(String),
    /// `/help`: shows the commands.
    Help,
    /// `/quit`: exits.
    Quit,
}

/// Usage text for [`Command::Help`].
pub const USAGE: &str = "\
Type a message to send it. Commands:
  /send [text]       send the draft, text is optional with images
  /new               start a new conversation
  /model pro|vision  select a model (starts a new conversation)
  /key <key>         set the API key of the selected model
  /attach <path>     attach an image to the draft
  /detach <n>        remove the n-th attached image
  /summarize <text>  summarize a piece of text
  /quit              exit";

impl Command {
    /// Parses a line, returning a message to show if it is not a valid
    /// command. Blank lines parse to `None`.
    pub fn parse(line: &str) -> Option<Result<Self, String>> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let Some(command) = line.strip_prefix('/') else {
            return Some(Ok(Command::Send(line.to_owned())));
        };

        let (name, arg) = match command.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (command, ""),
        };
        let require_arg = |usage: &str| {
            if arg.is_empty() {
                Err(format!("usage: /{name} {usage}"))
            } else {
                Ok(arg.to_owned())
            }
        };

        let parsed = match name {
            "send" => Ok(Command::Send(arg.to_owned())),
            "new" => Ok(Command::NewConversation),
            "model" => arg
                .parse()
                .map(Command::SelectModel)
                .map_err(|err| format!("{err}")),
            "key" => require_arg("<key>").map(Command::SetKey),
            "attach" => require_arg("<path>")
                .map(|path| Command::Attach(PathBuf::from(path))),
            "detach" => match arg.parse::<usize>() {
                Ok(index) if index > 0 => Ok(Command::Detach(index)),
                _ => Err(format!("usage: /{name} <n>, n starts from 1")),
            },
            "summarize" => require_arg("<text>").map(Command::Summarize),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            _ => Err(format!("unknown command `/{name}`, try /help")),
        };
        Some(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Result<Command, String> {
        Command::parse(line).unwrap()
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(Command::parse("   \n"), None);
        assert_eq!(
            parse("  Hello there \n"),
            Ok(Command::Send("Hello there".to_owned()))
        );
    }

    #[test]
    fn test_commands() {
        assert_eq!(parse("/send"), Ok(Command::Send(String::new())));
        assert_eq!(
            parse("/send  What is this? "),
            Ok(Command::Send("What is this?".to_owned()))
        );
        assert_eq!(parse("/new"), Ok(Command::NewConversation));
        assert_eq!(
            parse("/model vision"),
            Ok(Command::SelectModel(ModelVariant::Vision))
        );
        assert_eq!(
            parse("/key  abc123 "),
            Ok(Command::SetKey("abc123".to_owned()))
        );
        assert_eq!(
            parse("/attach ./my cat.png"),
            Ok(Command::Attach(PathBuf::from("./my cat.png")))
        );
        assert_eq!(parse("/detach 2"), Ok(Command::Detach(2)));
        assert_eq!(
            parse("/summarize Rust is a language."),
            Ok(Command::Summarize("Rust is a language.".to_owned()))
        );
        assert_eq!(parse("/quit"), Ok(Command::Quit));
    }

    #[test]
    fn test_invalid_commands() {
        assert!(parse("/model ultra").is_err());
        assert!(parse("/key").is_err());
        assert!(parse("/detach 0").is_err());
        assert!(parse("/detach x").is_err());
        assert_eq!(
            parse("/frobnicate"),
            Err("unknown command `/frobnicate`, try /help".to_owned())
        );
    }
}
