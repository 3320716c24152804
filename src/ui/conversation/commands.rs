use std::str::FromStr;

use strum::{AsRefStr, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// Commands that can be invoked by starting a message with a leading slash.
/// They are handled locally and never reach the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, EnumIter, AsRefStr, IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
pub enum SlashCommand {
    /// Show help
    Help,
    /// Show the site answers are drawn from
    Site,
    /// Exit the application
    Bye,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub command: SlashCommand,
}

impl SlashCommand {
    /// User-visible description shown in help.
    pub fn description(self) -> &'static str {
        match self {
            SlashCommand::Help => "사용 가능한 명령을 보여줍니다",
            SlashCommand::Site => "답변의 근거가 되는 사이트 주소를 보여줍니다",
            SlashCommand::Bye => "프로그램을 종료합니다",
        }
    }

    /// Command string without the leading '/'.
    pub fn command(self) -> &'static str {
        self.into()
    }
}

/// Parse a slash command from user input. Words after the command name are
/// ignored; no command takes arguments.
pub fn parse_slash_command(input: &str) -> Option<ParsedCommand> {
    let body = input.trim().strip_prefix('/')?;
    let head = body.split_whitespace().next()?;

    let command = SlashCommand::from_str(head).ok().or_else(|| match head.to_lowercase().as_str() {
        "q" | "quit" | "exit" => Some(SlashCommand::Bye),
        "h" | "?" => Some(SlashCommand::Help),
        _ => None,
    })?;

    Some(ParsedCommand { command })
}

/// Get help text for all available commands
pub fn get_help_text() -> String {
    let mut help = String::from("명령:");
    for command in SlashCommand::iter() {
        help.push_str(&format!("  /{} {}", command.command(), command.description()));
    }
    help.push_str("  (Enter 전송, Shift+Enter 줄바꿈, Esc 종료)");
    help
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_commands_and_aliases() {
        assert_eq!(parse_slash_command("/help").map(|c| c.command), Some(SlashCommand::Help));
        assert_eq!(parse_slash_command("  /site ").map(|c| c.command), Some(SlashCommand::Site));
        assert_eq!(parse_slash_command("/q").map(|c| c.command), Some(SlashCommand::Bye));
        assert_eq!(parse_slash_command("/EXIT").map(|c| c.command), Some(SlashCommand::Bye));
    }

    #[test]
    fn trailing_words_are_ignored() {
        assert_eq!(
            parse_slash_command("/site 주소 알려줘"),
            Some(ParsedCommand {
                command: SlashCommand::Site
            })
        );
    }

    #[test]
    fn plain_text_and_unknown_commands_are_not_commands() {
        assert_eq!(parse_slash_command("독도는 어디에 있나요?"), None);
        assert_eq!(parse_slash_command("/unknown"), None);
        assert_eq!(parse_slash_command("/"), None);
    }

    #[test]
    fn help_lists_every_command() {
        let help = get_help_text();
        for command in SlashCommand::iter() {
            assert!(help.contains(&format!("/{}", command.command())));
        }
    }
}
