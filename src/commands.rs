/// Available commands and autocomplete logic

#[derive(Debug, Clone)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub description: &'static str,
}

/// All available commands
pub const COMMANDS: &[Command] = &[
  Command {
    name: "register",
    aliases: &["r", "form", "new"],
    description: "Focus the registration form",
  },
  Command {
    name: "gallery",
    aliases: &["g", "cats", "list"],
    description: "Focus the cat gallery",
  },
  Command {
    name: "refresh",
    aliases: &["reload", "invalidate"],
    description: "Mark the gallery stale and refetch",
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    description: "Exit catui",
  },
];

/// Get autocomplete suggestions for a given input
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  let input_lower = input.trim().to_lowercase();

  if input_lower.is_empty() {
    return COMMANDS.iter().collect();
  }

  let mut matches: Vec<(&Command, u32)> = COMMANDS
    .iter()
    .filter_map(|cmd| match_priority(cmd, &input_lower).map(|p| (cmd, p)))
    .collect();

  // Stable sort keeps declaration order within a priority
  matches.sort_by_key(|(_, priority)| *priority);

  matches.into_iter().map(|(cmd, _)| cmd).collect()
}

/// Lower is better, None means no match
fn match_priority(cmd: &Command, input: &str) -> Option<u32> {
  if cmd.name == input {
    Some(0)
  } else if cmd.aliases.contains(&input) {
    Some(1)
  } else if cmd.name.starts_with(input) {
    Some(2)
  } else if cmd.aliases.iter().any(|a| a.starts_with(input)) {
    Some(3)
  } else if cmd.name.contains(input) {
    Some(4)
  } else if cmd.aliases.iter().any(|a| a.contains(input)) {
    Some(5)
  } else {
    None
  }
}
