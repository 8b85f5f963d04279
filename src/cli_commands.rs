use crate::i18n::Locale;

/// One line of interactive input, parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Free text: a search at the landing screen, or an answer.
    Text(String),
    /// A 1-based pick from the options or categories on screen.
    Pick(usize),
    Suggest(String),
    Category(String),
    Categories,
    Language(Locale),
    Reset,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

pub fn parse_command(input: &str) -> Command {
    let input = input.trim();
    if input.is_empty() {
        return Command::Empty;
    }

    if let Some(prefix) = input.strip_prefix('?') {
        return Command::Suggest(prefix.trim().to_string());
    }

    if let Some(rest) = input.strip_prefix('/') {
        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };
        return match name.to_lowercase().as_str() {
            "reset" | "r" | "home" => Command::Reset,
            "help" | "h" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            "categories" | "cats" => Command::Categories,
            "cat" | "category" if !arg.is_empty() => Command::Category(arg.to_string()),
            "suggest" | "s" => Command::Suggest(arg.to_string()),
            "lang" | "language" => match arg.parse::<Locale>() {
                Ok(locale) => Command::Language(locale),
                Err(_) => Command::Unknown(input.to_string()),
            },
            _ => Command::Unknown(input.to_string()),
        };
    }

    match input.parse::<usize>() {
        Ok(n) if n > 0 => Command::Pick(n),
        _ => Command::Text(input.to_string()),
    }
}
