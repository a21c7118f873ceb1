//! Comment command grammar.
//!
//! Single-line comments of the form `// periphery:<command>[:<args>]`
//! where command is one of `ignore`, `ignore-all`, `ignore-parameters`.
//! Arguments are comma-separated identifiers.

use crate::graph::CommentCommand;

/// Parse one comment line into a command, if it carries one.
pub fn parse_comment_command(comment: &str) -> Option<CommentCommand> {
    let trimmed = comment.trim().trim_start_matches("//").trim_start();
    let rest = trimmed.strip_prefix("periphery:")?;

    let (command, args) = match rest.split_once(':') {
        Some((command, args)) => (command.trim(), Some(args)),
        None => (rest.trim(), None),
    };

    match command {
        "ignore" => Some(CommentCommand::Ignore),
        "ignore-all" => Some(CommentCommand::IgnoreAll),
        "ignore-parameters" => {
            let names: Vec<String> = args?
                .split(',')
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())
                .collect();
            if names.is_empty() {
                None
            } else {
                Some(CommentCommand::IgnoreParameters(names))
            }
        }
        _ => None,
    }
}

/// Parse every command found in a list of comment lines.
pub fn parse_comment_commands(comments: &[String]) -> Vec<CommentCommand> {
    comments
        .iter()
        .filter_map(|comment| parse_comment_command(comment))
        .collect()
}
