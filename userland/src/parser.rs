//! Command-line parsing: tokenize, pull out `<`/`>`/`>>` redirection
//! targets and a trailing `&`, leaving the plain argv for dispatch.
//!
//! Grounded in `shell.c`'s `handle_io_setup` (which consumes the same
//! `stdin_file`/`stdout_file`/`is_file_append` fields this parser
//! produces).

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub args: Vec<String>,
    pub stdin_file: Option<String>,
    pub stdout_file: Option<String>,
    pub is_file_append: bool,
    pub is_background: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("empty command")]
    Empty,
    #[error("missing filename after `{0}`")]
    MissingRedirectTarget(&'static str),
}

pub fn parse(line: &str) -> Result<ParsedCommand, ParseError> {
    let mut tokens: Vec<String> = line.split_whitespace().map(str::to_string).collect();
    if tokens.is_empty() {
        return Err(ParseError::Empty);
    }

    let mut command = ParsedCommand::default();
    match tokens.last().map(String::as_str) {
        Some("&") => {
            command.is_background = true;
            tokens.pop();
        }
        Some(last) if last.ends_with('&') => {
            command.is_background = true;
            let trimmed = last[..last.len() - 1].to_string();
            *tokens.last_mut().unwrap() = trimmed;
        }
        _ => {}
    }

    let mut args = Vec::new();
    let mut iter = tokens.into_iter();
    while let Some(token) = iter.next() {
        match token.as_str() {
            "<" => {
                let target = iter.next().ok_or(ParseError::MissingRedirectTarget("<"))?;
                command.stdin_file = Some(target);
            }
            ">" => {
                let target = iter.next().ok_or(ParseError::MissingRedirectTarget(">"))?;
                command.stdout_file = Some(target);
                command.is_file_append = false;
            }
            ">>" => {
                let target = iter.next().ok_or(ParseError::MissingRedirectTarget(">>"))?;
                command.stdout_file = Some(target);
                command.is_file_append = true;
            }
            _ => args.push(token),
        }
    }
    if args.is_empty() {
        return Err(ParseError::Empty);
    }
    command.args = args;
    Ok(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_command() {
        let parsed = parse("ls -l").unwrap();
        assert_eq!(parsed.args, vec!["ls", "-l"]);
        assert!(!parsed.is_background);
    }

    #[test]
    fn parses_background_marker() {
        let parsed = parse("sleep 5 &").unwrap();
        assert!(parsed.is_background);
        assert_eq!(parsed.args, vec!["sleep", "5"]);
    }

    #[test]
    fn parses_redirection() {
        let parsed = parse("cat < in.txt >> out.txt").unwrap();
        assert_eq!(parsed.args, vec!["cat"]);
        assert_eq!(parsed.stdin_file.as_deref(), Some("in.txt"));
        assert_eq!(parsed.stdout_file.as_deref(), Some("out.txt"));
        assert!(parsed.is_file_append);
    }

    #[test]
    fn empty_line_errors() {
        assert!(matches!(parse("   "), Err(ParseError::Empty)));
    }
}
