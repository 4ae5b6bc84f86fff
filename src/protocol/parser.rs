//! Request line parsing
//!
//! Splits raw client input into a verb and its arguments.

use crate::protocol::commands::{Line, Request};

/// Parse a raw line (terminator already stripped) into a `Line`.
///
/// Only a truly empty line terminates the session. A whitespace-only line
/// yields a request with an empty verb, which dispatch rejects.
pub fn parse_command(raw: &str) -> Line {
    if raw.is_empty() {
        return Line::Terminate;
    }

    let mut tokens = raw.split_whitespace().map(str::to_string);
    let verb = tokens.next().unwrap_or_default();
    Line::Request(Request {
        verb,
        args: tokens.collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(verb: &str, args: &[&str]) -> Line {
        Line::Request(Request {
            verb: verb.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        })
    }

    #[test]
    fn test_empty_line_terminates() {
        assert_eq!(parse_command(""), Line::Terminate);
    }

    #[test]
    fn test_parse_basic_commands() {
        assert_eq!(parse_command("LIST"), request("LIST", &[]));
        assert_eq!(parse_command("FIND txt"), request("FIND", &["txt"]));
        assert_eq!(parse_command("find a b c"), request("find", &["a", "b", "c"]));
    }

    #[test]
    fn test_parse_with_whitespace() {
        assert_eq!(parse_command("  LIST  "), request("LIST", &[]));
        assert_eq!(parse_command("FIND   a\tb "), request("FIND", &["a", "b"]));
    }

    #[test]
    fn test_whitespace_only_line() {
        assert_eq!(parse_command("   "), request("", &[]));
    }

    #[test]
    fn test_verb_case_is_preserved() {
        assert_eq!(parse_command("Bogus arg"), request("Bogus", &["arg"]));
    }
}
