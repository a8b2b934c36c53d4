use crate::ast::{Quoting, SimpleCommand, Word};
use crate::environment::{is_valid_name, Environment};

/// Turns a word into the string it stands for right now.
///
/// `$NAME` and `${NAME}` are substituted in bare and double-quoted parts,
/// unset names expand to nothing. Single-quoted parts are taken verbatim.
pub fn expand_word(word: &Word, env: &Environment) -> String {
    let mut out = String::new();
    for part in &word.parts {
        match part.quoting {
            Quoting::Single => out.push_str(&part.text),
            Quoting::Bare | Quoting::Double => substitute(&part.text, env, &mut out),
        }
    }
    out
}

/// Argument vector for program load: verb followed by every argument.
pub fn build_argv(cmd: &SimpleCommand, env: &Environment) -> Vec<String> {
    std::iter::once(&cmd.verb)
        .chain(cmd.args.iter())
        .map(|w| expand_word(w, env))
        .collect()
}

fn substitute(text: &str, env: &Environment, out: &mut String) {
    let mut rest = text;
    while let Some(idx) = rest.find('$') {
        out.push_str(&rest[..idx]);
        let after = &rest[idx + 1..];

        if let Some(braced) = after.strip_prefix('{') {
            if let Some(end) = braced.find('}') {
                let name = &braced[..end];
                if is_valid_name(name) {
                    out.push_str(env.get(name).unwrap_or(""));
                    rest = &braced[end + 1..];
                    continue;
                }
            }
            out.push('$');
            rest = after;
            continue;
        }

        let len = after
            .char_indices()
            .find(|&(i, c)| !(c == '_' || c.is_ascii_alphanumeric()) || (i == 0 && c.is_ascii_digit()))
            .map(|(i, _)| i)
            .unwrap_or(after.len());
        if len == 0 {
            out.push('$');
        } else {
            out.push_str(env.get(&after[..len]).unwrap_or(""));
        }
        rest = &after[len..];
    }
    out.push_str(rest);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::WordPart;

    fn env() -> Environment {
        [("HOME", "/home/me"), ("X", "1")].into_iter().collect()
    }

    #[test]
    fn test_plain_word_is_unchanged() {
        assert_eq!(expand_word(&Word::literal("hello"), &env()), "hello");
    }

    #[test]
    fn test_variable_forms() {
        assert_eq!(expand_word(&Word::literal("$HOME/bin"), &env()), "/home/me/bin");
        assert_eq!(expand_word(&Word::literal("a${X}b"), &env()), "a1b");
        assert_eq!(expand_word(&Word::literal("$MISSING."), &env()), ".");
    }

    #[test]
    fn test_lone_and_malformed_dollars_stay_literal() {
        assert_eq!(expand_word(&Word::literal("cost $"), &env()), "cost $");
        assert_eq!(expand_word(&Word::literal("$1"), &env()), "$1");
        assert_eq!(expand_word(&Word::literal("${X"), &env()), "${X");
    }

    #[test]
    fn test_single_quotes_suppress_expansion() {
        let word = Word::new(vec![
            WordPart::new("$X", Quoting::Single),
            WordPart::new("-$X", Quoting::Double),
        ]);
        assert_eq!(expand_word(&word, &env()), "$X-1");
    }

    #[test]
    fn test_assignment_parts_concatenate() {
        assert_eq!(expand_word(&Word::assignment("A", "$X"), &env()), "A=1");
    }

    #[test]
    fn test_build_argv() {
        let cmd = SimpleCommand::from_literals(&["echo", "$X", "two"]);
        assert_eq!(build_argv(&cmd, &env()), vec!["echo", "1", "two"]);
    }
}
