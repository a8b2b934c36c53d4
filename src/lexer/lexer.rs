use thiserror::Error;

use super::token::{Token, TokenKind};
use crate::ast::{Quoting, Word, WordPart};
use crate::environment::is_valid_name;

#[derive(Debug, PartialEq, Eq, Clone, Error)]
pub enum LexError {
    #[error("Unterminated quote '{0}' starting at position {1}")]
    UnterminatedQuote(char, usize),
}

pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    pub fn tokenize(input: &str) -> Result<Vec<Token>, LexError> {
        Lexer::new(input).tokenize_all()
    }

    pub fn tokenize_all(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    /// Consumes `len` characters and returns an operator token covering them.
    fn op(&mut self, kind: TokenKind, len: usize) -> Token {
        let start = self.pos;
        self.pos += len;
        Token::new(kind, (start, self.pos))
    }

    pub fn next_token(&mut self) -> Result<Token, LexError> {
        while matches!(self.peek_at(0), Some(' ') | Some('\t')) {
            self.pos += 1;
        }

        let Some(ch) = self.peek_at(0) else {
            return Ok(Token::new(TokenKind::Eof, (self.pos, self.pos)));
        };

        let token = match ch {
            ';' | '\n' => self.op(TokenKind::Semicolon, 1),
            '|' if self.peek_at(1) == Some('|') => self.op(TokenKind::Or, 2),
            '|' => self.op(TokenKind::Pipe, 1),
            '&' if self.peek_at(1) == Some('&') => self.op(TokenKind::And, 2),
            '&' if self.peek_at(1) == Some('>') => self.op(TokenKind::RedirectBoth, 2),
            '&' => self.op(TokenKind::Amp, 1),
            '<' => self.op(TokenKind::RedirectIn, 1),
            '>' if self.peek_at(1) == Some('>') => self.op(TokenKind::AppendOut, 2),
            '>' => self.op(TokenKind::RedirectOut, 1),
            '2' if self.peek_at(1) == Some('>') => {
                if self.peek_at(2) == Some('>') {
                    self.op(TokenKind::AppendErr, 3)
                } else {
                    self.op(TokenKind::RedirectErr, 2)
                }
            }
            _ => self.read_word()?,
        };
        Ok(token)
    }

    fn read_word(&mut self) -> Result<Token, LexError> {
        let start = self.pos;
        let mut parts = Vec::new();
        let mut bare = String::new();

        while let Some(ch) = self.peek_at(0) {
            match ch {
                ' ' | '\t' | '\n' | ';' | '|' | '&' | '<' | '>' => break,
                '\'' | '"' => {
                    flush_bare(&mut bare, &mut parts);
                    let quoting = if ch == '\'' { Quoting::Single } else { Quoting::Double };
                    let text = self.read_quoted(ch)?;
                    parts.push(WordPart::new(text, quoting));
                }
                '\\' => {
                    self.pos += 1;
                    match self.peek_at(0) {
                        Some(escaped) => {
                            flush_bare(&mut bare, &mut parts);
                            parts.push(WordPart::new(escaped.to_string(), Quoting::Single));
                            self.pos += 1;
                        }
                        None => bare.push('\\'),
                    }
                }
                _ => {
                    bare.push(ch);
                    self.pos += 1;
                }
            }
        }
        flush_bare(&mut bare, &mut parts);

        Ok(Token::new(
            TokenKind::Word(Word::new(split_assignment(parts))),
            (start, self.pos),
        ))
    }

    fn read_quoted(&mut self, quote: char) -> Result<String, LexError> {
        let open = self.pos;
        self.pos += 1; // opening quote
        let mut text = String::new();
        while let Some(ch) = self.peek_at(0) {
            self.pos += 1;
            if ch == quote {
                return Ok(text);
            }
            text.push(ch);
        }
        Err(LexError::UnterminatedQuote(quote, open))
    }
}

fn flush_bare(bare: &mut String, parts: &mut Vec<WordPart>) {
    if !bare.is_empty() {
        parts.push(WordPart::new(std::mem::take(bare), Quoting::Bare));
    }
}

/// `NAME=rest...` becomes `NAME`, `=`, `rest...` so assignments can be
/// told apart from ordinary words.
fn split_assignment(mut parts: Vec<WordPart>) -> Vec<WordPart> {
    let Some(first) = parts.first() else {
        return parts;
    };
    if first.quoting != Quoting::Bare {
        return parts;
    }
    let Some(eq) = first.text.find('=') else {
        return parts;
    };
    if !is_valid_name(&first.text[..eq]) {
        return parts;
    }

    let first = parts.remove(0);
    let (name, value) = (&first.text[..eq], &first.text[eq + 1..]);
    let mut split = vec![
        WordPart::new(name, Quoting::Bare),
        WordPart::new("=", Quoting::Bare),
    ];
    if !value.is_empty() {
        split.push(WordPart::new(value, Quoting::Bare));
    }
    split.extend(parts);
    split
}
