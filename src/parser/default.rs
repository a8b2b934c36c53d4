use crate::ast::{AstNode, SimpleCommand, Word};
use crate::lexer::{Token, TokenKind};
use crate::parser::{ParseError, Parser};

pub struct DefaultParser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> DefaultParser<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&TokenKind> {
        self.tokens.get(self.pos).map(|t| &t.kind)
    }

    fn at_end(&self) -> bool {
        matches!(self.peek(), None | Some(TokenKind::Eof))
    }

    fn consume(&mut self, pat: &TokenKind) -> bool {
        if self.peek() == Some(pat) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn unexpected(&self, expected: &[&str]) -> ParseError {
        match self.tokens.get(self.pos) {
            None => ParseError::UnexpectedEof,
            Some(t) if t.kind == TokenKind::Eof => ParseError::UnexpectedEof,
            Some(t) => ParseError::UnexpectedToken {
                found: t.describe(),
                expected: expected.iter().map(|s| s.to_string()).collect(),
                pos: t.span.0,
            },
        }
    }

    fn expect_word(&mut self) -> Result<Word, ParseError> {
        match self.peek() {
            Some(TokenKind::Word(w)) => {
                let w = w.clone();
                self.pos += 1;
                Ok(w)
            }
            _ => Err(self.unexpected(&["filename"])),
        }
    }
}

// Top-down recursive descent parser
impl<'a> Parser for DefaultParser<'a> {
    fn parse(&mut self) -> Result<AstNode, ParseError> {
        if self.at_end() {
            return Err(ParseError::EmptyInput);
        }
        let node = self.parse_sequence()?;
        if !self.at_end() {
            return Err(self.unexpected(&["end of input"]));
        }
        Ok(node)
    }
}

impl<'a> DefaultParser<'a> {
    // a ; b ; c  (a trailing ';' is allowed)
    fn parse_sequence(&mut self) -> Result<AstNode, ParseError> {
        let mut node = self.parse_parallel()?;
        while self.consume(&TokenKind::Semicolon) {
            while self.consume(&TokenKind::Semicolon) {}
            if self.at_end() {
                break;
            }
            let rhs = self.parse_parallel()?;
            node = AstNode::sequence(node, rhs);
        }
        Ok(node)
    }

    fn parse_parallel(&mut self) -> Result<AstNode, ParseError> {
        let mut node = self.parse_and_or()?;
        while self.consume(&TokenKind::Amp) {
            let rhs = self.parse_and_or()?;
            node = AstNode::parallel(node, rhs);
        }
        Ok(node)
    }

    fn parse_and_or(&mut self) -> Result<AstNode, ParseError> {
        let mut node = self.parse_pipeline()?;
        loop {
            if self.consume(&TokenKind::And) {
                let rhs = self.parse_pipeline()?;
                node = AstNode::and(node, rhs);
            } else if self.consume(&TokenKind::Or) {
                let rhs = self.parse_pipeline()?;
                node = AstNode::or(node, rhs);
            } else {
                break;
            }
        }
        Ok(node)
    }

    fn parse_pipeline(&mut self) -> Result<AstNode, ParseError> {
        let mut node = self.parse_simple()?;
        while self.consume(&TokenKind::Pipe) {
            let rhs = self.parse_simple()?;
            node = AstNode::pipeline(node, rhs);
        }
        Ok(node)
    }

    // Words and redirections in any order; the first word is the verb.
    fn parse_simple(&mut self) -> Result<AstNode, ParseError> {
        let mut words = Vec::new();
        let mut cmd = SimpleCommand::new(Word::default(), Vec::new());

        loop {
            let Some(kind) = self.peek().cloned() else { break };
            match kind {
                TokenKind::Word(w) => {
                    words.push(w);
                    self.pos += 1;
                }
                TokenKind::RedirectIn => {
                    self.pos += 1;
                    cmd = cmd.with_input(self.expect_word()?);
                }
                TokenKind::RedirectOut | TokenKind::AppendOut => {
                    self.pos += 1;
                    cmd = cmd.with_output(self.expect_word()?, kind == TokenKind::AppendOut);
                }
                TokenKind::RedirectErr | TokenKind::AppendErr => {
                    self.pos += 1;
                    cmd = cmd.with_error(self.expect_word()?, kind == TokenKind::AppendErr);
                }
                TokenKind::RedirectBoth => {
                    self.pos += 1;
                    let file = self.expect_word()?;
                    cmd = cmd.with_output(file.clone(), false).with_error(file, false);
                }
                _ => break,
            }
        }

        if words.is_empty() {
            return Err(self.unexpected(&["command"]));
        }
        let mut words = words.into_iter();
        if let Some(verb) = words.next() {
            cmd.verb = verb;
        }
        cmd.args = words.collect();
        Ok(AstNode::Command(cmd))
    }
}
