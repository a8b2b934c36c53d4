use crate::ast::Word;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Word(Word),
    Pipe,          // |
    Or,            // ||
    Amp,           // &
    And,           // &&
    Semicolon,     // ; or newline
    RedirectIn,    // <
    RedirectOut,   // >
    AppendOut,     // >>
    RedirectErr,   // 2>
    AppendErr,     // 2>>
    RedirectBoth,  // &>
    Eof,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: (usize, usize), // [start, end)
}

impl Token {
    pub fn new(kind: TokenKind, span: (usize, usize)) -> Self {
        Token { kind, span }
    }

    pub fn describe(&self) -> String {
        match &self.kind {
            TokenKind::Word(_) => "word".to_string(),
            TokenKind::Pipe => "|".to_string(),
            TokenKind::Or => "||".to_string(),
            TokenKind::Amp => "&".to_string(),
            TokenKind::And => "&&".to_string(),
            TokenKind::Semicolon => ";".to_string(),
            TokenKind::RedirectIn => "<".to_string(),
            TokenKind::RedirectOut => ">".to_string(),
            TokenKind::AppendOut => ">>".to_string(),
            TokenKind::RedirectErr => "2>".to_string(),
            TokenKind::AppendErr => "2>>".to_string(),
            TokenKind::RedirectBoth => "&>".to_string(),
            TokenKind::Eof => "end of input".to_string(),
        }
    }
}
