/// Parsed command tree. Leaves are simple commands, every other variant
/// combines exactly two subtrees.
#[derive(Debug, Clone, PartialEq)]
pub enum AstNode {
    Command(SimpleCommand),
    Sequence(Box<AstNode>, Box<AstNode>),
    Parallel(Box<AstNode>, Box<AstNode>),
    Pipeline(Box<AstNode>, Box<AstNode>),
    And(Box<AstNode>, Box<AstNode>),
    Or(Box<AstNode>, Box<AstNode>),
}

impl AstNode {
    pub fn sequence(cmd1: AstNode, cmd2: AstNode) -> Self {
        AstNode::Sequence(Box::new(cmd1), Box::new(cmd2))
    }

    pub fn parallel(cmd1: AstNode, cmd2: AstNode) -> Self {
        AstNode::Parallel(Box::new(cmd1), Box::new(cmd2))
    }

    pub fn pipeline(cmd1: AstNode, cmd2: AstNode) -> Self {
        AstNode::Pipeline(Box::new(cmd1), Box::new(cmd2))
    }

    pub fn and(cmd1: AstNode, cmd2: AstNode) -> Self {
        AstNode::And(Box::new(cmd1), Box::new(cmd2))
    }

    pub fn or(cmd1: AstNode, cmd2: AstNode) -> Self {
        AstNode::Or(Box::new(cmd1), Box::new(cmd2))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimpleCommand {
    pub verb: Word,
    pub args: Vec<Word>,
    pub input: Option<Word>,
    pub output: Option<Word>,
    pub error: Option<Word>,
    pub io_flags: IoFlags,
}

impl SimpleCommand {
    pub fn new(verb: Word, args: Vec<Word>) -> Self {
        SimpleCommand {
            verb,
            args,
            input: None,
            output: None,
            error: None,
            io_flags: IoFlags::default(),
        }
    }

    pub fn with_input(mut self, file: Word) -> Self {
        self.input = Some(file);
        self
    }

    pub fn with_output(mut self, file: Word, append: bool) -> Self {
        self.output = Some(file);
        self.io_flags.out_append = append;
        self
    }

    pub fn with_error(mut self, file: Word, append: bool) -> Self {
        self.error = Some(file);
        self.io_flags.err_append = append;
        self
    }
}

#[cfg(test)]
impl SimpleCommand {
    /// Builds a command from plain literal words, verb first.
    pub fn from_literals(words: &[&str]) -> Self {
        let mut words = words.iter().map(|w| Word::literal(w));
        let verb = words.next().unwrap_or_else(|| Word::literal(""));
        SimpleCommand::new(verb, words.collect())
    }
}

/// Truncate-vs-append choice for the output and error streams.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IoFlags {
    pub out_append: bool,
    pub err_append: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quoting {
    Bare,
    Single,
    Double,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordPart {
    pub text: String,
    pub quoting: Quoting,
}

impl WordPart {
    pub fn new(text: impl Into<String>, quoting: Quoting) -> Self {
        WordPart { text: text.into(), quoting }
    }
}

/// An unexpanded token. Expansion happens at the point of use, see
/// [`crate::expander::expand_word`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Word {
    pub parts: Vec<WordPart>,
}

impl Word {
    pub fn new(parts: Vec<WordPart>) -> Self {
        Word { parts }
    }

    pub fn literal(text: &str) -> Self {
        Word { parts: vec![WordPart::new(text, Quoting::Bare)] }
    }

    /// `NAME`, `=`, `value` as the lexer splits an assignment verb.
    pub fn assignment(name: &str, value: &str) -> Self {
        Word {
            parts: vec![
                WordPart::new(name, Quoting::Bare),
                WordPart::new("=", Quoting::Bare),
                WordPart::new(value, Quoting::Bare),
            ],
        }
    }

    /// Raw text of a single-part word, used to recognise builtin names.
    pub fn as_name(&self) -> Option<&str> {
        match self.parts.as_slice() {
            [part] => Some(part.text.as_str()),
            _ => None,
        }
    }
}
