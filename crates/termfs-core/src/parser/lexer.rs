//! Lexer for one chain segment.
//!
//! Handles:
//! - Word tokenization on whitespace
//! - Pipe operator (`|`)
//! - Quote handling (single and double quotes); adjacent quoted and bare
//!   spans join into one word, so `a='b c'` is a single token
//! - Backslash escapes outside single quotes
//!
//! Variable and history references are already expanded when text reaches
//! the lexer.

/// Token types produced by the lexer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A word (command name or argument); may be empty when quoted (`""`)
    Word(String),
    /// Pipe operator `|`
    Pipe,
}

/// Lexer for tokenizing shell input
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    /// Tokenize the entire input into a vector.
    pub fn tokenize(self) -> Vec<Token> {
        self.collect()
    }

    fn current_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.current_char()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while self.current_char().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn read_word(&mut self) -> Token {
        let mut word = String::new();
        while let Some(c) = self.current_char() {
            if c.is_whitespace() || c == '|' {
                break;
            }
            self.bump();
            match c {
                '\'' => self.read_single_quoted(&mut word),
                '"' => self.read_double_quoted(&mut word),
                '\\' => {
                    if let Some(escaped) = self.bump() {
                        word.push(escaped);
                    }
                }
                _ => word.push(c),
            }
        }
        Token::Word(word)
    }

    /// Everything up to the closing quote is literal. An unclosed quote
    /// runs to the end of input.
    fn read_single_quoted(&mut self, word: &mut String) {
        while let Some(c) = self.bump() {
            if c == '\'' {
                return;
            }
            word.push(c);
        }
    }

    fn read_double_quoted(&mut self, word: &mut String) {
        while let Some(c) = self.bump() {
            match c {
                '"' => return,
                '\\' => match self.bump() {
                    Some('n') => word.push('\n'),
                    Some('t') => word.push('\t'),
                    Some(escaped) => word.push(escaped),
                    None => word.push('\\'),
                },
                _ => word.push(c),
            }
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        self.skip_whitespace();
        match self.current_char()? {
            '|' => {
                self.bump();
                Some(Token::Pipe)
            }
            _ => Some(self.read_word()),
        }
    }
}
