//! Command line parser.
//!
//! A raw line goes through, in order:
//! 1. History expansion: `!!`, `!n`, `!-n`
//! 2. Alias expansion of each command word
//! 3. Variable expansion: `$VAR`, `${VAR}`, `$?`
//! 4. Chain split on `&&` and `;`
//! 5. Per segment: pipe split on `|` and word tokenization with quotes
//!
//! Every step is quote-aware: single-quoted text is never expanded or split.

mod chain;
mod expand;
mod lexer;

pub use chain::{ChainSegment, split_chain};
pub use expand::{expand_aliases, expand_history, expand_variables};
pub use lexer::{Lexer, Token};

use thiserror::Error;

// =============================================================================
// Parse Error
// =============================================================================

/// Syntax errors of one input line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Chain operator with no command in front: `&& ls`, `ls ;; pwd`
    #[error("syntax error near unexpected token `{operator}'")]
    UnexpectedOperator { operator: &'static str },
    /// `&&` at the end of the line
    #[error("syntax error: unexpected end of input after `{operator}'")]
    TrailingOperator { operator: &'static str },
    /// Pipe at the beginning of a command: `| grep foo`
    #[error("syntax error near token {}: unexpected '|'", .position + 1)]
    UnexpectedPipe { position: usize },
    /// Empty stage between pipes: `ls | | grep`
    #[error("syntax error near token {}: empty pipe stage", .position + 1)]
    EmptyPipeStage { position: usize },
    /// Pipe at the end with no following command: `ls |`
    #[error("syntax error near token {}: unexpected end after '|'", .position + 1)]
    TrailingPipe { position: usize },
    /// History reference that names no entry
    #[error("{0}: event not found")]
    EventNotFound(String),
}

// =============================================================================
// Pipeline Representation
// =============================================================================

/// A single command in a pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub name: String,
    pub args: Vec<String>,
}

/// Commands connected by pipes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    pub commands: Vec<ParsedCommand>,
}

impl Pipeline {
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Split one chain segment into pipeline stages.
pub fn parse_pipeline(segment: &str) -> Result<Pipeline, ParseError> {
    let mut commands = Vec::new();
    let mut current_words = Vec::new();
    let mut expect_command = false; // true after seeing a pipe
    let mut last_pipe_pos = 0;

    for (idx, token) in Lexer::new(segment).enumerate() {
        match token {
            Token::Word(w) => {
                current_words.push(w);
                expect_command = false;
            }
            Token::Pipe => {
                if current_words.is_empty() {
                    return Err(if commands.is_empty() {
                        ParseError::UnexpectedPipe { position: idx }
                    } else {
                        ParseError::EmptyPipeStage { position: idx }
                    });
                }
                commands.push(words_to_command(std::mem::take(&mut current_words)));
                expect_command = true;
                last_pipe_pos = idx;
            }
        }
    }

    if expect_command && current_words.is_empty() {
        return Err(ParseError::TrailingPipe {
            position: last_pipe_pos,
        });
    }
    if !current_words.is_empty() {
        commands.push(words_to_command(current_words));
    }
    Ok(Pipeline { commands })
}

fn words_to_command(mut words: Vec<String>) -> ParsedCommand {
    let name = words.remove(0);
    ParsedCommand { name, args: words }
}
