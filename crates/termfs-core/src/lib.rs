//! Virtual file system and shell interpreter.
//!
//! This crate provides:
//! - [`FileSystemEngine`] over an arena [`NodeStore`] with path resolution,
//!   CRUD, rename/move/copy, search, change events and optional [`Storage`]
//! - [`Shell`], one session: [`Environment`], [`HistoryBuffer`], the command
//!   tokenizer in [`parser`] and the builtin table in [`Builtin`]
//! - [`autocomplete`] and [`get_hint`] for tab completion

mod autocomplete;
mod commands;
pub mod config;
pub mod env;
pub mod error;
mod executor;
pub mod filesystem;
pub mod history;
pub mod models;
pub mod parser;
mod session;
pub mod storage;
pub mod utils;

pub use autocomplete::{AutocompleteResult, autocomplete, get_hint};
pub use commands::{Builtin, CommandResult, Effect, Flags, Invocation};
pub use config::ShellConfig;
pub use env::Environment;
pub use error::{EnvironmentError, FsError, InvariantViolation, ShellError, StorageError};
pub use filesystem::{FileSystemEngine, FsEvent, NodeStore, Subscription, SubscriptionId};
pub use history::HistoryBuffer;
pub use models::{FileNode, Manifest, NodeId, NodeKind};
pub use parser::ParseError;
pub use session::{Identity, LineResult, Shell, TranscriptEntry};
pub use storage::{MemoryStorage, Storage};
