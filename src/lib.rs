pub mod bio;
pub mod cli;
pub mod core;
pub mod error;
pub mod processing;
pub mod storage;
pub mod utils;

pub use crate::core::config::DicoConfig;
pub use crate::core::dico::DicoKind;
pub use crate::core::query_system::DicoQuerySystem;
pub use crate::error::{DicoError, Result};
pub use crate::storage::{ShardedStore, StoreMode, StoreOptions, Term, TermStore};
