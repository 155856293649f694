pub mod config;
pub mod dico;
pub mod paths;
pub mod query_system;

pub use config::DicoConfig;
pub use dico::DicoKind;
pub use query_system::DicoQuerySystem;
