// Flat-file loaders that feed dictionary stores

pub mod obo;
pub mod taxdump;
pub mod traits;
pub mod tsv;

pub use obo::{load_obo, load_obo_file, parse_obo, store_graph};
pub use taxdump::load_taxdump;
pub use traits::{LoadStats, TermSink};
pub use tsv::{load_tsv, load_tsv_file};
