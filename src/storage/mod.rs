pub mod codec;
pub mod query;
pub mod sharded;
pub mod term_store;

pub use query::ApproximateQuery;
pub use sharded::{
    shard_dir, shards_on_disk, NoopMonitor, ShardKey, ShardMonitor, ShardProgress, ShardedStore,
    TaxonPrefixShardKey, DEFAULT_SHARD_COUNT,
};
pub use term_store::{
    parent_id, ChainWalk, StoreMode, StoreOptions, Term, TermStore, EMPTY_FIELD,
};
