pub mod checkpoint;
pub mod stage_cache;

pub use checkpoint::{Checkpoint, Stage};
pub use stage_cache::{StageCache, StageCacheEntry};
