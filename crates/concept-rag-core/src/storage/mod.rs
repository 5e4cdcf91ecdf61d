pub mod codec;
pub mod engine;
pub mod schema;

pub use engine::{Scored, StorageEngine};
