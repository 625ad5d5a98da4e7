// Cache module.
// In-memory payload cache plus the on-disk locations and JSON store helpers.

pub mod fetch;
pub mod paths;
pub mod store;

pub use fetch::{DEFAULT_CAPACITY, FetchCache, Payload, is_image};
pub use paths::*;
pub use store::{read_json, write_json};
