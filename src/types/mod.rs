mod repo;
pub mod version;

pub use repo::*;
