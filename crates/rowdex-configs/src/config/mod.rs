pub mod defaults;
mod loader;
mod types;

pub use loader::MAX_PAGE_SIZE_LIMIT;
pub use types::*;
