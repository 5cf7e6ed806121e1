//! Frame sources and loaders

mod loader;
mod memory;
mod traits;

pub use loader::load_frame;
pub use memory::{InMemoryFrameStore, StaticFrame};
pub use traits::DataFrameSource;
