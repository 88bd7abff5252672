mod category;
mod entry;
mod focus;
mod stats;
mod task;

pub use category::*;
pub use entry::*;
pub use focus::*;
pub use stats::*;
pub use task::*;
