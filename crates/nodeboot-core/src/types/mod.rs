mod address;
mod bootstrap;

pub use address::*;
pub use bootstrap::*;
