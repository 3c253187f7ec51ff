pub mod history;
pub mod sensor;
pub mod targets;

pub use history::*;
pub use sensor::*;
pub use targets::*;
