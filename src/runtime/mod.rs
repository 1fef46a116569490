pub mod native;

pub use native::{monitor, run, InputSelection, SessionOptions};
