pub mod filler;
pub mod observer;
pub mod runner;

pub use filler::{FillerSpec, random_filler};
pub use observer::{NullObserver, RunEvent, RunObserver, Stage, TracingObserver};
pub use runner::{RunError, RunState, Runner};
