//! Configuration, store bootstrap and dependency wiring.

pub mod bootstrap;
mod dependencies;
mod settings;

pub use dependencies::Dependencies;
pub use settings::{KafkaSettings, LogFormat, Settings};
