//! Command implementations for the lexiplan CLI

pub mod migrate;
pub mod serve;
pub mod tokenize;

pub use migrate::run_migrate;
pub use serve::run_serve;
pub use tokenize::run_tokenize;
