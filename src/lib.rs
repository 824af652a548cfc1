// Library interface for testing
pub mod cli;
pub mod digest;
pub mod search;
pub mod stats;
