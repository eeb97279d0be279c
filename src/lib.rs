pub mod cli;
pub mod comment;
pub mod config;
pub mod error;
pub mod history;
pub mod params;
pub mod render;
#[cfg(test)]
mod test_helpers;
