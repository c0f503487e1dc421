pub mod address;
pub mod config;
pub mod connectivity;
pub mod engine;
pub mod error;
pub mod system;
pub mod types;

#[cfg(test)]
mod tests;

pub use config::*;
pub use connectivity::*;
pub use engine::*;
pub use error::*;
pub use system::*;
pub use types::*;
