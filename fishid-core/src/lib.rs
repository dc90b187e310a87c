pub mod config;
pub mod normalize;
pub mod types;

// Keep the public surface small and intentional.
pub use config::*;
pub use normalize::*;
pub use types::*;
