pub mod controller;
pub mod error;
pub mod history;
pub mod session;
pub mod traits;
