pub mod classify;
pub mod facts;
pub mod parse;
pub mod request;
pub mod runtime;
