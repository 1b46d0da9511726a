pub mod config;
pub mod logging;
pub mod recommendation;
pub mod session;
pub mod source;
