pub mod cli;
pub mod loader;
pub mod logging;
pub mod script;
