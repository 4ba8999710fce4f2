pub mod commands;
pub mod config;
pub mod context;
pub mod domain_name;
pub mod error;
pub mod history;
pub mod hosts;
pub mod http;
pub mod repl;
pub mod util;
pub mod validate;
