pub mod archive;
pub mod catalog;
pub mod config;
pub mod layout;
pub mod lock;
pub mod model;

pub const VERSION: Option<&str> = option_env!("STRATA_VERSION");
