mod config_gen;
mod links;
mod status;

pub use config_gen::config_generate;
pub use links::{batch_shorten, list_owned, request_delete, resolve_alias, shorten};
pub use status::{health, stats};
