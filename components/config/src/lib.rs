#[macro_use]
extern crate serde_derive;

mod config;
mod generator;
mod toml;

pub use config::*;
pub use generator::generate_toml_config;
