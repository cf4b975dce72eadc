//! CLI command implementations.

mod config;
mod doctor;
mod generate;
mod list;
mod serve;
mod show;

pub use config::run_config;
pub use doctor::run_doctor;
pub use generate::run_generate;
pub use list::run_list;
pub use serve::run_serve;
pub use show::run_show;
