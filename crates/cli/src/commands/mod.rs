//! Command implementations.

mod init_db;
mod publish;
mod run;
mod validate;

pub use init_db::run_init_db;
pub use publish::run_publish;
pub use run::run_pipeline;
pub use validate::run_validate;
