//! Command implementations.

pub mod config;
pub mod csr;
pub mod fetch;
pub mod idps;

pub use config::run_config;
pub use csr::run_csr;
pub use fetch::run_fetch;
pub use idps::run_idps;
