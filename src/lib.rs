pub(crate) mod logging;
pub(crate) mod task;

pub mod manager;
pub mod reader;
pub mod reporter;
pub mod session;

uniffi::setup_scaffolding!();
