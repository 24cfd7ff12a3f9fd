pub mod retry;
pub mod runner;

pub use retry::{Backoff, retry_on_conflict};
pub use runner::{Registrar, shutdown_signal};
