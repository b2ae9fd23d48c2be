//! Command modules for the HDB CLI

pub mod debug;
pub mod inspect;
pub mod workspace;

pub use debug::debug;
pub use inspect::{address, calldata, flatten};
pub use workspace::{check, purge_cache, reset_state, show_config};
