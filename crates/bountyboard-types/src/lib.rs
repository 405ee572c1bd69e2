pub mod bounty;
pub mod error;
pub mod sanitize;
pub mod secret;
pub mod service;

pub use bounty::*;
pub use error::*;
pub use sanitize::*;
pub use secret::*;
pub use service::*;
