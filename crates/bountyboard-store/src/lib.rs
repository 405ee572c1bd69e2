//! In-process persistence for bounties and service listings.

pub mod filter;
pub mod memory;
pub mod traits;

pub use filter::*;
pub use memory::*;
pub use traits::*;
