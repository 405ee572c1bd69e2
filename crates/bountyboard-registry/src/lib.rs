pub mod agent;
pub mod breaker;
pub mod cache;
pub mod fetcher;
pub mod search;

pub use agent::*;
pub use breaker::*;
pub use cache::*;
pub use fetcher::*;
pub use search::*;
