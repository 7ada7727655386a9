pub mod actions;
pub mod client;
pub mod fixtures;
pub mod logging;
pub mod mock;
pub mod page;
