pub mod netsim;
pub mod router;
pub mod server;
pub mod store;
