//! Inbound command surface used by the UI layer

pub mod connection;
pub mod publish;

pub use connection::{connect_account, disconnect_account, get_connection_status};
pub use publish::publish_post;
