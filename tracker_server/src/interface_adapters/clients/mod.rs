// reqwest/tungstenite clients for services outside this process.

pub mod relay;
pub mod roster;

pub use relay::RelayClient;
pub use roster::RosterClient;
