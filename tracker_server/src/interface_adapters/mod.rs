// Interface adapters: wire protocol, network handling and external clients.

pub mod clients;
pub mod net;
pub mod protocol;
pub mod sinks;
pub mod state;
