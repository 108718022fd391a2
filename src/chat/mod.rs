pub mod relay;
mod socket;

pub use relay::ChatRelay;
pub use socket::group_socket;
