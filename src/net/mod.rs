//! Networking: wire types, the transport seam, its cookie jar and the
//! request gateway.

pub mod cookies;
pub mod gateway;
pub mod transport;
pub mod types;

#[cfg(test)]
#[path = "scripted_transport_test.rs"]
pub mod test_helpers;
