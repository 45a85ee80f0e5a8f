// Core modules - one responsibility per file
pub mod conversions; // wire strings → domain types
pub mod requests; // validation + RequestIntent assembly
pub mod rest; // thin typed wrapper around HttpTransport
pub mod signer; // EVM (v3) request signing
pub mod types; // serde structs ← raw JSON

pub mod builder; // config → concrete connector
pub mod connector; // compose sub-traits

pub use builder::{build_connector, build_connector_with_rest, build_signer};
pub use connector::AsterConnector;
pub use requests::{AsterRequests, EndpointSet, MAX_LEVERAGE, MIN_LEVERAGE};
pub use rest::AsterRestClient;
pub use signer::AsterSigner;
