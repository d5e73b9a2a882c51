//! Message Signing Module
//!
//! Bitcoin "Signed Message" signing and verification with compact,
//! public-key-recoverable signatures.

pub mod bitcoin;
pub mod compact;

pub use bitcoin::{recover_public_key, write_compact_size, MessageSigner};
pub use compact::{CompactSignature, Header};
