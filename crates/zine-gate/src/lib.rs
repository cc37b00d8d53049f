//! zine-gate: the decrypt gate
//!
//! Pipeline:
//! ```text
//! suite (self-tested, memoized) → fetch metadata by CID → decode all fields
//!   → verify TOTP → scrypt(passphrase, salt) → secretbox open
//!   → inspect ZIP → write {cid}.zip
//! ```
//!
//! States: `Verifying2FA → DerivingKey&Decrypting → {Succeeded, Rejected}`.
//! There are no retries; a rejected attempt is final and the caller may start
//! a new one.

pub mod archive;
pub mod delivery;
pub mod gate;
pub mod pipeline;

pub use archive::{inspect, ArchiveEntry, ArchiveSummary};
pub use delivery::deliver;
pub use gate::{attempt_decrypt, unix_now, Credentials, GateOptions};
pub use pipeline::{open_zine, OpenOutcome, OpenRequest};
