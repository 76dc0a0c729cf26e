//! Versioning
//!
//! - `VersionChainResolver`: read side (`find_newest`, `history`)
//! - `VersionLedger`: write side (`create`, `supersede`, `record_revision`)
//!
//! Both work against the `versions` collection of a shared
//! [`DocumentStore`](crate::domain::DocumentStore).

pub mod ledger;
pub mod resolver;

pub use ledger::{NewVersion, VersionLedger};
pub use resolver::{NewestVersion, VersionChainResolver};
