//! Filesystem-backed collaborators
//!
//! A local directory stands in for the remote manifest service and the
//! config, localization and archive stores write to disk. The CLI wires
//! these together; hosts embed their own implementations instead.

pub mod mirror;
pub mod preload;
pub mod stores;

pub use mirror::{sha256_hex, DirectoryManifestClient};
pub use preload::CountdownPreload;
pub use stores::{DirectoryArchiveMounter, FileConfigStore, FileLocalizationStore};
