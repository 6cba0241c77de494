//! Local Steam state reader and control surface.
//!
//! Locates the Steam installation through the OS configuration store,
//! parses Steam's text VDF documents (library folders, app manifests,
//! login users), probes process state, and drives the client through
//! `steam://` URI requests. All reader output is a snapshot taken when
//! the facade is built; running-status probes are always live.

pub mod facade;
pub mod icon;
pub mod install;
pub mod library;
pub mod process;
pub mod protocol;
pub mod state;
pub mod users;
pub mod vdf;

// Re-export primary types.
pub use facade::{AsyncSlot, Steam, SteamHandle};
pub use icon::{IconResolver, MetadataLookup};
pub use install::Installation;
pub use library::{InstalledApp, LibraryFolder};
pub use process::ProcessInspector;
pub use protocol::{FriendStatus, SteamProtocol};
pub use state::{AppCondition, StateFlags};
pub use users::UserProfile;
pub use vdf::VdfError;

/// Errors for Steam operations.
#[derive(Debug, thiserror::Error)]
pub enum SteamError {
    #[error("steam configuration-store entry missing or incomplete")]
    ConfigMissing,

    #[error("VDF parse error: {0}")]
    Vdf(#[from] vdf::VdfError),

    #[error("I/O error: {0}")]
    Io(String),
}
