//! Button-action handlers.
//!
//! Each action reacts to button events (settings received, key down,
//! key up) against the accessory-runtime contract in [`contract`]. The
//! runtime itself is out of scope; handlers see only those traits.
//!
//! Handler policy: failures on the control path are logged and
//! swallowed. A button press never returns an error to the runtime.

pub mod account;
pub mod app;
pub mod big_picture;
pub mod contract;
pub mod global;
pub mod status;

pub use account::{AccountAction, AccountSettings};
pub use app::{ActionMode, AppAction, AppSettings};
pub use big_picture::BigPictureAction;
pub use contract::{ButtonContext, GlobalStore};
pub use global::{
    PluginGlobalState, StateUpdate, read_global_state, sync_from_facade, sync_global_state,
};
pub use status::StatusAction;
