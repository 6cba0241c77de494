//! The accessory-runtime contract, reduced to what the handlers need.
//!
//! Object-safe, boxed-future traits so the runtime adapter and test
//! doubles plug in interchangeably.

use futures_util::future::BoxFuture;
use serde_json::Value;

/// One button instance on the device.
pub trait ButtonContext: Send + Sync {
    fn set_title(&self, title: String) -> BoxFuture<'_, ()>;

    /// `None` clears the image back to the action default.
    fn set_image(&self, image: Option<String>) -> BoxFuture<'_, ()>;

    /// This button's persisted settings object.
    fn settings(&self) -> BoxFuture<'_, Value>;

    fn set_settings(&self, settings: Value) -> BoxFuture<'_, ()>;

    fn send_to_property_inspector(&self, payload: Value) -> BoxFuture<'_, ()>;
}

/// The plugin-wide persisted settings object.
pub trait GlobalStore: Send + Sync {
    fn global(&self) -> BoxFuture<'_, Value>;

    fn set_global(&self, value: Value) -> BoxFuture<'_, ()>;
}
