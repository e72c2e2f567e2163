//! Adapter layer for the `recycler` crate.
//!
//! The `recycler` crate owns the window math and view lifecycle. This crate wraps it in a
//! framework-neutral facade that adapters drive from their scroll events and frame ticks:
//!
//! - [`Controller`]: the engine facade (data source, render host, tracker and navigation)
//! - [`Navigator`]: animated scroll-to-index with incremental homing on unmeasured targets
//! - [`PagedPolicy`]: one-item-per-page settling with focus callbacks
//! - [`Tween`]: the interruptible scalar animation underneath
//!
//! No UI framework bindings live here.
#![forbid(unsafe_code)]

#[macro_use]
mod macros;

mod controller;
mod navigator;
mod paging;
mod tween;


pub use controller::Controller;
pub use navigator::{Motion, NavigationKind, NavigationStep, Navigator, ScrollTarget};
pub use paging::{
    FocusChange, NavigationPolicy, PageTarget, PagedPolicy, PagingOptions, PlainPolicy,
};
pub use tween::{AnimationStatus, Easing, Tween};

pub use recycler;
