//! Solar array digital twin core.
//!
//! Sun position from time and location, gap-aware panel layout over a
//! mounting frame, a tick-driven simulation clock, and the static fault
//! registry, composed into a renderer-agnostic [`scene::Scene`].

pub mod clock;
pub mod error;
pub mod faults;
pub mod layout;
pub mod scene;
pub mod scheduler;
pub mod sky;
pub mod sun;
pub mod time;
pub mod twin;

pub use error::TwinError;
pub use twin::{Param, Twin, TwinParams};
