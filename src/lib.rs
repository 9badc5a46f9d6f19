//! quilt: a tiling window manager core.
//!
//! The crate is the platform-independent half of the manager: a
//! single-writer state store ([`model::Store`]), the layout engines that
//! compute window placement, and the reactor loop that applies native
//! events. A platform backend feeds [`sys::gateway::NativeEvent`]s into the
//! reactor channel and implements [`sys::gateway::PlatformGateway`] for the
//! calls going the other way.

pub mod common;
pub mod layout_engine;
pub mod model;
pub mod pickers;
pub mod reactor;
pub mod sys;
pub mod transforms;
