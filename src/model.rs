pub mod events;
pub mod map;
pub mod monitor;
pub mod persist;
pub(crate) mod positioner;
pub mod quirks;
pub mod sector;
pub mod store;
pub mod tx_store;
pub mod window;
pub mod workspace;

pub use events::{StoreEvent, SubscriptionId};
pub use monitor::Monitor;
pub use sector::RootSector;
pub use store::{Store, StoreError};
pub use window::{Window, WindowPosition, WindowSizeState};
pub use workspace::{Workspace, WorkspaceId};
