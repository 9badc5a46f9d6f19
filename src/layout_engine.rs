pub mod column;
pub mod engine;
pub mod proxy;
pub mod slice;
pub mod tree;

pub use column::ColumnEngine;
pub use engine::{
    Axis, Direction, LayoutEngine, WindowPlacement, build_engine, build_engines,
};
pub use proxy::{BarReserveEngine, GapEngine};
pub use slice::SliceEngine;
pub use tree::TreeEngine;
