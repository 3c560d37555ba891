mod browser;
mod component;
pub mod config;
pub mod error;
pub mod events;
pub mod interaction;
pub mod layout;
pub mod measure;
pub mod model;
mod persist;
pub mod positions;
mod render;
pub mod scale;
pub mod scheduler;
pub mod state;
pub mod store;
pub mod types;
pub mod viewport;
pub mod visibility;

pub use component::FlowGraphCanvas;
pub use config::{ChildStatusPolicy, FlowConfig, LayoutStrategy, ZoomConfig};
pub use error::{FlowError, ValidationError};
pub use state::FlowGraphState;
pub use store::FlowSnapshot;
pub use types::{FlowNode, NodeId, NodeStatus, Point, Rect};
