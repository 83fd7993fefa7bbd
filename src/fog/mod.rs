//! Fog of war core: region model, geometry, spatial index and state value objects.
//!
//! Nothing in here touches the ECS. Types use Bevy's math and color types so the host
//! can hand them straight to the renderer and camera code.

pub mod animation;
pub mod error;
pub mod events;
pub mod geometry;
pub mod quadtree;
pub mod region;
pub mod settings;
pub mod snapshot;
pub mod store;
pub mod viewport;


pub use animation::{AnimationScheduler, OpacityTween, ease_in_out_cubic};
pub use error::FogError;
pub use events::{EventBus, FogEvent, FogEventKind, SubscriptionId};
pub use quadtree::{IndexConfig, QuadTree};
pub use region::{FogRegion, RegionId, RegionOptions, RegionPatch, RegionShape, ShapeKind};
pub use settings::{FogSettings, PatternKind, RenderQuality};
pub use snapshot::FogSnapshot;
pub use store::RegionStore;
pub use viewport::Viewport;
