/// Simple3D Core Library - pivot transforms and pick/hover dispatch
///
/// This library provides the engine-independent core shared by the front-ends:
/// pivot-relative rotation and scaling, camera rays, a pickable scene and the
/// per-object event dispatcher.

pub mod animation;
pub mod error;
pub mod events;
pub mod projection;
pub mod scene;
pub mod shape;
pub mod transform;

// Re-export commonly used types
pub use animation::{Easing, FrameLoop, FrameStats, Repeat, Tween};
pub use error::{Error, Result};
pub use events::{DeliveryMode, Dispatcher, EventKind, PickEvent};
pub use projection::{Camera, ProjectionMode, Viewport};
pub use scene::{Hit, ObjectId, Scene, SceneObject};
pub use shape::{Ray, Shape};
pub use transform::{RotationState, Transform};
