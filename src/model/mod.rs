// MODEL: Entity state, cameras and lights
pub mod transform;
pub mod camera;
pub mod light;
pub mod player;
pub mod scene;

pub use transform::{facing_direction, Transform};
pub use camera::{CameraView, FixedOffsetCamera, Lens, OrbitCamera, OrthoCamera, PanDirection, PlayerCamera};
pub use light::{DirectionalLight, Flashlight, LightLevels};
pub use player::{CameraPerson, MovementTuning, Player};
pub use scene::{PlayerSpawn, Scene, SceneryEntry};
