// VIEW: GPU setup, assets and drawing
pub mod gpu_init;
pub mod mesh;
pub mod texture;
pub mod render;

pub use gpu_init::GpuContext;
pub use mesh::{Mesh, MeshBuffer, Vertex};
pub use texture::{GpuTexture, TextureImage, TextureKind};
pub use render::{EntityTextures, GpuEntity, Renderer, UiFrame};
