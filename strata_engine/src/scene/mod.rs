/// Scene module - drawable objects, mesh data and the camera input they are rendered with

pub mod camera;
pub mod mesh;
pub mod object;
pub mod spawner;

pub use camera::*;
pub use mesh::*;
pub use object::*;
pub use spawner::*;
