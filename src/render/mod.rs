pub mod compositor;
pub mod pipeline;
pub mod surface;
pub mod surface_pool;
