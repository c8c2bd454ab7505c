pub mod blur;
pub mod composite;
pub mod edge;
pub mod mask;
pub mod params;
pub mod pass;
pub mod saturation;
pub mod shift;
