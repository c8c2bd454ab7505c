pub mod capture;
pub mod codec;
pub mod loader;
