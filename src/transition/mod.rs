pub mod instance;
pub mod manager;
