pub mod configuration;
pub mod credential;
pub mod resources;
