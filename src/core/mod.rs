pub mod bounds;
pub mod config;
pub mod constants;
pub mod geo;
pub mod site;
pub mod viewport;
