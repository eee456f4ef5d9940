pub mod exports;
mod registry;
pub mod types;
