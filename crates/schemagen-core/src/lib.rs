pub mod advisor;
pub mod config;
pub mod error;
pub mod extract;
pub mod framework;
pub mod generator;
pub mod io;
pub mod paths;
pub mod process;
pub mod refresh;
pub mod scanner;
pub mod schema;
pub mod store;

pub use error::{Result, SchemaError};
