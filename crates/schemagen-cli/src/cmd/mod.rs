pub mod check;
pub mod freshness;
pub mod generate;
pub mod history;
pub mod info;
pub mod mcp;
