pub mod config;
pub mod exam;
pub mod import;
pub mod logging;
pub mod manifest;
pub mod report;
pub mod rewrite;
pub mod store;
pub mod text;
pub mod validate;
