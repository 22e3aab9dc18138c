pub mod changeset;
pub mod classify;
pub mod config;
pub mod error;
pub mod features;
pub mod fetch;
pub mod geometry;
pub mod labels;
pub mod output;
pub mod parser;
pub mod pipeline;
pub mod profiles;
pub mod sample;
pub mod versions;
