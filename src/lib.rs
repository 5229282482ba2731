pub mod cache;
pub mod climatology;
pub mod config;
pub mod enrich;
pub mod fetch;
pub mod observation;
pub mod output;
pub mod pipeline;
pub mod profile;
pub mod registry;
pub mod risk;
pub mod sources;
