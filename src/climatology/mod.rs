pub mod aggregate;
pub mod scores;
pub mod stats;
pub mod types;
pub mod weather_code;
pub mod window;
