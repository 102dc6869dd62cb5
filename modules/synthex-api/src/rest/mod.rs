pub mod analyze;

pub use analyze::api_analyze;
