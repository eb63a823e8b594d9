//! Integration tests for quote-radar

mod config_test;
mod properties_test;
mod radar_test;
mod service_test;
