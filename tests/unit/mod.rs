/// Unit test entry point

mod basic_tests;
mod engine_properties;
