//! Integration tests for the docstore XML document store

mod cli;
mod config_integration;
mod container_lifecycle;
mod cursor;
mod merge;
mod properties;
mod test_utils;
