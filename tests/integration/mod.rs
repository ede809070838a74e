//! Integration tests for the jobgate job admission and execution service

mod admission;
mod config_loading;
mod job_service;
mod test_utils;
