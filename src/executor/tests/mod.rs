//! Tests for the executor
//!
//! Organized by feature area

mod helpers;

mod basic_tests;
mod error_tests;
mod evaluator_tests;
mod function_tests;
mod limit_tests;
mod loop_tests;
mod require_tests;
