//! Tests for the assembly writer

mod integration_tests;
