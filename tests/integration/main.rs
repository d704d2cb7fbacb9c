//! Integration tests for the slot playback engine

mod bounds_source_test;
mod invariants_test;
