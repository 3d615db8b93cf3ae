//! # Scheduler Tests
