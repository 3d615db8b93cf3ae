//! # Simulation Tests
