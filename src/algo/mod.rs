//! Mesh processing algorithms.

pub mod decimate;
