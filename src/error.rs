//! Error types for whittle.
//!
//! This module defines all error types used throughout the library.

use thiserror::Error;

use crate::mesh::HalfEdgeId;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during mesh construction and decimation.
#[derive(Error, Debug)]
pub enum Error {
    /// The mesh has no triangles.
    #[error("mesh has no triangles")]
    EmptyMesh,

    /// A triangle references an invalid vertex index.
    #[error("triangle {triangle} references invalid vertex index {vertex}")]
    InvalidVertexIndex {
        /// The triangle index.
        triangle: usize,
        /// The invalid vertex index.
        vertex: usize,
    },

    /// A triangle has duplicate vertex indices.
    #[error("triangle {triangle} is degenerate (has duplicate vertices)")]
    DegenerateTriangle {
        /// The triangle index.
        triangle: usize,
    },

    /// Face windings disagree: a boundary vertex has incoming but no
    /// outgoing boundary edges (or the other way around), so the outer
    /// shell cannot be closed around it.
    #[error("inconsistently oriented faces around vertex {vertex}")]
    InconsistentOrientation {
        /// The vertex whose boundary cannot be closed.
        vertex: usize,
    },

    /// An unrecognized key was passed in a configuration map.
    #[error("unknown configuration option: {key}")]
    UnknownOption {
        /// The unrecognized key.
        key: String,
    },

    /// Neither a tolerance nor a triangle target was configured, so the
    /// decimation loop would have no stopping rule.
    #[error("no stopping rule: set a tolerance or a target triangle count")]
    NoStoppingRule,

    /// Invalid parameter value.
    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The invalid value (as string).
        value: String,
        /// Reason the value is invalid.
        reason: &'static str,
    },

    /// An edge swap was requested on an edge that cannot be swapped.
    #[error("edge {edge:?} cannot be swapped (boundary, outer or non-manifold)")]
    SwapRefused {
        /// The offending half-edge.
        edge: HalfEdgeId,
    },
}

impl Error {
    /// Create an invalid parameter error.
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        Error::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }
}
