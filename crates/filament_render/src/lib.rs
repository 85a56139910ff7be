//! # Filament Render
//!
//! CPU-side geometry for GPU spline rendering:
//! - Mesh-strip ribbons and procedural segment records per batch
//! - Bounds over control points, extension points excluded
//! - A bridge that uploads only what changed
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    SPLINE PIPELINE                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Control Points → Mesh Strips / Procedural Segments         │
//! │       ↓                            ↓                        │
//! │  Bounds (map-reduce)          Render Bridge → GPU           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Rules
//!
//! - Jobs read control points, never write them
//! - One rayon task per spline, output slices disjoint
//! - No GPU API: uploads go through [`SplineRenderer`]

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod culling;
pub mod geometry;
pub mod integration;

pub use culling::{compute_bounds, registry_bounds, spline_bounds, total_bounds, Aabb};
pub use geometry::{
    generate_mesh_strips, generate_procedural_segments, Color32, MeshStripBuffers,
    ProceduralSegment, StripVertex,
};
pub use integration::{
    GeometryMode, RenderBridge, RenderBridgeConfig, RenderBridgeStats, SplineRenderer,
};
