//! # Rendering Integration Layer
//!
//! Connects the spline registry to whatever draws it.
//!
//! ## Data Flow
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    FRAME ORDER                                  │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │   Workers      ──── modify_control_points ───┐                  │
//! │                                              ▼                  │
//! │   close()      ──── batch dirty flags ───────┐                  │
//! │                                              ▼                  │
//! │   RenderBridge ◄─── geometry + bounds jobs ◄─┘                  │
//! │        │                                                        │
//! │        └──► SplineRenderer ──► GPU                              │
//! │                                                                 │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Rules
//!
//! 1. The bridge never writes control points
//! 2. Only dirty batches are uploaded
//! 3. Flags are cleared after upload, never before

pub mod render_bridge;

pub use render_bridge::{
    GeometryMode, RenderBridge, RenderBridgeConfig, RenderBridgeStats, SplineRenderer,
};
