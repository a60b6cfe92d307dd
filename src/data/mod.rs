//! Data layer: the per-file analysis pipeline.
//!
//! Architecture:
//! ```text
//!   RawUpload (name + bytes)
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  decode   │  bytes → UTF-8 text, invalid bytes dropped
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  detect tab / comma / whitespace → ParsedTable
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  columns  │  pick voltage + current columns
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  metrics  │  optional J = I / area, paired Sweep
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  observe  │  threshold rules → ObservationSet
//!   └──────────┘
//! ```
//!
//! `pipeline` chains the stages and isolates failures per file.

pub mod columns;
pub mod decode;
pub mod loader;
pub mod metrics;
pub mod model;
pub mod observe;
pub mod pipeline;
