//! Data layer: the expression container, its metadata, and derivations.
//!
//! Architecture:
//! ```text
//!   matrix + names + metadata
//!        │
//!        ▼
//!   ┌────────────────────┐
//!   │ ExpressionSetBuilder│  validate shapes, build name indices
//!   └────────────────────┘
//!        │
//!        ▼
//!   ┌───────────────┐
//!   │ ExpressionSet  │──► accessors, Arrow table views
//!   └───────────────┘
//!        │
//!        ▼
//!   ┌────────────────────────┐
//!   │ subset / filter / combine│  → new ExpressionSet
//!   └────────────────────────┘
//! ```
pub mod combine;
pub mod container;
pub mod experiment;
pub mod filter;
pub mod model;
pub mod select;
pub mod table;
