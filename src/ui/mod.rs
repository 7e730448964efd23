//! ui
//!
//! User-facing output: verbosity-aware printing and the tree renderer.
//!
//! The command layer is the only consumer; core modules emit structured
//! data and single-line progress messages through [`output`].

pub mod output;
pub mod tree_fmt;
