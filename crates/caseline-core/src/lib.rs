//! caseline-core
//!
//! Pure domain types shared by the assessment engine and its collaborators:
//! identifiers, population tags, risk levels, response sets and scoring
//! outcomes. No I/O lives here.

pub mod error;
pub mod ids;
pub mod models;
