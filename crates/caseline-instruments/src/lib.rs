//! caseline-instruments
//!
//! Risk/needs assessment instruments. Pure data and rule evaluation, no
//! storage or transport: an administrator defines domains, items and a
//! scoring table; a completed response set is scored against it and each
//! domain score and the total are resolved to a risk level and
//! recommendation.

pub mod authoring;
pub mod config;
pub mod document;
pub mod error;
pub mod model;
pub mod resolve;
pub mod scoring;

pub use authoring::{RemovedDomain, RuleOverlap};
pub use config::AuthoringPolicy;
pub use error::{InstrumentError, ValidationError};
pub use model::{AnswerOption, ControlType, Domain, Instrument, Item, Scope, ScoringMethod, ScoringRule};
pub use resolve::{resolve, resolve_all};
pub use scoring::{ScoreSheet, score_domain, score_item, score_sheet, score_total};
