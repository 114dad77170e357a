use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// How strictly instrument documents are checked before they are accepted
/// or handed back to storage. The defaults keep draft editing lenient.
///
/// The caller owns where this comes from; missing fields deserialize to the
/// lenient default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AuthoringPolicy {
    /// Refuse documents whose rules overlap for the same scope and population.
    #[serde(default)]
    pub reject_overlapping_ranges: bool,
    /// Refuse rules that filter on a population the instrument does not target.
    #[serde(default)]
    pub require_known_populations: bool,
}

impl AuthoringPolicy {
    pub fn strict() -> Self {
        Self {
            reject_overlapping_ranges: true,
            require_known_populations: true,
        }
    }
}
