use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use ts_rs::TS;

use crate::error::CoreError;
use crate::ids::ItemId;
use crate::models::population::Population;

/// One recorded answer.
///
/// Select controls send a string or an array of strings, numeric controls
/// send a number. Anything else is kept as `Malformed` and scores zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(untagged)]
#[ts(export)]
pub enum Answer {
    Number(#[ts(type = "number")] i64),
    Choice(String),
    Choices(Vec<String>),
    Malformed(serde_json::Value),
}

impl Answer {
    pub fn choice(value: impl Into<String>) -> Self {
        Self::Choice(value.into())
    }

    pub fn choices<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Choices(values.into_iter().map(Into::into).collect())
    }

    /// The option values this answer selects, in the order given.
    ///
    /// A bare number selects the option whose value is its decimal text.
    pub fn selected_values(&self) -> Vec<String> {
        match self {
            Self::Number(n) => vec![n.to_string()],
            Self::Choice(value) => vec![value.clone()],
            Self::Choices(values) => values.clone(),
            Self::Malformed(_) => Vec::new(),
        }
    }

    /// The answer as an integer, for numeric controls.
    ///
    /// Numeric strings and integral floats are accepted; fractional values
    /// are not rounded and yield `None`.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Choice(text) => text.trim().parse().ok(),
            Self::Choices(_) => None,
            Self::Malformed(serde_json::Value::Number(n)) => n
                .as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64),
            Self::Malformed(_) => None,
        }
    }
}

pub type Answers = BTreeMap<ItemId, Answer>;

/// The answers recorded for one administration of an instrument.
///
/// This is a plain data carrier. Whether `population` is one of the
/// instrument's target populations is decided at resolution time, since
/// responses may be collected against an older instrument version.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ResponseSet {
    #[serde(default, deserialize_with = "blank_population_as_none")]
    pub population: Option<Population>,
    #[serde(default)]
    pub answers: Answers,
}

impl ResponseSet {
    pub fn new(population: Option<&str>) -> Self {
        Self {
            population: population.and_then(Population::new),
            answers: Answers::new(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Builder-style insert, replacing any earlier answer for the item.
    pub fn with_answer(mut self, item_id: impl Into<ItemId>, answer: Answer) -> Self {
        self.answers.insert(item_id.into(), answer);
        self
    }

    pub fn answer(&self, item_id: &ItemId) -> Option<&Answer> {
        self.answers.get(item_id)
    }
}

fn blank_population_as_none<'de, D>(deserializer: D) -> Result<Option<Population>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(Population::new))
}
