use crate::consts::{
    COALESCED_PARCELS, DEFAULT_COALESCE_SPACE, DEFAULT_MAX, DEFAULT_MIN, DEFAULT_STEP,
    MAX_CANDIDATES, TUNING_SPACE_KEY,
};
use crate::error::{TunerError, TunerResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpaceKind {
    /// Ordered, distinct integer tokens kept in decimal string form.
    Discrete(Vec<String>),
    /// Every value `min, min + step, ..` not exceeding `max`.
    Stepped { min: i64, max: i64, step: i64 },
}

/// The validated candidate set for one tunable parameter. Immutable once
/// built; shared read-only by every request that draws from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSpace {
    pub name: String,
    pub kind: SpaceKind,
}

impl Default for ParameterSpace {
    fn default() -> Self {
        Self::default_space()
    }
}

impl ParameterSpace {
    pub fn default_space() -> Self {
        Self {
            name: COALESCED_PARCELS.to_string(),
            kind: SpaceKind::Discrete(
                DEFAULT_COALESCE_SPACE
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            ),
        }
    }

    pub fn default_bounds() -> Self {
        Self {
            name: COALESCED_PARCELS.to_string(),
            kind: SpaceKind::Stepped {
                min: DEFAULT_MIN,
                max: DEFAULT_MAX,
                step: DEFAULT_STEP,
            },
        }
    }

    pub fn discrete(name: &str, tokens: Vec<String>) -> TunerResult<Self> {
        if tokens.is_empty() {
            return Err(TunerError::Validation(format!(
                "'{}' must list at least one candidate",
                name
            )));
        }
        if tokens.len() > MAX_CANDIDATES {
            return Err(TunerError::Validation(format!(
                "'{}' lists {} candidates; at most {} are allowed",
                name,
                tokens.len(),
                MAX_CANDIDATES
            )));
        }

        let mut seen = HashSet::with_capacity(tokens.len());
        let mut normalized = Vec::with_capacity(tokens.len());
        for token in &tokens {
            let value: i64 = token.trim().parse().map_err(|_| {
                TunerError::Validation(format!(
                    "'{}' candidate '{}' is not an integer",
                    name, token
                ))
            })?;
            if !seen.insert(value) {
                return Err(TunerError::Validation(format!(
                    "'{}' lists candidate {} more than once",
                    name, value
                )));
            }
            normalized.push(value.to_string());
        }

        Ok(Self {
            name: name.to_string(),
            kind: SpaceKind::Discrete(normalized),
        })
    }

    pub fn stepped(name: &str, min: i64, max: i64, step: i64) -> TunerResult<Self> {
        if step < 1 {
            return Err(TunerError::Validation(format!(
                "'{}' step must be at least 1 (got {})",
                name, step
            )));
        }
        if min > max {
            return Err(TunerError::Validation(format!(
                "'{}' min {} exceeds max {}",
                name, min, max
            )));
        }
        let len = stepped_len(min, max, step).filter(|&n| n <= MAX_CANDIDATES);
        if len.is_none() {
            return Err(TunerError::Validation(format!(
                "'{}' range {}..={} step {} spans more than {} candidates",
                name, min, max, step, MAX_CANDIDATES
            )));
        }
        Ok(Self {
            name: name.to_string(),
            kind: SpaceKind::Stepped { min, max, step },
        })
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> TunerResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Parses a `{"tuning_space": {"coalesced_parcels": ...}}` document.
    /// The whole document is rejected on the first structural error.
    pub fn from_json_str(content: &str) -> TunerResult<Self> {
        let document: Value = serde_json::from_str(content)?;

        let root = document.as_object().ok_or_else(|| {
            TunerError::Validation("Parameter space file root must be an object.".to_string())
        })?;

        let tuning_spec = root.get(TUNING_SPACE_KEY).ok_or_else(|| {
            TunerError::Validation(format!(
                "Parameter space file root must contain a member named '{}'.",
                TUNING_SPACE_KEY
            ))
        })?;

        let tuning_spec = tuning_spec.as_object().ok_or_else(|| {
            TunerError::Validation(format!(
                "Parameter space file's '{}' member must be an object.",
                TUNING_SPACE_KEY
            ))
        })?;

        let param = tuning_spec.get(COALESCED_PARCELS).ok_or_else(|| {
            TunerError::Validation(format!(
                "Parameter space file's '{}' object must contain a member named '{}'.",
                TUNING_SPACE_KEY, COALESCED_PARCELS
            ))
        })?;

        match param {
            Value::Array(items) => {
                let mut tokens = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        Value::Number(n) if n.as_i64().is_some() => tokens.push(n.to_string()),
                        Value::String(s) => tokens.push(s.clone()),
                        other => {
                            return Err(TunerError::Validation(format!(
                                "'{}' must contain only integers or strings (found {})",
                                COALESCED_PARCELS, other
                            )))
                        }
                    }
                }
                Self::discrete(COALESCED_PARCELS, tokens)
            }
            Value::Object(bounds) => {
                let field = |key: &str, default: i64| -> TunerResult<i64> {
                    match bounds.get(key) {
                        None => Ok(default),
                        Some(v) => v.as_i64().ok_or_else(|| {
                            TunerError::Validation(format!(
                                "'{}.{}' must be an integer",
                                COALESCED_PARCELS, key
                            ))
                        }),
                    }
                };
                Self::stepped(
                    COALESCED_PARCELS,
                    field("min", DEFAULT_MIN)?,
                    field("max", DEFAULT_MAX)?,
                    field("step", DEFAULT_STEP)?,
                )
            }
            _ => Err(TunerError::Validation(format!(
                "Parameter space file's '{}' member must be an array.",
                COALESCED_PARCELS
            ))),
        }
    }

    /// Loads the space named by `path`, falling back to the built-in list
    /// when no path is given or the file cannot be used.
    pub fn resolve(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default_space();
        };

        match Self::load_from_file(path) {
            Ok(space) => space,
            Err(e) => {
                warn!(
                    "Unable to use tuning space file {}: {}. Using default tuning space instead.",
                    path.display(),
                    e
                );
                Self::default_space()
            }
        }
    }

    pub fn tokens(&self) -> Option<&[String]> {
        match &self.kind {
            SpaceKind::Discrete(tokens) => Some(tokens),
            SpaceKind::Stepped { .. } => None,
        }
    }

    /// Numeric candidates in declaration (or ascending) order.
    pub fn candidates(&self) -> Vec<i64> {
        match &self.kind {
            // Tokens are validated at construction.
            SpaceKind::Discrete(tokens) => {
                tokens.iter().filter_map(|t| t.parse().ok()).collect()
            }
            SpaceKind::Stepped { min, max, step } if *step > 0 => {
                (*min..=*max).step_by(*step as usize).collect()
            }
            SpaceKind::Stepped { .. } => Vec::new(),
        }
    }

    pub fn contains(&self, value: i64) -> bool {
        match &self.kind {
            SpaceKind::Discrete(tokens) => tokens
                .iter()
                .any(|t| t.parse::<i64>().ok() == Some(value)),
            SpaceKind::Stepped { min, max, step } => {
                *step > 0
                    && value >= *min
                    && value <= *max
                    && value.checked_sub(*min).is_some_and(|d| d % step == 0)
            }
        }
    }

    pub fn len(&self) -> usize {
        match &self.kind {
            SpaceKind::Discrete(tokens) => tokens.len(),
            SpaceKind::Stepped { min, max, step } => {
                stepped_len(*min, *max, *step).unwrap_or(0)
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Number of grid points in `min..=max` at `step`, or `None` when the range
/// is empty or does not fit in `usize`.
pub(crate) fn stepped_len(min: i64, max: i64, step: i64) -> Option<usize> {
    if step < 1 {
        return None;
    }
    let span = max.checked_sub(min).filter(|s| *s >= 0)?;
    let len = (span / step).checked_add(1)?;
    usize::try_from(len).ok()
}

impl fmt::Display for ParameterSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Tuning space:")?;
        write!(f, "\t{}: ", self.name)?;
        match &self.kind {
            SpaceKind::Discrete(tokens) => write!(f, "{}", tokens.join(" ")),
            SpaceKind::Stepped { min, max, step } => {
                write!(f, "{}..={} step {}", min, max, step)
            }
        }
    }
}
