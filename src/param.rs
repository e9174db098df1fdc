use crate::space::{stepped_len, ParameterSpace, SpaceKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A named control knob and the grid of values it may take.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TunableParam {
    Long {
        name: String,
        initial: i64,
        min: i64,
        max: i64,
        step: i64,
    },
    Enumerated {
        name: String,
        initial: String,
        choices: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamValue {
    Long(i64),
    Enumerated(String),
}

impl ParamValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ParamValue::Long(v) => Some(*v),
            ParamValue::Enumerated(s) => s.trim().parse().ok(),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Long(v) => write!(f, "{}", v),
            ParamValue::Enumerated(s) => write!(f, "{}", s),
        }
    }
}

impl TunableParam {
    /// Builds the parameter a request tunes over `space`, starting from the
    /// grid point nearest `preferred`.
    pub fn from_space(space: &ParameterSpace, preferred: i64) -> Self {
        match &space.kind {
            SpaceKind::Discrete(tokens) => {
                let initial = tokens
                    .iter()
                    .min_by_key(|t| {
                        t.parse::<i64>()
                            .map(|v| v.abs_diff(preferred))
                            .unwrap_or(u64::MAX)
                    })
                    .cloned()
                    .unwrap_or_default();
                TunableParam::Enumerated {
                    name: space.name.clone(),
                    initial,
                    choices: tokens.clone(),
                }
            }
            SpaceKind::Stepped { min, max, step } => {
                let len = space.len().max(1);
                // Nearest grid point; i128 keeps the offset arithmetic exact.
                let offset = i128::from(preferred.clamp(*min, *max)) - i128::from(*min);
                let step128 = i128::from(*step).max(1);
                let index = ((offset + step128 / 2) / step128).min(len as i128 - 1);
                let initial = *min + index as i64 * step;
                TunableParam::Long {
                    name: space.name.clone(),
                    initial,
                    min: *min,
                    max: *max,
                    step: *step,
                }
            }
        }
    }

    pub fn name(&self) -> &str {
        match self {
            TunableParam::Long { name, .. } | TunableParam::Enumerated { name, .. } => name,
        }
    }

    pub fn grid_len(&self) -> usize {
        match self {
            TunableParam::Long { min, max, step, .. } => {
                stepped_len(*min, *max, *step).unwrap_or(0)
            }
            TunableParam::Enumerated { choices, .. } => choices.len(),
        }
    }

    /// Value at grid position `index`; callers keep `index < grid_len()`.
    pub fn value_at(&self, index: usize) -> ParamValue {
        match self {
            TunableParam::Long { min, step, .. } => ParamValue::Long(min + index as i64 * step),
            TunableParam::Enumerated { choices, .. } => {
                ParamValue::Enumerated(choices[index].clone())
            }
        }
    }

    pub fn initial_index(&self) -> usize {
        match self {
            TunableParam::Long {
                initial, min, step, ..
            } => initial
                .checked_sub(*min)
                .and_then(|offset| offset.checked_div(*step))
                .and_then(|index| usize::try_from(index).ok())
                .unwrap_or(0),
            TunableParam::Enumerated {
                initial, choices, ..
            } => choices.iter().position(|c| c == initial).unwrap_or(0),
        }
    }
}
