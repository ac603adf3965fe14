//! Learner mastery level.
//!
//! Affects prompt tone only — there is no measured adaptation in this
//! codebase; see the open questions recorded in `DESIGN.md`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The learner's self-reported or session-assigned mastery level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MasteryLevel {
    /// New to Cisco IOS; prompts favor concrete, step-by-step explanations.
    #[default]
    Novice,
    /// Comfortable with basic commands; prompts can assume common vocabulary.
    Intermediate,
    /// Experienced; prompts can be terse and reference concepts by name.
    Advanced,
}

impl MasteryLevel {
    /// A short phrase describing the tone prompts should take for this level.
    #[must_use]
    pub const fn tone_hint(self) -> &'static str {
        match self {
            Self::Novice => {
                "Explain in plain language, define any Cisco-specific terms, and \
                 walk through reasoning step by step."
            }
            Self::Intermediate => {
                "Assume familiarity with basic IOS commands and modes; focus on \
                 the specific issue without re-explaining fundamentals."
            }
            Self::Advanced => {
                "Be concise and precise; reference concepts and command names \
                 directly without introductory explanation."
            }
        }
    }
}

impl fmt::Display for MasteryLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Novice => "novice",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        };
        f.write_str(s)
    }
}

impl FromStr for MasteryLevel {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "novice" => Ok(Self::Novice),
            "intermediate" => Ok(Self::Intermediate),
            "advanced" => Ok(Self::Advanced),
            other => Err(crate::error::Error::Config {
                message: format!("unknown mastery level: {other}"),
            }),
        }
    }
}
