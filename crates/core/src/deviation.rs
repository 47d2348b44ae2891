//! Reporting deviations from the plan.
//!
//! When the worker on a report differs from what was planned, the report is
//! saved together with a deviation row per kind, each with a justification.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviationType {
    /// Work reported without an assigned worker.
    NoWorker,
    /// Reporting worker does not hold the planned skill.
    SkillMismatch,
    /// Actual minutes exceed the standard time for the work.
    ExceedsStdTime,
}

impl DeviationType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoWorker => "no_worker",
            Self::SkillMismatch => "skill_mismatch",
            Self::ExceedsStdTime => "exceeds_std_time",
        }
    }
}

impl FromStr for DeviationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "no_worker" => Ok(Self::NoWorker),
            "skill_mismatch" => Ok(Self::SkillMismatch),
            "exceeds_std_time" => Ok(Self::ExceedsStdTime),
            other => Err(format!("Unknown deviation type '{other}'")),
        }
    }
}

/// What was observed on a report, compared against its plan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportObservation {
    pub has_worker: bool,
    pub worker_has_planned_skill: bool,
    pub actual_minutes: i64,
    /// Standard minutes for the work; `None` when the catalog has no figure.
    pub standard_minutes: Option<i64>,
}

/// Deviations implied by an observation, in a stable order.
pub fn detect_deviations(observation: &ReportObservation) -> Vec<DeviationType> {
    let mut found = Vec::new();
    if !observation.has_worker {
        found.push(DeviationType::NoWorker);
    } else if !observation.worker_has_planned_skill {
        found.push(DeviationType::SkillMismatch);
    }
    if let Some(standard) = observation.standard_minutes {
        if observation.actual_minutes > standard {
            found.push(DeviationType::ExceedsStdTime);
        }
    }
    found
}

/// Every detected deviation needs a non-blank justification.
pub fn validate_deviations(
    detected: &[DeviationType],
    justifications: &BTreeMap<DeviationType, String>,
) -> Result<(), String> {
    let missing: Vec<&str> = detected
        .iter()
        .filter(|kind| {
            justifications
                .get(*kind)
                .map_or(true, |text| text.trim().is_empty())
        })
        .map(|kind| kind.as_str())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(format!(
            "Justification required for deviation(s): {}",
            missing.join(", ")
        ))
    }
}
