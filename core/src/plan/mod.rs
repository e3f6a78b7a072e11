//! Phase and job definitions.
//!
//! A plan is declared once, validated once, and read-only for the rest of the
//! run: the executor only ever sees `&PhasePlan`.

mod manifest;
mod types;

pub use manifest::{load_plan, parse_plan};
pub use types::{Criticality, Job, JobUnit, Phase, PhasePlan};
