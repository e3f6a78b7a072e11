//! Phase-ordered build orchestration.
//!
//! A run walks a fixed list of phases, hands each declared job to the job
//! runner, records every outcome in the ledger, and finally collects the
//! package artifacts the successful jobs left behind.
//!
//! ```text
//! PhasePlan (plan manifest)
//!   ↓
//! ExecutionEngine::execute() ── run_job() per job ──▶ <log_dir>/<job>.log
//!   ↓                                   │
//! Ledger { job -> Outcome }  ◀──────────┘
//!   ↓
//! ArtifactCollector::collect() → <output_dir>/*.whl + install.sh
//!   ↓
//! RunReport
//! ```

pub mod api;
pub mod collector;
pub mod config;
pub mod context;
pub mod error;
pub mod executor;
pub mod plan;
pub mod runner;
pub mod util;
