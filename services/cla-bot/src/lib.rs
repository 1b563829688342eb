//! CLA Bot Automation Library
//!
//! Two batch jobs run from CI whenever the CLA signup sheet changes.
//!
//! ## Binaries
//!
//! - `fetch-new-contributors`: Diff the CLA signup sheet against the known contributors list
//! - `summon-cla-bot`: Comment `@cla-bot check` on every open, unsigned PR by the new contributors
//!
//! ## Example Pipeline
//!
//! ```bash
//! # Find contributors who signed since the last run
//! fetch-new-contributors \
//!   --contributors .github/contributors \
//!   --account service-account.json \
//!   --output new_contributors
//!
//! # Ask the CLA bot to re-check their open pull requests
//! GITHUB_TOKEN=<TOKEN> \
//! summon-cla-bot --contributors new_contributors
//! ```
//!
//! Both jobs are safe to re-run with the same inputs.

pub mod auth;
pub mod comments;
pub mod config;
pub mod contributors;
pub mod discovery;
pub mod error;
pub mod fetch_job;
pub mod github;
pub mod self_check;
pub mod sheets;
pub mod testing;

pub use error::{ClaBotError, Result};
