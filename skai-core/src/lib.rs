//! # skai-core
//!
//! Core library for skai - a demo console for satellite-image damage
//! assessment in disaster response.
//!
//! This library provides:
//! - Authentication against a fixed credential table, with a persisted session
//! - A keyed localization table for six languages
//! - The five-stage assessment pipeline and its state machine
//! - Simulated long-running operations with canned results
//! - Configuration, logging and SQLite storage
//!
//! ## Architecture
//!
//! Everything a front-end needs lives in one [`Dashboard`] value. Commands
//! mutate it synchronously; mock operations run on tokio and report back
//! through events the front-end drains with [`Dashboard::pump`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use skai_core::{Config, Dashboard, OperationKind};
//!
//! # async fn demo() -> skai_core::Result<()> {
//! let config = Config::load()?;
//! let mut dashboard = Dashboard::open(&config)?;
//!
//! if dashboard.restore().is_none() {
//!     dashboard
//!         .login("unhcr.admin", "humanitarian2024")
//!         .await
//!         .expect("demo credentials");
//! }
//! dashboard.select_sample_data()?;
//! dashboard.trigger(OperationKind::Enhance)?;
//! dashboard.next_event().await;
//! # Ok(())
//! # }
//! ```

// Re-export commonly used items at the crate root
pub use assets::{ImageAsset, ImageRole};
pub use config::Config;
pub use dashboard::{Dashboard, DashboardEvent, StageResults, Trigger};
pub use db::Database;
pub use error::{Error, Result};
pub use i18n::{Localizer, Params};
pub use operations::{OperationKind, OperationStatus};
pub use pipeline::{PipelineState, Stage, StageStatus, UnmetPrecondition};
pub use session::{AuthFailure, Session};

// Public modules
pub mod assets;
pub mod chat;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod error;
pub mod format;
pub mod i18n;
pub mod logging;
pub mod operations;
pub mod pipeline;
pub mod report;
pub mod session;
