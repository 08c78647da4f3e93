//! Analytics ingestion for exported social-media post tables.
//!
//! An upload flows through three stages:
//! - [`schema::resolve`] maps loosely named headers onto canonical fields,
//! - [`reports::generate_record`] computes the fixed-shape [`AnalyticsRecord`],
//! - [`charts::derive_charts`] describes the charts the resolved fields allow.
//!
//! [`pipeline::analyze`] runs all three and hands each chart to a
//! [`render::ChartRenderer`].

pub mod charts;
pub mod error;
pub mod loader;
pub mod output;
pub mod pipeline;
pub mod recommend;
pub mod render;
pub mod reports;
pub mod schema;
pub mod settings;
pub mod types;
pub mod util;

pub use error::{AnalyticsError, Result};
pub use types::{AnalyticsRecord, Cell, RawTable, TopPost};
