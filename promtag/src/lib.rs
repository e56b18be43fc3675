//! Declarative registration of Prometheus collectors.
//!
//! Metrics are declared as fields of a struct. Each field carries an annotation describing its
//! metric name, label names, help text and, for histograms, the bucket ladder. Registering the
//! struct builds every collector, writes it into its field and registers it with a
//! [`prometheus::Registry`].
//!
//! - [`Counter`]: a labeled counter family.
//! - [`Histogram`]: a labeled histogram family.
//!
//! Fields of any other type are ordinary data and left untouched.
//!
//! # Example
//! ```rust
//! use promtag::{Counter, Histogram, MetricRecord, register_metrics};
//!
//! #[derive(Default, MetricRecord)]
//! struct Stat {
//!     #[metric("name=seconds_from_start, labels=[thread], help='seconds since application start'")]
//!     seconds_from_start: Counter,
//!
//!     // No annotation: named `unused_default_counter`, no labels.
//!     unused_default_counter: Counter,
//!
//!     #[metric("labels=[thread], buckets=[0.0001, 0.001, 0.01, 0.1, 1.0, 10, 100]")]
//!     random_duration: Histogram,
//!
//!     // Not a metric, skipped.
//!     started_by: String,
//! }
//!
//! let registry = prometheus::Registry::new();
//! let mut stat = Stat::default();
//! register_metrics(&mut stat, &registry).unwrap();
//!
//! stat.seconds_from_start.inc(&["main"]);
//! stat.random_duration.observe(&["main"], 0.25);
//! ```
//!
//! # Annotations
//!
//! The annotation is a comma separated list of `key=value` clauses, see [`attr`] for the grammar.
//!
//! | Attribute | Value            | Kinds              | Default                      |
//! |-----------|------------------|--------------------|------------------------------|
//! | `name`    | string           | all                | snake_case field name        |
//! | `help`    | string           | all                | empty                        |
//! | `labels`  | list of strings  | all                | no labels                    |
//! | `buckets` | list of numbers  | [`Histogram`]      | [`DEFAULT_BUCKETS`]          |
pub mod attr;

pub mod counter;
pub use counter::*;

pub mod histogram;
pub use histogram::*;

pub mod error;
pub use error::{Error, Result};

pub mod record;
pub use record::{FieldDescriptor, FieldSlot, MetricRecord, RecordHandle};

pub mod registrar;
pub use registrar::{Registrar, register_metrics};

pub mod spec;
pub use spec::{CollectorKind, CollectorSpec};

/// Derives [`MetricRecord`](trait@MetricRecord) for a struct with named fields.
///
/// Fields of type [`Counter`] or [`Histogram`] become metric slots; their annotation is given
/// with `#[metric("...")]`. The derive also implements [`RecordHandle`] for the struct itself so
/// that handing the record over by value fails with [`Error::NotAStructPointer`].
pub use promtag_derive::MetricRecord;
