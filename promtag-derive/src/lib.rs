//! This crate contains the derive macro describing metric records for `promtag`.
//! Refer to the [MetricRecord] derive documentation for more information.
use darling::FromDeriveInput;
use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

use crate::expand::RecordInput;

mod expand;

/// Derives `promtag::MetricRecord` for a struct with named fields, exposing every field to the
/// registrar in declaration order.
///
/// The kind of a field is identified by the last segment of its declared type:
/// `Counter` and `Histogram` fields are metric slots, every other field is ordinary data and is
/// skipped during registration.
///
/// # Attributes
///
/// - `#[metric("...")]` (or `#[metric = "..."]`): the annotation of the field, a comma separated
///   list of `name`, `labels`, `help` and `buckets` clauses. It is parsed when the record is
///   registered. A bare `#[metric]` is the same as no annotation.
///
/// # Example
/// ```rust
/// use promtag::{Counter, Histogram, MetricRecord};
///
/// #[derive(Default, MetricRecord)]
/// struct Stat {
///     /// Named `request_count`, labeled by route and status.
///     #[metric("name=request_count, labels=[route, status], help='requests served'")]
///     requests: Counter,
///
///     // No annotation: named `request_duration`, default buckets.
///     request_duration: Histogram,
///
///     #[metric = "labels=[route], buckets=[0.1, 0.5, 1, 5]"]
///     render_seconds: Histogram,
///
///     // Not a metric.
///     owner: String,
/// }
///
/// let registry = prometheus::Registry::new();
/// let mut stat = Stat::default();
/// promtag::register_metrics(&mut stat, &registry).unwrap();
///
/// stat.requests.inc(&["/", "200"]);
/// stat.render_seconds.observe(&["/"], 0.3);
/// ```
///
/// # Sample Output
/// ```text
/// # HELP render_seconds render_seconds
/// # TYPE render_seconds histogram
/// render_seconds_bucket{route="/",le="0.1"} 0
/// render_seconds_bucket{route="/",le="0.5"} 1
/// render_seconds_bucket{route="/",le="1"} 1
/// render_seconds_bucket{route="/",le="5"} 1
/// render_seconds_bucket{route="/",le="+Inf"} 1
/// render_seconds_sum{route="/"} 0.3
/// render_seconds_count{route="/"} 1
/// # HELP request_count requests served
/// # TYPE request_count counter
/// request_count{route="/",status="200"} 1
/// ```
///
/// The derive also implements `promtag::RecordHandle` for the struct itself, so passing the
/// record by value instead of by mutable reference fails at registration:
///
/// ```rust
/// use promtag::{Counter, Error, MetricRecord};
///
/// #[derive(Default, MetricRecord)]
/// struct Stat {
///     requests: Counter,
/// }
///
/// let registry = prometheus::Registry::new();
/// let err = promtag::register_metrics(Stat::default(), &registry).unwrap_err();
/// assert!(matches!(err.root_cause(), Error::NotAStructPointer { .. }));
/// ```
#[proc_macro_derive(MetricRecord, attributes(metric))]
pub fn derive_metric_record(item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);

    let record = match RecordInput::from_derive_input(&input) {
        Ok(v) => v,
        Err(e) => {
            return e.write_errors().into();
        }
    };

    expand::expand(record).unwrap_or_else(|err| err.into_compile_error()).into()
}
