use std::collections::HashMap;

use crate::{error::Result, spec::CollectorSpec};

/// Buckets used by histogram fields that do not declare `buckets`.
pub const DEFAULT_BUCKETS: &[f64] = &[0.001, 0.01, 0.05, 0.1, 0.2, 0.3, 0.5, 1.0, 2.0, 10.0, 20.0];

/// A labeled histogram field. It starts out unregistered and holds a live
/// [`prometheus::HistogramVec`] once its record has been registered.
#[derive(Debug, Clone, Default)]
pub struct Histogram {
    inner: Option<prometheus::HistogramVec>,
}

impl Histogram {
    /// Build the histogram family described by `spec`.
    pub(crate) fn collector(
        spec: &CollectorSpec,
        opts: prometheus::Opts,
    ) -> Result<prometheus::HistogramVec> {
        let buckets = spec.buckets.clone().unwrap_or_else(|| DEFAULT_BUCKETS.to_vec());
        let opts = prometheus::HistogramOpts::from(opts).buckets(buckets);
        let labels: Vec<&str> = spec.labels.iter().map(String::as_str).collect();
        Ok(prometheus::HistogramVec::new(opts, &labels)?)
    }

    pub(crate) fn install(&mut self, vec: prometheus::HistogramVec) {
        self.inner = Some(vec);
    }

    /// Whether a live histogram family has been injected into this field.
    ///
    /// The family is injected right before it is submitted to the registry, so a field whose
    /// registration failed is installed but never exposed.
    pub fn is_installed(&self) -> bool {
        self.inner.is_some()
    }

    /// The underlying histogram family, if registered.
    pub fn vec(&self) -> Option<&prometheus::HistogramVec> {
        self.inner.as_ref()
    }

    /// The histogram for the given label name to value mapping.
    pub fn with(&self, labels: &HashMap<&str, &str>) -> prometheus::Result<prometheus::Histogram> {
        self.registered()?.get_metric_with(labels)
    }

    /// The histogram for the given label values, in label declaration order.
    pub fn with_label_values(&self, values: &[&str]) -> prometheus::Result<prometheus::Histogram> {
        self.registered()?.get_metric_with_label_values(values)
    }

    /// Observe `value` for the given label values. Does nothing while unregistered.
    pub fn observe(&self, values: &[&str], value: f64) {
        if let Some(vec) = &self.inner {
            vec.with_label_values(values).observe(value);
        }
    }

    fn registered(&self) -> prometheus::Result<&prometheus::HistogramVec> {
        self.inner
            .as_ref()
            .ok_or_else(|| prometheus::Error::Msg("histogram is not registered".into()))
    }
}
