use std::collections::HashMap;

use crate::{error::Result, spec::CollectorSpec};

/// A labeled counter field. It starts out unregistered and holds a live
/// [`prometheus::CounterVec`] once its record has been registered.
#[derive(Debug, Clone, Default)]
pub struct Counter {
    inner: Option<prometheus::CounterVec>,
}

impl Counter {
    /// Build the counter family described by `spec`.
    pub(crate) fn collector(
        spec: &CollectorSpec,
        opts: prometheus::Opts,
    ) -> Result<prometheus::CounterVec> {
        let labels: Vec<&str> = spec.labels.iter().map(String::as_str).collect();
        Ok(prometheus::CounterVec::new(opts, &labels)?)
    }

    pub(crate) fn install(&mut self, vec: prometheus::CounterVec) {
        self.inner = Some(vec);
    }

    /// Whether a live counter family has been injected into this field.
    ///
    /// The family is injected right before it is submitted to the registry, so a field whose
    /// registration failed is installed but never exposed.
    pub fn is_installed(&self) -> bool {
        self.inner.is_some()
    }

    /// The underlying counter family, if registered.
    pub fn vec(&self) -> Option<&prometheus::CounterVec> {
        self.inner.as_ref()
    }

    /// The counter for the given label name to value mapping.
    pub fn with(&self, labels: &HashMap<&str, &str>) -> prometheus::Result<prometheus::Counter> {
        self.registered()?.get_metric_with(labels)
    }

    /// The counter for the given label values, in label declaration order.
    pub fn with_label_values(&self, values: &[&str]) -> prometheus::Result<prometheus::Counter> {
        self.registered()?.get_metric_with_label_values(values)
    }

    /// Increment the counter for the given label values. Does nothing while unregistered.
    pub fn inc(&self, values: &[&str]) {
        if let Some(vec) = &self.inner {
            vec.with_label_values(values).inc();
        }
    }

    /// Increment the counter for the given label values by `value`. Does nothing while
    /// unregistered.
    pub fn inc_by(&self, values: &[&str], value: f64) {
        if let Some(vec) = &self.inner {
            vec.with_label_values(values).inc_by(value);
        }
    }

    fn registered(&self) -> prometheus::Result<&prometheus::CounterVec> {
        self.inner.as_ref().ok_or_else(|| prometheus::Error::Msg("counter is not registered".into()))
    }
}
