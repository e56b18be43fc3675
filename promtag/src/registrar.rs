use std::collections::HashMap;

use prometheus::{Registry, core::Collector};
use tracing::{debug, trace, warn};

use crate::{
    attr::{self, AttributeDefinition},
    counter::Counter,
    error::{Error, Result},
    histogram::Histogram,
    record::{FieldDescriptor, FieldSlot, RecordHandle},
    spec::{CollectorKind, CollectorSpec},
};

/// Register every metric field of `record` with `registry`, using default settings.
///
/// `record` must be a mutable reference to a [`MetricRecord`](crate::MetricRecord). See
/// [`Registrar::register`] for the details.
pub fn register_metrics<H: RecordHandle>(record: H, registry: &Registry) -> Result<()> {
    Registrar::new(registry).register(record).map(|_| ())
}

/// Creates the collectors declared by a metric record and registers them.
///
/// ```rust
/// use promtag::{Counter, Histogram, MetricRecord, Registrar};
///
/// #[derive(Default, MetricRecord)]
/// struct Stat {
///     #[metric("labels=[route], help='Requests served.'")]
///     requests: Counter,
///     #[metric("labels=[route], buckets=[0.01, 0.1, 1]")]
///     latency: Histogram,
/// }
///
/// let registry = prometheus::Registry::new();
/// let mut stat = Stat::default();
/// Registrar::new(&registry)
///     .with_namespace("app")
///     .with_label("host", "localhost")
///     .register(&mut stat)
///     .unwrap();
///
/// stat.requests.inc(&["/"]);
/// stat.latency.observe(&["/"], 0.05);
/// ```
#[derive(Debug, Clone)]
pub struct Registrar<'a> {
    registry: &'a Registry,
    namespace: Option<String>,
    labels: HashMap<String, String>,
}

impl Default for Registrar<'_> {
    /// A registrar for [`prometheus::default_registry`].
    fn default() -> Self {
        Self::new(prometheus::default_registry())
    }
}

impl<'a> Registrar<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Self { registry, namespace: None, labels: HashMap::new() }
    }

    /// Set the registry to register the collectors with.
    pub fn with_registry(mut self, registry: &'a Registry) -> Self {
        self.registry = registry;
        self
    }

    /// Prefix every exposed metric name with `namespace` and an underscore.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Add a constant label to every collector.
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Create a collector for every metric field of `record`, write it into the field and
    /// register it. Returns the number of collectors registered.
    ///
    /// Fields are processed in declaration order and ordinary fields are skipped. The first
    /// failure aborts registration; collectors registered before it stay registered.
    pub fn register<H: RecordHandle>(&self, mut record: H) -> Result<usize> {
        let type_name = record.type_name();
        let fields = record.unpack().map_err(|e| e.context("struct unpack error"))?;
        let definitions = parse_annotations(&fields).map_err(|e| e.context("struct tag parse error"))?;

        let mut registered = 0;
        for (field, definitions) in fields.into_iter().zip(definitions) {
            let name = field.name;
            let collector: Box<dyn Collector> = match field.slot {
                FieldSlot::Counter(counter) => {
                    let vec = self.build(CollectorKind::Counter, name, &definitions, Counter::collector)?;
                    counter.install(vec.clone());
                    Box::new(vec)
                }
                FieldSlot::Histogram(histogram) => {
                    let vec =
                        self.build(CollectorKind::Histogram, name, &definitions, Histogram::collector)?;
                    histogram.install(vec.clone());
                    Box::new(vec)
                }
                FieldSlot::Other => {
                    trace!(field = name, ty = field.type_name, "skipping non-metric field");
                    continue;
                }
            };

            if let Err(e) = self.submit(collector) {
                warn!(record = type_name, field = name, error = %e, "metric registration aborted");
                return Err(e.context(format!("collector register failed for {name}")));
            }
            registered += 1;
        }

        debug!(record = type_name, registered, "registered metric record");
        Ok(registered)
    }

    /// Resolve the collector configuration of a field and build the live collector from it.
    fn build<C>(
        &self,
        kind: CollectorKind,
        field: &str,
        definitions: &[AttributeDefinition],
        collector: impl FnOnce(&CollectorSpec, prometheus::Opts) -> Result<C>,
    ) -> Result<C> {
        CollectorSpec::resolve(kind, field, definitions)
            .and_then(|spec| {
                debug!(field, metric = %spec.name, labels = ?spec.labels, %kind, "resolved collector");
                collector(&spec, self.opts(&spec))
            })
            .map_err(|e| e.context(format!("collector create failed for {field}")))
    }

    fn opts(&self, spec: &CollectorSpec) -> prometheus::Opts {
        // The collector library rejects empty help text.
        let help = if spec.help.is_empty() { &spec.name } else { &spec.help };
        let mut opts = prometheus::Opts::new(&spec.name, help).const_labels(self.labels.clone());
        if let Some(namespace) = &self.namespace {
            opts = opts.namespace(namespace);
        }
        opts
    }

    fn submit(&self, collector: Box<dyn Collector>) -> Result<()> {
        let name = collector.desc().first().map(|desc| desc.fq_name.clone()).unwrap_or_default();
        self.registry.register(collector).map_err(|e| match e {
            prometheus::Error::AlreadyReg => Error::RegistrationConflict { name },
            prometheus::Error::Msg(msg) if msg.contains("same fully-qualified name") => {
                Error::RegistrationConflict { name }
            }
            other => Error::Collector(other),
        })
    }
}

/// Parse the annotation of every field, including ordinary ones.
fn parse_annotations(fields: &[FieldDescriptor<'_>]) -> Result<Vec<Vec<AttributeDefinition>>> {
    fields
        .iter()
        .map(|field| match field.annotation {
            Some(text) => attr::parse(text)
                .map_err(|source| Error::AnnotationParse { field: field.name.to_string(), source }),
            None => Ok(Vec::new()),
        })
        .collect()
}

