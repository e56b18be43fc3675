//! Resolution of field annotations into collector configurations.
use std::fmt;

use heck::ToSnakeCase;

use crate::{
    attr::{AttributeDefinition, AttributeValue},
    error::{Error, Result},
    histogram::DEFAULT_BUCKETS,
};

/// The collector kinds a metric field can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectorKind {
    /// A counter family, held by a [`crate::Counter`] field.
    Counter,
    /// A histogram family, held by a [`crate::Histogram`] field.
    Histogram,
}

impl fmt::Display for CollectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Counter => write!(f, "counter"),
            Self::Histogram => write!(f, "histogram"),
        }
    }
}

/// The resolved configuration for a single collector.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectorSpec {
    pub kind: CollectorKind,
    /// The metric name, without any registrar namespace.
    pub name: String,
    pub help: String,
    /// The variable label names, in declaration order.
    pub labels: Vec<String>,
    /// The bucket ladder. Only set for histograms.
    pub buckets: Option<Vec<f64>>,
}

impl CollectorSpec {
    /// The configuration of a field without any annotation: the snake-cased field name, empty
    /// help and no labels. Histograms get [`DEFAULT_BUCKETS`].
    pub fn with_defaults(kind: CollectorKind, field: &str) -> Self {
        Self {
            kind,
            name: field.to_snake_case(),
            help: String::new(),
            labels: Vec::new(),
            buckets: match kind {
                CollectorKind::Counter => None,
                CollectorKind::Histogram => Some(DEFAULT_BUCKETS.to_vec()),
            },
        }
    }

    /// Fold the attribute definitions of `field` over the defaults of `kind`.
    ///
    /// Definitions are applied in order. A repeated `name`, `help` or `buckets` overwrites the
    /// earlier one, while every `labels` definition appends to the label list.
    pub fn resolve(
        kind: CollectorKind,
        field: &str,
        definitions: &[AttributeDefinition],
    ) -> Result<Self> {
        let mut spec = Self::with_defaults(kind, field);

        for def in definitions {
            let attribute = def.name();
            let malformed = |reason| Error::AttributeMalformed {
                field: field.to_string(),
                attribute: attribute.to_string(),
                reason,
            };

            match attribute {
                "name" => {
                    spec.name = def
                        .value()
                        .and_then(AttributeValue::as_str)
                        .ok_or_else(|| malformed("is not a string"))?
                        .to_string();
                }
                "help" => {
                    spec.help = def
                        .value()
                        .and_then(AttributeValue::as_str)
                        .ok_or_else(|| malformed("is not a string"))?
                        .to_string();
                }
                "labels" => {
                    let items = def
                        .value()
                        .and_then(AttributeValue::as_list)
                        .ok_or_else(|| malformed("is not a list"))?;
                    for item in items {
                        let label = item.as_str().ok_or_else(|| malformed("has a non-string label"))?;
                        spec.labels.push(label.to_string());
                    }
                }
                "buckets" if kind == CollectorKind::Histogram => {
                    let buckets = def
                        .value()
                        .and_then(AttributeValue::as_list)
                        .ok_or_else(|| malformed("is not a list of numbers"))?
                        .iter()
                        .map(|item| item.as_f64().ok_or_else(|| malformed("has a non-numeric bucket")))
                        .collect::<Result<Vec<_>>>()?;
                    spec.buckets = Some(buckets);
                }
                _ => {
                    return Err(Error::UnsupportedAttribute {
                        field: field.to_string(),
                        attribute: attribute.to_string(),
                        kind,
                    });
                }
            }
        }

        Ok(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attr::parse;

    fn resolve(kind: CollectorKind, field: &str, annotation: &str) -> Result<CollectorSpec> {
        CollectorSpec::resolve(kind, field, &parse(annotation).unwrap())
    }

    #[test]
    fn counter_defaults() {
        let spec = resolve(CollectorKind::Counter, "SecondsFromStart", "").unwrap();
        assert_eq!(
            spec,
            CollectorSpec {
                kind: CollectorKind::Counter,
                name: "seconds_from_start".to_string(),
                help: String::new(),
                labels: vec![],
                buckets: None,
            }
        );

        let spec = resolve(CollectorKind::Counter, "unused_default_counter", "").unwrap();
        assert_eq!(spec.name, "unused_default_counter");
    }

    #[test]
    fn histogram_defaults_to_builtin_ladder() {
        let spec = resolve(CollectorKind::Histogram, "random_duration", "").unwrap();
        assert_eq!(
            spec.buckets.unwrap(),
            vec![0.001, 0.01, 0.05, 0.1, 0.2, 0.3, 0.5, 1.0, 2.0, 10.0, 20.0]
        );
    }

    #[test]
    fn counter_full_annotation() {
        let spec = resolve(
            CollectorKind::Counter,
            "requests",
            "name=request_count,labels=[route,status],help='requests served'",
        )
        .unwrap();

        assert_eq!(spec.name, "request_count");
        assert_eq!(spec.labels, vec!["route", "status"]);
        assert_eq!(spec.help, "requests served");
        assert_eq!(spec.buckets, None);
    }

    #[test]
    fn buckets_replace_ladder_in_given_order() {
        let spec =
            resolve(CollectorKind::Histogram, "latency", "buckets=[0.1, 0.5, 1, 5]").unwrap();
        assert_eq!(spec.buckets.unwrap(), vec![0.1, 0.5, 1.0, 5.0]);

        let spec = resolve(CollectorKind::Histogram, "latency", "buckets=[5, 1]").unwrap();
        assert_eq!(spec.buckets.unwrap(), vec![5.0, 1.0]);
    }

    #[test]
    fn repeated_name_last_write_wins() {
        let spec = resolve(CollectorKind::Counter, "hits", "name=first,name=second").unwrap();
        assert_eq!(spec.name, "second");
    }

    #[test]
    fn repeated_labels_append_and_keep_duplicates() {
        let spec =
            resolve(CollectorKind::Histogram, "latency", "labels=[a, b],labels=[b]").unwrap();
        assert_eq!(spec.labels, vec!["a", "b", "b"]);
    }

    #[test]
    fn buckets_on_counter_is_unsupported() {
        let err = resolve(CollectorKind::Counter, "hits", "buckets=[1, 2]").unwrap_err();
        assert!(matches!(
            err,
            Error::UnsupportedAttribute { ref attribute, kind: CollectorKind::Counter, .. }
                if attribute == "buckets"
        ));
    }

    #[test]
    fn unknown_attribute_is_unsupported() {
        let err = resolve(CollectorKind::Histogram, "latency", "unit=seconds").unwrap_err();
        assert!(matches!(err, Error::UnsupportedAttribute { ref attribute, .. } if attribute == "unit"));
    }

    #[test]
    fn malformed_values() {
        let cases = [
            (CollectorKind::Counter, "name=[a]", "name"),
            (CollectorKind::Counter, "name=5", "name"),
            (CollectorKind::Counter, "name", "name"),
            (CollectorKind::Counter, "help=[a]", "help"),
            (CollectorKind::Counter, "labels=route", "labels"),
            (CollectorKind::Counter, "labels=[route, 5]", "labels"),
            (CollectorKind::Histogram, "buckets=0.5", "buckets"),
            (CollectorKind::Histogram, "buckets=[0.5, high]", "buckets"),
        ];

        for (kind, annotation, expected) in cases {
            match resolve(kind, "field", annotation) {
                Err(Error::AttributeMalformed { field, attribute, .. }) => {
                    assert_eq!(field, "field");
                    assert_eq!(attribute, expected, "{annotation}");
                }
                other => panic!("{annotation}: expected AttributeMalformed, got {other:?}"),
            }
        }
    }
}
