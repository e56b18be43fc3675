//! Introspection of metric records.
//!
//! A record is a struct with named fields, some of which are metric slots. The
//! [`MetricRecord`](macro@crate::MetricRecord) derive implements [`MetricRecord`] for it, listing
//! every field in declaration order together with its raw annotation text.
use crate::{
    counter::Counter,
    error::{Error, Result},
    histogram::Histogram,
    spec::CollectorKind,
};

/// Mutable access to the storage of a single field.
#[derive(Debug)]
pub enum FieldSlot<'a> {
    Counter(&'a mut Counter),
    Histogram(&'a mut Histogram),
    /// An ordinary data field. Left untouched by registration.
    Other,
}

impl FieldSlot<'_> {
    /// The collector kind stored in this slot, `None` for ordinary fields.
    pub fn kind(&self) -> Option<CollectorKind> {
        match self {
            Self::Counter(_) => Some(CollectorKind::Counter),
            Self::Histogram(_) => Some(CollectorKind::Histogram),
            Self::Other => None,
        }
    }
}

/// A single field of a metric record.
#[derive(Debug)]
pub struct FieldDescriptor<'a> {
    /// The declared field name.
    pub name: &'static str,
    /// The declared type, as written in the struct definition.
    pub type_name: &'static str,
    /// The raw annotation text, if the field carries one.
    pub annotation: Option<&'static str>,
    pub slot: FieldSlot<'a>,
}

impl<'a> FieldDescriptor<'a> {
    pub fn new(
        name: &'static str,
        type_name: &'static str,
        annotation: Option<&'static str>,
        slot: FieldSlot<'a>,
    ) -> Self {
        Self { name, type_name, annotation, slot }
    }
}

/// A struct whose fields can be filled with collectors. Usually derived with
/// [`#[derive(MetricRecord)]`](macro@crate::MetricRecord).
pub trait MetricRecord {
    /// All fields of the record, in declaration order.
    fn fields(&mut self) -> Vec<FieldDescriptor<'_>>;
}

/// A handle to a record as handed to the registrar.
///
/// Only a mutable reference to a record can be unpacked. Shared references and records passed by
/// value are rejected with [`Error::NotAStructPointer`], since collectors injected into them
/// would never reach the caller.
pub trait RecordHandle {
    /// The type name of the handle, used in error messages and logs.
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Expose the fields of the referenced record.
    fn unpack(&mut self) -> Result<Vec<FieldDescriptor<'_>>>;
}

impl<T: MetricRecord + ?Sized> RecordHandle for &mut T {
    fn unpack(&mut self) -> Result<Vec<FieldDescriptor<'_>>> {
        Ok((**self).fields())
    }
}

impl<T: MetricRecord + ?Sized> RecordHandle for &T {
    fn unpack(&mut self) -> Result<Vec<FieldDescriptor<'_>>> {
        Err(Error::NotAStructPointer { type_name: std::any::type_name::<Self>() })
    }
}
