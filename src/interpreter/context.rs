//! Per-decode store of resolved field values

use crate::schema::SchemaDefinition;

use super::value::{Record, Value};

/// Ordered, append-only map of field values for one schema decode
///
/// Slots are indexed by declaration index. A slot is written at most once;
/// fields skipped by `when` stay empty and read back as their type default.
#[derive(Debug)]
pub struct FieldEvaluationContext<'s> {
    schema: &'s SchemaDefinition,
    slots: Vec<Option<Value>>,
    /// Declaration indices in resolution order
    resolved: Vec<usize>,
}

impl<'s> FieldEvaluationContext<'s> {
    pub fn new(schema: &'s SchemaDefinition) -> Self {
        Self {
            schema,
            slots: vec![None; schema.fields.len()],
            resolved: Vec::with_capacity(schema.fields.len()),
        }
    }

    pub fn schema(&self) -> &'s SchemaDefinition {
        self.schema
    }

    /// Stores the value of field `index`
    ///
    /// Returns false, leaving the existing value, if the slot is taken.
    pub fn insert(&mut self, index: usize, value: Value) -> bool {
        match self.slots.get_mut(index) {
            Some(slot) if slot.is_none() => {
                *slot = Some(value);
                self.resolved.push(index);
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        let field = self.schema.field(name)?;
        self.get(field.index)
    }

    /// Value of field `index`, or its type default when unresolved
    pub fn value_or_default(&self, index: usize) -> Value {
        match self.get(index) {
            Some(value) => value.clone(),
            None => self
                .schema
                .fields
                .get(index)
                .map_or(Value::Null, |f| f.default_value()),
        }
    }

    /// Number of resolved fields, placeholders included
    pub fn len(&self) -> usize {
        self.resolved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty()
    }

    /// Named fields resolved so far, in resolution order
    pub fn resolved_fields(&self) -> Vec<(String, Value)> {
        self.resolved
            .iter()
            .map(|&i| &self.schema.fields[i])
            .filter(|f| !f.is_placeholder())
            .filter_map(|f| Some((f.name.clone(), self.get(f.index)?.clone())))
            .collect()
    }

    /// Builds the record, filling unresolved fields with their defaults
    pub fn into_record(self) -> Record {
        let mut record = Record::new(self.schema.name.clone());
        let mut slots = self.slots;
        for field in self.schema.output_fields() {
            let value = slots[field.index]
                .take()
                .unwrap_or_else(|| field.default_value());
            record.push(field.name.clone(), value);
        }
        record
    }
}
