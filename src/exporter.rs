//! Model exporter
//!
//! Projects an untyped raw document onto an [`ExportType`]'s allow-list,
//! recursing into nested entities declared in the [`FieldTypeRegistry`].
//!
//! Per field, in declared order:
//! 1. a callback registered under the field's raw key is invoked with the
//!    current raw document;
//! 2. otherwise the raw key is read, absent (or `null`) means omitted;
//! 3. a declared nested type exports the value as an object or a list;
//! 4. anything else passes through unchanged.
//!
//! Computed fields run last, over the assembled entity.
//!
//! [`FieldTypeRegistry`]: crate::model::FieldTypeRegistry

use serde_json::{Map, Value};

use crate::error::{kind_of, ExportError, Result};
use crate::model::{ComputeInput, ContainerShape, ExportSchema, ExportType};

/// One export pass over an [`ExportSchema`]
#[derive(Debug, Clone, Copy)]
pub struct Exporter<'a> {
    schema: &'a ExportSchema,
    prefix: Option<&'a str>,
}

impl<'a> Exporter<'a> {
    pub fn new(schema: &'a ExportSchema) -> Self {
        Self {
            schema,
            prefix: None,
        }
    }

    /// Identifying prefix made visible to computed fields
    pub fn with_prefix(mut self, prefix: Option<&'a str>) -> Self {
        self.prefix = prefix;
        self
    }

    /// Export `raw` as the named type
    pub fn export(&self, raw: &Value, type_name: &str) -> Result<Value> {
        let ty = self.lookup(type_name)?;
        self.export_value(type_name, raw, ty)
    }

    /// Export `raw` as the named object type
    pub fn export_object(&self, raw: &Value, type_name: &str) -> Result<Map<String, Value>> {
        let ty = self.lookup(type_name)?;
        self.export_entity(raw, ty)
    }

    fn lookup(&self, type_name: &str) -> Result<&'a ExportType> {
        self.schema
            .export_type(type_name)
            .ok_or_else(|| ExportError::UnknownType(type_name.to_string()))
    }

    fn export_value(&self, field: &str, raw: &Value, ty: &ExportType) -> Result<Value> {
        if ty.is_passthrough() {
            return Ok(raw.clone());
        }
        if !raw.is_object() {
            return Err(ExportError::Shape {
                field: field.to_string(),
                expected: ContainerShape::Object,
                found: kind_of(raw),
            });
        }
        self.export_entity(raw, ty).map(Value::Object)
    }

    fn export_entity(&self, raw: &Value, ty: &ExportType) -> Result<Map<String, Value>> {
        let mut entity = Map::new();

        for field in ty.fields() {
            let key = field.source_key();
            let resolved = match self.schema.callbacks.get(key) {
                Some(callback) => callback(raw).map_err(|source| ExportError::Callback {
                    field: field.name.clone(),
                    source,
                })?,
                None => raw.get(key).cloned(),
            };

            let value = match resolved {
                None | Some(Value::Null) => continue,
                Some(value) => value,
            };

            let value = self.resolve_nested(key, value)?;
            entity.insert(field.name.clone(), value);
        }

        for computed in ty.computed() {
            let input = ComputeInput {
                raw,
                entity: &entity,
                prefix: self.prefix,
                source_id_key: &self.schema.source_id_key,
            };
            let value = (computed.compute)(&input).map_err(|source| ExportError::Computed {
                export_type: ty.name().to_string(),
                field: computed.name.clone(),
                source,
            })?;
            if let Some(value) = value {
                entity.insert(computed.name.clone(), value);
            }
        }

        Ok(entity)
    }

    fn resolve_nested(&self, field: &str, value: Value) -> Result<Value> {
        let Some(spec) = self.schema.fields.get(field) else {
            return Ok(value);
        };

        match spec.shape {
            ContainerShape::Scalar => Ok(value),
            ContainerShape::Object => {
                let ty = self.lookup(&spec.export_type)?;
                self.export_value(field, &value, ty)
            }
            ContainerShape::List => {
                let ty = self.lookup(&spec.export_type)?;
                let items = value.as_array().ok_or_else(|| ExportError::Shape {
                    field: field.to_string(),
                    expected: ContainerShape::List,
                    found: kind_of(&value),
                })?;
                items
                    .iter()
                    .map(|item| self.export_value(field, item, ty))
                    .collect::<Result<Vec<_>>>()
                    .map(Value::Array)
            }
        }
    }
}

/// Export `raw` as `type_name` under `schema`
pub fn export(raw: &Value, schema: &ExportSchema, type_name: &str) -> Result<Value> {
    Exporter::new(schema).export(raw, type_name)
}
