//! Export schema model
//!
//! An [`ExportSchema`] bundles everything one export call reads:
//!
//! - a [`TypeCatalog`] of named [`ExportType`]s (field allow-lists plus
//!   computed fields),
//! - a [`FieldTypeRegistry`] saying which fields hold nested entities,
//! - a [`CallbackRegistry`] of per-field value overrides,
//! - [`TagRules`] used when sequencing releases.
//!
//! All of them are plain values. Variants are produced by deriving a copy of a
//! base and overriding entries on the copy; the base is never touched, so
//! exports under different variants can run side by side.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::release::TagRules;
use crate::version::StandardVersion;

/// How a field's raw value is instantiated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerShape {
    /// Value passes through untouched
    Scalar,
    /// A single nested entity
    Object,
    /// A sequence of nested entities
    List,
}

impl fmt::Display for ContainerShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerShape::Scalar => write!(f, "scalar"),
            ContainerShape::Object => write!(f, "object"),
            ContainerShape::List => write!(f, "list of objects"),
        }
    }
}

/// Declared nested type of a field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub export_type: String,
    pub shape: ContainerShape,
}

impl FieldSpec {
    pub fn object(export_type: impl Into<String>) -> Self {
        Self {
            export_type: export_type.into(),
            shape: ContainerShape::Object,
        }
    }

    pub fn list(export_type: impl Into<String>) -> Self {
        Self {
            export_type: export_type.into(),
            shape: ContainerShape::List,
        }
    }
}

/// One entry of an export type's allow-list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    /// Output key
    pub name: String,
    /// Raw key to read when it differs from the output key
    pub source: Option<String>,
}

impl FieldDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: None,
        }
    }

    /// Output `name`, read from raw key `source`
    pub fn renamed(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: Some(source.into()),
        }
    }

    /// Raw key this field is read from
    pub fn source_key(&self) -> &str {
        self.source.as_deref().unwrap_or(&self.name)
    }
}

impl From<&str> for FieldDef {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Inputs visible to a computed field
pub struct ComputeInput<'a> {
    /// Raw document the entity is exported from
    pub raw: &'a Value,
    /// Fields assembled so far for this entity
    pub entity: &'a Map<String, Value>,
    /// Identifying prefix, only present on a release's first export
    pub prefix: Option<&'a str>,
    /// Raw key holding the source identifier
    pub source_id_key: &'a str,
}

pub type ComputeFn = Arc<dyn Fn(&ComputeInput<'_>) -> anyhow::Result<Option<Value>> + Send + Sync>;

/// A derived field, evaluated after an entity's structural fields
#[derive(Clone)]
pub struct ComputedField {
    pub name: String,
    pub compute: ComputeFn,
}

impl ComputedField {
    pub fn new<F>(name: impl Into<String>, compute: F) -> Self
    where
        F: Fn(&ComputeInput<'_>) -> anyhow::Result<Option<Value>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            compute: Arc::new(compute),
        }
    }
}

impl fmt::Debug for ComputedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComputedField").field("name", &self.name).finish()
    }
}

/// A named entity kind with a fixed allow-list of output fields
#[derive(Debug, Clone)]
pub struct ExportType {
    name: String,
    fields: Vec<FieldDef>,
    computed: Vec<ComputedField>,
    passthrough: bool,
}

impl ExportType {
    pub fn new<I, F>(name: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<FieldDef>,
    {
        Self {
            name: name.into(),
            fields: fields.into_iter().map(Into::into).collect(),
            computed: Vec::new(),
            passthrough: false,
        }
    }

    /// A type whose raw value is emitted as-is
    pub fn passthrough(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            computed: Vec::new(),
            passthrough: true,
        }
    }

    /// Specialise `base`: same name, base fields plus `extra`
    pub fn extend<I, F>(base: &ExportType, extra: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<FieldDef>,
    {
        let mut ty = base.clone();
        for field in extra.into_iter().map(Into::into) {
            if !ty.allows(&field.name) {
                ty.fields.push(field);
            }
        }
        ty
    }

    /// Add a renamed field
    pub fn with_field(mut self, field: FieldDef) -> Self {
        self.fields.retain(|f| f.name != field.name);
        self.fields.push(field);
        self
    }

    /// Add a computed field; its name joins the allow-list
    pub fn with_computed(mut self, field: ComputedField) -> Self {
        self.fields.retain(|f| f.name != field.name);
        self.computed.retain(|c| c.name != field.name);
        self.computed.push(field);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Structural fields, in declared order
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn computed(&self) -> &[ComputedField] {
        &self.computed
    }

    pub fn is_passthrough(&self) -> bool {
        self.passthrough
    }

    /// Whether `name` may appear in this type's output
    pub fn allows(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name) || self.computed.iter().any(|c| c.name == name)
    }

    /// Every output key this type may emit
    pub fn allow_list(&self) -> Vec<&str> {
        self.fields
            .iter()
            .map(|f| f.name.as_str())
            .chain(self.computed.iter().map(|c| c.name.as_str()))
            .collect()
    }
}

/// Export types by name
#[derive(Debug, Clone, Default)]
pub struct TypeCatalog {
    types: HashMap<String, ExportType>,
}

impl TypeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of this catalogue to override
    pub fn derive(&self) -> Self {
        self.clone()
    }

    /// Add or replace a type
    pub fn with(mut self, ty: ExportType) -> Self {
        self.types.insert(ty.name.clone(), ty);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ExportType> {
        self.types.get(name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Field name -> nested type declaration
#[derive(Debug, Clone, Default)]
pub struct FieldTypeRegistry {
    specs: HashMap<String, FieldSpec>,
}

impl FieldTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of this registry to override
    pub fn derive(&self) -> Self {
        self.clone()
    }

    pub fn with(mut self, field: impl Into<String>, spec: FieldSpec) -> Self {
        self.specs.insert(field.into(), spec);
        self
    }

    pub fn without(mut self, field: &str) -> Self {
        self.specs.remove(field);
        self
    }

    pub fn get(&self, field: &str) -> Option<&FieldSpec> {
        self.specs.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.specs.contains_key(field)
    }
}

pub type Callback = Arc<dyn Fn(&Value) -> anyhow::Result<Option<Value>> + Send + Sync>;

/// Field name -> value override computed from the raw document
#[derive(Clone, Default)]
pub struct CallbackRegistry {
    callbacks: HashMap<String, Callback>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of this registry to override
    pub fn derive(&self) -> Self {
        self.clone()
    }

    pub fn with<F>(mut self, field: impl Into<String>, callback: F) -> Self
    where
        F: Fn(&Value) -> anyhow::Result<Option<Value>> + Send + Sync + 'static,
    {
        self.callbacks.insert(field.into(), Arc::new(callback));
        self
    }

    pub fn without(mut self, field: &str) -> Self {
        self.callbacks.remove(field);
        self
    }

    pub fn get(&self, field: &str) -> Option<&Callback> {
        self.callbacks.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.callbacks.contains_key(field)
    }
}

impl fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut fields: Vec<_> = self.callbacks.keys().collect();
        fields.sort();
        f.debug_struct("CallbackRegistry").field("fields", &fields).finish()
    }
}

/// Everything an export reads, for one target standard version
#[derive(Debug, Clone)]
pub struct ExportSchema {
    pub version: StandardVersion,
    pub types: TypeCatalog,
    pub fields: FieldTypeRegistry,
    pub callbacks: CallbackRegistry,
    pub tag_rules: TagRules,
    pub source_id_key: String,
}

impl ExportSchema {
    pub fn new(
        version: StandardVersion,
        types: TypeCatalog,
        fields: FieldTypeRegistry,
        callbacks: CallbackRegistry,
    ) -> Self {
        Self {
            version,
            types,
            fields,
            callbacks,
            tag_rules: TagRules::default(),
            source_id_key: "tenderID".to_string(),
        }
    }

    pub fn with_tag_rules(mut self, rules: TagRules) -> Self {
        self.tag_rules = rules;
        self
    }

    pub fn with_source_id_key(mut self, key: impl Into<String>) -> Self {
        self.source_id_key = key.into();
        self
    }

    pub fn export_type(&self, name: &str) -> Option<&ExportType> {
        self.types.get(name)
    }
}
