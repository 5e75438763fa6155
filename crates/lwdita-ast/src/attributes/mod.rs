//! Attribute traits and their composition into per-node-type descriptors.
//!
//! A trait is a reusable bundle of attribute fields with one validator.
//! Node types are described by an ordered list of traits plus their own
//! fields; [`compose`] flattens that into a [`ComposedNodeType`] once, when
//! the registry is built.

pub mod traits;
pub mod values;

use crate::error::AttributeValidationFailure;
use indexmap::IndexMap;
use tracing::debug;

/// A property value: scalar, array or object.
pub type PropValue = serde_json::Value;

/// Property bag, ordered by the node type's field list.
pub type Props = IndexMap<String, PropValue>;

/// Decides whether `value` (absent when `None`) is acceptable for `field`.
///
/// Validators answer `false` for fields they do not own.
pub type FieldValidator = fn(&str, Option<&PropValue>) -> bool;

/// A reusable bundle of attribute fields.
#[derive(Debug, Clone, Copy)]
pub struct AttributeTrait {
    pub name: &'static str,
    pub fields: &'static [&'static str],
    pub validator: FieldValidator,
}

impl AttributeTrait {
    pub const fn new(
        name: &'static str,
        fields: &'static [&'static str],
        validator: FieldValidator,
    ) -> Self {
        Self {
            name,
            fields,
            validator,
        }
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields.contains(&field)
    }

    pub fn is_valid_field(&self, field: &str, value: Option<&PropValue>) -> bool {
        (self.validator)(field, value)
    }
}

impl PartialEq for AttributeTrait {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.fields == other.fields
    }
}

/// Node-specific fields and their validator.
///
/// Without a validator, node-specific fields accept any string or absence.
#[derive(Debug, Clone, Default)]
pub struct NodeShape {
    pub fields: Vec<String>,
    pub validator: Option<FieldValidator>,
}

impl NodeShape {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn with_validator(mut self, validator: FieldValidator) -> Self {
        self.validator = Some(validator);
        self
    }
}

/// Merge `traits` and `shape` into one field list and one validator.
///
/// Fields are the union in trait order, then the node-specific fields.
pub fn compose(shape: NodeShape, traits: &[AttributeTrait]) -> ComposedNodeType {
    let mut fields: Vec<String> = Vec::new();
    let trait_fields = traits.iter().flat_map(|t| t.fields.iter().map(|f| f.to_string()));
    for field in trait_fields.chain(shape.fields.iter().cloned()) {
        if !fields.contains(&field) {
            fields.push(field);
        }
    }
    ComposedNodeType {
        fields,
        traits: traits.to_vec(),
        own_fields: shape.fields,
        own_validator: shape.validator,
    }
}

/// The flattened attribute behavior of one node type.
#[derive(Debug, Clone)]
pub struct ComposedNodeType {
    fields: Vec<String>,
    traits: Vec<AttributeTrait>,
    own_fields: Vec<String>,
    own_validator: Option<FieldValidator>,
}

impl ComposedNodeType {
    /// A node type with no attributes at all.
    pub fn empty() -> Self {
        compose(NodeShape::new(), &[])
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn traits(&self) -> &[AttributeTrait] {
        &self.traits
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }

    /// Short-circuiting OR across the trait validators and the node's own.
    pub fn is_valid_field(&self, field: &str, value: Option<&PropValue>) -> bool {
        self.traits.iter().any(|t| t.is_valid_field(field, value)) || self.own_field_valid(field, value)
    }

    fn own_field_valid(&self, field: &str, value: Option<&PropValue>) -> bool {
        match self.own_validator {
            Some(validator) => validator(field, value),
            None => {
                self.own_fields.iter().any(|f| f == field)
                    && values::or_absent(value, values::is_cdata)
            }
        }
    }

    /// Check every declared field, present or absent.
    pub fn validate(&self, tag: &str, props: &Props) -> Result<(), AttributeValidationFailure> {
        for field in &self.fields {
            let value = props.get(field);
            if !self.is_valid_field(field, value) {
                return Err(AttributeValidationFailure {
                    tag: tag.to_string(),
                    field: field.clone(),
                    value: value.cloned(),
                });
            }
        }
        Ok(())
    }

    /// Copy declared attributes into a property bag, in field order.
    ///
    /// Undeclared attributes are dropped.
    pub fn attributes_to_props(&self, tag: &str, attributes: &[(String, String)]) -> Props {
        let mut props = Props::with_capacity(attributes.len());
        for field in &self.fields {
            if let Some((_, value)) = attributes.iter().find(|(name, _)| name == field) {
                props.insert(field.clone(), PropValue::String(value.clone()));
            }
        }
        for (name, _) in attributes {
            if !self.has_field(name) {
                debug!(tag, attribute = %name, "dropping undeclared attribute");
            }
        }
        props
    }
}
