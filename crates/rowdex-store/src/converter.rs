//! Entity ↔ field map conversion.
//!
//! `IndexedTable` never inspects entities itself; it hands them to an
//! [`EntityConverter`]. [`DescriptorConverter`] covers every type implementing
//! `TableEntity`; hand-written converters are only needed for entities whose
//! persisted layout differs from their own `to_fields` mapping.

use rowdex_commons::{ConvertError, FieldMap, TableEntity, RESERVED_FIELDS};
use std::collections::HashSet;
use std::marker::PhantomData;

use crate::error::ConfigError;

/// Converts between an entity and the field map persisted next to its keys.
pub trait EntityConverter<E>: Send + Sync {
    fn serialize(&self, entity: &E) -> FieldMap;

    fn deserialize(&self, fields: &FieldMap) -> Result<E, ConvertError>;
}

/// Converter driven by `TableEntity::FIELDS`.
///
/// Construction validates the descriptor list once; afterwards conversion only
/// keeps declared fields.
#[derive(Debug)]
pub struct DescriptorConverter<E> {
    _phantom: PhantomData<fn() -> E>,
}

impl<E: TableEntity> DescriptorConverter<E> {
    pub fn new() -> Result<Self, ConfigError> {
        let entity = E::TABLE_NAME;
        if E::FIELDS.is_empty() {
            return Err(ConfigError::NoFields { entity });
        }

        let mut seen = HashSet::with_capacity(E::FIELDS.len());
        for field in E::FIELDS {
            if RESERVED_FIELDS.contains(&field.name) {
                return Err(ConfigError::ReservedField {
                    entity,
                    field: field.name,
                });
            }
            if !seen.insert(field.name) {
                return Err(ConfigError::DuplicateField {
                    entity,
                    field: field.name,
                });
            }
        }

        Ok(Self {
            _phantom: PhantomData,
        })
    }
}

impl<E: TableEntity> EntityConverter<E> for DescriptorConverter<E> {
    fn serialize(&self, entity: &E) -> FieldMap {
        entity
            .to_fields()
            .into_iter()
            .filter(|(name, _)| E::descriptor(name).is_some())
            .collect()
    }

    fn deserialize(&self, fields: &FieldMap) -> Result<E, ConvertError> {
        for (name, value) in fields.iter() {
            if let Some(field) = E::descriptor(name) {
                if field.kind != value.kind() {
                    return Err(ConvertError::KindMismatch {
                        field: name.clone(),
                        expected: field.kind,
                        actual: value.kind(),
                    });
                }
            }
        }
        E::from_fields(fields)
    }
}
