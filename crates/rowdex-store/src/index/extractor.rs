use rowdex_commons::{ConvertError, KeyValue, TableEntity, IDENTITY_FIELD};
use std::marker::PhantomData;

/// Projects one key fragment out of an entity.
///
/// Projections must be pure: the same entity always yields the same value.
pub trait KeyProjection<E>: Send + Sync {
    fn project(&self, entity: &E) -> Result<KeyValue, ConvertError>;
}

/// Function-based projection.
///
/// Allows using closures as projections without a manual trait implementation.
pub struct FunctionProjection<E, V, F>
where
    F: Fn(&E) -> V + Send + Sync,
    V: Into<KeyValue>,
{
    func: F,
    _phantom: PhantomData<fn(&E) -> V>,
}

impl<E, V, F> FunctionProjection<E, V, F>
where
    F: Fn(&E) -> V + Send + Sync,
    V: Into<KeyValue>,
{
    pub fn new(func: F) -> Self {
        Self {
            func,
            _phantom: PhantomData,
        }
    }
}

impl<E, V, F> KeyProjection<E> for FunctionProjection<E, V, F>
where
    F: Fn(&E) -> V + Send + Sync,
    V: Into<KeyValue>,
{
    fn project(&self, entity: &E) -> Result<KeyValue, ConvertError> {
        Ok((self.func)(entity).into())
    }
}

/// Contributes the same fragment for every entity.
#[derive(Debug, Clone)]
pub struct ConstantProjection(KeyValue);

impl ConstantProjection {
    pub fn new(value: impl Into<KeyValue>) -> Self {
        Self(value.into())
    }
}

impl<E> KeyProjection<E> for ConstantProjection {
    fn project(&self, _entity: &E) -> Result<KeyValue, ConvertError> {
        Ok(self.0.clone())
    }
}

/// Projects the canonical `Id` field (a GUID) through the entity's field map.
///
/// `IndexBuilder::build` rejects entity types that do not declare the field.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityProjection;

impl<E: TableEntity> KeyProjection<E> for IdentityProjection {
    fn project(&self, entity: &E) -> Result<KeyValue, ConvertError> {
        entity.to_fields().get_guid(IDENTITY_FIELD).map(KeyValue::Guid)
    }
}
