//! Per-kind create/update lifecycle hooks.

use warden_core::ErrorList;

/// Behaviour applied by [`GenericStore`](crate::GenericStore) around every
/// create and update of one resource kind.
///
/// Order on create: `prepare_for_create` → `validate` → `canonicalize`.
/// Order on update: `prepare_for_update` → `validate_update` → `canonicalize`.
pub trait RestStrategy<T>: Send + Sync {
    /// Whether objects of this kind live inside a namespace.
    fn namespace_scoped(&self) -> bool;

    /// Normalize a new object before validation (e.g. clear fields the client
    /// may not set).
    fn prepare_for_create(&self, obj: &mut T);

    fn validate(&self, obj: &T) -> ErrorList;

    /// Normalize the object after validation.
    fn canonicalize(&self, _obj: &mut T) {}

    /// Whether an update of a missing object creates it.
    fn allow_create_on_update(&self) -> bool;

    /// Normalize an update against the currently stored object.
    fn prepare_for_update(&self, obj: &mut T, old: &T);

    fn validate_update(&self, obj: &T, old: &T) -> ErrorList;

    /// Whether an update without a `resource_version` precondition is accepted.
    fn allow_unconditional_update(&self) -> bool;
}
