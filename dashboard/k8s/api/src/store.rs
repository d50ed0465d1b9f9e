use kube::{
    core::{ApiResource, DynamicObject, TypeMeta},
    Resource, ResourceExt,
};
use parking_lot::RwLock;
use std::{collections::BTreeMap, sync::Arc};

pub type SharedStore = Arc<RwLock<Store>>;

/// A local mirror of one resource kind in one namespace.
///
/// Objects are keyed by name so that listing is ordered and repeatable for an
/// unchanged mirror.
#[derive(Debug)]
pub struct Store {
    resource: ApiResource,
    objects: BTreeMap<String, DynamicObject>,
}

// === impl Store ===

impl Store {
    pub fn new(resource: ApiResource) -> Self {
        Self {
            resource,
            objects: BTreeMap::new(),
        }
    }

    /// Creates an empty store for objects of kind `K`.
    pub fn of<K>() -> Self
    where
        K: Resource<DynamicType = ()>,
    {
        Self::new(ApiResource::erase::<K>(&()))
    }

    pub fn resource(&self) -> &ApiResource {
        &self.resource
    }

    /// Inserts or replaces an object.
    ///
    /// List responses omit `apiVersion` and `kind` on their items, so objects
    /// without type information are stamped with the watched resource's.
    pub fn apply(&mut self, mut obj: DynamicObject) {
        if obj.types.is_none() {
            obj.types = Some(TypeMeta {
                api_version: self.resource.api_version.clone(),
                kind: self.resource.kind.clone(),
            });
        }
        self.objects.insert(obj.name_any(), obj);
    }

    pub fn delete(&mut self, name: &str) {
        self.objects.remove(name);
    }

    /// Replaces the store's contents with a complete relist.
    pub fn reset(&mut self, objs: impl IntoIterator<Item = DynamicObject>) {
        self.objects.clear();
        for obj in objs {
            self.apply(obj);
        }
    }

    pub fn list(&self) -> Vec<DynamicObject> {
        self.objects.values().cloned().collect()
    }
}
