use appdash_core::TypeMismatch;
use appdash_k8s_api::{DynamicObject, ResourceExt};
use serde::de::DeserializeOwned;
use tracing::debug;

/// Interprets a watched object as a `K`.
///
/// The object's kind must be `K`'s and its contents must deserialize as one.
pub(crate) fn decode<K>(obj: DynamicObject) -> Result<K, TypeMismatch>
where
    K: k8s_openapi::Resource + DeserializeOwned,
{
    let name = obj.name_any();
    let kind = match obj.types.as_ref() {
        Some(types) => types.kind.clone(),
        None => "<untyped object>".to_string(),
    };
    if kind != K::KIND {
        return Err(TypeMismatch {
            expected: K::KIND,
            found: kind,
            name,
        });
    }

    serde_json::to_value(obj)
        .and_then(serde_json::from_value)
        .map_err(|error| {
            debug!(%error, %name, kind = K::KIND, "Failed to decode object");
            TypeMismatch {
                expected: K::KIND,
                found: format!("malformed {kind}"),
                name,
            }
        })
}
