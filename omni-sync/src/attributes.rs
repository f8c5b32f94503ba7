//! Custom-attribute reconciliation.
//!
//! Only keys named in the desired map are compared. Keys the source does not
//! mention are kept as the platform has them.

use omni_core::Attributes;

/// The attribute write needed for one user.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeChange {
    /// Desired keys whose value differs from the platform's, sorted.
    pub changed_keys: Vec<String>,
    /// Current attributes overlaid with the desired ones; the full payload.
    pub merged: Attributes,
}

/// Compare current and desired attributes.
///
/// Returns `None` when the source declares no attributes for the user or
/// every declared key already has the desired value.
pub fn plan_attributes(
    current: Option<&Attributes>,
    desired: Option<&Attributes>,
) -> Option<AttributeChange> {
    let desired = desired?;
    let empty = Attributes::new();
    let current = current.unwrap_or(&empty);

    let mut changed_keys: Vec<String> = desired
        .iter()
        .filter(|(key, value)| current.get(key.as_str()) != Some(*value))
        .map(|(key, _)| key.clone())
        .collect();
    if changed_keys.is_empty() {
        return None;
    }
    changed_keys.sort();

    let mut merged = current.clone();
    for (key, value) in desired {
        merged.insert(key.clone(), value.clone());
    }
    Some(AttributeChange {
        changed_keys,
        merged,
    })
}
