use std::collections::BTreeMap;

/// Merge `additions` into `base`, key by key. Keys already present in `base`
/// but absent from `additions` are left untouched; there is no way to remove
/// a key. An absent base map is treated as empty.
pub fn merge(base: &mut Option<BTreeMap<String, String>>, additions: &BTreeMap<String, String>) {
    if additions.is_empty() {
        return;
    }
    let map = base.get_or_insert_with(BTreeMap::new);
    for (key, value) in additions {
        map.insert(key.clone(), value.clone());
    }
}
