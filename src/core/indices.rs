use hashbrown::HashMap;

/// Secondary index from a key to the ids filed under it, in insertion order.
pub type VecIndex<K, V> = HashMap<K, Vec<V>>;

/// Files `value` under `key`.
pub fn push_to_vec_index<K, V>(index: &mut VecIndex<K, V>, key: K, value: V)
where
    K: std::hash::Hash + Eq,
{
    index.entry(key).or_default().push(value);
}

/// Removes `value` from `key`, dropping the key once it is empty.
pub fn remove_from_vec_index<K, V>(index: &mut VecIndex<K, V>, key: &K, value: &V)
where
    K: std::hash::Hash + Eq,
    V: PartialEq,
{
    let Some(values) = index.get_mut(key) else {
        return;
    };
    if let Some(pos) = values.iter().position(|x| x == value) {
        values.remove(pos);
    }
    if values.is_empty() {
        index.remove(key);
    }
}
