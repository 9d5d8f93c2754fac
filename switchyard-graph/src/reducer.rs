use std::collections::BTreeMap;

pub struct AppendVec;
impl AppendVec {
    pub fn merge<T: Clone>(current: &[T], update: Vec<T>) -> Vec<T> {
        let mut out = current.to_vec();
        out.extend(update);
        out
    }
}

pub struct MergeMap;
impl MergeMap {
    pub fn merge<K: Ord + Clone, V: Clone>(
        current: &BTreeMap<K, V>,
        update: BTreeMap<K, V>,
    ) -> BTreeMap<K, V> {
        let mut out = current.clone();
        out.extend(update);
        out
    }
}

/// Keeps the current value unless the update carries one.
pub struct Override;
impl Override {
    pub fn merge<T: Clone>(current: &Option<T>, update: Option<T>) -> Option<T> {
        update.or_else(|| current.clone())
    }
}
