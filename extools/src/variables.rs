use std::collections::HashMap;
use std::collections::hash_map;

pub const LINE_BEGIN: &str = "line_begin";
pub const COL_BEGIN: &str = "col_begin";
pub const LINE_END: &str = "line_end";
pub const COL_END: &str = "col_end";
pub const LINE: &str = "line";
pub const COL: &str = "col";

/// Variable name to value mapping used for `${name}` substitution.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VariableMap(HashMap<String, String>);

impl VariableMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> hash_map::Iter<'_, String, String> {
        self.0.iter()
    }

    /// Substitute every reference in `template`. See [`crate::expand::expand`].
    pub fn expand(&self, template: &str) -> String {
        crate::expand::expand(template, self)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for VariableMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for VariableMap {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

/// Process environment snapshot, captured once per top-level invocation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Environment(Vec<(String, String)>);

impl Environment {
    /// Snapshot the current process environment. Entries that are not valid
    /// UTF-8 are skipped.
    pub fn capture() -> Self {
        std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Environment {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// A selection: anchor `a` and active end `b`, as character offsets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Region {
    pub a: usize,
    pub b: usize,
}

impl Region {
    pub fn new(a: usize, b: usize) -> Self {
        Self { a, b }
    }

    /// Empty selection at `offset`.
    pub fn caret(offset: usize) -> Self {
        Self::new(offset, offset)
    }
}

/// Zero-based row/column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct RowCol {
    pub row: usize,
    pub col: usize,
}

impl RowCol {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// Row/column of a region's anchor and active end.
///
/// `anchor` stays the anchor even when it lies after `active`: "begin" and
/// "end" follow selection direction, not document order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct SelectionBounds {
    pub anchor: RowCol,
    pub active: RowCol,
}

impl SelectionBounds {
    pub fn from_region(region: Region, row_col: impl Fn(usize) -> RowCol) -> Self {
        Self {
            anchor: row_col(region.a),
            active: row_col(region.b),
        }
    }
}

/// Build the variable map for one invocation.
///
/// Host variables go in first, then the environment, then the derived
/// position entries, so later sources win on key collisions.
pub fn resolve(
    bounds: SelectionBounds,
    host_variables: &HashMap<String, String>,
    environment: &Environment,
) -> VariableMap {
    let mut vars = VariableMap::new();
    vars.extend(host_variables.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    vars.extend(environment.iter());

    let line_begin = (bounds.anchor.row + 1).to_string();
    let col_begin = (bounds.anchor.col + 1).to_string();
    vars.insert(LINE_BEGIN, line_begin.clone());
    vars.insert(COL_BEGIN, col_begin.clone());
    vars.insert(LINE_END, (bounds.active.row + 1).to_string());
    vars.insert(COL_END, (bounds.active.col + 1).to_string());
    vars.insert(LINE, line_begin);
    vars.insert(COL, col_begin);
    vars
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn bounds(anchor: (usize, usize), active: (usize, usize)) -> SelectionBounds {
        SelectionBounds {
            anchor: RowCol::new(anchor.0, anchor.1),
            active: RowCol::new(active.0, active.1),
        }
    }

    #[test]
    fn derived_positions_are_one_based() {
        let vars = resolve(bounds((4, 9), (4, 9)), &HashMap::new(), &Environment::default());
        assert_eq!(vars.get(LINE_BEGIN), Some("5"));
        assert_eq!(vars.get(COL_BEGIN), Some("10"));
        assert_eq!(vars.get(LINE_END), Some("5"));
        assert_eq!(vars.get(COL_END), Some("10"));
        assert_eq!(vars.get(LINE), Some("5"));
        assert_eq!(vars.get(COL), Some("10"));
    }

    #[test]
    fn reversed_selection_keeps_anchor_as_begin() {
        let vars = resolve(bounds((7, 2), (1, 0)), &HashMap::new(), &Environment::default());
        assert_eq!(vars.get(LINE_BEGIN), Some("8"));
        assert_eq!(vars.get(COL_BEGIN), Some("3"));
        assert_eq!(vars.get(LINE_END), Some("2"));
        assert_eq!(vars.get(COL_END), Some("1"));
    }

    #[test]
    fn later_sources_win() {
        let host = HashMap::from([
            ("file".to_string(), "/a.rs".to_string()),
            ("HOME".to_string(), "/host-home".to_string()),
            ("line".to_string(), "99".to_string()),
        ]);
        let env: Environment = [("HOME", "/env-home"), ("col", "42")].into_iter().collect();
        let vars = resolve(bounds((0, 0), (0, 0)), &host, &env);
        assert_eq!(vars.get("file"), Some("/a.rs"));
        assert_eq!(vars.get("HOME"), Some("/env-home"));
        assert_eq!(vars.get(LINE), Some("1"));
        assert_eq!(vars.get(COL), Some("1"));
    }

    #[test]
    fn from_region_maps_each_end() {
        let b = SelectionBounds::from_region(Region::new(3, 10), |o| RowCol::new(o / 4, o % 4));
        assert_eq!(b.anchor, RowCol::new(0, 3));
        assert_eq!(b.active, RowCol::new(2, 2));
    }

    #[test]
    fn capture_sees_process_environment() {
        let env = Environment::capture();
        let path = std::env::var("PATH").ok();
        assert_eq!(
            env.iter().find(|(k, _)| *k == "PATH").map(|(_, v)| v.to_string()),
            path
        );
    }

    proptest! {
        #[test]
        fn position_law(ra in 0usize..10_000, ca in 0usize..500, rb in 0usize..10_000, cb in 0usize..500) {
            let vars = resolve(bounds((ra, ca), (rb, cb)), &HashMap::new(), &Environment::default());
            let line_begin = (ra + 1).to_string();
            let col_begin = (ca + 1).to_string();
            let line_end = (rb + 1).to_string();
            let col_end = (cb + 1).to_string();
            prop_assert_eq!(vars.get(LINE_BEGIN), Some(line_begin.as_str()));
            prop_assert_eq!(vars.get(COL_BEGIN), Some(col_begin.as_str()));
            prop_assert_eq!(vars.get(LINE_END), Some(line_end.as_str()));
            prop_assert_eq!(vars.get(COL_END), Some(col_end.as_str()));
            prop_assert_eq!(vars.get(LINE), vars.get(LINE_BEGIN));
            prop_assert_eq!(vars.get(COL), vars.get(COL_BEGIN));
        }

        #[test]
        fn resolve_is_pure(
            host in proptest::collection::hash_map("[a-z_]{1,8}", "[ -~]{0,12}", 0..8),
            env in proptest::collection::vec(("[A-Z_]{1,8}", "[ -~]{0,12}"), 0..8),
            r in 0usize..100,
            c in 0usize..100,
        ) {
            let env: Environment = env.into_iter().collect();
            let first = resolve(bounds((r, c), (c, r)), &host, &env);
            let second = resolve(bounds((r, c), (c, r)), &host, &env);
            prop_assert_eq!(first, second);
        }
    }
}
