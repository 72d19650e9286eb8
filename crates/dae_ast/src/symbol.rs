//! Interned names for model variables.
//!
//! Every `Expr::Variable` carries a `SymbolId` rather than a `String`, so
//! structural equality of expressions (and therefore hash-consing in the
//! arena) never compares text.

use rustc_hash::FxHashMap;

/// Dense index of an interned variable name.
pub type SymbolId = usize;

/// Two-way table between variable names and their ids.
///
/// Ids are handed out in first-interned order, which makes the unknown
/// ordering of a system reproducible from its source text.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    names: Vec<String>,
    ids: FxHashMap<String, SymbolId>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id for `name`, allocating one on first use.
    pub fn intern(&mut self, name: &str) -> SymbolId {
        if let Some(&id) = self.ids.get(name) {
            return id;
        }
        let id = self.names.len();
        self.names.push(name.to_owned());
        self.ids.insert(name.to_owned(), id);
        id
    }

    /// Name behind `id`.
    ///
    /// # Panics
    /// Panics if `id` was not produced by this table.
    #[inline]
    pub fn name(&self, id: SymbolId) -> &str {
        &self.names[id]
    }

    /// Lookup without interning.
    #[inline]
    pub fn lookup(&self, name: &str) -> Option<SymbolId> {
        self.ids.get(name).copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_idempotent() {
        let mut table = SymbolTable::new();
        let a = table.intern("x");
        let b = table.intern("x");
        assert_eq!(a, b);
        assert_eq!(table.len(), 1);
        assert_eq!(table.name(a), "x");
    }

    #[test]
    fn ids_follow_first_use() {
        let mut table = SymbolTable::new();
        let y = table.intern("y");
        let x = table.intern("x");
        assert_eq!((y, x), (0, 1));
        assert_eq!(table.lookup("x"), Some(1));
        assert_eq!(table.lookup("z"), None);
    }
}
