use super::node::{Node, NodeId};
use crate::config::Symbol;
use std::collections::HashMap;

/// The node arena: a fixed 256-slot allocation indexed by id, plus the
/// symbol map and the two cached machine ids used as default hosts. A
/// slot is live iff its node carries a non-zero id; there are no owning
/// pointers between nodes, every link is by id.
pub struct Tree {
    nodes: Vec<Node>,
    symbols: HashMap<Symbol, NodeId>,
    pub printer: NodeId,
    pub assembly: NodeId,
}

impl Default for Tree {
    fn default() -> Self {
        Tree {
            nodes: vec![Node::default(); crate::LAYER_CAP * crate::INDEX_CAP],
            symbols: HashMap::new(),
            printer: NodeId::NIL,
            assembly: NodeId::NIL,
        }
    }
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        let node = &self.nodes[usize::from(id)];
        node.live().then_some(node)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let node = &mut self.nodes[usize::from(id)];
        node.live().then_some(node)
    }

    pub fn symbol(&self, sym: &Symbol) -> Option<NodeId> {
        self.symbols.get(sym).copied()
    }

    pub fn name(&self, id: NodeId) -> Symbol {
        self.node(id)
            .map(|node| node.name)
            .unwrap_or_else(|| Symbol::from("nil"))
    }

    /// live ids in scan order
    pub fn live(&self) -> impl Iterator<Item = NodeId> + '_ {
        NodeId::all().filter(|&id| self.node(id).is_some())
    }

    fn cache_machines(&mut self, sym: &Symbol, id: NodeId) {
        if sym.as_str() == "printer" {
            self.printer = id;
        }
        if sym.as_str() == "assembly" {
            self.assembly = id;
        }
    }

    /// allocate the lowest free index of `layer` under `sym`; None when
    /// the layer is full. The caller owns duplicate-name detection.
    pub fn insert(&mut self, layer: u8, sym: &Symbol) -> Option<NodeId> {
        let id = (1..crate::INDEX_CAP as u8)
            .map(|index| NodeId::make(layer, index))
            .find(|&id| !self.nodes[usize::from(id)].live())?;

        let node = &mut self.nodes[usize::from(id)];
        node.id = id;
        node.name = *sym;

        self.symbols.insert(*sym, id);
        self.cache_machines(sym, id);
        Some(id)
    }

    /// allocate the highest free index of `layer`, used for synthesised
    /// nodes so they sit after the hand-authored ones
    pub fn append(&mut self, layer: u8) -> Option<NodeId> {
        let id = (1..crate::INDEX_CAP as u8)
            .rev()
            .map(|index| NodeId::make(layer, index))
            .find(|&id| !self.nodes[usize::from(id)].live())?;

        self.nodes[usize::from(id)].id = id;
        Some(id)
    }

    /// bind a generated name to a node; false on collision
    pub fn set_symbol(&mut self, id: NodeId, sym: &Symbol) -> bool {
        if self.symbols.contains_key(sym) {
            return false;
        }
        self.symbols.insert(*sym, id);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_takes_lowest_index() {
        let mut tree = Tree::new();
        let a = tree.insert(2, &Symbol::from("a")).unwrap();
        let b = tree.insert(2, &Symbol::from("b")).unwrap();
        assert_eq!(u8::from(a), 0x21);
        assert_eq!(u8::from(b), 0x22);
    }

    #[test]
    fn append_takes_highest_index() {
        let mut tree = Tree::new();
        let a = tree.append(2).unwrap();
        let b = tree.append(2).unwrap();
        assert_eq!(u8::from(a), 0x2f);
        assert_eq!(u8::from(b), 0x2e);
    }

    #[test]
    fn index_zero_is_reserved() {
        let mut tree = Tree::new();
        for _ in 0..15 {
            assert!(tree.insert(1, &Symbol::from("x")).is_some());
        }
        assert!(tree.insert(1, &Symbol::from("full")).is_none());
        assert!(tree.node(NodeId::make(1, 0)).is_none());
    }

    #[test]
    fn resolves_symbols() {
        let mut tree = Tree::new();
        let id = tree.insert(1, &Symbol::from("elem-a")).unwrap();
        assert_eq!(tree.symbol(&Symbol::from("elem-a")), Some(id));
        assert_eq!(tree.name(id).as_str(), "elem-a");
        assert_eq!(tree.name(NodeId::from(0x99)).as_str(), "nil");
    }

    #[test]
    fn caches_default_hosts() {
        let mut tree = Tree::new();
        let printer = tree.insert(2, &Symbol::from("printer")).unwrap();
        let assembly = tree.insert(2, &Symbol::from("assembly")).unwrap();
        assert_eq!(tree.printer, printer);
        assert_eq!(tree.assembly, assembly);
    }

    #[test]
    fn set_symbol_rejects_collisions() {
        let mut tree = Tree::new();
        let a = tree.insert(1, &Symbol::from("taken")).unwrap();
        let b = tree.append(2).unwrap();
        assert!(!tree.set_symbol(b, &Symbol::from("taken")));
        assert!(tree.set_symbol(b, &Symbol::from("fresh")));
        assert_ne!(a, b);
    }

    #[test]
    fn live_scans_in_order() {
        let mut tree = Tree::new();
        let hi = tree.append(3).unwrap();
        let lo = tree.insert(1, &Symbol::from("lo")).unwrap();
        let ids: Vec<NodeId> = tree.live().collect();
        assert_eq!(ids, vec![lo, hi]);
    }
}
