use super::bits::Bits;
use super::edges::Edges;
use crate::config::Symbol;

/// NodeId packs a tree position into one byte: layer in the high nibble,
/// index within the layer in the low nibble. Id 0 is nil and index 0 of
/// every layer is reserved, so a live node always has a non-zero id.
/// Layer ordering is the DAG direction: children sit strictly below
/// their parents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct NodeId(u8);

/// u8 isomorphism
impl From<u8> for NodeId {
    fn from(n: u8) -> Self {
        NodeId(n)
    }
}
impl From<NodeId> for u8 {
    fn from(id: NodeId) -> Self {
        id.0
    }
}
impl From<NodeId> for usize {
    fn from(id: NodeId) -> Self {
        id.0 as usize
    }
}

impl NodeId {
    pub const NIL: NodeId = NodeId(0);

    pub fn make(layer: u8, index: u8) -> Self {
        NodeId(layer * crate::INDEX_CAP as u8 + index)
    }

    pub fn layer(&self) -> u8 {
        self.0 / crate::INDEX_CAP as u8
    }
    pub fn index(&self) -> u8 {
        self.0 % crate::INDEX_CAP as u8
    }
    pub fn is_nil(&self) -> bool {
        self.0 == 0
    }

    /// every id the pipeline scans, in order. The upper bound is
    /// exclusive of 0xff: the last slot of the last layer is never
    /// visited by generation, checks, or dumps.
    pub fn all() -> impl Iterator<Item = NodeId> {
        (1..u8::MAX).map(NodeId)
    }

    /// ids of one layer, descending index order
    pub fn layer_rev(layer: u8) -> impl Iterator<Item = NodeId> {
        (1..crate::INDEX_CAP as u8)
            .rev()
            .map(move |index| NodeId::make(layer, index))
    }

    /// ids spanning layers `bottom..=top`, from the last slot of `top`
    /// down to the first slot of `bottom`
    pub fn span_rev(bottom: u8, top: u8) -> impl Iterator<Item = NodeId> {
        (bottom..=top)
            .rev()
            .flat_map(|layer| NodeId::layer_rev(layer))
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02x}", self.0)
    }
}

/// Item classification. Natural and synthetic nodes are "elemental": the
/// leaves of the dependency DAG. Sys nodes are exempt from generation
/// and most checks. The discriminant order is the item enum order in the
/// generated database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum ItemType {
    #[default]
    Nil,
    Natural,
    Synthetic,
    Logistics,
    Active,
    Passive,
    Sys,
}

impl ItemType {
    pub const TABLE: [(&'static str, ItemType); 7] = [
        ("nil", ItemType::Nil),
        ("natural", ItemType::Natural),
        ("synth", ItemType::Synthetic),
        ("passive", ItemType::Passive),
        ("active", ItemType::Active),
        ("logistics", ItemType::Logistics),
        ("sys", ItemType::Sys),
    ];

    pub fn elem(&self) -> bool {
        matches!(self, ItemType::Natural | ItemType::Synthetic)
    }

    /// single letter tag for debug dumps
    pub fn tag(&self) -> char {
        match self {
            ItemType::Nil => '?',
            ItemType::Natural => 'n',
            ItemType::Synthetic => 's',
            ItemType::Logistics => 'l',
            ItemType::Active => 'a',
            ItemType::Passive => 'p',
            ItemType::Sys => 'y',
        }
    }
}

impl std::fmt::Display for ItemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ItemType::Nil => "nil",
            ItemType::Natural => "natural",
            ItemType::Synthetic => "synth",
            ItemType::Logistics => "logistics",
            ItemType::Active => "active",
            ItemType::Passive => "passive",
            ItemType::Sys => "sys",
        };
        write!(f, "{}", name)
    }
}

/// membership in one of the ui item lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListTag {
    #[default]
    Nil,
    Control,
    Factory,
}

impl ListTag {
    pub const TABLE: [(&'static str, ListTag); 3] = [
        ("nil", ListTag::Nil),
        ("control", ListTag::Control),
        ("factory", ListTag::Factory),
    ];
}

impl std::fmt::Display for ListTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ListTag::Nil => "nil",
            ListTag::Control => "control",
            ListTag::Factory => "factory",
        };
        write!(f, "{}", name)
    }
}

/// per-recipe work cost; min tracks the critical path and total the full
/// recursive sum weighted by counts
#[derive(Debug, Clone, Copy, Default)]
pub struct Work {
    pub node: u32,
    pub min: u32,
    pub total: u32,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Energy {
    pub node: u32,
    pub total: u32,
}

/// research cost of unlocking this item
#[derive(Debug, Clone, Copy, Default)]
pub struct Lab {
    pub bits: u8,
    pub work: u8,
    pub energy: u16,
}

#[derive(Debug, Clone, Default)]
pub struct Host {
    pub name: Symbol,
    pub id: NodeId,
}

/// edge list with its membership mirror
#[derive(Debug, Clone, Default)]
pub struct EdgeSet {
    pub set: Bits,
    pub edges: Edges,
}

impl EdgeSet {
    pub fn inc(&mut self, id: NodeId, count: u32) {
        self.edges.inc(id, count);
        self.set.put(id);
    }

    pub fn dec(&mut self, id: NodeId, count: u32) {
        if self.edges.dec(id, count) == 0 {
            self.set.del(id);
        }
    }
}

/// immutable snapshot of the parsed recipe, kept for the checkers
#[derive(Debug, Clone, Default)]
pub struct Base {
    pub input: Edges,
    pub needs: Edges,
}

#[derive(Debug, Clone, Default)]
pub struct Node {
    pub id: NodeId,
    pub kind: ItemType,
    pub tier: u8,
    pub generated: bool,
    pub done: bool,

    pub name: Symbol,
    pub syllable: Symbol,
    pub config: Symbol,
    pub list: ListTag,

    pub work: Work,
    pub energy: Energy,
    pub lab: Lab,

    pub specs: String,
    pub host: Host,

    pub children: EdgeSet,
    pub needs: EdgeSet,
    pub base: Base,
    pub out: Edges,
}

impl Node {
    pub fn live(&self) -> bool {
        !self.id.is_nil()
    }

    pub fn child_inc(&mut self, id: NodeId, count: u32) {
        self.children.inc(id, count);
    }
    pub fn needs_inc(&mut self, id: NodeId, count: u32) {
        self.needs.inc(id, count);
    }
    pub fn needs_dec(&mut self, id: NodeId, count: u32) {
        self.needs.dec(id, count);
    }

    /// one-line state trace for the generator's debug log
    pub fn dump(&self, title: &str) {
        log::debug!(
            "{}: id={}:{}:{}, child={}, needs={}, work={}/{}/{}, en={}/{}",
            title,
            self.id,
            self.name,
            self.kind.tag(),
            self.children.edges,
            self.needs.edges,
            self.work.node,
            self.work.min,
            self.work.total,
            self.energy.node,
            self.energy.total,
        );
    }
}
