use super::edges::Edges;
use super::node::{ItemType, Node, NodeId};
use super::tree::Tree;
use crate::config::{Symbol, SYMBOL_CAP};
use crate::rng::Rng;
use crate::{CHILD_COUNT_CAP, LAYER_CAP, NAME_CAP};

/// Deterministic synthesis of the missing parts of the tree: every node
/// gets its bill-of-materials completed from its unexplained needs, a
/// host, lab costs, recursive work/energy totals and, if the synthesiser
/// invented it, a name. All randomness is drawn from an rng seeded by
/// the node id so a given input produces a bit-identical tree.
struct Gen<'a> {
    tree: &'a mut Tree,
    id: NodeId,
    rng: Rng,
    threshold: u32,
}

/// how well a candidate child covers a node's needs
#[derive(Default, Clone, Copy)]
struct Match {
    count: u32,
    set: u32,
    msb: NodeId,
}

/// link count and coverage if `child` were linked under `node`: the
/// candidate qualifies only when its needs are a subset of the node's,
/// and the count is the bottleneck ratio over the shared needs.
fn child_count(node: &Node, child: &Node) -> Match {
    if !node.needs.set.contains(&child.needs.set) {
        return Match::default();
    }

    let mut matched = Match {
        count: u32::MAX,
        set: 0,
        msb: NodeId::NIL,
    };

    for edge in child.needs.edges.iter() {
        let need = node.needs.edges.find(edge.id).expect("contained set");
        matched.set += 1;
        matched.msb = edge.id;
        matched.count = matched.count.min(need.count / edge.count);
    }

    matched.count = matched.count.min(CHILD_COUNT_CAP);
    matched
}

impl Gen<'_> {
    fn node(&self) -> &Node {
        self.tree.node(self.id).expect("generating a live node")
    }
    fn node_mut(&mut self) -> &mut Node {
        self.tree.node_mut(self.id).expect("generating a live node")
    }

    /// small needs, below a share of the largest one, are eligible for
    /// trimming instead of routing
    fn threshold(&mut self) {
        let mut max: Option<(NodeId, u32)> = None;
        for need in self.node().needs.edges.iter() {
            if let Some((_, count)) = max {
                if count > need.count {
                    continue;
                }
            }
            max = Some((need.id, need.count));
        }

        let Some((id, count)) = max else { return };
        self.threshold = ((count as u64 * 35) / 100) as u32;
        log::debug!(
            "gen.threshold: edge={}:{}, thresh={}",
            id,
            count,
            self.threshold
        );
    }

    /// drop still-present needs that shrank below both the threshold and
    /// their declared base; prevents nodes built out of crumbs
    fn trim_needs(&mut self) -> bool {
        let mut trimmed = false;
        let mut ix = 0;

        while let Some(need) = self.node().needs.edges.get(ix) {
            let base = self
                .node()
                .base
                .needs
                .find(need.id)
                .expect("needs stay within base");

            if base.count == need.count || need.count > self.threshold {
                ix += 1;
                continue;
            }

            log::debug!(
                "gen.needs.trim: edge={}:{}, threshold={}",
                need.id,
                need.count,
                self.threshold
            );

            self.node_mut().needs_dec(need.id, need.count);
            trimmed = true;
        }

        trimmed
    }

    /// needs sitting in the layer directly below become children as-is
    fn child_elem(&mut self) {
        let layer = self.id.layer();
        let mut ix = 0;

        while let Some(need) = self.node().needs.edges.get(ix) {
            assert!(layer > need.id.layer());
            if need.id.layer() < layer - 1 {
                ix += 1;
                continue;
            }

            self.node_mut()
                .child_inc(need.id, need.count.min(CHILD_COUNT_CAP));
            self.node_mut().needs_dec(need.id, need.count);
        }

        if self.node().needs.edges.len() == 1 {
            let need = self.node().needs.edges.get(0).expect("len 1");
            self.node_mut()
                .child_inc(need.id, need.count.min(CHILD_COUNT_CAP));
            self.node_mut().needs_dec(need.id, need.count);
        }
    }

    /// drain the linked child's needs from ours, `count` times over
    fn child_link(&mut self, child: NodeId, count: u32) {
        let needs = self.tree.node(child).expect("live child").needs.edges.clone();
        for need in needs.iter() {
            self.node_mut().needs_dec(need.id, need.count * count);
        }

        self.node_mut().child_inc(child, count);
        self.node().dump("gen.child.link");
    }

    /// invent a passive intermediate in `layer` and hand it a slice of
    /// our needs; whatever sits above the child's reach becomes needs on
    /// the child, resolved when the child itself is generated
    fn child_create(&mut self, layer: u8) -> bool {
        log::debug!(
            "gen.child.set: layer={}, set={}",
            layer,
            self.node().needs.set
        );

        let Some(child) = self.tree.append(layer) else {
            return false;
        };
        {
            let node = self.tree.node_mut(child).expect("appended");
            node.kind = ItemType::Passive;
            node.generated = true;
        }

        let needs = self.node().needs.edges.clone();
        let max = needs.iter().map(|need| need.count).max().unwrap_or(0);

        const DIV: u64 = 10;
        let mut min = u32::MAX;

        for need in needs.iter() {
            let mult = self.rng.exp(1, DIV);
            let mut count = ((max as u64 * mult) / DIV) as u32;
            count = count.max(self.threshold.max(1));
            count = count.min(need.count);

            if child.layer() - 1 > need.id.layer() {
                let node = self.tree.node_mut(child).expect("appended");
                node.needs_inc(need.id, count);
            } else {
                count = count.min(CHILD_COUNT_CAP);
                let node = self.tree.node_mut(child).expect("appended");
                node.child_inc(need.id, count);
            }

            min = min.min(need.count / count);
        }

        let drained = self.tree.node(child).expect("appended").needs.edges.clone();
        for need in drained.iter() {
            self.node_mut().needs_dec(need.id, need.count * min);
        }
        let drained = self
            .tree
            .node(child)
            .expect("appended")
            .children
            .edges
            .clone();
        for need in drained.iter() {
            self.node_mut().needs_dec(need.id, need.count * min);
        }

        self.node_mut().child_inc(child, min);

        self.tree.node(child).expect("appended").dump("gen.child.new");
        self.node().dump("gen.child.create");
        true
    }

    fn children(&mut self) {
        if self.node().needs.edges.is_empty() {
            return;
        }

        let top = self.id.layer() - 1;

        let max = self
            .node()
            .children
            .edges
            .iter()
            .map(|edge| edge.id.layer())
            .max()
            .unwrap_or(0);

        // Ensures that our first child is: in the layer directly below
        // our node to ensure that we have the right depth; that it uses
        // our MSB element so that any newly added elements get added
        // into the tree.
        if max < top {
            let mut matched = Match::default();
            let mut child: Option<NodeId> = None;

            for it in NodeId::layer_rev(top) {
                let Some(node) = self.tree.node(it) else { continue };
                if node.kind.elem() {
                    continue;
                }
                if self.node().kind == ItemType::Passive && node.kind != ItemType::Passive {
                    continue;
                }

                let counts = child_count(self.node(), node);
                if counts.count == 0 {
                    continue;
                }
                if counts.msb < matched.msb {
                    continue;
                }
                matched = counts;
                child = Some(it);
            }

            let msb = self.node().needs.set.msb().expect("needs non-empty");
            if matched.msb != msb {
                self.child_create(top);
            } else {
                self.child_link(child.expect("matched"), matched.count);
            }
        }

        // Link to as many nodes in the tree as possible.
        while !self.node().needs.edges.is_empty() {
            let mut matched = Match::default();
            let mut child: Option<NodeId> = None;

            let bottom = self.node().needs.set.msb().expect("non-empty").layer();
            assert!(top > bottom);

            for it in NodeId::span_rev(bottom + 1, top) {
                let Some(node) = self.tree.node(it) else { continue };
                if node.kind.elem() {
                    continue;
                }
                if self.node().kind == ItemType::Passive && node.kind != ItemType::Passive {
                    continue;
                }
                if self.node().children.set.has(it) {
                    continue;
                }

                let counts = child_count(self.node(), node);
                if counts.count == 0 {
                    continue;
                }
                if counts.msb < matched.msb {
                    continue;
                }
                if counts.set < matched.set {
                    continue;
                }

                matched = counts;
                child = Some(it);
            }

            match child {
                Some(id) => self.child_link(id, matched.count),
                None => {
                    if !self.trim_needs() {
                        break;
                    }
                }
            }
        }

        // If all else fails create new nodes to drain the rest of our needs.
        let mut failures = 0;
        while !self.node().needs.edges.is_empty() {
            let bottom = self.node().needs.set.msb().expect("non-empty").layer();
            assert!(top > bottom);

            let layer = self.rng.exp(bottom as u64, top as u64) as u8 + 1;
            if !self.child_create(layer) {
                failures += 1;
                if failures > 5 {
                    break;
                }
            }

            self.trim_needs();
        }
    }

    fn host(&mut self) {
        if !self.node().host.name.is_empty() {
            let name = self.node().host.name;
            if let Some(host) = self.tree.symbol(&name) {
                self.node_mut().host.id = host;
                return;
            }
        }

        let printer = self.tree.printer;
        let assembly = self.tree.assembly;

        let children = self.node().children.edges.clone();
        for edge in children.iter() {
            let child = self.tree.node(edge.id).expect("live child");
            if child.kind.elem() {
                self.node_mut().host.id = printer;
                return;
            }
        }

        self.node_mut().host.id = assembly;
    }

    fn lab(&mut self) {
        let layer = self.id.layer() as u64;
        let bits = fuzz(&mut self.rng, (layer * 64) / LAYER_CAP as u64) as u8;
        let work = fuzz(&mut self.rng, (layer * u8::MAX as u64) / LAYER_CAP as u64) as u8;
        let energy = fuzz(&mut self.rng, 1u64 << layer) as u16;

        let node = self.node_mut();
        node.lab.bits = bits;
        node.lab.work = work;
        node.lab.energy = energy;
    }

    /// rebuild needs from the children's residual needs and settle the
    /// recursive work/energy totals; undeclared work/energy costs are
    /// drawn just above the most expensive child
    fn update(&mut self) {
        // We don't want to update the needs of elems.
        if self.node().kind.elem() {
            let node = self.node_mut();
            node.work.min += node.work.node;
            node.work.total += node.work.node;
            node.energy.total += node.energy.node * node.work.node;
            return;
        }

        let mut tape_len: u64 = 1;
        let mut child_work_max: u32 = 0;
        let mut child_energy_max: u32 = 0;

        {
            let node = self.node_mut();
            node.needs.set.clear();
            node.needs.edges.clear();
        }

        let children = self.node().children.edges.clone();
        for edge in children.iter() {
            let child = self.tree.node(edge.id).expect("live child");
            let work = child.work;
            let energy = child.energy;
            let needs = child.needs.edges.clone();

            tape_len += edge.count as u64;
            child_work_max = child_work_max.max(work.node);
            child_energy_max = child_energy_max.max(energy.node);

            let node = self.node_mut();
            node.work.total += work.total * edge.count;
            node.energy.total += energy.total * edge.count;
            for need in needs.iter() {
                node.needs_inc(need.id, need.count * edge.count);
            }
        }

        if self.node().work.node == 0 {
            assert!(child_work_max > 0, "no work to derive for {}", self.id);
            let min = child_work_max as u64 + 1;
            let max = ((min * 3) / 2).max(min + 1);
            let upper = if tape_len < u8::MAX as u64 {
                (u8::MAX as u64 - tape_len) as u32
            } else {
                u32::MAX
            };
            let work = (self.rng.uni(min, max) as u32).min(upper).max(1);
            self.node_mut().work.node = work;
        }
        {
            let node = self.node_mut();
            node.work.total += node.work.node;
            node.work.min += node.work.node;
        }

        if self.node().energy.node == 0 {
            assert!(child_energy_max > 0, "no energy to derive for {}", self.id);
            let min = child_energy_max as u64 + 1;
            let max = ((min * 3) / 2).max(min + 1);
            self.node_mut().energy.node = self.rng.uni(min, max) as u32;
        }
        {
            let node = self.node_mut();
            node.energy.total += node.energy.node * node.work.node;
        }

        self.node().dump("gen.update");
    }

    fn next_ix(&mut self, max: usize) -> usize {
        if max > 0 {
            self.rng.uni(0, max as u64) as usize
        } else {
            0
        }
    }

    /// compose a name out of a layer head, child syllables and a tail,
    /// retrying on symbol collisions
    fn name(&mut self) {
        for _attempt in 0..10 {
            let mut name = NameBuf::default();

            let mut head = self.id.layer() as usize - 1;
            name.append(HEADS[head]);

            let needs = self.node().needs.edges.clone();
            assert!(!needs.is_empty(), "nothing to name {} from", self.id);

            let mut syllables = self.rng.uni(2, 3);
            let mut ix = needs.len() - 1;

            loop {
                if syllables == 0 {
                    let tail = self.rng.uni(0, TAILS.len() as u64) as usize;
                    name.append(TAILS[tail]);
                    name.dash();
                    head = self.next_ix(head);
                    name.append(HEADS[head]);
                    syllables = self.rng.uni(1, 2);
                } else {
                    syllables -= 1;
                }

                let elem = needs.get(ix).expect("indexed within needs");
                let syllable = self.tree.node(elem.id).expect("live need").syllable;
                name.append(syllable.as_str());

                ix = self.next_ix(ix);
                if !(ix != 0 && name.len + 3 + 4 < NAME_CAP) {
                    break;
                }
            }

            let tail = self.rng.uni(0, TAILS.len() as u64) as usize;
            name.append(TAILS[tail]);

            let sym = name.symbol();
            if self.tree.set_symbol(self.id, &sym) {
                self.node_mut().name = sym;
                return;
            }
        }

        panic!("unable to name {} after ten attempts", self.id);
    }
}

const HEADS: [&str; 15] = [
    "mono", "duo", "tri", "tetra", "penta", "hexa", "hepta", "octo", "ennea",
    "deca", "hendeca", "dodeca", "decatria", "decatessara", "decapente",
];
const TAILS: [&str; 14] = [
    "alm", "alt", "ate", "ex", "gen", "itil", "ide", "ium", "ols", "on", "oid",
    "ry", "sh", "tor",
];

fn is_vowel(byte: u8) -> bool {
    matches!(byte, b'a' | b'e' | b'i' | b'o' | b'u')
}

/// name assembly buffer; joints are smoothed by dropping one letter on
/// vowel-on-vowel and doubled-consonant seams
#[derive(Default)]
struct NameBuf {
    buf: [u8; SYMBOL_CAP],
    len: usize,
}

impl NameBuf {
    fn append(&mut self, src: &str) {
        let mut src = src.as_bytes();

        if let Some(&first) = src.first() {
            if self.len > 0 && is_vowel(first) && is_vowel(self.buf[self.len - 1]) {
                self.len -= 1;
            }
            if self.len > 0 && first == self.buf[self.len - 1] {
                src = &src[1..];
            }
        }

        for &byte in src {
            if self.len >= NAME_CAP {
                break;
            }
            self.buf[self.len] = byte;
            self.len += 1;
        }
    }

    fn dash(&mut self) {
        self.buf[self.len] = b'-';
        self.len += 1;
    }

    fn symbol(&self) -> Symbol {
        Symbol::from(std::str::from_utf8(&self.buf[..self.len]).expect("ascii name"))
    }
}

/// multi-output recipes scale their needs down to a single output so the
/// rest of the algorithm never deals in ratios
fn out_div(tree: &mut Tree, id: NodeId) {
    let node = tree.node_mut(id).expect("live");

    let div = node.out.count(id) as u64;
    if div == 0 {
        node.out.inc(id, 1);
    }
    if div <= 1 {
        return;
    }

    node.needs.edges = node
        .needs
        .edges
        .iter()
        .map(|need| (need.id, (need.count as u64).div_ceil(div) as u32))
        .collect();
}

fn gen_node(tree: &mut Tree, id: NodeId) {
    if tree.node(id).expect("live").done {
        return;
    }

    log::debug!("");
    tree.node(id).expect("live").dump("gen");

    let mut r#gen = Gen {
        tree,
        id,
        rng: Rng::from(u8::from(id) as u64),
        threshold: 0,
    };

    // For generated nodes, base won't have been initialized so do it here.
    if r#gen.node().generated {
        let needs = r#gen.node().needs.edges.clone();
        r#gen.node_mut().base.needs = needs;
    }

    if !r#gen.node().kind.elem() {
        r#gen.threshold();
        r#gen.child_elem();
        r#gen.children();
    }

    r#gen.host();
    r#gen.lab();

    let children = r#gen.node().children.edges.clone();
    for edge in children.iter() {
        gen_node(&mut *r#gen.tree, edge.id);
    }

    r#gen.update();
    if r#gen.node().name.is_empty() {
        r#gen.name();
    }
    r#gen.node_mut().done = true;
}

/// elements carry their own cost so linking one implies its needs
fn elem_setup(tree: &mut Tree, id: NodeId) {
    tree.node_mut(id).expect("live").needs_inc(id, 1);
}

/// fold synthetic inputs' element costs into the element's own needs
fn elem_inc(tree: &mut Tree, id: NodeId) {
    let children = tree.node(id).expect("live").children.edges.clone();

    for child in children.iter() {
        let elem = tree.node(child.id).expect("live child");
        assert!(elem.kind.elem(), "element child of {} must be elemental", id);
        let needs = elem.needs.edges.clone();

        let node = tree.node_mut(id).expect("live");
        for need in needs.iter() {
            node.needs_inc(need.id, need.count * child.count);
        }
    }
}

/// second-order element costs: each need contributes the needs of its
/// own element, self-loops excluded
fn item_inc(tree: &mut Tree, id: NodeId) {
    let needs = tree.node(id).expect("live").needs.edges.clone();
    let mut sum = Edges::default();

    for need in needs.iter() {
        let elem = tree.node(need.id).expect("live need");
        assert!(elem.kind.elem(), "needs of {} must be elemental", id);

        for edge in elem.needs.edges.iter() {
            if edge.id != need.id {
                sum.inc(edge.id, edge.count * need.count);
            }
        }
    }

    let node = tree.node_mut(id).expect("live");
    for edge in sum.iter() {
        node.needs_inc(edge.id, edge.count);
    }
}

fn fuzz(rng: &mut Rng, value: u64) -> u64 {
    let half = value / 2;
    rng.uni((value - half).max(1), (value + half).max(2))
}

pub fn generate(tree: &mut Tree) {
    for id in NodeId::all() {
        let Some(node) = tree.node(id) else { continue };
        if node.kind == ItemType::Sys {
            continue;
        }

        out_div(tree, id);
        if tree.node(id).expect("live").kind.elem() {
            elem_setup(tree, id);
        }

        gen_node(tree, id);
    }

    for id in NodeId::all() {
        let Some(node) = tree.node(id) else { continue };
        if node.kind == ItemType::Sys {
            continue;
        }

        if tree.node(id).expect("live").kind.elem() {
            elem_inc(tree, id);
        } else {
            item_inc(tree, id);
        }

        tree.node(id).expect("live").dump("gen.inc");
    }
}
