use super::bits::Bits;
use super::edges::Edges;
use super::node::{ItemType, Node, NodeId};
use super::tree::Tree;
use crate::config::Errors;
use crate::{CHECK_DIV, CHECK_MULT};

// -----------------------------------------------------------------------------
// inputs
// -----------------------------------------------------------------------------

fn basics(node: &Node, errs: &mut Errors) {
    if node.work.node == 0 && node.kind.elem() {
        errs.node(u8::from(node.id), node.name.as_str(), "missing work");
    }
    if node.energy.node == 0 && node.kind.elem() {
        errs.node(u8::from(node.id), node.name.as_str(), "missing energy:node");
    }
}

/// elemental cost already accounted for by a declared input: substitute
/// a node by its declared needs, else by its inputs, else by itself
fn sum_needs(tree: &Tree, id: NodeId, sum: &mut Edges, count: u32) {
    let node = tree.node(id).expect("live input");

    if !node.base.needs.is_empty() {
        for need in node.base.needs.iter() {
            sum.inc(need.id, need.count * count);
        }
        return;
    }

    if !node.base.input.is_empty() {
        for input in node.base.input.iter() {
            sum_needs(tree, input.id, sum, input.count * count);
        }
        return;
    }

    sum.inc(id, count);
}

/// ultimate element cost of a need, recursing through the inputs of
/// elemental chains
fn sum_elems(tree: &Tree, id: NodeId, sum: &mut Edges, count: u32) {
    let node = tree.node(id).expect("live need");

    for elem in node.base.input.iter() {
        sum.inc(elem.id, elem.count * count);
        sum_elems(tree, elem.id, sum, elem.count * count);
    }
}

/// verify that the declared needs cover the declared inputs and the
/// transitive element cost, then subtract both; what remains is the
/// overhead the generator must route through intermediates
fn inputs_needs(tree: &mut Tree, id: NodeId, errs: &mut Errors) {
    if tree.node(id).expect("live").base.needs.is_empty() {
        return;
    }

    let (name, base_input) = {
        let node = tree.node(id).expect("live");
        (node.name, node.base.input.clone())
    };

    let mut ins = Edges::default();
    for input in base_input.iter() {
        sum_needs(tree, input.id, &mut ins, input.count);
    }

    for exp in ins.iter() {
        let val = tree.node(id).expect("live").needs.edges.count(exp.id);
        if val >= exp.count {
            continue;
        }
        errs.node(
            u8::from(id),
            name.as_str(),
            format!(
                "inputs.ins: field={}:{}, val={}, needs={}",
                exp.id,
                tree.name(exp.id),
                val,
                exp.count
            ),
        );
    }

    for exp in ins.iter() {
        tree.node_mut(id).expect("live").needs_dec(exp.id, exp.count);
    }

    let needs = tree.node(id).expect("live").needs.edges.clone();
    let mut elems = Edges::default();
    for need in needs.iter() {
        sum_elems(tree, need.id, &mut elems, need.count);
    }

    for exp in elems.iter() {
        let node = tree.node(id).expect("live");
        let val = node.needs.edges.count(exp.id);
        if val >= exp.count {
            continue;
        }

        let in_count = ins.count(exp.id);
        let base = node.base.needs.count(exp.id);
        errs.node(
            u8::from(id),
            name.as_str(),
            format!(
                "inputs.elems: field={}:{}, val={}, exp={} | {} >= {} {{ ins={} + elems={} }}",
                exp.id,
                tree.name(exp.id),
                val,
                exp.count,
                base,
                in_count + exp.count,
                in_count,
                exp.count
            ),
        );
    }

    for exp in elems.iter() {
        tree.node_mut(id).expect("live").needs_dec(exp.id, exp.count);
    }
}

pub fn inputs(tree: &mut Tree, errs: &mut Errors) {
    for id in NodeId::all() {
        let Some(node) = tree.node(id) else { continue };
        if node.kind == ItemType::Sys {
            continue;
        }

        basics(node, errs);
        inputs_needs(tree, id, errs);
    }
}

// -----------------------------------------------------------------------------
// outputs
// -----------------------------------------------------------------------------

fn delta(field: &str, node: &Node, value: u32, exp: u32, errs: &mut Errors) {
    if exp == 0 {
        errs.node(
            u8::from(node.id),
            node.name.as_str(),
            format!("field={}, exp={}, has={}", field, exp, value),
        );
        return;
    }

    let delta = (((exp as u64 * CHECK_MULT as u64) / CHECK_DIV as u64) as u32).max(1);
    let min = exp - exp.min(delta);
    let max = exp + delta;

    if value >= min && value <= max {
        return;
    }

    errs.node(
        u8::from(node.id),
        node.name.as_str(),
        format!(
            "field={}, exp={{{} +/- {}}}, has={{{} <= {} <= {}}}",
            field, exp, delta, min, value, max
        ),
    );
}

fn check_tape(node: &Node, errs: &mut Errors) {
    let ins: u64 = node.children.edges.iter().map(|e| e.count as u64).sum();
    let work = node.work.node as u64;
    let outs = (node.out.len() as u64).max(1);

    let total = ins + work + outs;
    if total > u8::MAX as u64 {
        errs.node(
            u8::from(node.id),
            node.name.as_str(),
            format!(
                "tape length: ins={} + work={} + outs={} = {}",
                ins, work, outs, total
            ),
        );
    }
}

fn check_children(tree: &Tree, node: &Node, errs: &mut Errors) {
    for edge in node.children.edges.iter() {
        if node.children.edges.len() == 1 && edge.count == 1 {
            errs.node(
                u8::from(node.id),
                node.name.as_str(),
                format!("singleton: id={}:{}", edge.id, tree.name(edge.id)),
            );
        }
    }
}

/// final needs must cover exactly the declared set, each count within
/// the tolerance band around its declared base
fn check_needs(tree: &Tree, node: &Node, errs: &mut Errors) {
    let base: Bits = node.base.needs.iter().map(|e| e.id).collect();

    let mut bits = node.needs.set;
    bits.minus(&base);
    for id in bits.iter() {
        errs.node(
            u8::from(node.id),
            node.name.as_str(),
            format!("missing needs: id={}:{}", id, tree.name(id)),
        );
    }

    let mut bits = base;
    bits.minus(&node.needs.set);
    for id in bits.iter() {
        errs.node(
            u8::from(node.id),
            node.name.as_str(),
            format!("extra needs: id={}:{}", id, tree.name(id)),
        );
    }

    let mut bits = base;
    bits.intersect(&node.needs.set);
    for id in bits.iter() {
        let base = node.base.needs.find(id).expect("intersected");
        let need = node.needs.edges.find(id).expect("intersected");
        let field = format!("need:{}:{}", id, tree.name(id));
        delta(&field, node, need.count, base.count, errs);
    }
}

/// informational: list dependencies a hand-authored node picked up from
/// generation, for human review of the synthesised layers
fn check_deps(tree: &Tree, node: &Node, set: &mut Bits) {
    fn walk(tree: &Tree, id: NodeId, set: &mut Bits, count: &mut usize, buffer: &mut String) {
        set.put(id);
        let node = tree.node(id).expect("live");
        for edge in node.children.edges.iter() {
            if set.has(edge.id) {
                continue;
            }
            let child = tree.node(edge.id).expect("live child");
            if child.kind.elem() {
                continue;
            }

            *count += 1;
            buffer.push_str(&format!(" {}:{}", child.id, child.name));
            walk(tree, edge.id, set, count, buffer);
        }
    }

    let mut count = 0;
    let mut buffer = String::new();
    walk(tree, node.id, set, &mut count, &mut buffer);
    if count == 0 {
        return;
    }

    log::info!(
        "[{}:{}] new-deps {}:[{} ]",
        node.id,
        node.name,
        count,
        buffer
    );
}

fn check_host(tree: &Tree, node: &Node, errs: &mut Errors) {
    if node.host.name.is_empty() {
        return;
    }
    if tree.symbol(&node.host.name).is_some() {
        return;
    }

    errs.node(
        u8::from(node.id),
        node.name.as_str(),
        format!("unknown host: {}", node.host.name),
    );
}

pub fn outputs(tree: &Tree, errs: &mut Errors) {
    let mut deps = Bits::default();

    for id in NodeId::all() {
        let Some(node) = tree.node(id) else { continue };
        if node.kind == ItemType::Sys || node.kind.elem() {
            continue;
        }

        check_tape(node, errs);
        check_children(tree, node, errs);
        if !node.generated && !node.base.needs.is_empty() {
            check_needs(tree, node, errs);
        }

        if !node.generated {
            check_deps(tree, node, &mut deps);
        }
    }

    for id in NodeId::all() {
        if let Some(node) = tree.node(id) {
            check_host(tree, node, errs);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Symbol;

    fn node_at(layer: u8, index: u8) -> Node {
        Node {
            id: NodeId::make(layer, index),
            name: Symbol::from("test"),
            ..Node::default()
        }
    }

    #[test]
    fn delta_tolerates_80_percent() {
        let node = node_at(2, 1);

        let mut errs = Errors::default();
        delta("need", &node, 10, 10, &mut errs);
        delta("need", &node, 2, 10, &mut errs);
        delta("need", &node, 18, 10, &mut errs);
        assert!(errs.is_empty());

        delta("need", &node, 1, 10, &mut errs);
        delta("need", &node, 19, 10, &mut errs);
        assert_eq!(errs.len(), 2);
    }

    #[test]
    fn delta_floors_at_one() {
        let node = node_at(2, 1);
        let mut errs = Errors::default();
        delta("need", &node, 2, 1, &mut errs);
        assert!(errs.is_empty());
        delta("need", &node, 3, 1, &mut errs);
        assert_eq!(errs.len(), 1);
    }

    #[test]
    fn tape_overflow_is_flagged() {
        let mut node = node_at(2, 1);
        node.children.inc(NodeId::from(0x11), 250);
        node.work.node = 10;

        let mut errs = Errors::default();
        check_tape(&node, &mut errs);
        assert_eq!(errs.len(), 1);
        assert!(errs.iter().next().unwrap().contains("tape length"));
    }

    #[test]
    fn tape_at_budget_passes() {
        let mut node = node_at(2, 1);
        node.children.inc(NodeId::from(0x11), 244);
        node.work.node = 10;

        let mut errs = Errors::default();
        check_tape(&node, &mut errs);
        assert!(errs.is_empty());
    }

    #[test]
    fn singleton_child_is_flagged() {
        let tree = Tree::new();
        let mut node = node_at(2, 1);
        node.children.inc(NodeId::from(0x11), 1);

        let mut errs = Errors::default();
        check_children(&tree, &node, &mut errs);
        assert_eq!(errs.len(), 1);

        let mut errs = Errors::default();
        node.children.inc(NodeId::from(0x11), 1);
        check_children(&tree, &node, &mut errs);
        assert!(errs.is_empty());
    }

    #[test]
    fn needs_diff_is_flagged() {
        let tree = Tree::new();
        let mut node = node_at(3, 1);
        node.base.needs.inc(NodeId::from(0x11), 4);
        node.base.needs.inc(NodeId::from(0x12), 4);
        node.needs.inc(NodeId::from(0x12), 4);
        node.needs.inc(NodeId::from(0x13), 4);

        let mut errs = Errors::default();
        check_needs(&tree, &node, &mut errs);

        let all: Vec<&str> = errs.iter().collect();
        assert_eq!(all.len(), 2);
        assert!(all.iter().any(|e| e.contains("missing needs: id=13")));
        assert!(all.iter().any(|e| e.contains("extra needs: id=11")));
    }
}
