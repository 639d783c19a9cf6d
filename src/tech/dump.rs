use super::edges::Edge;
use super::node::{ItemType, ListTag, Node, NodeId};
use super::tree::Tree;
use crate::config::Writer;
use crate::rng::Rng;
use std::path::Path;

// -----------------------------------------------------------------------------
// lisp
// -----------------------------------------------------------------------------

/// Emit the bill-of-materials as a shuffled tape: a seeded rng walks the
/// children and splits each count between the front and the back of the
/// tape, so machines consume inputs in a varied but reproducible order
/// without changing totals.
fn dump_tape(out: &mut Writer, tree: &Tree, node: &Node) {
    if node.children.edges.is_empty() {
        return;
    }

    let mut rng = Rng::from(u8::from(node.id) as u64);
    let mut ins = node.children.edges.clone();

    let mut tape = [Edge::default(); 256];
    let (mut front, mut back) = (0usize, tape.len());

    while !ins.is_empty() {
        let i = rng.uni(0, ins.len() as u64) as usize;
        let input = ins.get(i).expect("indexed within ins");

        if ins.len() == 1 {
            if front > 0 && tape[front - 1].id == input.id {
                tape[front - 1].count += input.count;
            } else if back < tape.len() && tape[back].id == input.id {
                // quirk: merges into the unused front slot, which the
                // emit loop skips; kept verbatim for output stability
                tape[front].count += input.count;
            } else {
                tape[front] = input;
                front += 1;
            }
            break;
        }

        // 0: front, 1: back, 2: both ends
        let op = rng.uni(0, if input.count > 1 { 3 } else { 2 });
        let mut max = input.count as u64;
        if op == 2 {
            max /= 2;
        }
        let edge = Edge {
            id: input.id,
            count: rng.uni(0, max) as u32 + 1,
        };

        if op == 0 || op == 2 {
            if front > 0 && tape[front - 1].id == edge.id {
                tape[front - 1].count += edge.count;
            } else {
                tape[front] = edge;
                front += 1;
            }
            ins.dec(edge.id, edge.count);
        }

        if op == 1 || op == 2 {
            if back < tape.len() && tape[back].id == edge.id {
                tape[back].count += edge.count;
            } else {
                back -= 1;
                tape[back] = edge;
            }
            ins.dec(edge.id, edge.count);
        }
    }

    out.open_line();
    out.symbol_str("in");

    let mut i = 0;
    loop {
        if i == front {
            i = back;
        }
        if i == tape.len() {
            break;
        }

        let edge = tape[i];
        let child = tree.node(edge.id).expect("live child");
        out.open_line();
        out.symbol(&child.name);
        out.u64(edge.count as u64);
        out.close();

        i += 1;
    }

    out.close();
}

fn dump_lisp_node(out: &mut Writer, tree: &Tree, node: &Node) {
    out.open();
    out.symbol(&node.name);

    {
        out.open_line();
        out.symbol_str("info");
        out.field_str("type", &node.kind.to_string());
        if node.tier != 0 {
            out.field_u64("tier", node.tier as u64);
        }
        if !node.syllable.is_empty() {
            out.field_sym("syllable", &node.syllable);
        }
        if !node.config.is_empty() {
            out.field_sym("config", &node.config);
        }
        if node.list != ListTag::Nil {
            out.field_str("list", &node.list.to_string());
        }
        out.close();
    }

    if node.kind == ItemType::Sys {
        out.close();
        out.gap();
        return;
    }

    {
        out.open_line();
        out.symbol_str("specs");

        out.open();
        out.symbol_str("lab-bits");
        out.symbol_str("u8");
        out.u64(node.lab.bits as u64);
        out.close();

        out.open();
        out.symbol_str("lab-work");
        out.symbol_str("work");
        out.u64(node.lab.work as u64);
        out.close();

        out.open();
        out.symbol_str("lab-energy");
        out.symbol_str("energy");
        out.u64(node.lab.energy as u64);
        out.close();

        if !node.specs.is_empty() {
            out.line();
            out.symbol_str(&node.specs);
        }
        out.close();
    }

    {
        out.open_line();
        out.symbol_str("tape");
        out.field_u64("layer", node.id.layer() as u64);
        out.field_u64("work", node.work.node as u64);
        out.field_u64("energy", node.energy.node as u64);
        out.field_sym("host", &tree.name(node.host.id));

        dump_tape(out, tree, node);

        // synthesised nodes are never reached by the out-div scan and
        // keep an empty out set; they produce one of themselves
        out.open_line();
        out.symbol_str("out");
        if node.out.is_empty() {
            out.open();
            out.symbol(&node.name);
            out.u64(1);
            out.close();
        }
        for edge in node.out.iter() {
            out.open();
            out.symbol(&tree.name(edge.id));
            out.u64(edge.count as u64);
            out.close();
        }
        out.close();

        out.close();
    }

    {
        out.open_line();
        out.symbol_str("dbg");

        out.open_line();
        out.symbol_str("info");
        out.open();
        out.symbol_str("id");
        out.symbol_str(&format!("0x{:02x}", u8::from(node.id)));
        out.close();
        out.field_u64("layer", node.id.layer() as u64);
        out.close();

        out.open_line();
        out.symbol_str("work");
        out.field_u64("min", node.work.min as u64);
        out.field_u64("total", node.work.total as u64);
        out.close();

        out.open_line();
        out.symbol_str("energy");
        out.u64(node.energy.total as u64);
        out.close();

        out.open_line();
        out.symbol_str("children");
        out.u64(node.children.edges.len() as u64);
        for edge in node.children.edges.iter() {
            out.open_line();
            out.symbol_str(&format!("0x{:02x}", u8::from(edge.id)));
            out.symbol(&tree.name(edge.id));
            out.u64(edge.count as u64);
            out.close();
        }
        out.close();

        out.open_line();
        out.symbol_str("needs");
        out.u64(node.needs.edges.len() as u64);
        for edge in node.needs.edges.iter() {
            out.open_line();
            out.symbol_str(&format!("0x{:02x}", u8::from(edge.id)));
            out.symbol(&tree.name(edge.id));
            out.u64(edge.count as u64);
            out.close();
        }
        out.close();

        out.close();
    }

    out.close();
    out.gap();
}

// -----------------------------------------------------------------------------
// dot
// -----------------------------------------------------------------------------

fn dump_dot_node(out: &mut Writer, node: &Node) {
    let color = match node.kind {
        ItemType::Natural => "blue",
        ItemType::Synthetic => "purple",
        ItemType::Active => "red",
        ItemType::Logistics => "orange",
        ItemType::Passive => "green",
        _ => return,
    };

    out.write(&format!(
        "subgraph {{ node [color={}; label=\"{}:{}\"]; \"{}\" }}\n",
        color, node.id, node.name, node.id
    ));

    for child in node.children.edges.iter() {
        out.write(&format!(
            "\"{}\" -> \"{}\" [headlabel=\"{}\"; arrowsize=0.5]\n",
            child.id, node.id, child.count
        ));
    }

    out.write("\n");
}

// -----------------------------------------------------------------------------
// dump
// -----------------------------------------------------------------------------

pub fn dump(tree: &Tree, src: &Path, output: &Path) -> anyhow::Result<()> {
    let mut lisp = Writer::create(&src.join("tech.lisp"), crate::DUMP_CAP);

    let mut dot = Writer::create(&output.join("tech.dot"), crate::DUMP_CAP);
    dot.write("strict digraph {\n\n");

    for id in NodeId::all() {
        let Some(node) = tree.node(id) else { continue };
        dump_lisp_node(&mut lisp, tree, node);
        dump_dot_node(&mut dot, node);
    }

    dot.write("}\n");

    lisp.save()?;
    dot.save()?;
    Ok(())
}
