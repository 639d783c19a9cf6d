use super::node::{ItemType, ListTag, NodeId};
use super::tree::Tree;
use crate::config::{Reader, Symbol};

#[derive(Default)]
struct Info {
    tier: u8,
    kind: ItemType,
    syllable: Symbol,
    config: Symbol,
    list: ListTag,
    specs: String,
}

fn parse_info(input: &mut Reader, info: &mut Info) {
    while !input.peek_close() {
        input.open();

        let field = input.symbol();
        match field.as_str() {
            "tier" => {
                info.tier = input.u64() as u8;
                input.close();
            }
            "type" => {
                if let Some(kind) = input.symbol_table(&ItemType::TABLE) {
                    info.kind = kind;
                }
                input.close();
            }
            "syllable" => {
                info.syllable = input.symbol();
                input.close();
            }
            "config" => {
                info.config = input.symbol();
                input.close();
            }
            "list" => {
                if let Some(list) = input.symbol_table(&ListTag::TABLE) {
                    info.list = list;
                }
                input.close();
            }
            _ => {
                input.goto_close();
            }
        }
    }
    input.close();
}

#[derive(Clone, Copy)]
enum TapeField {
    Needs,
    In,
    Out,
}

/// one `(sym count)` or bare `sym` entry of a needs/in/out list
fn parse_entry(input: &mut Reader) -> (Symbol, u32) {
    if !input.peek_open() {
        return (input.symbol(), 1);
    }
    input.open();
    let sym = input.symbol();
    let count = if input.peek_close() { 1 } else { input.u64() as u32 };
    input.close();
    (sym, count)
}

fn parse_tape(tree: &mut Tree, input: &mut Reader, item: &Symbol) -> Option<NodeId> {
    let mut node: Option<NodeId> = None;

    while !input.peek_close() {
        input.open();

        let field = input.symbol();

        if field.as_str() == "layer" {
            if node.is_some() {
                input.err(format!("duplicate layer field in '{}'", item));
                input.goto_close();
                continue;
            }

            let layer = input.u64();
            if layer == 0 || layer >= crate::LAYER_CAP as u64 {
                input.err(format!("invalid layer '{}' in '{}'", layer, item));
                input.goto_close();
                continue;
            }

            let id = tree.insert(layer as u8, item);
            assert!(id.is_some(), "layer {} full", layer);
            node = id;

            input.close();
            continue;
        }

        let Some(id) = node else {
            input.err(format!(
                "missing layer field before '{}' in '{}'",
                field, item
            ));
            input.goto_close();
            continue;
        };

        match field.as_str() {
            "host" => {
                let host = input.symbol();
                tree.node_mut(id).expect("inserted").host.name = host;
                input.close();
                continue;
            }
            "work" => {
                let work = input.u64() as u32;
                tree.node_mut(id).expect("inserted").work.node = work;
                input.close();
                continue;
            }
            "energy" => {
                let energy = input.u64() as u32;
                tree.node_mut(id).expect("inserted").energy.node = energy;
                input.close();
                continue;
            }
            _ => {}
        }

        let tape = match field.as_str() {
            "needs" => TapeField::Needs,
            "in" => TapeField::In,
            "out" => TapeField::Out,
            _ => {
                input.goto_close();
                continue;
            }
        };

        while !input.peek_close() {
            let (sym, count) = parse_entry(input);

            let Some(child) = tree.symbol(&sym) else {
                input.err(format!("unknown tape entry '{}' in '{}'", sym, item));
                continue;
            };
            if count == 0 {
                input.err(format!("invalid count for '{}' in '{}'", sym, item));
                continue;
            }

            let node = tree.node_mut(id).expect("inserted");
            match tape {
                TapeField::Needs => node.needs_inc(child, count),
                TapeField::In => node.child_inc(child, count),
                TapeField::Out => node.out.inc(child, count),
            }
        }

        input.close();
    }
    input.close();

    if node.is_none() {
        input.err(format!("missing layer field in '{}'", item));
        return None;
    }

    let node_ref = tree.node_mut(node.unwrap()).expect("inserted");
    node_ref.base.input = node_ref.children.edges.clone();
    node_ref.base.needs = node_ref.needs.edges.clone();

    node
}

/// populate the tree from a hand-authored tech description. Schema
/// errors accumulate in the reader's sink; broken forms are skipped.
pub fn parse(tree: &mut Tree, input: &mut Reader) {
    while !input.peek_eof() {
        input.open();

        let item = input.symbol();
        if tree.symbol(&item).is_some() {
            input.err(format!("duplicate node '{}'", item));
            input.goto_close();
            continue;
        }

        let mut info = Info::default();
        let mut node: Option<NodeId> = None;

        while !input.peek_close() {
            input.open();

            let field = input.symbol();
            match field.as_str() {
                "info" => parse_info(input, &mut info),
                "specs" => info.specs = input.until_close(),
                "tape" => {
                    if info.kind == ItemType::Nil {
                        input.err(format!(
                            "missing 'info.type' field before 'tape' field for '{}'",
                            item
                        ));
                        input.goto_close();
                        continue;
                    }
                    node = parse_tape(tree, input, &item);
                }
                _ => {
                    input.goto_close();
                }
            }
        }

        input.close();

        if let Some(id) = node {
            let node = tree.node_mut(id).expect("inserted");
            node.kind = info.kind;
            node.tier = info.tier;
            node.syllable = info.syllable;
            node.config = info.config;
            node.list = info.list;
            node.specs = info.specs;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Errors;
    use std::path::Path;

    fn parsed(src: &str) -> (Tree, Errors) {
        let mut tree = Tree::new();
        let mut input = Reader::from_str(Path::new("test.lisp"), src.to_string());
        parse(&mut tree, &mut input);
        (tree, input.into_errors())
    }

    const ELEMS: &str = "
        (elem-a (info (type natural) (syllable al))
                (tape (layer 1) (work 1) (energy 1) (out (elem-a 1))))
        (elem-b (info (type natural) (syllable bo))
                (tape (layer 1) (work 1) (energy 1) (out (elem-b 1))))";

    #[test]
    fn parses_elements() {
        let (tree, errs) = parsed(ELEMS);
        assert!(errs.is_empty());

        let id = tree.symbol(&Symbol::from("elem-a")).unwrap();
        let node = tree.node(id).unwrap();
        assert_eq!(node.kind, ItemType::Natural);
        assert_eq!(node.syllable.as_str(), "al");
        assert_eq!(id.layer(), 1);
        assert_eq!(node.work.node, 1);
        assert_eq!(node.out.count(id), 1);
    }

    #[test]
    fn parses_recipes_and_snapshots_base() {
        let src = ELEMS.to_string()
            + "
        (widget (info (type passive) (tier 2))
                (specs (state u8 4))
                (tape (layer 2)
                      (needs (elem-a 4) elem-b)
                      (in (elem-a 2))
                      (out (widget 1))))";
        let (tree, errs) = parsed(&src);
        assert!(errs.is_empty());

        let a = tree.symbol(&Symbol::from("elem-a")).unwrap();
        let b = tree.symbol(&Symbol::from("elem-b")).unwrap();
        let id = tree.symbol(&Symbol::from("widget")).unwrap();
        let node = tree.node(id).unwrap();

        assert_eq!(node.tier, 2);
        assert_eq!(node.specs, "(state u8 4)");
        assert_eq!(node.needs.edges.count(a), 4);
        assert_eq!(node.needs.edges.count(b), 1);
        assert_eq!(node.children.edges.count(a), 2);
        assert_eq!(node.base.needs, node.needs.edges);
        assert_eq!(node.base.input, node.children.edges);
        assert!(node.needs.set.has(a) && node.needs.set.has(b));
    }

    #[test]
    fn skips_unknown_fields() {
        let with = ELEMS.to_string()
            + "
        (widget (info (type passive) (foobar 42))
                (tape (layer 2) (foobar 42) (needs (elem-a 4)) (out (widget 1))))";
        let without = ELEMS.to_string()
            + "
        (widget (info (type passive))
                (tape (layer 2) (needs (elem-a 4)) (out (widget 1))))";

        let (lhs, errs) = parsed(&with);
        assert!(errs.is_empty());
        let (rhs, _) = parsed(&without);

        let id = lhs.symbol(&Symbol::from("widget")).unwrap();
        assert_eq!(id, rhs.symbol(&Symbol::from("widget")).unwrap());
        let (lhs, rhs) = (lhs.node(id).unwrap(), rhs.node(id).unwrap());
        assert_eq!(lhs.needs.edges, rhs.needs.edges);
        assert_eq!(lhs.kind, rhs.kind);
    }

    #[test]
    fn requires_type_before_tape() {
        let (tree, errs) = parsed("(widget (tape (layer 2) (work 1)))");
        assert_eq!(errs.len(), 1);
        assert!(errs.iter().next().unwrap().contains("info.type"));
        assert!(tree.symbol(&Symbol::from("widget")).is_none());
    }

    #[test]
    fn requires_layer_first() {
        let (_, errs) = parsed("(widget (info (type passive)) (tape (work 1) (layer 2)))");
        assert!(!errs.is_empty());
        assert!(errs.iter().next().unwrap().contains("missing layer field"));
    }

    #[test]
    fn rejects_duplicate_layer() {
        let (_, errs) =
            parsed("(widget (info (type passive)) (tape (layer 2) (layer 3)))");
        assert_eq!(errs.len(), 1);
        assert!(errs.iter().next().unwrap().contains("duplicate layer"));
    }

    #[test]
    fn rejects_duplicate_nodes() {
        let src = "
        (widget (info (type passive)) (tape (layer 2)))
        (widget (info (type passive)) (tape (layer 3)))";
        let (tree, errs) = parsed(src);
        assert_eq!(errs.len(), 1);
        assert!(errs.iter().next().unwrap().contains("duplicate node"));
        let id = tree.symbol(&Symbol::from("widget")).unwrap();
        assert_eq!(id.layer(), 2);
    }

    #[test]
    fn rejects_unknown_tape_entries() {
        let (_, errs) = parsed(
            "(widget (info (type passive)) (tape (layer 2) (needs (ghost 4))))",
        );
        assert_eq!(errs.len(), 1);
        assert!(errs.iter().next().unwrap().contains("unknown tape entry 'ghost'"));
    }
}
