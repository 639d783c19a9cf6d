use super::{ItemInfo, Order, State};
use crate::config::Reader;
use crate::tech::node::{ItemType, ListTag};
use std::path::Path;

/// the layer rides in the debug block of the canonical database
fn dbg_layer(input: &mut Reader) -> u8 {
    let mut layer = 0;

    while !input.peek_close() {
        input.open();

        let key = input.symbol();
        if key.as_str() != "info" {
            input.goto_close();
            continue;
        }

        while !input.peek_close() {
            input.open();
            let field = input.symbol();
            match field.as_str() {
                "layer" => {
                    layer = input.u64() as u8;
                    input.close();
                }
                _ => {
                    input.goto_close();
                }
            }
        }
        input.close();
    }
    input.close();

    layer
}

fn harvest(state: &mut State, input: &mut Reader) {
    while !input.peek_eof() {
        input.open();

        let mut info = ItemInfo {
            name: input.symbol(),
            ..ItemInfo::default()
        };

        input.open();
        input.expect_str("info");

        while !input.peek_close() {
            input.open();

            let field = input.symbol();
            match field.as_str() {
                "type" => {
                    if let Some(kind) = input.symbol_table(&ItemType::TABLE) {
                        info.kind = kind;
                    }
                    input.close();
                }
                "list" => {
                    if let Some(list) = input.symbol_table(&ListTag::TABLE) {
                        info.list = list;
                    }
                    input.close();
                }
                "order" => {
                    if let Some(order) = input.symbol_table(&Order::TABLE) {
                        info.order = order;
                    }
                    input.close();
                }
                "config" => {
                    info.config = input.symbol();
                    input.close();
                }
                _ => {
                    input.goto_close();
                }
            }
        }
        input.close();

        // skip the rest of the object, fishing the layer out of dbg
        while !input.peek_close() {
            input.open();
            let section = input.symbol();
            match section.as_str() {
                "dbg" => info.layer = dbg_layer(input),
                _ => {
                    input.goto_close();
                }
            }
        }
        input.close();

        assert!(
            info.kind != ItemType::Nil,
            "item '{}' without a type",
            info.name
        );
        state.info.push(info);
    }
}

/// harvest every item's info (and its layer) from the canonical tech
/// database; the tape and specs sections are re-read by their own
/// generators later
pub fn items(state: &mut State, path: &Path) -> anyhow::Result<()> {
    let mut input = Reader::from_path(path)?;
    harvest(state, &mut input);
    state.merge(input);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn harvested(src: &str) -> State {
        let mut state = State::default();
        let mut input = Reader::from_str(Path::new("tech.lisp"), src.to_string());
        harvest(&mut state, &mut input);
        state.merge(input);
        state
    }

    #[test]
    fn harvests_info_and_layer() {
        let state = harvested(
            "(widget
               (info (type passive) (list factory) (order first))
               (specs (lab-bits u8 4))
               (tape (layer 3) (work 2))
               (dbg (info (id 0x31) (layer 3)) (work (min 2) (total 9))))",
        );
        assert!(state.errs.is_empty());
        assert_eq!(state.info.len(), 1);

        let info = &state.info[0];
        assert_eq!(info.name.as_str(), "widget");
        assert_eq!(info.kind, ItemType::Passive);
        assert_eq!(info.list, ListTag::Factory);
        assert_eq!(info.order, Order::First);
        assert_eq!(info.layer, 3);
    }

    #[test]
    fn defaults_survive_sparse_info() {
        let state = harvested("(bone (info (type natural)) (tape (layer 1)))");
        assert!(state.errs.is_empty());
        let info = &state.info[0];
        assert_eq!(info.order, Order::Nil);
        assert_eq!(info.list, ListTag::Nil);
        assert_eq!(info.layer, 0);
    }
}
