use super::{Files, State};
use crate::config::{Reader, Symbol};
use crate::tech::bits::Bits;
use crate::tech::node::NodeId;

/// `(info (rank n) (elems …) (tech …))` research metadata riding inside
/// a tape section
fn info_section(state: &mut State, files: &mut Files, input: &mut Reader, item_enum: &Symbol) {
    let mut rank = 0u8;
    let mut elems = [0u16; 12];
    let mut tech = Bits::default();

    while !input.peek_close() {
        input.open();

        let key = input.symbol();
        match key.as_str() {
            "rank" => {
                rank = input.u64() as u8;
                input.close();
            }
            "elems" => {
                while !input.peek_close() {
                    input.open();
                    let elem = input.symbol();
                    let count = input.u64();

                    let atom = state.atoms.value(&elem).unwrap_or(0);
                    if (atom as usize) < elems.len() {
                        elems[atom as usize] = count as u16;
                    }

                    input.close();
                }
                input.close();
            }
            "tech" => {
                while !input.peek_close() {
                    input.open();
                    let tech_item = input.symbol();

                    match state.atoms.value(&tech_item) {
                        Some(atom) if atom > 0 && atom < u8::MAX as i64 => {
                            tech.put(NodeId::from(atom as u8));
                        }
                        _ => input.err(format!("unknown tech item '{}'", tech_item)),
                    }

                    input.close();
                }
                input.close();
            }
            _ => {
                input.goto_close();
            }
        }
    }

    files.tapes_info.write(&format!(
        "\ntape_info_register_begin(item_{}) {{ .rank = {} }};\n",
        item_enum, rank
    ));

    for id in tech.iter() {
        let name = state.atoms.name(u8::from(id) as i64).expect("registered");
        files.tapes_info.write(&format!(
            "  tape_info_register_tech({});\n",
            Symbol::concat("item-", name.as_str()).to_enum()
        ));
    }

    for (atom, &count) in elems.iter().enumerate().skip(1) {
        if count == 0 {
            continue;
        }
        let name = state.atoms.name(atom as i64).expect("registered");
        files.tapes_info.write(&format!(
            "  tape_info_register_elems({}, {});\n",
            Symbol::concat("item-", name.as_str()).to_enum(),
            count
        ));
    }

    files.tapes_info.write("tape_info_register_end()\n");
}

/// flatten one `(tape …)` section into its registration fragment: the
/// consume slots, then the emit slots, bounded at 255 total
pub fn section(state: &mut State, files: &mut Files, input: &mut Reader, item: &Symbol) {
    let mut work = 0u8;
    let mut energy = 0u32;
    let mut host = Symbol::default();

    let mut inputs: Vec<Symbol> = Vec::new();
    let mut outputs: Vec<Symbol> = Vec::new();

    let item_enum = item.to_enum();

    while !input.peek_close() {
        input.open();

        let key = input.symbol();
        match key.as_str() {
            "layer" => {
                input.u64();
                input.close();
                continue;
            }
            "work" => {
                let value = input.word();
                if !(0..=u8::MAX as i64).contains(&value) {
                    input.err(format!("invalid work value '{:x}'", value));
                }
                work = value as u8;
                input.close();
                continue;
            }
            "energy" => {
                let value = input.word();
                if !(0..=u32::MAX as i64).contains(&value) {
                    input.err(format!("invalid energy value '{:x}'", value));
                }
                energy = value as u32;
                input.close();
                continue;
            }
            "host" => {
                let value = input.symbol();
                if state.atoms.value(&value).is_none() {
                    input.err(format!("unknown host atom '{}'", value));
                }
                host = value.to_enum();
                input.close();
                continue;
            }
            "info" => {
                info_section(state, files, input, &item_enum);
                input.close();
                continue;
            }
            _ => {}
        }

        let (is_input, is_output) = (key.as_str() == "in", key.as_str() == "out");
        if !is_input && !is_output {
            input.err(format!("unknown field '{}'", key));
            input.goto_close();
            continue;
        }

        while !input.peek_close() {
            let (entry, mut count) = if input.peek_open() {
                input.open();
                let entry = input.symbol();
                let count = if input.peek_close() { 1 } else { input.word() };
                input.close();
                (entry, count)
            } else {
                (input.symbol(), 1)
            };

            if state.atoms.value(&entry).is_none() {
                input.err(format!("unknown atom '{}'", entry));
            }

            if !(1..=u8::MAX as i64).contains(&count) {
                input.err(format!("invalid count '{:x}'", count));
                count = 0;
            }

            if count as usize + inputs.len() + outputs.len() > u8::MAX as usize {
                input.err(format!(
                    "tape overflow: {} + {} + {}",
                    count,
                    inputs.len(),
                    outputs.len()
                ));
                count = 0;
            }

            let entry = entry.to_enum();
            for _ in 0..count {
                if is_input {
                    inputs.push(entry);
                }
                if is_output {
                    outputs.push(entry);
                }
            }
        }

        input.close();
    }
    input.close();

    files.tapes.write(&format!(
        "\ntape_register_begin(item_{}, {}) {{\n    \
         .id = item_{},\n    \
         .host = {},\n    \
         .work = {},\n    \
         .energy = {},\n    \
         .inputs = {},\n    \
         .outputs = {},\n  }};\n",
        item_enum,
        inputs.len() + outputs.len(),
        item_enum,
        host,
        work,
        energy,
        inputs.len(),
        outputs.len()
    ));

    for (ix, entry) in inputs.iter().chain(outputs.iter()).enumerate() {
        files.tapes.write(&format!(
            "  tape_register_ix({:3}, {});\n",
            ix, entry
        ));
    }

    files.tapes.write("tape_register_end()\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn emitted(src: &str) -> (Files, State) {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut files = Files::create(dir.path());

        let mut state = State::default();
        for (name, atom) in [("elem-a", 1), ("elem-b", 2), ("widget", 3), ("printer", 4)] {
            state.atoms.set(&Symbol::from(name), atom);
        }

        let mut input = Reader::from_str(Path::new("tech.lisp"), src.to_string());
        input.open();
        let item = Symbol::from("widget");
        section(&mut state, &mut files, &mut input, &item);
        state.merge(input);
        (files, state)
    }

    #[test]
    fn flattens_counts_into_slots() {
        let (files, state) = emitted(
            "((layer 2) (work 5) (energy 7) (host printer)
              (in (elem-a 2) (elem-b 1))
              (out (widget 1)))",
        );
        assert!(state.errs.is_empty());

        let fragment = files.tapes.buffer();
        assert!(fragment.contains("tape_register_begin(item_widget, 4)"));
        assert!(fragment.contains(".host = printer,"));
        assert!(fragment.contains(".work = 5,"));
        assert!(fragment.contains(".inputs = 3,"));
        assert!(fragment.contains(".outputs = 1,"));
        assert!(fragment.contains("tape_register_ix(  0, elem_a);"));
        assert!(fragment.contains("tape_register_ix(  1, elem_a);"));
        assert!(fragment.contains("tape_register_ix(  2, elem_b);"));
        assert!(fragment.contains("tape_register_ix(  3, widget);"));
    }

    #[test]
    fn bare_entries_count_once() {
        let (files, state) = emitted("((in elem-a) (out (widget 1)))");
        assert!(state.errs.is_empty());
        assert!(files.tapes.buffer().contains(".inputs = 1,"));
    }

    #[test]
    fn unknown_atoms_are_errors() {
        let (_, state) = emitted("((in (ghost 2)))");
        assert_eq!(state.errs.len(), 1);
        assert!(state.errs.iter().next().unwrap().contains("unknown atom 'ghost'"));
    }

    #[test]
    fn overflowing_tapes_are_errors() {
        let (_, state) = emitted("((in (elem-a 200) (elem-b 100)))");
        assert!(state
            .errs
            .iter()
            .any(|e| e.contains("tape overflow")));
    }

    #[test]
    fn info_emits_research_metadata() {
        let (files, state) = emitted(
            "((info (rank 2) (elems (elem-a 8) (elem-b 4)) (tech (printer)))
              (in (elem-a 1) (elem-b 1)) (out (widget 1)))",
        );
        assert!(state.errs.is_empty());

        let fragment = files.tapes_info.buffer();
        assert!(fragment.contains("tape_info_register_begin(item_widget) { .rank = 2 };"));
        assert!(fragment.contains("tape_info_register_tech(item_printer);"));
        assert!(fragment.contains("tape_info_register_elems(item_elem_a, 8);"));
        assert!(fragment.contains("tape_info_register_elems(item_elem_b, 4);"));
        assert!(fragment.contains("tape_info_register_end()"));
    }
}
