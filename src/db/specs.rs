use super::Files;
use crate::config::{Reader, Symbol};

/// the three lab specs have fixed slots in the spec word; everything
/// else sequences from zero within its item
fn is_lab(spec: &Symbol) -> bool {
    matches!(spec.as_str(), "lab-bits" | "lab-work" | "lab-energy")
}

/// emit the spec enum, registration and value fragments for one item's
/// `(specs …)` section
pub fn section(files: &mut Files, input: &mut Reader, item: &Symbol) {
    let item_enum = item.to_enum();

    let mut seq = 0u8;
    while !input.peek_close() {
        input.open();

        let spec = input.symbol();
        let spec_enum = spec.to_enum();

        if is_lab(&spec) {
            files.specs_enum.write(&format!(
                "\nspec_{}_{} = make_spec(item_{}, spec_{}),",
                item_enum, spec_enum, item_enum, spec_enum
            ));
        } else {
            files.specs_enum.write(&format!(
                "\nspec_{}_{} = make_spec(item_{}, 0x{:x}),",
                item_enum, spec_enum, item_enum, seq
            ));
            seq += 1;
        }

        let kind = input.symbol();

        if kind.as_str() == "fn" {
            files.specs_register.write(&format!(
                "spec_register_fn(spec_{}_{}, \"spec-{}-{}\", spec_{}_{}_fn);\n",
                item_enum, spec_enum, item, spec, item_enum, spec_enum
            ));
            input.close();
            continue;
        }

        files.specs_register.write(&format!(
            "spec_register_var(spec_{}_{}, \"spec-{}-{}\", im_{}_{});\n",
            item_enum, spec_enum, item, spec, item_enum, spec_enum
        ));

        let mut is_enum = false;
        let ctype = match kind.as_str() {
            "word" => "vm_word",
            "item" => "enum item",
            "work" => "im_work",
            "u8" => "uint8_t",
            "u16" => "uint16_t",
            "u32" => "uint32_t",
            "energy" => "im_energy",
            "enum" => {
                is_enum = true;
                ""
            }
            _ => {
                input.err(format!("unknown type '{}'", kind));
                input.goto_close();
                continue;
            }
        };

        if is_enum {
            files
                .specs_value
                .write(&format!("enum {{ im_{}_{} = ", item_enum, spec_enum));
        } else {
            files.specs_value.write(&format!(
                "static const {} im_{}_{} = ",
                ctype, item_enum, spec_enum
            ));
        }

        let token = input.peek().kind();
        match token {
            "number" => {
                let value = input.word();
                files.specs_value.write(&format!("0x{:x}", value));
            }
            "atom" => {
                let atom = input.atom_symbol().to_enum();
                files.specs_value.write(atom.as_str());
            }
            _ => {
                input.err(format!("unexpected token type: {}", token));
                input.goto_close();
                continue;
            }
        }

        files.specs_value.write(if is_enum { " };\n" } else { ";\n" });

        input.close();
    }

    input.close();

    files.specs_enum.write("\n");
    files.specs_value.write("\n");
    files.specs_register.write("\n");
}

#[cfg(test)]
mod tests {
    use super::super::State;
    use super::*;
    use std::path::Path;

    fn emitted(src: &str) -> (Files, State) {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut files = Files::create(dir.path());
        let mut state = State::default();

        let mut input = Reader::from_str(Path::new("tech.lisp"), src.to_string());
        input.open();
        section(&mut files, &mut input, &Symbol::from("lab-rig"));
        state.merge(input);
        (files, state)
    }

    #[test]
    fn lab_specs_use_fixed_slots() {
        let (files, state) = emitted("((lab-bits u8 8) (state u8 2) (queue u16 4))");
        assert!(state.errs.is_empty());

        let fragment = files.specs_enum.buffer();
        assert!(fragment.contains("spec_lab_rig_lab_bits = make_spec(item_lab_rig, spec_lab_bits),"));
        assert!(fragment.contains("spec_lab_rig_state = make_spec(item_lab_rig, 0x0),"));
        assert!(fragment.contains("spec_lab_rig_queue = make_spec(item_lab_rig, 0x1),"));
    }

    #[test]
    fn values_are_typed_constants() {
        let (files, state) = emitted("((state u8 2) (cap energy 0x20))");
        assert!(state.errs.is_empty());

        let fragment = files.specs_value.buffer();
        assert!(fragment.contains("static const uint8_t im_lab_rig_state = 0x2;"));
        assert!(fragment.contains("static const im_energy im_lab_rig_cap = 0x20;"));
    }

    #[test]
    fn fn_specs_register_callbacks() {
        let (files, state) = emitted("((launch fn))");
        assert!(state.errs.is_empty());

        let fragment = files.specs_register.buffer();
        assert!(fragment
            .contains("spec_register_fn(spec_lab_rig_launch, \"spec-lab-rig-launch\", spec_lab_rig_launch_fn);"));
    }

    #[test]
    fn atom_values_become_enums() {
        let (files, state) = emitted("((target item !item-printer))");
        assert!(state.errs.is_empty());
        assert!(files
            .specs_value
            .buffer()
            .contains("static const enum item im_lab_rig_target = item_printer;"));
    }

    #[test]
    fn unknown_spec_types_are_errors() {
        let (_, state) = emitted("((state blob 2))");
        assert_eq!(state.errs.len(), 1);
        assert!(state.errs.iter().next().unwrap().contains("unknown type 'blob'"));
    }
}
