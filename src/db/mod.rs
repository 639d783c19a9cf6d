//! The db stage: reads the canonical tech database plus the io and star
//! description files and emits the C header fragments the game build
//! concatenates into its generated headers.

pub mod io;
pub mod items;
pub mod parse;
pub mod specs;
pub mod stars;
pub mod tapes;

use crate::config::{Atoms, Errors, Reader, Symbol, Writer};
use crate::tech::node::{ItemType, ListTag};
use std::path::Path;

/// explicit placement override within an item type's enum range
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Order {
    First,
    #[default]
    Nil,
    Last,
}

impl Order {
    pub const TABLE: [(&'static str, Order); 3] = [
        ("nil", Order::Nil),
        ("first", Order::First),
        ("last", Order::Last),
    ];
}

/// one item harvested from the canonical tech database
#[derive(Debug, Clone, Default)]
pub struct ItemInfo {
    pub name: Symbol,
    pub kind: ItemType,
    pub list: ListTag,
    pub order: Order,
    pub config: Symbol,
    pub layer: u8,
    pub atom: i64,
}

#[derive(Default)]
pub struct State {
    pub atoms: Atoms,
    pub info: Vec<ItemInfo>,
    pub errs: Errors,
}

impl State {
    fn merge(&mut self, input: Reader) {
        self.errs.merge(input.into_errors());
    }
}

/// one buffered writer per fragment; nothing reaches disk on error
pub struct Files {
    pub item: Writer,
    pub im_register: Writer,
    pub im_includes: Writer,
    pub im_control: Writer,
    pub im_factory: Writer,
    pub specs_enum: Writer,
    pub specs_register: Writer,
    pub specs_value: Writer,
    pub tapes: Writer,
    pub tapes_info: Writer,
    pub io_enum: Writer,
    pub ioe_enum: Writer,
    pub io_register: Writer,
    pub stars_prefix: Writer,
    pub stars_suffix: Writer,
    pub stars_rolls: Writer,
}

impl Files {
    fn create(dir: &Path) -> Self {
        let file = |name: &str| Writer::create(&dir.join(format!("{}.h", name)), crate::FRAGMENT_CAP);
        Files {
            item: file("item"),
            im_register: file("im_register"),
            im_includes: file("im_includes"),
            im_control: file("im_control"),
            im_factory: file("im_factory"),
            specs_enum: file("specs_enum"),
            specs_register: file("specs_register"),
            specs_value: file("specs_value"),
            tapes: file("tapes"),
            tapes_info: file("tapes_info"),
            io_enum: file("io_enum"),
            ioe_enum: file("ioe_enum"),
            io_register: file("io_register"),
            stars_prefix: file("stars_prefix"),
            stars_suffix: file("stars_suffix"),
            stars_rolls: file("stars_rolls"),
        }
    }

    fn save(self) -> anyhow::Result<()> {
        self.item.save()?;
        self.im_register.save()?;
        self.im_includes.save()?;
        self.im_control.save()?;
        self.im_factory.save()?;
        self.specs_enum.save()?;
        self.specs_register.save()?;
        self.specs_value.save()?;
        self.tapes.save()?;
        self.tapes_info.save()?;
        self.io_enum.save()?;
        self.ioe_enum.save()?;
        self.io_register.save()?;
        self.stars_prefix.save()?;
        self.stars_suffix.save()?;
        self.stars_rolls.save()?;
        Ok(())
    }
}

/// walk the canonical database once more and feed the specs and tape
/// sections to their fragment generators
fn specs_tapes(state: &mut State, files: &mut Files, path: &Path) -> anyhow::Result<()> {
    let mut input = Reader::from_path(path)?;

    while !input.peek_eof() {
        input.open();
        let item = input.symbol();

        while !input.peek_close() {
            input.open();

            let section = input.symbol();
            match section.as_str() {
                "info" => {
                    input.goto_close();
                }
                "specs" => specs::section(files, &mut input, &item),
                "tape" => tapes::section(state, files, &mut input, &item),
                "dbg" => {
                    input.goto_close();
                }
                _ => {
                    input.err(format!("unknown section: {}", section));
                    input.goto_close();
                }
            }
        }

        input.close();
    }

    state.merge(input);
    Ok(())
}

/// run the db stage; returns the number of recorded errors
pub fn run(res: &Path, src: &Path) -> anyhow::Result<usize> {
    let r#gen = src.join("gen");
    std::fs::create_dir_all(&r#gen)?;

    let mut state = State::default();
    let mut files = Files::create(&r#gen);

    files
        .item
        .write("enum item : uint8_t\n{\n  item_nil = atom_nil,\n");

    parse::items(&mut state, &src.join("tech.lisp"))?;
    items::generate(&mut state, &mut files);
    specs_tapes(&mut state, &mut files, &src.join("tech.lisp"))?;
    io::generate(&mut state, &mut files, &res.join("io.lisp"))?;
    stars::generate(&mut state, &mut files, &res.join("stars"))?;

    files.item.write("};\n");

    if !state.errs.is_empty() {
        return Ok(state.errs.len());
    }

    files.save()?;
    log::info!("db: {} items", state.info.len());
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TECH: &str = "
(elem-a (info (type natural) (syllable al))
        (tape (layer 1) (work 1) (energy 1) (out (elem-a 1))))
(elem-b (info (type natural) (syllable bo))
        (tape (layer 1) (work 1) (energy 1) (out (elem-b 1))))
(printer (info (type active) (list factory))
         (tape (layer 2) (work 8) (energy 4)
               (in (elem-a 2) (elem-b 2)) (out (printer 1))))
(assembly (info (type active) (list factory))
          (tape (layer 2) (work 12) (energy 6)
                (in (elem-a 3) (elem-b 2)) (out (assembly 1))))
(widget (info (type passive) (list control))
        (tape (layer 2) (needs (elem-a 4) (elem-b 2)) (out (widget 1))))";

    const IO: &str = "(io io-ping io-reset)\n(ioe ioe-out-of-range)";

    /// tech stage into `src`, then the db stage over its canonical output
    #[test]
    fn runs_downstream_of_the_tech_stage() {
        let dir = tempfile::tempdir().expect("tempdir");
        let res = dir.path();
        let src = res.join("src");
        std::fs::create_dir_all(&src).expect("mkdir");

        std::fs::write(res.join("tech.lisp"), TECH).expect("write tech");
        std::fs::write(res.join("io.lisp"), IO).expect("write io");

        let stars = res.join("stars");
        std::fs::create_dir_all(&stars).expect("mkdir");
        std::fs::write(stars.join("prefix.lisp"), "(prefix vega altair)").expect("write");
        std::fs::write(stars.join("suffix.lisp"), "(greek alpha beta)").expect("write");
        std::fs::write(
            stars.join("rolls.lisp"),
            "(barren (hue 30) (weight 8) (rolls (one item-elem-a 100)))",
        )
        .expect("write");

        let errors = crate::tech::run(res, &src, res).expect("tech run");
        assert_eq!(errors, 0);

        let errors = run(res, &src).expect("db run");
        assert_eq!(errors, 0);

        let item = std::fs::read_to_string(src.join("gen/item.h")).expect("read");
        assert!(item.starts_with("enum item : uint8_t"));
        assert!(item.contains("item_nil = atom_nil,"));
        assert!(item.contains("item_elem_a"));
        assert!(item.contains("item_widget"));
        assert!(item.contains("items_natural_first = 0x01,"));
        assert!(item.contains("items_max = 0x06,"));
        assert!(item.ends_with("};\n"));

        let register = std::fs::read_to_string(src.join("gen/im_register.h")).expect("read");
        assert!(register.contains("im_register(item_elem_a, \"elem-a\", 6, \"item-elem-a\"),"));
        assert!(register.contains("im_register_cfg(item_printer, \"printer\", 7, \"item-printer\", im_printer_config),"));

        let control = std::fs::read_to_string(src.join("gen/im_control.h")).expect("read");
        assert!(control.contains("item_widget,"));
        let factory = std::fs::read_to_string(src.join("gen/im_factory.h")).expect("read");
        assert!(factory.contains("item_printer,"));

        let tapes = std::fs::read_to_string(src.join("gen/tapes.h")).expect("read");
        assert!(tapes.contains("tape_register_begin(item_widget,"));
        assert!(tapes.contains(".host = printer,"));

        let specs = std::fs::read_to_string(src.join("gen/specs_enum.h")).expect("read");
        assert!(specs.contains("spec_widget_lab_bits = make_spec(item_widget, spec_lab_bits),"));

        assert!(src.join("gen/io_enum.h").exists());
        assert!(src.join("gen/stars_rolls.h").exists());
    }

    #[test]
    fn broken_input_suppresses_fragments() {
        let dir = tempfile::tempdir().expect("tempdir");
        let res = dir.path();
        let src = res.join("src");
        std::fs::create_dir_all(&src).expect("mkdir");

        // tape references an atom that was never declared
        std::fs::write(
            src.join("tech.lisp"),
            "(widget (info (type passive))
                     (specs (lab-bits u8 4) (lab-work work 8) (lab-energy energy 2))
                     (tape (layer 2) (work 2) (energy 2) (in (ghost 2))))",
        )
        .expect("write tech");
        std::fs::write(res.join("io.lisp"), IO).expect("write io");

        let stars = res.join("stars");
        std::fs::create_dir_all(&stars).expect("mkdir");
        std::fs::write(stars.join("prefix.lisp"), "(prefix vega)").expect("write");
        std::fs::write(stars.join("suffix.lisp"), "").expect("write");
        std::fs::write(stars.join("rolls.lisp"), "").expect("write");

        let errors = run(res, &src).expect("db run");
        assert!(errors > 0);
        assert!(!src.join("gen/item.h").exists());
    }
}
