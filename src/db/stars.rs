use super::{Files, State};
use crate::config::{Reader, Symbol};
use std::path::Path;

/// `(NAME sym sym …)` name pool, sorted for stable output
struct Names {
    name: Symbol,
    list: Vec<Symbol>,
}

fn read_names(input: &mut Reader) -> Names {
    input.open();

    let name = input.symbol();
    let mut list = Vec::new();
    while !input.peek_close() {
        list.push(input.symbol());
    }
    input.close();

    list.sort();
    Names { name, list }
}

fn prefix(files: &mut Files, input: &mut Reader) {
    let names = read_names(input);

    files
        .stars_prefix
        .write(&format!("stars_prefix_begin({})\n", names.list.len()));

    for (ix, name) in names.list.iter().enumerate() {
        files
            .stars_prefix
            .write(&format!("  stars_prefix({}, \"{}\")\n", ix, name));
    }

    files.stars_prefix.write("stars_prefix_end()\n");
}

fn suffix(files: &mut Files, input: &mut Reader) {
    while !input.peek_eof() {
        let names = read_names(input);

        files.stars_suffix.write(&format!(
            "stars_suffix_begin(\"{}\", {})\n",
            names.name,
            names.list.len()
        ));

        for (ix, name) in names.list.iter().enumerate() {
            files
                .stars_suffix
                .write(&format!("  stars_suffix({}, \"{}\")\n", ix, name));
        }

        files.stars_suffix.write("stars_suffix_end()\n\n");
    }
}

// -----------------------------------------------------------------------------
// rolls
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RollKind {
    One,
    Rng,
    OneOf,
    AllOf,
}

impl RollKind {
    const TABLE: [(&'static str, RollKind); 4] = [
        ("one", RollKind::One),
        ("rng", RollKind::Rng),
        ("one-of", RollKind::OneOf),
        ("all-of", RollKind::AllOf),
    ];

    fn as_str(&self) -> &'static str {
        match self {
            RollKind::One => "one",
            RollKind::Rng => "rng",
            RollKind::OneOf => "one_of",
            RollKind::AllOf => "all_of",
        }
    }
}

struct Roll {
    kind: RollKind,
    min: Symbol,
    max: Symbol,
    count: u16,
}

/// `(rolls (<kind> <min_item> [<max_item>] <count>) …)` star class recipe
fn read_rolls(input: &mut Reader, rolls: &mut Vec<Roll>) {
    while !input.peek_close() {
        input.open();

        let Some(kind) = input.symbol_table(&RollKind::TABLE) else {
            input.goto_close();
            continue;
        };

        let min = input.symbol().to_enum();
        let max = if kind != RollKind::One {
            input.symbol().to_enum()
        } else {
            min
        };
        let count = input.u64() as u16;

        input.close();
        rolls.push(Roll {
            kind,
            min,
            max,
            count,
        });
    }
}

fn roll_tables(files: &mut Files, input: &mut Reader) {
    while !input.peek_eof() {
        input.open();

        let name = input.symbol();
        let mut rolls: Vec<Roll> = Vec::new();
        let mut weight = 0u64;
        let mut hue = 0u64;

        while !input.peek_close() {
            input.open();

            let key = input.symbol();
            match key.as_str() {
                "hue" => {
                    hue = input.u64();
                    input.close();
                }
                "weight" => {
                    weight = input.u64();
                    input.close();
                }
                "rolls" => {
                    read_rolls(input, &mut rolls);
                    input.close();
                }
                _ => {
                    input.err(format!("unknown roll key '{}'", key));
                    input.goto_close();
                }
            }
        }
        input.close();

        files.stars_rolls.write(&format!(
            "stars_rolls_begin(\"{}\", {}, {}, {})\n",
            name,
            weight,
            hue,
            rolls.len()
        ));

        for (ix, roll) in rolls.iter().enumerate() {
            files.stars_rolls.write(&format!(
                "  stars_rolls({}, {}, {}, {}, {})\n",
                ix,
                roll.kind.as_str(),
                roll.min,
                roll.max,
                roll.count
            ));
        }

        files.stars_rolls.write("stars_rolls_end()\n\n");
    }
}

/// star name pools and class generation tables from `<res>/stars/`
pub fn generate(state: &mut State, files: &mut Files, dir: &Path) -> anyhow::Result<()> {
    let mut input = Reader::from_path(&dir.join("prefix.lisp"))?;
    prefix(files, &mut input);
    state.merge(input);

    let mut input = Reader::from_path(&dir.join("suffix.lisp"))?;
    suffix(files, &mut input);
    state.merge(input);

    let mut input = Reader::from_path(&dir.join("rolls.lisp"))?;
    roll_tables(files, &mut input);
    state.merge(input);

    Ok(())
}
