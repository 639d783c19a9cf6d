use super::{Files, State};
use crate::config::Reader;
use std::path::Path;

/// `(io …)` and `(ioe …)` symbol lists become the command and error
/// enums plus their registration table
pub fn generate(state: &mut State, files: &mut Files, path: &Path) -> anyhow::Result<()> {
    let mut input = Reader::from_path(path)?;

    while !input.peek_eof() {
        input.open();

        let kind = input.symbol();
        match kind.as_str() {
            "io" => {
                let mut ix = 0;
                while !input.peek_close() {
                    let io = input.symbol();
                    let io_enum = io.to_enum();

                    files.io_enum.write(&format!(
                        "{:<20} = io_min + 0x{:02x},\n",
                        io_enum.as_str(),
                        ix
                    ));
                    files.io_register.write(&format!(
                        "io_register({}, \"{}\", {}),\n",
                        io_enum,
                        io,
                        io.len()
                    ));
                    ix += 1;
                }
                input.close();
            }
            "ioe" => {
                let mut ix = 0;
                while !input.peek_close() {
                    let ioe = input.symbol();
                    let ioe_enum = ioe.to_enum();

                    files.ioe_enum.write(&format!(
                        "{:<20} = ioe_min + 0x{:02x},\n",
                        ioe_enum.as_str(),
                        ix
                    ));
                    files.io_register.write(&format!(
                        "ioe_register({}, \"{}\", {}),\n",
                        ioe_enum,
                        ioe,
                        ioe.len()
                    ));
                    ix += 1;
                }
                input.close();
            }
            _ => {
                input.err(format!("unknown type io '{}'", kind));
                input.goto_close();
            }
        }
    }

    state.merge(input);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn enumerates_commands_and_errors() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("io.lisp");
        std::fs::write(&path, "(io io-ping io-send-item)\n(ioe ioe-out-of-range)")
            .expect("write");

        let mut state = State::default();
        let mut files = Files::create(dir.path());
        generate(&mut state, &mut files, &path).expect("generate");
        assert!(state.errs.is_empty());

        let io = files.io_enum.buffer();
        assert!(io.contains(&format!("{:<20} = io_min + 0x00,", "io_ping")));
        assert!(io.contains(&format!("{:<20} = io_min + 0x01,", "io_send_item")));

        assert!(files
            .ioe_enum
            .buffer()
            .contains(&format!("{:<20} = ioe_min + 0x00,", "ioe_out_of_range")));

        let register = files.io_register.buffer();
        assert!(register.contains("io_register(io_ping, \"io-ping\", 7),"));
        assert!(register.contains("ioe_register(ioe_out_of_range, \"ioe-out-of-range\", 16),"));
    }

    #[test]
    fn unknown_sections_are_errors() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("io.lisp");
        std::fs::write(&path, "(iox a b)").expect("write");

        let mut state = State::default();
        let mut files = Files::create(dir.path());
        generate(&mut state, &mut files, &path).expect("generate");
        assert_eq!(state.errs.len(), 1);
    }
}
