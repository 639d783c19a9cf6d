use super::symbol::Symbol;
use anyhow::Context;
use std::io::Write as _;
use std::path::{Path, PathBuf};

/// Buffered configuration writer.
///
/// Output accumulates in a fixed-capacity in-memory buffer; generated
/// artifacts have bounded sizes so exhausting it is fatal. Nothing
/// touches the filesystem until `save`, which writes `<path>.tmp`,
/// fsyncs, and renames into place so a failed run never leaves a
/// truncated file behind.
pub struct Writer {
    path: PathBuf,
    buf: String,
    cap: usize,
    depth: usize,
    sep: bool,
}

impl Writer {
    pub fn create(path: &Path, cap: usize) -> Self {
        Writer {
            path: path.to_path_buf(),
            buf: String::new(),
            cap,
            depth: 0,
            sep: false,
        }
    }

    pub fn write(&mut self, text: &str) {
        assert!(
            self.buf.len() + text.len() <= self.cap,
            "writer buffer overflow on '{}'",
            self.path.display()
        );
        self.buf.push_str(text);
    }

    fn sep(&mut self) {
        if self.sep {
            self.write(" ");
        }
        self.sep = true;
    }

    /// newline indented to the current list depth
    pub fn line(&mut self) {
        let indent = "\n".to_string() + &" ".repeat(self.depth * 2);
        self.write(&indent);
        self.sep = false;
    }

    pub fn open(&mut self) {
        self.sep();
        self.write("(");
        self.depth += 1;
        self.sep = false;
    }

    pub fn open_line(&mut self) {
        self.line();
        self.open();
    }

    pub fn close(&mut self) {
        assert!(self.depth > 0);
        self.write(")");
        self.depth -= 1;
        self.sep = true;
    }

    pub fn symbol(&mut self, sym: &Symbol) {
        self.sep();
        let text = sym.as_str().to_string();
        self.write(&text);
    }

    pub fn symbol_str(&mut self, text: &str) {
        self.sep();
        self.write(text);
    }

    pub fn atom(&mut self, sym: &Symbol) {
        self.sep();
        let text = format!("!{}", sym);
        self.write(&text);
    }

    pub fn u64(&mut self, value: u64) {
        self.sep();
        let text = value.to_string();
        self.write(&text);
    }

    /// `(key value)` fields, the bread and butter of every dump
    pub fn field_u64(&mut self, key: &str, value: u64) {
        self.open();
        self.symbol_str(key);
        self.u64(value);
        self.close();
    }

    pub fn field_sym(&mut self, key: &str, sym: &Symbol) {
        self.open();
        self.symbol_str(key);
        self.symbol(sym);
        self.close();
    }

    pub fn field_str(&mut self, key: &str, value: &str) {
        self.open();
        self.symbol_str(key);
        self.symbol_str(value);
        self.close();
    }

    /// accumulated output, for inspection before save
    pub fn buffer(&self) -> &str {
        &self.buf
    }

    /// blank line between top-level forms
    pub fn gap(&mut self) {
        self.write("\n\n");
        self.sep = false;
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn save(self) -> anyhow::Result<()> {
        assert!(self.depth == 0, "unbalanced writer on '{}'", self.path.display());

        let tmp = self.path.with_extension("tmp");
        let mut file = std::fs::File::create(&tmp)
            .with_context(|| format!("unable to create '{}'", tmp.display()))?;
        file.write_all(self.buf.as_bytes())
            .with_context(|| format!("unable to write '{}'", tmp.display()))?;
        file.sync_all()
            .with_context(|| format!("unable to sync '{}'", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("unable to rename '{}'", tmp.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spaces_list_elements() {
        let mut out = Writer::create(Path::new("/dev/null"), 1024);
        out.open();
        out.symbol_str("tape");
        out.field_u64("layer", 2);
        out.field_sym("host", &Symbol::from("printer"));
        out.close();
        assert_eq!(out.buf, "(tape (layer 2) (host printer))");
    }

    #[test]
    fn indents_to_depth() {
        let mut out = Writer::create(Path::new("/dev/null"), 1024);
        out.open();
        out.symbol_str("widget");
        out.open_line();
        out.symbol_str("info");
        out.close();
        out.close();
        assert_eq!(out.buf, "(widget\n  (info))");
    }

    #[test]
    fn writes_atoms() {
        let mut out = Writer::create(Path::new("/dev/null"), 1024);
        out.atom(&Symbol::from("item-bone"));
        assert_eq!(out.buf, "!item-bone");
    }

    #[test]
    #[should_panic(expected = "writer buffer overflow")]
    fn overflow_is_fatal() {
        let mut out = Writer::create(Path::new("/dev/null"), 8);
        out.write("0123456789");
    }

    #[test]
    fn saves_atomically() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.lisp");
        let mut out = Writer::create(&path, 1024);
        out.field_u64("work", 3);
        out.save().expect("save");
        assert_eq!(std::fs::read_to_string(&path).expect("read"), "(work 3)");
        assert!(!path.with_extension("tmp").exists());
    }
}
