use std::path::Path;

/// Accumulating diagnostics sink.
///
/// Positional and invariant errors are recorded and logged, never thrown:
/// a single run surfaces every problem in the input. The caller checks the
/// count at stage boundaries and decides whether outputs may be written.
#[derive(Default, Debug)]
pub struct Errors {
    list: Vec<String>,
}

impl Errors {
    pub fn len(&self) -> usize {
        self.list.len()
    }
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.list.iter().map(|s| s.as_str())
    }

    /// positional diagnostic: `<file>:<line>:<col>: <message>`
    pub fn at(&mut self, file: &Path, line: usize, col: usize, message: impl AsRef<str>) {
        let entry = format!(
            "{}:{}:{}: {}",
            file.display(),
            line,
            col,
            message.as_ref()
        );
        log::error!("{}", entry);
        self.list.push(entry);
    }

    /// bare diagnostic, for errors with no position or node to blame
    pub fn push(&mut self, message: impl AsRef<str>) {
        let entry = message.as_ref().to_string();
        log::error!("{}", entry);
        self.list.push(entry);
    }

    /// node diagnostic: `[<id>:<name>] <message>`
    pub fn node(&mut self, id: u8, name: &str, message: impl AsRef<str>) {
        let entry = format!("[{:02x}:{}] {}", id, name, message.as_ref());
        log::error!("{}", entry);
        self.list.push(entry);
    }

    pub fn merge(&mut self, other: Errors) {
        self.list.extend(other.list);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_positions() {
        let mut errs = Errors::default();
        errs.at(Path::new("tech.lisp"), 3, 14, "unexpected token");
        assert_eq!(errs.len(), 1);
        assert_eq!(
            errs.iter().next().unwrap(),
            "tech.lisp:3:14: unexpected token"
        );
    }

    #[test]
    fn formats_nodes() {
        let mut errs = Errors::default();
        errs.node(0x21, "widget", "singleton: id=11:elem-a");
        assert_eq!(errs.iter().next().unwrap(), "[21:widget] singleton: id=11:elem-a");
    }

    #[test]
    fn merges_in_order() {
        let mut a = Errors::default();
        let mut b = Errors::default();
        a.node(1, "x", "first");
        b.node(2, "y", "second");
        a.merge(b);
        assert_eq!(a.len(), 2);
        assert!(a.iter().last().unwrap().contains("second"));
    }
}
