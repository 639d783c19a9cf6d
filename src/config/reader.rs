use super::atoms::Atoms;
use super::errors::Errors;
use super::symbol::Symbol;
use super::token::{Token, Tokenizer};
use anyhow::Context;
use std::path::{Path, PathBuf};

/// specs captures are bounded; the db items table assumes it
const CAPTURE_CAP: usize = 256;

/// Streaming reader over one configuration file.
///
/// Every read primitive records malformed input in the embedded error
/// sink and returns a neutral value instead of failing, so that a single
/// pass surfaces every problem. `goto_close` is the recovery point: any
/// unknown or broken form is skipped to its matching close paren.
pub struct Reader {
    file: PathBuf,
    tok: Tokenizer,
    peeked: Option<(Token, usize, usize, usize)>,
    pos: (usize, usize),
    errs: Errors,
}

impl Reader {
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let src = std::fs::read_to_string(path)
            .with_context(|| format!("unable to read '{}'", path.display()))?;
        Ok(Self::from_str(path, src))
    }

    pub fn from_str(path: &Path, src: String) -> Self {
        Reader {
            file: path.to_path_buf(),
            tok: Tokenizer::from(src),
            peeked: None,
            pos: (1, 1),
            errs: Errors::default(),
        }
    }

    pub fn into_errors(self) -> Errors {
        self.errs
    }

    pub fn err(&mut self, message: impl AsRef<str>) {
        let (line, col) = self.pos;
        let file = self.file.clone();
        self.errs.at(&file, line, col, message);
    }

    /// next token with its start position and byte offset; bad bytes are
    /// reported and skipped here so no caller ever sees them.
    fn fill(&mut self) {
        while self.peeked.is_none() {
            let start = self.tok.offset();
            let (token, line, col) = self.tok.next();
            if let Token::Bad(byte) = token {
                self.pos = (line, col);
                self.err(format!("malformed token '{}'", byte as char));
                continue;
            }
            self.peeked = Some((token, line, col, start));
        }
    }

    fn advance(&mut self) -> (Token, usize) {
        self.fill();
        let (token, line, col, start) = self.peeked.take().expect("filled");
        self.pos = (line, col);
        (token, start)
    }

    pub fn peek(&mut self) -> &Token {
        self.fill();
        &self.peeked.as_ref().expect("filled").0
    }

    pub fn peek_open(&mut self) -> bool {
        *self.peek() == Token::Open
    }
    pub fn peek_close(&mut self) -> bool {
        *self.peek() == Token::Close
    }
    pub fn peek_eof(&mut self) -> bool {
        *self.peek() == Token::Eof
    }

    pub fn open(&mut self) {
        let (token, _) = self.advance();
        if token != Token::Open {
            self.err(format!("expected open paren, got {}", token.kind()));
        }
    }

    pub fn close(&mut self) {
        let (token, _) = self.advance();
        if token != Token::Close {
            self.err(format!("expected close paren, got {}", token.kind()));
        }
    }

    pub fn symbol(&mut self) -> Symbol {
        match self.advance().0 {
            Token::Symbol(sym) => sym,
            token => {
                self.err(format!("expected symbol, got {}", token.kind()));
                Symbol::default()
            }
        }
    }

    pub fn word(&mut self) -> i64 {
        match self.advance().0 {
            Token::Number(value) => value,
            token => {
                self.err(format!("expected number, got {}", token.kind()));
                0
            }
        }
    }

    pub fn u64(&mut self) -> u64 {
        let value = self.word();
        if value < 0 {
            self.err(format!("expected unsigned number, got '{}'", value));
            return 0;
        }
        value as u64
    }

    pub fn atom_symbol(&mut self) -> Symbol {
        match self.advance().0 {
            Token::Atom(sym) => sym,
            token => {
                self.err(format!("expected atom, got {}", token.kind()));
                Symbol::default()
            }
        }
    }

    /// read an atom and resolve it through the interning table
    pub fn atom(&mut self, atoms: &mut Atoms) -> i64 {
        let sym = self.atom_symbol();
        atoms.intern(&sym)
    }

    /// map a symbol against a fixed enumeration; positional error on miss
    pub fn symbol_table<T: Copy>(&mut self, table: &[(&str, T)]) -> Option<T> {
        let sym = self.symbol();
        match table.iter().find(|(key, _)| *key == sym.as_str()) {
            Some((_, value)) => Some(*value),
            None => {
                self.err(format!("unexpected symbol '{}'", sym));
                None
            }
        }
    }

    /// read a symbol and require it to be `key`
    pub fn expect_str(&mut self, key: &str) {
        let sym = self.symbol();
        if sym.as_str() != key {
            self.err(format!("unexpected field key '{}'", sym));
        }
    }

    /// skip to the close paren matching the currently open list
    pub fn goto_close(&mut self) -> bool {
        let mut depth = 1usize;
        loop {
            match self.advance().0 {
                Token::Open => depth += 1,
                Token::Close => {
                    depth -= 1;
                    if depth == 0 {
                        return true;
                    }
                }
                Token::Eof => {
                    self.err("missing close paren");
                    return false;
                }
                _ => {}
            }
        }
    }

    /// verbatim source text up to the matching close paren
    pub fn until_close(&mut self) -> String {
        self.fill();
        let from = self.peeked.as_ref().expect("filled").3;

        let mut depth = 1usize;
        loop {
            let (token, start) = self.advance();
            match token {
                Token::Open => depth += 1,
                Token::Close => {
                    depth -= 1;
                    if depth == 0 {
                        let text = self.tok.slice(from, start).trim().to_string();
                        assert!(text.len() < CAPTURE_CAP, "specs capture overflow");
                        return text;
                    }
                }
                Token::Eof => {
                    self.err("missing close paren");
                    return String::new();
                }
                _ => {}
            }
        }
    }
}
