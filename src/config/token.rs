use super::symbol::{self, Symbol};

/// one lexical element of the configuration dialect
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Open,
    Close,
    Symbol(Symbol),
    Atom(Symbol),
    Number(i64),
    Str(String),
    Bad(u8),
    Eof,
}

impl Token {
    pub fn kind(&self) -> &'static str {
        match self {
            Token::Open => "open",
            Token::Close => "close",
            Token::Symbol(_) => "symbol",
            Token::Atom(_) => "atom",
            Token::Number(_) => "number",
            Token::Str(_) => "string",
            Token::Bad(_) => "bad",
            Token::Eof => "eof",
        }
    }
}

/// Streams tokens out of an in-memory file image. Whitespace and `;`
/// comments are skipped; line and column track the start of the last
/// token for diagnostics.
pub struct Tokenizer {
    src: Vec<u8>,
    it: usize,
    line: usize,
    col: usize,
}

impl From<String> for Tokenizer {
    fn from(src: String) -> Self {
        Tokenizer {
            src: src.into_bytes(),
            it: 0,
            line: 1,
            col: 1,
        }
    }
}

impl Tokenizer {
    fn peek(&self) -> Option<u8> {
        self.src.get(self.it).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.it += 1;
        if byte == b'\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(byte)
    }

    fn skip(&mut self) {
        while let Some(byte) = self.peek() {
            match byte {
                b' ' | b'\t' | b'\r' | b'\n' => {
                    self.advance();
                }
                b';' => {
                    while let Some(byte) = self.advance() {
                        if byte == b'\n' {
                            break;
                        }
                    }
                }
                _ => return,
            }
        }
    }

    fn chars(&mut self) -> Symbol {
        let mut sym = Symbol::default();
        while let Some(byte) = self.peek() {
            if !symbol::is_symbol_char(byte) {
                break;
            }
            sym.push(byte);
            self.advance();
        }
        sym
    }

    fn number(&mut self) -> Token {
        let negative = self.peek() == Some(b'-');
        if negative {
            self.advance();
        }

        let digits = self.chars();
        let digits = digits.as_str();

        let parsed = if let Some(hex) = digits.strip_prefix("0x") {
            u64::from_str_radix(hex, 16).map(|v| v as i64)
        } else {
            digits.parse::<i64>()
        };

        match parsed {
            Ok(value) if negative => Token::Number(-value),
            Ok(value) => Token::Number(value),
            Err(_) => Token::Bad(digits.as_bytes().first().copied().unwrap_or(b'-')),
        }
    }

    fn string(&mut self) -> Token {
        self.advance();
        let mut value = String::new();
        while let Some(byte) = self.advance() {
            if byte == b'"' {
                return Token::Str(value);
            }
            value.push(byte as char);
        }
        Token::Bad(b'"')
    }

    /// next token plus the (line, col) where it starts
    pub fn next(&mut self) -> (Token, usize, usize) {
        self.skip();
        let (line, col) = (self.line, self.col);

        let token = match self.peek() {
            None => Token::Eof,
            Some(b'(') => {
                self.advance();
                Token::Open
            }
            Some(b')') => {
                self.advance();
                Token::Close
            }
            Some(b'"') => self.string(),
            Some(b'!') => {
                self.advance();
                Token::Atom(self.chars())
            }
            Some(b'0'..=b'9') => self.number(),
            Some(b'-') if self.src.get(self.it + 1).is_some_and(|b| b.is_ascii_digit()) => {
                self.number()
            }
            Some(byte) if symbol::is_symbol_char(byte) => Token::Symbol(self.chars()),
            Some(byte) => {
                self.advance();
                Token::Bad(byte)
            }
        };

        (token, line, col)
    }

    /// raw source text between two byte offsets, for verbatim captures
    pub fn slice(&self, from: usize, to: usize) -> &str {
        std::str::from_utf8(&self.src[from..to]).expect("config files are utf-8")
    }

    pub fn offset(&self) -> usize {
        self.it
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(src: &str) -> Vec<Token> {
        let mut tok = Tokenizer::from(src.to_string());
        let mut out = Vec::new();
        loop {
            let (token, _, _) = tok.next();
            if token == Token::Eof {
                return out;
            }
            out.push(token);
        }
    }

    #[test]
    fn lexes_forms() {
        assert_eq!(
            tokens("(work 12)"),
            vec![
                Token::Open,
                Token::Symbol(Symbol::from("work")),
                Token::Number(12),
                Token::Close,
            ]
        );
    }

    #[test]
    fn lexes_hex_and_negative() {
        assert_eq!(tokens("0x1f -3"), vec![Token::Number(31), Token::Number(-3)]);
    }

    #[test]
    fn dash_starts_symbols() {
        assert_eq!(tokens("-"), vec![Token::Symbol(Symbol::from("-"))]);
    }

    #[test]
    fn lexes_atoms() {
        assert_eq!(
            tokens("!item-bone"),
            vec![Token::Atom(Symbol::from("item-bone"))]
        );
    }

    #[test]
    fn lexes_strings() {
        assert_eq!(
            tokens(r#""hello world""#),
            vec![Token::Str("hello world".to_string())]
        );
    }

    #[test]
    fn skips_comments() {
        assert_eq!(
            tokens("; header\n(a) ; trailing\n(b)"),
            vec![
                Token::Open,
                Token::Symbol(Symbol::from("a")),
                Token::Close,
                Token::Open,
                Token::Symbol(Symbol::from("b")),
                Token::Close,
            ]
        );
    }

    #[test]
    fn tracks_positions() {
        let mut tok = Tokenizer::from("(a\n  b)".to_string());
        assert_eq!(tok.next(), (Token::Open, 1, 1));
        assert_eq!(tok.next(), (Token::Symbol(Symbol::from("a")), 1, 2));
        assert_eq!(tok.next(), (Token::Symbol(Symbol::from("b")), 2, 3));
        assert_eq!(tok.next(), (Token::Close, 2, 4));
    }

    #[test]
    fn flags_bad_bytes() {
        assert_eq!(tokens("#"), vec![Token::Bad(b'#')]);
    }
}
