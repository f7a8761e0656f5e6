use crate::token::{self, Token, TokenKind};

/// Side-channel callback for lexical diagnostics. The formatted message
/// carries the line number and a caret pointing at the offending byte.
pub type ErrorHandler<'a> = Box<dyn FnMut(&str) + 'a>;

const UNEXPECTED_CHARACTER: &str = "unexpected character";
const UNTERMINATED_STRING: &str = "unterminated string";

pub struct Lexer<'a> {
    source: &'a [u8],

    // start/current delimit the token under examination
    start: usize,
    current: usize,

    line: usize,
    line_start: usize,

    handler: Option<ErrorHandler<'a>>,
    errors: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Lexer<'a> {
        Lexer {
            source: source.as_bytes(),
            start: 0,
            current: 0,
            line: 1,
            line_start: 0,
            handler: None,
            errors: 0,
        }
    }

    pub fn with_error_handler(source: &'a str, handler: ErrorHandler<'a>) -> Lexer<'a> {
        Lexer {
            handler: Some(handler),
            ..Lexer::new(source)
        }
    }

    /// Number of lexical errors seen so far. Once non-zero, `next`
    /// yields only `Eof` so the parser does not chase cascading errors.
    pub fn error_count(&self) -> usize {
        self.errors
    }

    pub fn next(&mut self) -> Token {
        if self.errors > 0 {
            return Token::eof(self.current, self.line);
        }

        while self.current < self.source.len() {
            self.start = self.current;

            let ch = self.peek(0);
            match ch {
                b'=' => {
                    return if self.match_next(b'=') {
                        self.emit(TokenKind::EqualEqual)
                    } else {
                        self.emit(TokenKind::Equal)
                    };
                }
                b'!' => {
                    return if self.match_next(b'=') {
                        self.emit(TokenKind::BangEqual)
                    } else {
                        self.emit(TokenKind::Bang)
                    };
                }
                b'+' => return self.emit(TokenKind::Plus),
                b'-' => return self.emit(TokenKind::Minus),
                b'*' => return self.emit(TokenKind::Star),
                b'/' => {
                    if self.match_next(b'/') {
                        self.skip(|ch| ch != b'\n');
                    } else {
                        return self.emit(TokenKind::Slash);
                    }
                }
                b'<' => return self.emit(TokenKind::Less),
                b'>' => return self.emit(TokenKind::More),
                b',' => return self.emit(TokenKind::Comma),
                b':' => return self.emit(TokenKind::Colon),
                b';' => return self.emit(TokenKind::SemiColon),
                b'(' => return self.emit(TokenKind::LParen),
                b')' => return self.emit(TokenKind::RParen),
                b'{' => return self.emit(TokenKind::LBrace),
                b'}' => return self.emit(TokenKind::RBrace),
                b'[' => return self.emit(TokenKind::LBracket),
                b']' => return self.emit(TokenKind::RBracket),
                b' ' | b'\t' | b'\r' | b'\n' => self.skip(is_whitespace),
                b'"' => return self.string(),
                _ => {
                    return if is_alpha(ch) {
                        self.ident()
                    } else if ch.is_ascii_digit() {
                        self.number()
                    } else {
                        self.unexpected()
                    };
                }
            }
        }

        Token::eof(self.source.len(), self.line)
    }

    fn ident(&mut self) -> Token {
        while is_alphanumeric(self.peek(0)) {
            self.advance();
        }

        let lexeme = self.lexeme_slice().to_owned();
        let kind = token::lookup_ident(&lexeme);
        self.emit_with_lexeme(kind, lexeme)
    }

    fn number(&mut self) -> Token {
        while self.peek(0).is_ascii_digit() {
            self.advance();
        }

        let lexeme = self.lexeme_slice().to_owned();
        self.emit_with_lexeme(TokenKind::Number, lexeme)
    }

    fn string(&mut self) -> Token {
        // consume the leading double-quote
        self.advance();

        loop {
            let ch = self.peek(0);
            if ch == b'"' || ch == b'\n' || ch == 0 {
                break;
            }
            self.advance();
        }

        if self.peek(0) != b'"' {
            self.report(UNTERMINATED_STRING);
            return self.emit_with_lexeme(TokenKind::Illegal, UNTERMINATED_STRING.to_owned());
        }

        // consume the trailing double-quote
        self.advance();
        let lexeme =
            String::from_utf8_lossy(&self.source[self.start + 1..self.current - 1]).into_owned();
        self.emit_with_lexeme(TokenKind::Str, lexeme)
    }

    fn unexpected(&mut self) -> Token {
        self.report(UNEXPECTED_CHARACTER);
        self.advance();
        self.emit_with_lexeme(TokenKind::Illegal, UNEXPECTED_CHARACTER.to_owned())
    }

    fn skip(&mut self, condition: fn(u8) -> bool) {
        loop {
            let ch = self.peek(0);
            if ch == 0 || !condition(ch) {
                break;
            }
            if ch == b'\n' {
                self.line += 1;
                self.line_start = self.current + 1;
            }
            self.advance();
        }
    }

    fn peek(&self, n: usize) -> u8 {
        if self.current + n < self.source.len() {
            self.source[self.current + n]
        } else {
            0
        }
    }

    fn advance(&mut self) {
        if self.current < self.source.len() {
            self.current += 1;
        }
    }

    fn match_next(&mut self, ch: u8) -> bool {
        if self.peek(1) == ch {
            self.advance();
            true
        } else {
            false
        }
    }

    fn emit(&mut self, kind: TokenKind) -> Token {
        self.advance();
        Token {
            kind,
            lexeme: kind.spelling().to_owned(),
            start: self.start,
            length: self.current - self.start,
            line: self.line,
        }
    }

    fn emit_with_lexeme(&mut self, kind: TokenKind, lexeme: String) -> Token {
        Token {
            kind,
            lexeme,
            start: self.start,
            length: self.current - self.start,
            line: self.line,
        }
    }

    fn lexeme_slice(&self) -> &str {
        std::str::from_utf8(&self.source[self.start..self.current]).unwrap_or_default()
    }

    fn report(&mut self, message: &str) {
        let end = self.current.min(self.source.len());
        let snippet = String::from_utf8_lossy(&self.source[self.line_start..end]);
        let gutter = format!("{} | ", self.line);
        let caret = " ".repeat(gutter.len() + end.saturating_sub(self.line_start));

        let diagnostic = format!(
            "Error: {}\n    {}{}\n    {}^--- Here",
            message, gutter, snippet, caret
        );

        if let Some(handler) = self.handler.as_mut() {
            handler(&diagnostic);
        }
        self.errors += 1;
    }
}

fn is_whitespace(ch: u8) -> bool {
    ch == b' ' || ch == b'\t' || ch == b'\r' || ch == b'\n'
}

fn is_alpha(ch: u8) -> bool {
    ch.is_ascii_lowercase() || ch.is_ascii_uppercase() || ch == b'_'
}

fn is_alphanumeric(ch: u8) -> bool {
    is_alpha(ch) || ch.is_ascii_digit()
}
