pub mod token;

use crate::scanner::token::{Token, TokenKind};

#[derive(Debug, Clone)]
pub struct ScanError {
    pub line: usize,
    pub message: String,
}

impl std::fmt::Display for ScanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

/// Turns source text into tokens, one per call to `next_token`.
///
/// Consecutive operand characters are always merged into a single token, so
/// `:=`, `<=` and `<>` need no special cases, but `((` is also one token.
/// A lone `.` anywhere in the stream forces end-of-input; `;` is always its
/// own one-character token.
pub struct Scanner {
    source: Vec<char>,
    pos: usize,
    line: usize,
    current: char,
    eof: bool,
}

fn is_operand(c: char) -> bool {
    matches!(
        c,
        '=' | '+' | '-' | '*' | '/' | '%' | '(' | ')' | '<' | '>' | ':'
    )
}

fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

impl Scanner {
    pub fn new(source: impl Into<String>) -> Self {
        let mut scanner = Scanner {
            source: source.into().chars().collect(),
            pos: 0,
            line: 1,
            current: '\0',
            eof: false,
        };
        scanner.read_next_char();
        scanner
    }

    fn read_next_char(&mut self) {
        match self.source.get(self.pos).copied() {
            // '.' is the hard end-of-input marker, distinct from `;`
            None | Some('.') => {
                self.eof = true;
                self.current = '\0';
            }
            Some(c) => {
                self.current = c;
                self.pos += 1;
            }
        }
    }

    fn consume(&mut self) {
        if self.current == '\n' {
            self.line += 1;
        }
        self.read_next_char();
    }

    fn scan_while(&mut self, condition: impl Fn(char) -> bool) -> String {
        let mut run = String::new();
        while !self.eof && condition(self.current) {
            run.push(self.current);
            self.consume();
        }
        run
    }

    fn skip_line_comment(&mut self) {
        while !self.eof && self.current != '\n' {
            self.consume();
        }
    }

    // The body is re-tokenized until an operand run equals `*/`, so `**/`
    // does not close the comment.
    fn skip_block_comment(&mut self) -> Result<(), ScanError> {
        let mut run = String::new();
        while run != "*/" {
            if self.eof {
                return Err(ScanError {
                    line: self.line,
                    message: "unterminated block comment".into(),
                });
            }
            if is_operand(self.current) {
                run = self.scan_while(is_operand);
            } else {
                self.consume();
            }
        }
        Ok(())
    }

    pub fn next_token(&mut self) -> Result<Token, ScanError> {
        // comments restart the loop rather than recursing, so arbitrarily
        // many of them cost no stack
        loop {
            while !self.eof && is_whitespace(self.current) {
                self.consume();
            }
            let line = self.line;

            if self.eof {
                return Ok(Token::new("", TokenKind::Eof, line));
            }
            if self.current == ';' {
                self.consume();
                return Ok(Token::new(";", TokenKind::Operator, line));
            }
            if is_operand(self.current) {
                let run = self.scan_while(is_operand);
                match run.as_str() {
                    "//" => self.skip_line_comment(),
                    "/*" => self.skip_block_comment()?,
                    _ => return Ok(Token::new(run, TokenKind::Operator, line)),
                }
                continue;
            }
            if self.current.is_ascii_digit() {
                let run = self.scan_while(|c| c.is_ascii_digit());
                return Ok(Token::new(run, TokenKind::Number, line));
            }
            if self.current.is_ascii_alphabetic() {
                // must start with a letter, digits may follow
                let run = self.scan_while(|c| c.is_ascii_alphanumeric());
                return Ok(Token::new(run, TokenKind::Identifier, line));
            }
            return Err(ScanError {
                line,
                message: format!("unrecognized character '{}'", self.current),
            });
        }
    }
}
