//! The scanner (spec §4.1): a restartable cursor over a program's source
//! text. `next_token` is the only public operation; it returns a token or a
//! parse failure. The scanner is a plain struct consumed by `next_token`,
//! not a coroutine or generator (spec §9 "Parser state as a reusable
//! cursor") — the evaluator owns exactly one scanner per active script
//! nesting level.

use crate::error::PickleError;
use crate::parser::types::{ParserOptions, Token, TokenKind};

fn is_space(b: u8) -> bool {
    b == b' ' || b == b'\t'
}

fn is_eol_byte(b: u8) -> bool {
    b == b'\n' || b == b'\r' || b == b';'
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

pub struct Scanner<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    len: usize,
    /// True when the next non-separator token would start a new command —
    /// the only context in which a leading `#` introduces a comment.
    at_command_start: bool,
    /// True between a `"` that opened a quoted word and its matching
    /// closing `"`. While set, `next_token` scans quoted content — a run of
    /// literal/escape bytes up to the next `$`, `[`, or closing quote —
    /// instead of top-level word syntax, so `$var` and `[cmd]` inside a
    /// quoted word produce `VarRef`/`Command` tokens the same way they
    /// would outside quotes (spec §4.1 "honors nested `[...]`, `$var`").
    in_quote: bool,
    pub options: ParserOptions,
}

impl<'a> Scanner<'a> {
    pub fn new(src: &'a str) -> Self {
        Scanner::with_options(src, ParserOptions::EVAL)
    }

    pub fn with_options(src: &'a str, options: ParserOptions) -> Self {
        Scanner {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            len: src.len(),
            at_command_start: true,
            in_quote: false,
            options,
        }
    }

    pub fn text(&self, tok: &Token) -> &'a str {
        &self.src[tok.start..tok.end]
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, off: usize) -> Option<u8> {
        self.bytes.get(self.pos + off).copied()
    }

    /// Scan and return the next token, or a parse failure (spec §4.1
    /// failures: unterminated brace/quote/command, stray close bracket).
    pub fn next_token(&mut self) -> Result<Token, PickleError> {
        loop {
            if self.in_quote {
                if self.pos >= self.len {
                    return Err(PickleError::UnterminatedQuote);
                }
                let c = self.bytes[self.pos];
                if c == b'"' {
                    self.pos += 1;
                    self.in_quote = false;
                    continue;
                }
                if c == b'[' && !self.options.no_commands {
                    return self.scan_command();
                }
                if c == b'$' && !self.options.no_variables {
                    return self.scan_variable();
                }
                return self.scan_quoted_segment();
            }

            if self.pos >= self.len {
                return Ok(Token::eof(self.pos));
            }
            let c = self.bytes[self.pos];

            if is_space(c) {
                let start = self.pos;
                while self.peek().map(is_space).unwrap_or(false) {
                    self.pos += 1;
                }
                return Ok(Token { kind: TokenKind::Separator, start, end: self.pos });
            }

            if is_eol_byte(c) {
                let start = self.pos;
                while self.peek().map(is_eol_byte).unwrap_or(false) {
                    self.pos += 1;
                }
                self.at_command_start = true;
                return Ok(Token { kind: TokenKind::Eol, start, end: self.pos });
            }

            if c == b'#' && self.at_command_start {
                self.skip_comment();
                continue;
            }

            self.at_command_start = false;

            if c == b'[' && !self.options.no_commands {
                return self.scan_command();
            }
            if c == b'{' {
                return self.scan_brace_word();
            }
            if c == b'$' && !self.options.no_variables {
                return self.scan_variable();
            }
            if c == b'"' {
                self.pos += 1;
                if self.peek() == Some(b'"') {
                    // An immediately-closed quote still contributes an
                    // (empty) argument, same as `{}`.
                    let start = self.pos;
                    self.pos += 1;
                    return Ok(Token { kind: TokenKind::EscapeWord, start, end: start });
                }
                self.in_quote = true;
                continue;
            }
            return self.scan_bare_word();
        }
    }

    /// Consume a `#...` comment, honoring `\<newline>` line continuation.
    fn skip_comment(&mut self) {
        while let Some(b) = self.peek() {
            if b == b'\\' && self.peek_at(1) == Some(b'\n') {
                self.pos += 2;
                continue;
            }
            if b == b'\n' {
                return;
            }
            self.pos += 1;
        }
    }

    /// `[ ... ]`, balanced, with one level of brace awareness so a `{ ... }`
    /// inside the command body does not close it early, and `\` skipping
    /// the next byte.
    fn scan_command(&mut self) -> Result<Token, PickleError> {
        debug_assert_eq!(self.bytes[self.pos], b'[');
        self.pos += 1;
        let start = self.pos;
        let mut cmd_depth = 1i32;
        let mut brace_depth = 0i32;
        loop {
            match self.peek() {
                None => return Err(PickleError::UnterminatedCommand),
                Some(b'\\') => {
                    self.pos += 2.min(self.len - self.pos);
                }
                Some(b'{') => {
                    brace_depth += 1;
                    self.pos += 1;
                }
                Some(b'}') => {
                    if brace_depth > 0 {
                        brace_depth -= 1;
                    }
                    self.pos += 1;
                }
                Some(b'[') if brace_depth == 0 => {
                    cmd_depth += 1;
                    self.pos += 1;
                }
                Some(b']') if brace_depth == 0 => {
                    cmd_depth -= 1;
                    if cmd_depth < 0 {
                        return Err(PickleError::StrayCloseBracket);
                    }
                    if cmd_depth == 0 {
                        let end = self.pos;
                        self.pos += 1;
                        return Ok(Token { kind: TokenKind::Command, start, end });
                    }
                    self.pos += 1;
                }
                Some(_) => self.pos += 1,
            }
        }
    }

    /// `{ ... }`, balanced; `\` escapes the next byte from affecting
    /// brace balance. The returned range is the interior only.
    fn scan_brace_word(&mut self) -> Result<Token, PickleError> {
        debug_assert_eq!(self.bytes[self.pos], b'{');
        self.pos += 1;
        let start = self.pos;
        let mut depth = 1i32;
        loop {
            match self.peek() {
                None => return Err(PickleError::UnterminatedBrace),
                Some(b'\\') => {
                    self.pos += 2.min(self.len - self.pos);
                }
                Some(b'{') => {
                    depth += 1;
                    self.pos += 1;
                }
                Some(b'}') => {
                    depth -= 1;
                    if depth == 0 {
                        let end = self.pos;
                        self.pos += 1;
                        return Ok(Token { kind: TokenKind::Word, start, end });
                    }
                    self.pos += 1;
                }
                Some(_) => self.pos += 1,
            }
        }
    }

    /// `$name` or `${name}`; a bare `$` with no following name byte (and
    /// not a `{`) yields a single-character literal word token.
    fn scan_variable(&mut self) -> Result<Token, PickleError> {
        debug_assert_eq!(self.bytes[self.pos], b'$');
        let dollar = self.pos;
        self.pos += 1;
        if self.peek() == Some(b'{') {
            self.pos += 1;
            let start = self.pos;
            loop {
                match self.peek() {
                    None => return Err(PickleError::UnterminatedBrace),
                    Some(b'}') => {
                        let end = self.pos;
                        self.pos += 1;
                        return Ok(Token { kind: TokenKind::VarRef, start, end });
                    }
                    Some(_) => self.pos += 1,
                }
            }
        }
        let start = self.pos;
        while self.peek().map(is_name_byte).unwrap_or(false) {
            self.pos += 1;
        }
        if self.pos == start {
            // Lone `$`: a one-byte literal word.
            return Ok(Token { kind: TokenKind::EscapeWord, start: dollar, end: self.pos });
        }
        Ok(Token { kind: TokenKind::VarRef, start, end: self.pos })
    }

    /// A run of literal/escape bytes inside an open `"..."` word, up to the
    /// next `$`, `[` (subject to the `no_variables`/`no_commands` toggles),
    /// or the closing quote. Called only while `in_quote` is set; `\`
    /// escapes the next byte so an escaped `"` cannot close the quote early.
    fn scan_quoted_segment(&mut self) -> Result<Token, PickleError> {
        let start = self.pos;
        loop {
            match self.peek() {
                None => return Err(PickleError::UnterminatedQuote),
                Some(b'\\') => {
                    self.pos += 2.min(self.len - self.pos);
                }
                Some(b'"') => break,
                Some(b'[') if !self.options.no_commands => break,
                Some(b'$') if !self.options.no_variables => break,
                Some(_) => self.pos += 1,
            }
        }
        Ok(Token { kind: TokenKind::EscapeWord, start, end: self.pos })
    }

    /// Up to the next separator, end-of-line, `$`, `[`, or `"`, with `\`
    /// escaping the following byte so it cannot terminate the word early.
    fn scan_bare_word(&mut self) -> Result<Token, PickleError> {
        let start = self.pos;
        loop {
            match self.peek() {
                None => break,
                Some(b'\\') => {
                    self.pos += 2.min(self.len - self.pos);
                }
                Some(b) if is_space(b) || is_eol_byte(b) => break,
                Some(b'$') if !self.options.no_variables => break,
                Some(b'[') if !self.options.no_commands => break,
                Some(b'"') => break,
                Some(_) => self.pos += 1,
            }
        }
        Ok(Token { kind: TokenKind::EscapeWord, start, end: self.pos })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let mut s = Scanner::new(src);
        let mut out = vec![];
        loop {
            let t = s.next_token().unwrap();
            if t.kind == TokenKind::End {
                break;
            }
            out.push(t.kind);
        }
        out
    }

    #[test]
    fn set_x_1() {
        let mut s = Scanner::new("set x 1");
        let t1 = s.next_token().unwrap();
        assert_eq!(t1.kind, TokenKind::EscapeWord);
        assert_eq!(s.text(&t1), "set");
        let _sep = s.next_token().unwrap();
        let t2 = s.next_token().unwrap();
        assert_eq!(s.text(&t2), "x");
    }

    #[test]
    fn brace_word_is_literal() {
        let mut s = Scanner::new("{a $b [c]}");
        let t = s.next_token().unwrap();
        assert_eq!(t.kind, TokenKind::Word);
        assert_eq!(s.text(&t), "a $b [c]");
    }

    #[test]
    fn nested_command_with_brace_protection() {
        let mut s = Scanner::new("[foo {a]b} bar]");
        let t = s.next_token().unwrap();
        assert_eq!(t.kind, TokenKind::Command);
        assert_eq!(s.text(&t), "foo {a]b} bar");
    }

    #[test]
    fn variable_forms() {
        let mut s = Scanner::new("$x${long name}$");
        let t1 = s.next_token().unwrap();
        assert_eq!(t1.kind, TokenKind::VarRef);
        assert_eq!(s.text(&t1), "x");
        let t2 = s.next_token().unwrap();
        assert_eq!(t2.kind, TokenKind::VarRef);
        assert_eq!(s.text(&t2), "long name");
        let t3 = s.next_token().unwrap();
        assert_eq!(t3.kind, TokenKind::EscapeWord);
        assert_eq!(s.text(&t3), "$");
    }

    #[test]
    fn unterminated_brace_errors() {
        let mut s = Scanner::new("{abc");
        assert!(matches!(s.next_token(), Err(PickleError::UnterminatedBrace)));
    }

    #[test]
    fn unterminated_quote_errors() {
        let mut s = Scanner::new("\"abc");
        assert!(matches!(s.next_token(), Err(PickleError::UnterminatedQuote)));
    }

    #[test]
    fn quoted_word_interpolates_variable() {
        let mut s = Scanner::new("\"val $x end\"");
        let t1 = s.next_token().unwrap();
        assert_eq!(t1.kind, TokenKind::EscapeWord);
        assert_eq!(s.text(&t1), "val ");
        let t2 = s.next_token().unwrap();
        assert_eq!(t2.kind, TokenKind::VarRef);
        assert_eq!(s.text(&t2), "x");
        let t3 = s.next_token().unwrap();
        assert_eq!(t3.kind, TokenKind::EscapeWord);
        assert_eq!(s.text(&t3), " end");
        let t4 = s.next_token().unwrap();
        assert_eq!(t4.kind, TokenKind::End);
    }

    #[test]
    fn quoted_word_interpolates_command() {
        let mut s = Scanner::new("\"[+ 1 1]\"");
        let t1 = s.next_token().unwrap();
        assert_eq!(t1.kind, TokenKind::Command);
        assert_eq!(s.text(&t1), "+ 1 1");
        let t2 = s.next_token().unwrap();
        assert_eq!(t2.kind, TokenKind::End);
    }

    #[test]
    fn empty_quoted_word_is_single_empty_token() {
        let mut s = Scanner::new("\"\"");
        let t = s.next_token().unwrap();
        assert_eq!(t.kind, TokenKind::EscapeWord);
        assert_eq!(s.text(&t), "");
        let eof = s.next_token().unwrap();
        assert_eq!(eof.kind, TokenKind::End);
    }

    #[test]
    fn escaped_quote_does_not_close_word_early() {
        let mut s = Scanner::new("\"a\\\"b\"");
        let t = s.next_token().unwrap();
        assert_eq!(t.kind, TokenKind::EscapeWord);
        assert_eq!(s.text(&t), "a\\\"b");
        let eof = s.next_token().unwrap();
        assert_eq!(eof.kind, TokenKind::End);
    }

    #[test]
    fn comment_skipped_at_command_start() {
        assert_eq!(kinds("# a comment\nset x 1"), kinds("set x 1"));
    }

    #[test]
    fn comment_not_special_mid_command() {
        // a literal '#' that isn't at a command start is just a bare word byte
        let mut s = Scanner::new("echo #notacomment");
        let t1 = s.next_token().unwrap();
        assert_eq!(s.text(&t1), "echo");
        let _sep = s.next_token().unwrap();
        let t2 = s.next_token().unwrap();
        assert_eq!(s.text(&t2), "#notacomment");
    }
}
