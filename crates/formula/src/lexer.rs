use crate::error::FormulaError;
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenKind {
    Number(f64),
    Ident,
    Plus,
    Minus,
    Star,
    Slash,
    /// Both `^` and `**`.
    Caret,
    LParen,
    RParen,
    Comma,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub span: Range<usize>,
}

/// Splits a formula into tokens. Identifiers are always whole words, so `ES`
/// is never seen as `E` followed by `S`.
pub fn tokenize(src: &str) -> Result<Vec<Token<'_>>, FormulaError> {
    let bytes = src.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let c = bytes[pos];
        let start = pos;

        if c.is_ascii_whitespace() {
            pos += 1;
            continue;
        }

        let kind = if c.is_ascii_digit() || (c == b'.' && next_is_digit(bytes, pos + 1)) {
            pos = scan_number(bytes, pos);
            let text = &src[start..pos];
            let value = text
                .parse::<f64>()
                .map_err(|_| FormulaError::syntax(src, start, format!("malformed number '{text}'")))?;
            TokenKind::Number(value)
        } else if c.is_ascii_alphabetic() || c == b'_' {
            while pos < bytes.len() && (bytes[pos].is_ascii_alphanumeric() || bytes[pos] == b'_') {
                pos += 1;
            }
            TokenKind::Ident
        } else {
            pos += 1;
            match c {
                b'+' => TokenKind::Plus,
                b'-' => TokenKind::Minus,
                b'*' if bytes.get(pos) == Some(&b'*') => {
                    pos += 1;
                    TokenKind::Caret
                }
                b'*' => TokenKind::Star,
                b'/' => TokenKind::Slash,
                b'^' => TokenKind::Caret,
                b'(' => TokenKind::LParen,
                b')' => TokenKind::RParen,
                b',' => TokenKind::Comma,
                _ => {
                    let ch = src[start..].chars().next().unwrap_or('?');
                    return Err(FormulaError::syntax(
                        src,
                        start,
                        format!("unexpected character '{ch}'"),
                    ));
                }
            }
        };

        tokens.push(Token {
            kind,
            text: &src[start..pos],
            span: start..pos,
        });
    }

    Ok(tokens)
}

fn next_is_digit(bytes: &[u8], pos: usize) -> bool {
    bytes.get(pos).is_some_and(u8::is_ascii_digit)
}

/// Returns the end of the number starting at `pos`: digits, an optional
/// fraction and an optional exponent (`e`/`E`, optional sign, digits).
fn scan_number(bytes: &[u8], mut pos: usize) -> usize {
    while next_is_digit(bytes, pos) {
        pos += 1;
    }
    if bytes.get(pos) == Some(&b'.') {
        pos += 1;
        while next_is_digit(bytes, pos) {
            pos += 1;
        }
    }
    if matches!(bytes.get(pos), Some(b'e' | b'E')) {
        let mut lookahead = pos + 1;
        if matches!(bytes.get(lookahead), Some(b'+' | b'-')) {
            lookahead += 1;
        }
        if next_is_digit(bytes, lookahead) {
            pos = lookahead;
            while next_is_digit(bytes, pos) {
                pos += 1;
            }
        }
    }
    pos
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        tokenize(src).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn error_symbols_are_single_tokens() {
        let tokens = tokenize("ES+S*EB").unwrap();
        let texts: Vec<_> = tokens.iter().map(|t| t.text).collect();
        assert_eq!(texts, vec!["ES", "+", "S", "*", "EB"]);
    }

    #[test]
    fn double_star_is_a_power() {
        assert_eq!(
            kinds("B**2"),
            vec![TokenKind::Ident, TokenKind::Caret, TokenKind::Number(2.0)]
        );
    }

    #[test]
    fn numbers_accept_trailing_dot_and_exponent() {
        assert_eq!(
            kinds("3./2. + .5 + 1e-3"),
            vec![
                TokenKind::Number(3.0),
                TokenKind::Slash,
                TokenKind::Number(2.0),
                TokenKind::Plus,
                TokenKind::Number(0.5),
                TokenKind::Plus,
                TokenKind::Number(1e-3),
            ]
        );
    }

    #[test]
    fn exponent_marker_needs_digits() {
        // `2eB` is the number 2 followed by the identifier `eB`.
        let tokens = tokenize("2eB").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Number(2.0));
        assert_eq!(tokens[1].text, "eB");
    }

    #[test]
    fn spans_point_into_the_source() {
        let src = " S / sqrt( B )";
        for token in tokenize(src).unwrap() {
            assert_eq!(&src[token.span.clone()], token.text);
        }
    }

    #[test]
    fn stray_characters_are_rejected_with_position() {
        match tokenize("S % B") {
            Err(FormulaError::SyntaxError { position, .. }) => assert_eq!(position, 2),
            other => panic!("expected a syntax error, got {other:?}"),
        }
    }
}
