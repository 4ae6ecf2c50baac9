use super::Located;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
    Comma,
    Ge,
    Gt,
    Le,
    Lt,
    Eq,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(v) => write!(f, "{v}"),
            Self::Ident(name) => write!(f, "{name}"),
            Self::Plus => write!(f, "+"),
            Self::Minus => write!(f, "-"),
            Self::Star => write!(f, "*"),
            Self::Slash => write!(f, "/"),
            Self::Caret => write!(f, "^"),
            Self::LParen => write!(f, "("),
            Self::RParen => write!(f, ")"),
            Self::Comma => write!(f, ","),
            Self::Ge => write!(f, ">="),
            Self::Gt => write!(f, ">"),
            Self::Le => write!(f, "<="),
            Self::Lt => write!(f, "<"),
            Self::Eq => write!(f, "=="),
        }
    }
}

/// Split `input` into tokens paired with their byte offsets.
/// `**` is accepted as a synonym for `^`.
pub(crate) fn tokenize(input: &str) -> Result<Vec<(Token, usize)>, Located> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let ch = bytes[i];
        let start = i;
        match ch {
            b' ' | b'\t' | b'\n' | b'\r' => {
                i += 1;
                continue;
            }
            b'0'..=b'9' | b'.' => {
                i = scan_number(bytes, i);
                let text = &input[start..i];
                let value = text.parse::<f64>().map_err(|_| Located {
                    position: start,
                    message: format!("invalid number literal `{text}`"),
                })?;
                tokens.push((Token::Number(value), start));
                continue;
            }
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => {
                while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                    i += 1;
                }
                tokens.push((Token::Ident(input[start..i].to_string()), start));
                continue;
            }
            _ => {}
        }

        let next = bytes.get(i + 1).copied();
        let (token, width) = match (ch, next) {
            (b'*', Some(b'*')) => (Token::Caret, 2),
            (b'>', Some(b'=')) => (Token::Ge, 2),
            (b'<', Some(b'=')) => (Token::Le, 2),
            (b'=', Some(b'=')) => (Token::Eq, 2),
            (b'+', _) => (Token::Plus, 1),
            (b'-', _) => (Token::Minus, 1),
            (b'*', _) => (Token::Star, 1),
            (b'/', _) => (Token::Slash, 1),
            (b'^', _) => (Token::Caret, 1),
            (b'(', _) => (Token::LParen, 1),
            (b')', _) => (Token::RParen, 1),
            (b',', _) => (Token::Comma, 1),
            (b'>', _) => (Token::Gt, 1),
            (b'<', _) => (Token::Lt, 1),
            (b'=', _) => (Token::Eq, 1),
            _ => {
                let shown = input[start..].chars().next().unwrap_or('?');
                return Err(Located {
                    position: start,
                    message: format!("unexpected character `{shown}`"),
                });
            }
        };
        tokens.push((token, start));
        i += width;
    }

    Ok(tokens)
}

fn scan_number(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
        i += 1;
    }
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        if j < bytes.len() && bytes[j].is_ascii_digit() {
            while j < bytes.len() && bytes[j].is_ascii_digit() {
                j += 1;
            }
            i = j;
        }
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<Token> {
        tokenize(input).unwrap().into_iter().map(|(t, _)| t).collect()
    }

    #[test]
    fn simple_sum() {
        assert_eq!(
            kinds("x + 1"),
            vec![Token::Ident("x".into()), Token::Plus, Token::Number(1.0)]
        );
    }

    #[test]
    fn scientific_literal() {
        assert_eq!(kinds("4.27e-07"), vec![Token::Number(4.27e-07)]);
        assert_eq!(kinds("1E3"), vec![Token::Number(1000.0)]);
    }

    #[test]
    fn exponent_letter_without_digits_is_identifier() {
        // `2e` is the number 2 followed by the identifier `e`
        assert_eq!(
            kinds("2e"),
            vec![Token::Number(2.0), Token::Ident("e".into())]
        );
    }

    #[test]
    fn double_star_is_power() {
        assert_eq!(
            kinds("x**2"),
            vec![Token::Ident("x".into()), Token::Caret, Token::Number(2.0)]
        );
    }

    #[test]
    fn relations() {
        assert_eq!(
            kinds(">= > <= < =="),
            vec![Token::Ge, Token::Gt, Token::Le, Token::Lt, Token::Eq]
        );
    }

    #[test]
    fn offsets_are_byte_positions() {
        let tokens = tokenize("f(x, y)").unwrap();
        let offsets: Vec<_> = tokens.iter().map(|(_, p)| *p).collect();
        assert_eq!(offsets, vec![0, 1, 2, 3, 5, 6]);
    }

    #[test]
    fn unexpected_character() {
        let err = tokenize("x $ 1").unwrap_err();
        assert_eq!(err.position, 2);
        assert!(err.message.contains('$'));
    }

    #[test]
    fn bad_number() {
        let err = tokenize("1.2.3").unwrap_err();
        assert_eq!(err.position, 0);
    }
}
