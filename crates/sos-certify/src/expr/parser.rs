use super::lexer::{Token, tokenize};
use super::{BinaryOp, Expr, Located, RelationOp};
use crate::poly::MAX_DEGREE;

/// Recursive-descent parser over a token stream.
///
/// ```text
/// relation := sum (relop sum)?
/// sum      := product (("+" | "-") product)*
/// product  := unary (("*" | "/") unary)*
/// unary    := ("-" | "+") unary | power
/// power    := primary ("^" exponent)?
/// exponent := INT ("^" exponent)? | "(" exponent ")"
/// primary  := NUMBER | IDENT | IDENT "(" args ")" | "(" sum ")"
/// ```
struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
    end: usize,
}

pub(crate) fn parse_expr(input: &str) -> Result<Expr, Located> {
    let mut parser = Parser::new(input)?;
    let expr = parser.sum()?;
    parser.finish()?;
    Ok(expr)
}

pub(crate) fn parse_relation(input: &str) -> Result<(Expr, Option<(RelationOp, Expr)>), Located> {
    let mut parser = Parser::new(input)?;
    let lhs = parser.sum()?;
    let rel = match parser.peek() {
        Some(Token::Ge) => Some(RelationOp::Ge),
        Some(Token::Gt) => Some(RelationOp::Gt),
        Some(Token::Le) => Some(RelationOp::Le),
        Some(Token::Lt) => Some(RelationOp::Lt),
        Some(Token::Eq) => {
            return Err(parser.error("equalities are not inequalities; split into `>=` and `<=`"));
        }
        _ => None,
    };
    let rhs = match rel {
        Some(op) => {
            parser.advance();
            Some((op, parser.sum()?))
        }
        None => None,
    };
    parser.finish()?;
    Ok((lhs, rhs))
}

impl Parser {
    fn new(input: &str) -> Result<Self, Located> {
        let tokens = tokenize(input)?;
        if tokens.is_empty() {
            return Err(Located {
                position: 0,
                message: "empty expression".to_string(),
            });
        }
        Ok(Self {
            tokens,
            pos: 0,
            end: input.len(),
        })
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn position(&self) -> usize {
        self.tokens.get(self.pos).map_or(self.end, |(_, p)| *p)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|(t, _)| t.clone());
        self.pos += 1;
        token
    }

    fn error(&self, message: impl Into<String>) -> Located {
        Located {
            position: self.position(),
            message: message.into(),
        }
    }

    fn unexpected(&self, expected: &str) -> Located {
        match self.peek() {
            Some(t) => self.error(format!("expected {expected}, found `{t}`")),
            None => self.error(format!("expected {expected}, found end of input")),
        }
    }

    fn expect(&mut self, token: &Token, expected: &str) -> Result<(), Located> {
        if self.peek() == Some(token) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn finish(&self) -> Result<(), Located> {
        if self.pos < self.tokens.len() {
            Err(self.unexpected("end of input"))
        } else {
            Ok(())
        }
    }

    fn sum(&mut self) -> Result<Expr, Located> {
        let mut lhs = self.product()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => return Ok(lhs),
            };
            let at = self.position();
            self.advance();
            let rhs = self.product()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                at,
            };
        }
    }

    fn product(&mut self) -> Result<Expr, Located> {
        let mut lhs = self.unary()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    let at = self.position();
                    self.advance();
                    let rhs = self.unary()?;
                    lhs = Expr::Binary {
                        op: BinaryOp::Mul,
                        lhs: Box::new(lhs),
                        rhs: Box::new(rhs),
                        at,
                    };
                }
                Some(Token::Slash) => {
                    let at = self.position();
                    self.advance();
                    let rhs = self.unary()?;
                    lhs = Expr::Div {
                        lhs: Box::new(lhs),
                        rhs: Box::new(rhs),
                        at,
                    };
                }
                _ => return Ok(lhs),
            }
        }
    }

    fn unary(&mut self) -> Result<Expr, Located> {
        match self.peek() {
            Some(Token::Minus) => {
                self.advance();
                Ok(Expr::Neg(Box::new(self.unary()?)))
            }
            Some(Token::Plus) => {
                self.advance();
                self.unary()
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Result<Expr, Located> {
        let base = self.primary()?;
        if self.peek() == Some(&Token::Caret) {
            let at = self.position();
            self.advance();
            let exponent = self.exponent()?;
            return Ok(Expr::Pow {
                base: Box::new(base),
                exponent,
                at,
            });
        }
        Ok(base)
    }

    /// An integer exponent no larger than [`MAX_DEGREE`].
    fn exponent(&mut self) -> Result<u32, Located> {
        let at = self.position();
        let value = match self.advance() {
            Some(Token::Number(v)) => v,
            Some(Token::LParen) => {
                let inner = self.exponent()?;
                self.expect(&Token::RParen, "`)`")?;
                return Ok(inner);
            }
            _ => {
                self.pos -= 1;
                return Err(self.unexpected("a non-negative integer exponent"));
            }
        };
        if value.fract() != 0.0 || value < 0.0 {
            return Err(Located {
                position: at,
                message: format!("exponent {value} is not a non-negative integer"),
            });
        }
        let too_large = |shown: String| Located {
            position: at,
            message: format!("exponent {shown} exceeds the maximum degree {MAX_DEGREE}"),
        };
        if value > f64::from(MAX_DEGREE) {
            return Err(too_large(value.to_string()));
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let mut exponent = value as u32;
        if self.peek() == Some(&Token::Caret) {
            self.advance();
            let tower = self.exponent()?;
            exponent = match exponent.checked_pow(tower) {
                Some(e) if e <= MAX_DEGREE => e,
                Some(e) => return Err(too_large(e.to_string())),
                None => return Err(too_large(format!("{exponent}^{tower}"))),
            };
        }
        Ok(exponent)
    }

    fn primary(&mut self) -> Result<Expr, Located> {
        let at = self.position();
        match self.advance() {
            Some(Token::Number(v)) => Ok(Expr::Number(v)),
            Some(Token::Ident(name)) => {
                if self.peek() == Some(&Token::LParen) {
                    self.advance();
                    let args = self.arguments()?;
                    Ok(Expr::Call { name, args, at })
                } else {
                    Ok(Expr::Variable { name, at })
                }
            }
            Some(Token::LParen) => {
                let inner = self.sum()?;
                self.expect(&Token::RParen, "`)`")?;
                Ok(inner)
            }
            _ => {
                self.pos -= 1;
                Err(self.unexpected("a number, identifier or `(`"))
            }
        }
    }

    fn arguments(&mut self) -> Result<Vec<Expr>, Located> {
        let mut args = Vec::new();
        if self.peek() == Some(&Token::RParen) {
            self.advance();
            return Ok(args);
        }
        loop {
            args.push(self.sum()?);
            match self.advance() {
                Some(Token::Comma) => {}
                Some(Token::RParen) => return Ok(args),
                _ => {
                    self.pos -= 1;
                    return Err(self.unexpected("`,` or `)`"));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precedence_mul_over_add() {
        let e = parse_expr("1 + 2 * x").unwrap();
        let Expr::Binary { op: BinaryOp::Add, rhs, .. } = e else {
            panic!("expected sum at the root, got {e:?}");
        };
        assert!(matches!(*rhs, Expr::Binary { op: BinaryOp::Mul, .. }));
    }

    #[test]
    fn subtraction_is_left_associative() {
        // (x - 1) - 2
        let e = parse_expr("x - 1 - 2").unwrap();
        let Expr::Binary { op: BinaryOp::Sub, lhs, rhs, .. } = e else {
            panic!("expected difference");
        };
        assert!(matches!(*lhs, Expr::Binary { op: BinaryOp::Sub, .. }));
        assert_eq!(*rhs, Expr::Number(2.0));
    }

    #[test]
    fn unary_minus_binds_looser_than_power() {
        let e = parse_expr("-x^2").unwrap();
        let Expr::Neg(inner) = e else {
            panic!("expected negation");
        };
        assert!(matches!(*inner, Expr::Pow { exponent: 2, .. }));
    }

    #[test]
    fn power_tower_is_right_associative() {
        let e = parse_expr("x^2^3").unwrap();
        assert!(matches!(e, Expr::Pow { exponent: 8, .. }));
    }

    #[test]
    fn parenthesized_exponent() {
        let e = parse_expr("x**(2)").unwrap();
        assert!(matches!(e, Expr::Pow { exponent: 2, .. }));
    }

    #[test]
    fn exponent_above_max_degree_rejected() {
        let err = parse_expr("x^4000000000").unwrap_err();
        assert_eq!(err.position, 2);
        assert!(err.message.contains("maximum degree"), "{}", err.message);
        assert!(parse_expr("x^64").is_ok());
        assert!(parse_expr("x^65").is_err());
    }

    #[test]
    fn power_tower_above_max_degree_rejected() {
        assert!(parse_expr("x^2^6").is_ok());
        let err = parse_expr("x^2^7").unwrap_err();
        assert!(err.message.contains("exponent 128"), "{}", err.message);
        assert!(parse_expr("x^64^64").is_err());
    }

    #[test]
    fn fractional_exponent_rejected() {
        let err = parse_expr("x^0.5").unwrap_err();
        assert!(err.message.contains("non-negative integer"));
    }

    #[test]
    fn function_call_arguments() {
        let e = parse_expr("g(x - 1, 2*y)").unwrap();
        let Expr::Call { name, args, at } = e else {
            panic!("expected call");
        };
        assert_eq!(name, "g");
        assert_eq!(args.len(), 2);
        assert_eq!(at, 0);
    }

    #[test]
    fn unbalanced_parenthesis() {
        let err = parse_expr("(x + 1").unwrap_err();
        assert!(err.message.contains("`)`"));
        assert_eq!(err.position, 6);
    }

    #[test]
    fn trailing_tokens_rejected() {
        let err = parse_expr("x y").unwrap_err();
        assert!(err.message.contains("end of input"));
        assert_eq!(err.position, 2);
    }

    #[test]
    fn empty_input_rejected() {
        assert!(parse_expr("   ").is_err());
    }

    #[test]
    fn relation_splits_sides() {
        let (lhs, rhs) = parse_relation("f(x) >= f(x - 1) + x + 1").unwrap();
        assert!(matches!(lhs, Expr::Call { .. }));
        let (op, _) = rhs.unwrap();
        assert_eq!(op, RelationOp::Ge);
    }

    #[test]
    fn bare_expression_has_no_relation() {
        let (_, rhs) = parse_relation("x - 1").unwrap();
        assert!(rhs.is_none());
    }

    #[test]
    fn equality_rejected() {
        let err = parse_relation("x == 1").unwrap_err();
        assert!(err.message.contains("equalities"));
    }

    #[test]
    fn chained_relation_rejected() {
        assert!(parse_relation("0 <= x <= 1").is_err());
    }
}
