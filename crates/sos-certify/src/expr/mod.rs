//! Textual polynomial expressions.
//!
//! Hypotheses, conclusions and target templates are written as strings
//! such as `f(x) >= f(x - 1) + x + 1`. Parsing yields an unexpanded tree;
//! [`Expression::expand`] turns it into a canonical [`Polynomial`] against
//! a [`Scope`] that fixes which identifiers and functions are legal.

mod lexer;
mod parser;

use std::collections::{BTreeMap, BTreeSet};

use crate::error::CertifyError;
use crate::poly::{MAX_DEGREE, Polynomial};

/// Parse or expansion failure at a byte offset of the source string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Located {
    pub position: usize,
    pub message: String,
}

impl Located {
    fn into_error(self, input: &str) -> CertifyError {
        CertifyError::Expression {
            input: input.to_string(),
            position: self.position,
            message: self.message,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationOp {
    Ge,
    Gt,
    Le,
    Lt,
}

/// Unexpanded expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Variable { name: String, at: usize },
    Neg(Box<Expr>),
    Binary { op: BinaryOp, lhs: Box<Expr>, rhs: Box<Expr>, at: usize },
    Div { lhs: Box<Expr>, rhs: Box<Expr>, at: usize },
    Pow { base: Box<Expr>, exponent: u32, at: usize },
    Call { name: String, args: Vec<Expr>, at: usize },
}

/// A function callable from expressions: parameters plus a body written
/// in those parameters.
#[derive(Debug, Clone, Copy)]
pub struct FunctionRef<'a> {
    pub params: &'a [String],
    pub body: &'a Polynomial,
}

/// Identifiers and functions visible while expanding.
#[derive(Debug, Clone, Default)]
pub struct Scope<'a> {
    variables: BTreeSet<&'a str>,
    functions: BTreeMap<&'a str, FunctionRef<'a>>,
}

impl<'a> Scope<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_variables(mut self, names: impl IntoIterator<Item = &'a str>) -> Self {
        self.variables.extend(names);
        self
    }

    pub fn with_function(mut self, name: &'a str, params: &'a [String], body: &'a Polynomial) -> Self {
        self.functions.insert(name, FunctionRef { params, body });
        self
    }

    pub fn has_variable(&self, name: &str) -> bool {
        self.variables.contains(name)
    }

    pub fn function(&self, name: &str) -> Option<FunctionRef<'a>> {
        self.functions.get(name).copied()
    }
}

/// Reject a result whose degree would exceed [`MAX_DEGREE`] before it is
/// computed.
fn check_degree(degree: u64, at: usize) -> Result<(), Located> {
    if degree > u64::from(MAX_DEGREE) {
        return Err(Located {
            position: at,
            message: format!("degree {degree} exceeds the maximum degree {MAX_DEGREE}"),
        });
    }
    Ok(())
}

fn overflow(at: usize) -> Located {
    Located {
        position: at,
        message: "power overflow".to_string(),
    }
}

fn degree_of(p: &Polynomial) -> u64 {
    p.degree().unwrap_or(0)
}

impl Expr {
    fn expand(&self, scope: &Scope<'_>) -> Result<Polynomial, Located> {
        match self {
            Self::Number(v) => Ok(Polynomial::constant(*v)),
            Self::Variable { name, at } => {
                if scope.has_variable(name) {
                    Ok(Polynomial::var(name))
                } else if scope.function(name).is_some() {
                    Err(Located {
                        position: *at,
                        message: format!("function `{name}` used without arguments"),
                    })
                } else {
                    Err(Located {
                        position: *at,
                        message: format!("unknown identifier `{name}`"),
                    })
                }
            }
            Self::Neg(inner) => Ok(-inner.expand(scope)?),
            Self::Binary { op, lhs, rhs, at } => {
                let l = lhs.expand(scope)?;
                let r = rhs.expand(scope)?;
                match op {
                    BinaryOp::Add => Ok(&l + &r),
                    BinaryOp::Sub => Ok(&l - &r),
                    BinaryOp::Mul => {
                        check_degree(degree_of(&l) + degree_of(&r), *at)?;
                        l.checked_mul(&r).ok_or_else(|| overflow(*at))
                    }
                }
            }
            Self::Div { lhs, rhs, at } => {
                let l = lhs.expand(scope)?;
                match rhs.expand(scope)?.as_constant() {
                    Some(d) if d != 0.0 => Ok(l.scale(1.0 / d)),
                    _ => Err(Located {
                        position: *at,
                        message: "divisor must be a non-zero constant".to_string(),
                    }),
                }
            }
            Self::Pow { base, exponent, at } => {
                let b = base.expand(scope)?;
                check_degree(degree_of(&b).saturating_mul(u64::from(*exponent)), *at)?;
                b.checked_pow(*exponent).ok_or_else(|| overflow(*at))
            }
            Self::Call { name, args, at } => {
                let Some(function) = scope.function(name) else {
                    return Err(Located {
                        position: *at,
                        message: format!("unknown function `{name}`"),
                    });
                };
                if function.params.len() != args.len() {
                    return Err(Located {
                        position: *at,
                        message: format!(
                            "`{name}` takes {} argument(s), {} given",
                            function.params.len(),
                            args.len()
                        ),
                    });
                }
                let mut replacements = BTreeMap::new();
                for (param, arg) in function.params.iter().zip(args) {
                    replacements.insert(param.clone(), arg.expand(scope)?);
                }
                check_degree(function.body.substituted_degree(&replacements), *at)?;
                function
                    .body
                    .substitute_all(&replacements)
                    .ok_or_else(|| overflow(*at))
            }
        }
    }
}

/// A parsed polynomial expression together with its source text.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    source: String,
    root: Expr,
}

impl Expression {
    /// # Errors
    ///
    /// Returns [`CertifyError::Expression`] on a syntax error.
    pub fn parse(source: &str) -> Result<Self, CertifyError> {
        let root = parser::parse_expr(source).map_err(|e| e.into_error(source))?;
        Ok(Self {
            source: source.to_string(),
            root,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root(&self) -> &Expr {
        &self.root
    }

    /// Expand into canonical form.
    ///
    /// # Errors
    ///
    /// Returns [`CertifyError::Expression`] for identifiers or functions
    /// outside `scope`, arity mismatches, non-constant divisors and
    /// products, powers or calls whose degree exceeds [`MAX_DEGREE`].
    pub fn expand(&self, scope: &Scope<'_>) -> Result<Polynomial, CertifyError> {
        self.root.expand(scope).map_err(|e| e.into_error(&self.source))
    }
}

/// A constraint `lhs op rhs`, or a bare expression asserted `>= 0`.
#[derive(Debug, Clone, PartialEq)]
pub struct Inequality {
    source: String,
    lhs: Expr,
    op: RelationOp,
    rhs: Expr,
}

impl Inequality {
    /// # Errors
    ///
    /// Returns [`CertifyError::Expression`] on a syntax error, an equality,
    /// or a chained comparison.
    pub fn parse(source: &str) -> Result<Self, CertifyError> {
        let (lhs, rest) = parser::parse_relation(source).map_err(|e| e.into_error(source))?;
        let (op, rhs) = rest.unwrap_or((RelationOp::Ge, Expr::Number(0.0)));
        Ok(Self {
            source: source.to_string(),
            lhs,
            op,
            rhs,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn op(&self) -> RelationOp {
        self.op
    }

    /// The polynomial asserted non-negative: `lhs - rhs` for `>=`/`>`,
    /// `rhs - lhs` for `<=`/`<`.
    ///
    /// # Errors
    ///
    /// Same as [`Expression::expand`].
    pub fn to_nonnegative(&self, scope: &Scope<'_>) -> Result<Polynomial, CertifyError> {
        let lhs = self.lhs.expand(scope).map_err(|e| e.into_error(&self.source))?;
        let rhs = self.rhs.expand(scope).map_err(|e| e.into_error(&self.source))?;
        Ok(match self.op {
            RelationOp::Ge | RelationOp::Gt => &lhs - &rhs,
            RelationOp::Le | RelationOp::Lt => &rhs - &lhs,
        })
    }
}
