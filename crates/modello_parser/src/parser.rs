use modello_ast::{Constant, Context, Expr, ExprId};
use nom::{
    bytes::complete::{tag, take_while},
    character::complete::{char, multispace0, one_of},
    combinator::opt,
    multi::{fold_many0, separated_list0},
    sequence::{delimited, pair, preceded},
    IResult,
};
use num_bigint::BigInt;
use num_rational::BigRational;

use crate::error::ParseError;

/// Maps identifiers (possibly dotted, like `child.c`) to expressions.
pub trait Resolver {
    fn resolve(&mut self, ctx: &mut Context, path: &str) -> Result<ExprId, ParseError>;
}

/// Resolver that turns every identifier into a free symbol.
pub struct FreeSymbols;

impl Resolver for FreeSymbols {
    fn resolve(&mut self, ctx: &mut Context, path: &str) -> Result<ExprId, ParseError> {
        Ok(ctx.var(path))
    }
}

// Intermediate AST for parsing
#[derive(Debug, Clone)]
enum ParseNode {
    Number(BigRational),
    Constant(Constant),
    Path(String),
    Add(Box<ParseNode>, Box<ParseNode>),
    Sub(Box<ParseNode>, Box<ParseNode>),
    Mul(Box<ParseNode>, Box<ParseNode>),
    Div(Box<ParseNode>, Box<ParseNode>),
    Pow(Box<ParseNode>, Box<ParseNode>),
    Neg(Box<ParseNode>),
    Function(String, Vec<ParseNode>),
}

impl ParseNode {
    fn lower(self, ctx: &mut Context, resolver: &mut dyn Resolver) -> Result<ExprId, ParseError> {
        Ok(match self {
            ParseNode::Number(n) => ctx.add(Expr::Number(n)),
            ParseNode::Constant(c) => ctx.add(Expr::Constant(c)),
            ParseNode::Path(path) => resolver.resolve(ctx, &path)?,
            ParseNode::Add(l, r) => {
                let lid = l.lower(ctx, resolver)?;
                let rid = r.lower(ctx, resolver)?;
                ctx.add(Expr::Add(lid, rid))
            }
            ParseNode::Sub(l, r) => {
                let lid = l.lower(ctx, resolver)?;
                let rid = r.lower(ctx, resolver)?;
                ctx.add(Expr::Sub(lid, rid))
            }
            ParseNode::Mul(l, r) => {
                let lid = l.lower(ctx, resolver)?;
                let rid = r.lower(ctx, resolver)?;
                ctx.add(Expr::Mul(lid, rid))
            }
            ParseNode::Div(l, r) => {
                let lid = l.lower(ctx, resolver)?;
                let rid = r.lower(ctx, resolver)?;
                ctx.add(Expr::Div(lid, rid))
            }
            ParseNode::Pow(b, e) => {
                let bid = b.lower(ctx, resolver)?;
                let eid = e.lower(ctx, resolver)?;
                ctx.add(Expr::Pow(bid, eid))
            }
            ParseNode::Neg(e) => {
                let eid = e.lower(ctx, resolver)?;
                ctx.add(Expr::Neg(eid))
            }
            ParseNode::Function(name, args) => {
                let arg_ids = args
                    .into_iter()
                    .map(|a| a.lower(ctx, resolver))
                    .collect::<Result<Vec<_>, _>>()?;
                ctx.add(Expr::Function(name, arg_ids))
            }
        })
    }
}

/// Convert a decimal string to BigRational.
/// Supports: "8.2" → 41/5, ".5" → 1/2, "8." → 8, "123" → 123
fn decimal_to_rational(integer_part: &str, fractional_part: &str) -> BigRational {
    let int_val: BigInt = integer_part.parse().unwrap_or_else(|_| BigInt::from(0));
    if fractional_part.is_empty() {
        return BigRational::from_integer(int_val);
    }

    let denominator = num_traits::pow(BigInt::from(10), fractional_part.len());
    let frac_val: BigInt = fractional_part.parse().unwrap_or_else(|_| BigInt::from(0));

    // BigRational::new reduces the fraction
    BigRational::new(int_val * &denominator + frac_val, denominator)
}

fn error_at(input: &str, kind: nom::error::ErrorKind) -> nom::Err<nom::error::Error<&str>> {
    nom::Err::Error(nom::error::Error::new(input, kind))
}

// Parser for numeric literals: 123, 8.2, .5, 8.
fn parse_number(input: &str) -> IResult<&str, ParseNode> {
    let is_digit = |c: char| c.is_ascii_digit();
    let (remaining, (int_str, maybe_frac)) =
        pair(take_while(is_digit), opt(pair(tag("."), take_while(is_digit))))(input)?;
    let frac_str = maybe_frac.map(|(_, frac)| frac).unwrap_or("");

    if int_str.is_empty() && frac_str.is_empty() {
        return Err(error_at(input, nom::error::ErrorKind::Digit));
    }

    Ok((remaining, ParseNode::Number(decimal_to_rational(int_str, frac_str))))
}

fn is_word_boundary(remaining: &str) -> bool {
    remaining
        .chars()
        .next()
        .map_or(true, |c| !c.is_ascii_alphanumeric() && c != '_' && c != '.' && c != '(')
}

// 'e' and 'pi' should not match prefixes of longer identifiers (e.g. 'exact', 'pivot')
fn parse_constant(input: &str) -> IResult<&str, ParseNode> {
    if input.starts_with("pi") && is_word_boundary(&input[2..]) {
        return Ok((&input[2..], ParseNode::Constant(Constant::Pi)));
    }
    if input.starts_with('e') && is_word_boundary(&input[1..]) {
        return Ok((&input[1..], ParseNode::Constant(Constant::E)));
    }
    Err(error_at(input, nom::error::ErrorKind::Tag))
}

/// Identifiers start with letter or underscore, then allow letters, digits, underscores.
pub(crate) fn parse_identifier(input: &str) -> IResult<&str, &str> {
    let mut chars = input.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return Err(error_at(input, nom::error::ErrorKind::Alpha)),
    }
    let len = 1 + chars
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
        .count();
    Ok((&input[len..], &input[..len]))
}

// Dotted attribute paths: x, child.c, line.start.x
fn parse_path(input: &str) -> IResult<&str, ParseNode> {
    let (mut rest, first) = parse_identifier(input)?;
    let mut len = first.len();
    while let Some(after_dot) = rest.strip_prefix('.') {
        let (next, segment) = parse_identifier(after_dot)?;
        len += 1 + segment.len();
        rest = next;
    }
    Ok((rest, ParseNode::Path(input[..len].to_string())))
}

fn parse_parens(input: &str) -> IResult<&str, ParseNode> {
    delimited(char('('), parse_expr, preceded(multispace0, char(')')))(input)
}

fn parse_function(input: &str) -> IResult<&str, ParseNode> {
    let (input, name) = parse_identifier(input)?;
    let (input, _) = preceded(multispace0, char('('))(input)?;
    let (input, mut args) = separated_list0(preceded(multispace0, char(',')), parse_expr)(input)?;
    let (input, _) = preceded(multispace0, char(')'))(input)?;

    match (name, args.len()) {
        // sqrt(x) -> x^(1/2)
        ("sqrt", 1) => {
            let half = BigRational::new(BigInt::from(1), BigInt::from(2));
            let arg = args.remove(0);
            Ok((
                input,
                ParseNode::Pow(Box::new(arg), Box::new(ParseNode::Number(half))),
            ))
        }
        // exp(x) -> e^x
        ("exp", 1) => {
            let arg = args.remove(0);
            Ok((
                input,
                ParseNode::Pow(Box::new(ParseNode::Constant(Constant::E)), Box::new(arg)),
            ))
        }
        _ => Ok((input, ParseNode::Function(name.to_string(), args))),
    }
}

fn parse_atom(input: &str) -> IResult<&str, ParseNode> {
    let (input, _) = multispace0(input)?;
    if let Ok(ok) = parse_number(input) {
        return Ok(ok);
    }
    if let Ok(ok) = parse_function(input) {
        return Ok(ok);
    }
    if let Ok(ok) = parse_constant(input) {
        return Ok(ok);
    }
    if let Ok(ok) = parse_path(input) {
        return Ok(ok);
    }
    parse_parens(input)
}

// power := atom ("^" unary)?   right associative, allows x^-1
fn parse_power(input: &str) -> IResult<&str, ParseNode> {
    let (input, base) = parse_atom(input)?;
    let (input, exp) = opt(preceded(preceded(multispace0, char('^')), parse_unary))(input)?;
    Ok(match exp {
        Some(e) => (input, ParseNode::Pow(Box::new(base), Box::new(e))),
        None => (input, base),
    })
}

fn parse_unary(input: &str) -> IResult<&str, ParseNode> {
    let (rest, _) = multispace0(input)?;
    if let Some(after) = rest.strip_prefix('-') {
        let (after, inner) = parse_unary(after)?;
        return Ok((after, ParseNode::Neg(Box::new(inner))));
    }
    if let Some(after) = rest.strip_prefix('+') {
        return parse_unary(after);
    }
    parse_power(rest)
}

fn parse_term(input: &str) -> IResult<&str, ParseNode> {
    let (input, first) = parse_unary(input)?;
    fold_many0(
        pair(preceded(multispace0, one_of("*/")), parse_unary),
        move || first.clone(),
        |acc, (op, rhs)| match op {
            '*' => ParseNode::Mul(Box::new(acc), Box::new(rhs)),
            _ => ParseNode::Div(Box::new(acc), Box::new(rhs)),
        },
    )(input)
}

fn parse_expr(input: &str) -> IResult<&str, ParseNode> {
    let (input, first) = parse_term(input)?;
    fold_many0(
        pair(preceded(multispace0, one_of("+-")), parse_term),
        move || first.clone(),
        |acc, (op, rhs)| match op {
            '+' => ParseNode::Add(Box::new(acc), Box::new(rhs)),
            _ => ParseNode::Sub(Box::new(acc), Box::new(rhs)),
        },
    )(input)
}

fn parse_node(input: &str) -> Result<ParseNode, ParseError> {
    if input.trim().is_empty() {
        return Err(ParseError::Empty);
    }
    let syntax_error = |rest: &str| ParseError::Syntax {
        offset: input.len() - rest.len(),
        found: rest.chars().take(16).collect(),
    };
    match parse_expr(input) {
        Ok((rest, node)) => {
            let rest = rest.trim_start();
            if rest.is_empty() {
                Ok(node)
            } else {
                Err(syntax_error(rest))
            }
        }
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(syntax_error(e.input)),
        Err(nom::Err::Incomplete(_)) => Err(syntax_error("")),
    }
}

/// Parse an expression, turning identifiers into free symbols.
pub fn parse(input: &str, ctx: &mut Context) -> Result<ExprId, ParseError> {
    parse_with(input, ctx, &mut FreeSymbols)
}

/// Parse an expression, resolving identifiers through `resolver`.
pub fn parse_with(
    input: &str,
    ctx: &mut Context,
    resolver: &mut dyn Resolver,
) -> Result<ExprId, ParseError> {
    parse_node(input)?.lower(ctx, resolver)
}

#[cfg(test)]
mod tests {
    use super::*;
    use modello_ast::DisplayExpr;

    fn roundtrip(input: &str) -> String {
        let mut ctx = Context::new();
        let id = parse(input, &mut ctx).unwrap();
        DisplayExpr { context: &ctx, id }.to_string()
    }

    #[test]
    fn test_precedence() {
        assert_eq!(roundtrip("1 + x*2"), "1 + x * 2");
        assert_eq!(roundtrip("(a+b)^2"), "(a + b)^2");
        assert_eq!(roundtrip("a - (b - c)"), "a - (b - c)");
        assert_eq!(roundtrip("-x^2"), "-x^2");
    }

    #[test]
    fn test_power_is_right_associative() {
        let mut ctx = Context::new();
        let id = parse("2^3^2", &mut ctx).unwrap();
        match ctx.get(id) {
            Expr::Pow(_, e) => assert!(matches!(ctx.get(*e), Expr::Pow(_, _))),
            other => panic!("expected Pow, got {:?}", other),
        }
    }

    #[test]
    fn test_decimals_are_exact() {
        let mut ctx = Context::new();
        let id = parse("8.2", &mut ctx).unwrap();
        assert_eq!(
            ctx.as_number(id),
            Some(&BigRational::new(BigInt::from(41), BigInt::from(5)))
        );
    }

    #[test]
    fn test_sqrt_becomes_half_power() {
        assert_eq!(roundtrip("sqrt(a^2 + b^2)"), "(a^2 + b^2)^(1/2)");
    }

    #[test]
    fn test_constants_respect_word_boundaries() {
        let mut ctx = Context::new();
        let pi = parse("pi", &mut ctx).unwrap();
        assert_eq!(ctx.get(pi), &Expr::Constant(Constant::Pi));
        let pivot = parse("pivot", &mut ctx).unwrap();
        assert!(matches!(ctx.get(pivot), Expr::Variable(_)));
        let exact = parse("exact + e", &mut ctx).unwrap();
        assert_eq!(
            DisplayExpr { context: &ctx, id: exact }.to_string(),
            "exact + e"
        );
    }

    #[test]
    fn test_dotted_paths_reach_resolver() {
        struct Record(Vec<String>);
        impl Resolver for Record {
            fn resolve(&mut self, ctx: &mut Context, path: &str) -> Result<ExprId, ParseError> {
                self.0.push(path.to_string());
                Ok(ctx.var(path))
            }
        }
        let mut ctx = Context::new();
        let mut rec = Record(Vec::new());
        parse_with("child.c + d", &mut ctx, &mut rec).unwrap();
        assert_eq!(rec.0, vec!["child.c".to_string(), "d".to_string()]);
    }

    #[test]
    fn test_resolver_errors_propagate() {
        struct Nothing;
        impl Resolver for Nothing {
            fn resolve(&mut self, _: &mut Context, path: &str) -> Result<ExprId, ParseError> {
                Err(ParseError::UnknownName(path.to_string()))
            }
        }
        let mut ctx = Context::new();
        assert_eq!(
            parse_with("1 + q", &mut ctx, &mut Nothing),
            Err(ParseError::UnknownName("q".to_string()))
        );
    }

    #[test]
    fn test_syntax_errors() {
        let mut ctx = Context::new();
        assert_eq!(parse("   ", &mut ctx), Err(ParseError::Empty));
        assert!(matches!(
            parse("a + * b", &mut ctx),
            Err(ParseError::Syntax { .. })
        ));
        assert!(matches!(
            parse("(a + b", &mut ctx),
            Err(ParseError::Syntax { .. })
        ));
        assert_eq!(
            parse("a b", &mut ctx),
            Err(ParseError::Syntax {
                offset: 2,
                found: "b".to_string()
            })
        );
    }
}
