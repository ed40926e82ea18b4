//! Model definition documents.
//!
//! ```text
//! # comments run to the end of the line
//! model Point {
//!     x [real] "x coordinate"
//!     y [real]
//!     w as weight [positive]
//! }
//!
//! model Line {
//!     start: Point
//!     end: Point
//!     length = sqrt((end.x - start.x)^2 + (end.y - start.y)^2) "Length"
//! }
//!
//! model Square extends Shape, Named { side [positive]; area = side^2 }
//! ```
//!
//! `as` gives a dummy a symbol name other than its attribute name.
//! Members are separated by newlines or `;`. Expressions are kept as source
//! text here; they are resolved against the model's attributes when the
//! model is built.

use nom::{
    bytes::complete::take_until,
    character::complete::{char, multispace0},
    combinator::{all_consuming, opt, verify},
    multi::separated_list1,
    sequence::{delimited, preceded, terminated},
    IResult,
};

use crate::error::ParseError;
use crate::parser::parse_identifier;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Document {
    pub models: Vec<ModelDecl>,
}

impl Document {
    pub fn model(&self, name: &str) -> Option<&ModelDecl> {
        self.models.iter().find(|m| m.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDecl {
    pub name: String,
    pub bases: Vec<String>,
    pub members: Vec<MemberDecl>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberDecl {
    pub name: String,
    pub kind: MemberKind,
    pub label: Option<String>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberKind {
    /// `name [as symbol] [assumption, ...]`
    Dummy {
        assumptions: Vec<String>,
        symbol: Option<String>,
    },
    /// `name = expression`
    Define { expr: String },
    /// `name: Model`
    Nested { model: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Open,
    Close,
    Statement(String),
}

/// Split source into `{`, `}` and statements, skipping comments.
/// Quoted labels are kept intact.
fn tokenize(input: &str) -> Vec<(usize, Token)> {
    let mut tokens = Vec::new();
    for (index, line) in input.lines().enumerate() {
        let line_no = index + 1;
        let mut current = String::new();
        let mut in_quotes = false;
        let flush = |current: &mut String, tokens: &mut Vec<(usize, Token)>| {
            let statement = current.trim();
            if !statement.is_empty() {
                tokens.push((line_no, Token::Statement(statement.to_string())));
            }
            current.clear();
        };
        for c in line.chars() {
            match c {
                '"' => {
                    in_quotes = !in_quotes;
                    current.push(c);
                }
                _ if in_quotes => current.push(c),
                '#' => break,
                ';' => flush(&mut current, &mut tokens),
                '{' => {
                    flush(&mut current, &mut tokens);
                    tokens.push((line_no, Token::Open));
                }
                '}' => {
                    flush(&mut current, &mut tokens);
                    tokens.push((line_no, Token::Close));
                }
                _ => current.push(c),
            }
        }
        flush(&mut current, &mut tokens);
    }
    tokens
}

fn ws<'a, O>(
    inner: impl FnMut(&'a str) -> IResult<&'a str, O>,
) -> impl FnMut(&'a str) -> IResult<&'a str, O> {
    delimited(multispace0, inner, multispace0)
}

fn parse_label(input: &str) -> IResult<&str, String> {
    let (input, text) = delimited(char('"'), take_until("\""), char('"'))(input)?;
    Ok((input, text.to_string()))
}

// model Name [extends A, B]
fn parse_header(input: &str) -> IResult<&str, (String, Vec<String>)> {
    let (input, keyword) = ws(parse_identifier)(input)?;
    if keyword != "model" {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Tag,
        )));
    }
    let (input, name) = ws(parse_identifier)(input)?;
    let (input, bases) = opt(preceded(
        ws(nom::bytes::complete::tag("extends")),
        separated_list1(char(','), ws(parse_identifier)),
    ))(input)?;
    let bases = bases
        .unwrap_or_default()
        .into_iter()
        .map(str::to_string)
        .collect();
    Ok((input, (name.to_string(), bases)))
}

fn parse_nested(input: &str) -> IResult<&str, (String, MemberKind, Option<String>)> {
    let (input, name) = ws(parse_identifier)(input)?;
    let (input, model) = preceded(char(':'), ws(parse_identifier))(input)?;
    let (input, label) = opt(terminated(parse_label, multispace0))(input)?;
    Ok((
        input,
        (
            name.to_string(),
            MemberKind::Nested {
                model: model.to_string(),
            },
            label,
        ),
    ))
}

fn parse_dummy(input: &str) -> IResult<&str, (String, MemberKind, Option<String>)> {
    let (input, name) = ws(parse_identifier)(input)?;
    let (input, symbol) = opt(preceded(
        verify(parse_identifier, |word: &str| word == "as"),
        ws(parse_identifier),
    ))(input)?;
    let (input, assumptions) = opt(terminated(
        delimited(
            char('['),
            separated_list1(char(','), ws(parse_identifier)),
            char(']'),
        ),
        multispace0,
    ))(input)?;
    let (input, label) = opt(terminated(parse_label, multispace0))(input)?;
    let assumptions = assumptions
        .unwrap_or_default()
        .into_iter()
        .map(str::to_string)
        .collect();
    Ok((
        input,
        (
            name.to_string(),
            MemberKind::Dummy {
                assumptions,
                symbol: symbol.map(str::to_string),
            },
            label,
        ),
    ))
}

fn parse_define(input: &str) -> Option<(String, MemberKind, Option<String>)> {
    let (name, rest) = input.split_once('=')?;
    let (_, name) = all_consuming(ws(parse_identifier))(name).ok()?;
    let (expr, label) = match rest.find('"') {
        Some(start) => {
            let (_, label) = all_consuming(ws(parse_label))(&rest[start..]).ok()?;
            (&rest[..start], Some(label))
        }
        None => (rest, None),
    };
    Some((
        name.to_string(),
        MemberKind::Define {
            expr: expr.trim().to_string(),
        },
        label,
    ))
}

fn parse_member(line: usize, statement: &str) -> Result<MemberDecl, ParseError> {
    // labels may contain '=' or ':', so only look at the code before them
    let code = statement.split('"').next().unwrap_or_default();
    let parsed = if code.contains('=') {
        parse_define(statement)
    } else if code.contains(':') {
        all_consuming(parse_nested)(statement).ok().map(|(_, m)| m)
    } else {
        all_consuming(parse_dummy)(statement).ok().map(|(_, m)| m)
    };
    let (name, kind, label) = parsed.ok_or_else(|| ParseError::Document {
        line,
        message: format!("invalid member '{}'", statement),
    })?;
    if let MemberKind::Define { expr } = &kind {
        if expr.is_empty() {
            return Err(ParseError::Document {
                line,
                message: format!("missing expression for '{}'", name),
            });
        }
    }
    Ok(MemberDecl {
        name,
        kind,
        label,
        line,
    })
}

/// Parse a model definition document.
pub fn parse_document(input: &str) -> Result<Document, ParseError> {
    let mut document = Document::default();
    let mut tokens = tokenize(input).into_iter();

    while let Some((line, token)) = tokens.next() {
        let header = match token {
            Token::Statement(s) => s,
            Token::Open | Token::Close => {
                return Err(ParseError::Document {
                    line,
                    message: "expected 'model <Name> {'".to_string(),
                })
            }
        };
        let (name, bases) = all_consuming(parse_header)(&header)
            .map(|(_, h)| h)
            .map_err(|_| ParseError::Document {
                line,
                message: format!("invalid model header '{}'", header),
            })?;
        if document.model(&name).is_some() {
            return Err(ParseError::Document {
                line,
                message: format!("model '{}' is defined twice", name),
            });
        }
        match tokens.next() {
            Some((_, Token::Open)) => {}
            _ => {
                return Err(ParseError::Document {
                    line,
                    message: format!("expected '{{' after model '{}'", name),
                })
            }
        }

        let mut members = Vec::new();
        loop {
            match tokens.next() {
                Some((_, Token::Close)) => break,
                Some((member_line, Token::Statement(s))) => {
                    members.push(parse_member(member_line, &s)?)
                }
                Some((member_line, Token::Open)) => {
                    return Err(ParseError::Document {
                        line: member_line,
                        message: "unexpected '{'".to_string(),
                    })
                }
                None => {
                    return Err(ParseError::Document {
                        line,
                        message: format!("model '{}' is not closed", name),
                    })
                }
            }
        }

        document.models.push(ModelDecl {
            name,
            bases,
            members,
            line,
        });
    }

    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINE: &str = r#"
# two points and the segment between them
model Point {
    x [real] "x coordinate"
    y [real]
}

model Line {
    start: Point
    end: Point
    length = sqrt((end.x - start.x)^2 + (end.y - start.y)^2) "Length"
}
"#;

    #[test]
    fn parses_models_and_members() {
        let doc = parse_document(LINE).unwrap();
        assert_eq!(doc.models.len(), 2);

        let point = doc.model("Point").unwrap();
        assert_eq!(point.line, 3);
        assert_eq!(
            point.members[0],
            MemberDecl {
                name: "x".to_string(),
                kind: MemberKind::Dummy {
                    assumptions: vec!["real".to_string()],
                    symbol: None,
                },
                label: Some("x coordinate".to_string()),
                line: 4,
            }
        );

        let line = doc.model("Line").unwrap();
        assert_eq!(
            line.members[1].kind,
            MemberKind::Nested {
                model: "Point".to_string()
            }
        );
        assert_eq!(
            line.members[2].kind,
            MemberKind::Define {
                expr: "sqrt((end.x - start.x)^2 + (end.y - start.y)^2)".to_string()
            }
        );
        assert_eq!(line.members[2].label.as_deref(), Some("Length"));
    }

    #[test]
    fn parses_single_line_models_with_bases() {
        let doc = parse_document("model Sq extends Shape, Named { side [positive, rational]; area = side^2 }")
            .unwrap();
        let sq = &doc.models[0];
        assert_eq!(sq.bases, vec!["Shape".to_string(), "Named".to_string()]);
        assert_eq!(sq.members.len(), 2);
        assert_eq!(sq.members[1].name, "area");
    }

    #[test]
    fn dummy_symbol_name_can_differ() {
        let doc = parse_document(
            "model Flow {\n  conflict_rate as resolution_rate [positive] \"Conflicts\"\n  ask\n  astro as x\n}",
        )
        .unwrap();
        let members = &doc.models[0].members;
        assert_eq!(
            members[0].kind,
            MemberKind::Dummy {
                assumptions: vec!["positive".to_string()],
                symbol: Some("resolution_rate".to_string()),
            }
        );
        assert_eq!(members[0].label.as_deref(), Some("Conflicts"));
        assert_eq!(members[1].name, "ask");
        assert_eq!(
            members[2].kind,
            MemberKind::Dummy {
                assumptions: Vec::new(),
                symbol: Some("x".to_string()),
            }
        );
        assert!(parse_document("model A { x as }").is_err());
    }

    #[test]
    fn empty_model_is_allowed() {
        let doc = parse_document("model Empty {}").unwrap();
        assert!(doc.models[0].members.is_empty());
    }

    #[test]
    fn reports_line_of_bad_member() {
        let err = parse_document("model A {\n  x\n  y z\n}").unwrap_err();
        assert_eq!(
            err,
            ParseError::Document {
                line: 3,
                message: "invalid member 'y z'".to_string()
            }
        );
    }

    #[test]
    fn rejects_unclosed_and_duplicate_models() {
        assert!(matches!(
            parse_document("model A {\n x\n"),
            Err(ParseError::Document { line: 1, .. })
        ));
        assert!(matches!(
            parse_document("model A {}\nmodel A {}"),
            Err(ParseError::Document { line: 2, .. })
        ));
        assert!(matches!(
            parse_document("model A { c = }"),
            Err(ParseError::Document { .. })
        ));
    }
}
