//! Parsers for the query sub-languages using chumsky.
//!
//! ```text
//! cuts        ref:value[;value]*[|ref:value[;value]*]*
//! fields      ref[,ref]*
//! drilldowns  ref[|ref]*
//! aggregates  ref[|ref]*
//! ordering    ref[:asc|desc][,ref[:asc|desc]]*
//!
//! ref         segment[.segment]*      segment = [A-Za-z0-9_]+
//! value       "quoted \"string\"" | bare text up to | ; or "
//! ```
//!
//! These parsers only check syntax. A missing or blank input is the empty
//! list, never an error.

use chumsky::prelude::*;

use super::ast::*;
use super::span::Spanned;
use super::Diagnostic;

type Extra<'src> = extra::Err<Rich<'src, char>>;

/// Convert a SimpleSpan to our Span type (Range<usize>)
fn to_span(span: SimpleSpan) -> std::ops::Range<usize> {
    span.start..span.end
}

// =============================================================================
// Shared primitives
// =============================================================================

fn reference<'src>() -> impl Parser<'src, &'src str, Ref, Extra<'src>> + Clone {
    let segment = any()
        .filter(|c: &char| c.is_alphanumeric() || *c == '_')
        .repeated()
        .at_least(1);

    segment
        .separated_by(just('.'))
        .at_least(1)
        .to_slice()
        .map_with(|r: &str, e| Spanned::new(r.to_string(), to_span(e.span())))
        .labelled("reference")
}

fn quoted<'src>() -> impl Parser<'src, &'src str, String, Extra<'src>> + Clone {
    let escape = just('\\').ignore_then(choice((
        just('n').to('\n'),
        just('t').to('\t'),
        any(),
    )));

    none_of("\\\"")
        .or(escape)
        .repeated()
        .collect::<String>()
        .delimited_by(just('"'), just('"'))
        .labelled("quoted string")
}

/// One cut value; `None` for blank bare text.
fn value<'src>() -> impl Parser<'src, &'src str, Option<Literal>, Extra<'src>> + Clone {
    let quoted = quoted().padded().map(|s| Some(Literal::String(s)));
    let bare = none_of("|;\"")
        .repeated()
        .to_slice()
        .map(|s: &str| (!s.trim().is_empty()).then(|| Literal::from_bare(s)));

    choice((quoted, bare))
}

fn cut<'src>() -> impl Parser<'src, &'src str, Cut, Extra<'src>> + Clone {
    reference()
        .padded()
        .then_ignore(just(':'))
        .then(value().separated_by(just(';')).at_least(1).collect::<Vec<_>>())
        .map(|(reference, values)| {
            let value = if matches!(values.as_slice(), [None]) {
                CutValue::Null
            } else {
                CutValue::Set(
                    values
                        .into_iter()
                        .map(|v| v.unwrap_or_else(|| Literal::String(String::new())))
                        .collect(),
                )
            };
            Cut {
                reference,
                operator: CutOperator::In,
                value,
            }
        })
}

fn ref_list<'src>(separator: char) -> impl Parser<'src, &'src str, Vec<Ref>, Extra<'src>> {
    reference()
        .padded()
        .separated_by(just(separator))
        .at_least(1)
        .collect::<Vec<_>>()
        .then_ignore(end())
}

// =============================================================================
// Sub-languages
// =============================================================================

pub fn cuts_parser<'src>() -> impl Parser<'src, &'src str, Vec<Cut>, Extra<'src>> {
    cut()
        .separated_by(just('|'))
        .at_least(1)
        .collect::<Vec<_>>()
        .then_ignore(end())
}

pub fn fields_parser<'src>() -> impl Parser<'src, &'src str, Vec<Ref>, Extra<'src>> {
    ref_list(',')
}

pub fn drilldowns_parser<'src>() -> impl Parser<'src, &'src str, Vec<Ref>, Extra<'src>> {
    ref_list('|')
}

pub fn aggregates_parser<'src>() -> impl Parser<'src, &'src str, Vec<Ref>, Extra<'src>> {
    ref_list('|')
}

pub fn ordering_parser<'src>() -> impl Parser<'src, &'src str, Vec<Ordering>, Extra<'src>> {
    let direction = choice((
        just("asc").to(SortDirection::Asc),
        just("desc").to(SortDirection::Desc),
    ))
    .padded()
    .labelled("sort direction");

    reference()
        .padded()
        .then(just(':').ignore_then(direction).or_not())
        .map(|(reference, direction)| Ordering {
            reference,
            direction: direction.unwrap_or_default(),
        })
        .separated_by(just(','))
        .at_least(1)
        .collect::<Vec<_>>()
        .then_ignore(end())
}

// =============================================================================
// Entry points
// =============================================================================

fn run<'src, T>(
    parser: impl Parser<'src, &'src str, Vec<T>, Extra<'src>>,
    input: Option<&'src str>,
) -> Result<Vec<T>, Vec<Diagnostic>> {
    let Some(text) = input.filter(|t| !t.trim().is_empty()) else {
        return Ok(Vec::new());
    };

    let (output, errors) = parser.parse(text).into_output_errors();
    if !errors.is_empty() {
        return Err(errors
            .into_iter()
            .map(|e| Diagnostic::error(to_span(*e.span()), e.to_string()))
            .collect());
    }
    Ok(output.unwrap_or_default())
}

pub fn parse_cuts(input: Option<&str>) -> Result<Vec<Cut>, Vec<Diagnostic>> {
    run(cuts_parser(), input)
}

pub fn parse_fields(input: Option<&str>) -> Result<Vec<Ref>, Vec<Diagnostic>> {
    run(fields_parser(), input)
}

pub fn parse_drilldowns(input: Option<&str>) -> Result<Vec<Ref>, Vec<Diagnostic>> {
    run(drilldowns_parser(), input)
}

pub fn parse_aggregates(input: Option<&str>) -> Result<Vec<Ref>, Vec<Diagnostic>> {
    run(aggregates_parser(), input)
}

pub fn parse_ordering(input: Option<&str>) -> Result<Vec<Ordering>, Vec<Diagnostic>> {
    run(ordering_parser(), input)
}
