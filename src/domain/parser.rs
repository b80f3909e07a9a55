//! Parser for the DOT-like decision tree dump.
//!
//! Line 1 is a header and is skipped. Lines containing `->` hold edge statements,
//! all other lines hold label statements. Statements are separated by `;`.
//!
//! ```text
//! digraph Tree {
//! n_0 [label="0 0 <= 30.0 samples 12"];
//! n_1 [label="1 A samples 7 mistakes 1"];
//! n_2 [label="2 B samples 5 mistakes 0"];
//! n_0 -> n_1;
//! n_0 -> n_2;
//! }
//! ```

use std::collections::BTreeMap;

use nom::branch::alt;
use nom::bytes::complete::{tag, take_until, take_while1};
use nom::character::complete::{anychar, char, digit1, multispace0, satisfy};
use nom::combinator::{all_consuming, map, map_res, not, opt, recognize, value};
use nom::error::ParseError;
use nom::multi::many1_count;
use nom::sequence::{delimited, preceded};
use nom::{IResult, Parser};
use tracing::{debug, instrument, trace};

use crate::domain::entities::{Edge, LeafNode, NodeId, SplitNode};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::features::FeatureNameResolver;

/// Raw parse result: node records keyed by id plus edges in encounter order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DotDocument {
    pub splits: BTreeMap<NodeId, SplitNode>,
    pub leaves: BTreeMap<NodeId, LeafNode>,
    pub edges: Vec<Edge>,
}

impl DotDocument {
    pub fn node_count(&self) -> usize {
        self.splits.len() + self.leaves.len()
    }
}

/// Turns dump text into a [`DotDocument`], resolving feature indexes on the way.
pub struct DotTreeParser<'a, R: FeatureNameResolver + ?Sized> {
    resolver: &'a R,
}

impl<'a, R: FeatureNameResolver + ?Sized> DotTreeParser<'a, R> {
    pub fn new(resolver: &'a R) -> Self {
        Self { resolver }
    }

    /// Parse the whole dump. Fails on the first offending statement.
    #[instrument(level = "debug", skip(self, text), fields(bytes = text.len()))]
    pub fn parse(&self, text: &str) -> DomainResult<DotDocument> {
        let mut doc = DotDocument::default();
        // id -> line of first declaration
        let mut declared: BTreeMap<NodeId, usize> = BTreeMap::new();

        for (idx, line) in text.lines().enumerate().skip(1) {
            let line_no = idx + 1;
            let is_edge_line = line.contains("->");

            for statement in line.split(';').map(str::trim) {
                if statement.is_empty() || statement == "}" {
                    continue;
                }
                // every statement on an edge line must be an edge
                if !is_edge_line && !statement.starts_with("n_") {
                    trace!(line = line_no, statement, "skipping non-node statement");
                    continue;
                }
                if is_edge_line {
                    let (parent, child) = parse_edge(statement).map_err(|e| e.at_line(line_no))?;
                    trace!(line = line_no, parent, child, "edge");
                    doc.edges.push(Edge {
                        parent,
                        child,
                        line: line_no,
                    });
                } else {
                    self.parse_label(statement, line_no, &mut doc, &mut declared)
                        .map_err(|e| e.at_line(line_no))?;
                }
            }
        }

        debug!(
            splits = doc.splits.len(),
            leaves = doc.leaves.len(),
            edges = doc.edges.len(),
            "parsed tree dump"
        );
        Ok(doc)
    }

    fn parse_label(
        &self,
        statement: &str,
        line_no: usize,
        doc: &mut DotDocument,
        declared: &mut BTreeMap<NodeId, usize>,
    ) -> DomainResult<()> {
        let (id, body) = parse_label_statement(statement)?;
        if let Some(first) = declared.get(&id) {
            return Err(DomainError::format(format!(
                "node n_{} declared twice (first at line {})",
                id, first
            )));
        }

        let tokens = lex_body(body)?;
        if tokens.contains(&Token::Le) {
            let split = self.split_from_tokens(id, &tokens)?;
            trace!(line = line_no, id, feature = %split.feature, "split node");
            doc.splits.insert(id, split);
        } else {
            let leaf = leaf_from_tokens(id, &tokens)?;
            trace!(line = line_no, id, label = %leaf.predicted_label, "leaf node");
            doc.leaves.insert(id, leaf);
        }
        declared.insert(id, line_no);
        Ok(())
    }

    /// `[<id>] <feature_idx> <= <threshold> samples <N> ...`
    fn split_from_tokens(&self, id: NodeId, tokens: &[Token<'_>]) -> DomainResult<SplitNode> {
        let le = tokens
            .iter()
            .position(|t| *t == Token::Le)
            .ok_or_else(|| DomainError::format("split label without `<=`"))?;
        let feature_token = match strip_leading_id(id, &tokens[..le])?.as_slice() {
            [feature] => *feature,
            _ => {
                return Err(DomainError::format(
                    "split label must have one feature index before `<=`",
                ))
            }
        };
        let (threshold, sample_count) = match &tokens[le + 1..] {
            [Token::Word(thr), Token::Word("samples"), Token::Word(n), ..] => {
                (parse_threshold(thr)?, parse_count(n, "samples")?)
            }
            _ => {
                return Err(DomainError::format(
                    "split label must continue with `<threshold> samples <N>`",
                ))
            }
        };

        let feature_index = parse_count(feature_token, "feature index")? as usize;
        let feature = self.resolver.get_name(feature_index)?.to_string();

        Ok(SplitNode {
            id,
            feature_index,
            feature,
            threshold,
            sample_count,
        })
    }
}

/// `[<id>] <label> samples <N> mistakes <N> ...`
fn leaf_from_tokens(id: NodeId, tokens: &[Token<'_>]) -> DomainResult<LeafNode> {
    let samples = tokens
        .iter()
        .position(|t| *t == Token::Word("samples"))
        .ok_or_else(|| {
            DomainError::format("label matches neither split (`<=`) nor leaf (`samples`) shape")
        })?;
    let label = match strip_leading_id(id, &tokens[..samples])?.as_slice() {
        [label] => *label,
        _ => {
            return Err(DomainError::format(
                "leaf label must have one label token before `samples`",
            ))
        }
    };
    match &tokens[samples + 1..] {
        [Token::Word(n), Token::Word("mistakes"), Token::Word(m), ..] => Ok(LeafNode {
            id,
            predicted_label: label.to_string(),
            sample_count: parse_count(n, "samples")?,
            mistake_count: parse_count(m, "mistakes")?,
        }),
        _ => Err(DomainError::format(
            "leaf label must continue with `samples <N> mistakes <N>`",
        )),
    }
}

/// Accepts `[field]` or `[id, field]`; a leading id must match the statement id.
fn strip_leading_id<'t>(id: NodeId, head: &'t [Token<'t>]) -> DomainResult<Vec<&'t str>> {
    let words = head
        .iter()
        .map(|t| match t {
            Token::Word(w) => Ok(*w),
            Token::Le => Err(DomainError::format("unexpected `<=`")),
        })
        .collect::<DomainResult<Vec<_>>>()?;
    match words.as_slice() {
        [leading, rest @ ..] if words.len() == 2 => {
            let declared = parse_count(leading, "node id")?;
            if declared as usize != id {
                return Err(DomainError::format(format!(
                    "label id {} does not match node n_{}",
                    declared, id
                )));
            }
            Ok(rest.to_vec())
        }
        _ => Ok(words),
    }
}

fn parse_count(token: &str, what: &str) -> DomainResult<u64> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DomainError::format(format!(
            "{} must be a non-negative integer, got `{}`",
            what, token
        )));
    }
    token
        .parse()
        .map_err(|_| DomainError::format(format!("{} out of range: `{}`", what, token)))
}

fn parse_threshold(token: &str) -> DomainResult<f64> {
    token
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| {
            DomainError::format(format!("threshold must be a decimal number, got `{}`", token))
        })
}

// ---------------------------------------------------------------------------
// statement skeletons
// ---------------------------------------------------------------------------

/// A combinator that takes a parser `inner` and produces a parser that also consumes both leading and
/// trailing whitespace, returning the output of `inner`.
fn ws<'a, F, O, E: ParseError<&'a str>>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O, E>
where
    F: Parser<&'a str, O, E>,
{
    delimited(multispace0, inner, multispace0)
}

fn node_ref(input: &str) -> IResult<&str, NodeId> {
    preceded(tag("n_"), map_res(digit1, str::parse::<NodeId>))(input)
}

fn attributes(input: &str) -> IResult<&str, &str> {
    delimited(char('['), take_until("]"), char(']'))(input)
}

/// `n_<id> [label="<body>" ...]`
fn label_skeleton(input: &str) -> IResult<&str, (NodeId, &str)> {
    let (input, id) = ws(node_ref)(input)?;
    let (input, _) = ws(char('['))(input)?;
    let (input, _) = ws(tag("label"))(input)?;
    let (input, _) = ws(char('='))(input)?;
    let (input, body) = delimited(char('"'), take_until("\""), char('"'))(input)?;
    let (input, _) = take_until("]")(input)?;
    let (input, _) = ws(char(']'))(input)?;
    Ok((input, (id, body)))
}

/// `n_<parent> -> n_<child> [attrs]`
fn edge_skeleton(input: &str) -> IResult<&str, (NodeId, NodeId)> {
    let (input, parent) = ws(node_ref)(input)?;
    let (input, _) = ws(tag("->"))(input)?;
    let (input, child) = ws(node_ref)(input)?;
    let (input, _) = opt(ws(attributes))(input)?;
    Ok((input, (parent, child)))
}

fn parse_label_statement(statement: &str) -> DomainResult<(NodeId, &str)> {
    all_consuming(label_skeleton)(statement)
        .map(|(_, parsed)| parsed)
        .map_err(|_| {
            DomainError::format(format!(
                "expected `n_<id> [label=\"...\"]`, got `{}`",
                statement
            ))
        })
}

fn parse_edge(statement: &str) -> DomainResult<(NodeId, NodeId)> {
    all_consuming(edge_skeleton)(statement)
        .map(|(_, parsed)| parsed)
        .map_err(|_| {
            DomainError::format(format!(
                "expected `n_<parent> -> n_<child>`, got `{}`",
                statement
            ))
        })
}

// ---------------------------------------------------------------------------
// label body lexer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    /// The comparison marker `<=`
    Le,
    Word(&'a str),
}

fn is_separator_char(c: char) -> bool {
    c.is_whitespace() || matches!(c, ':' | ',' | '=')
}

/// Whitespace, `:`, `,`, `=` and backslash escapes such as `\n`.
fn separator(input: &str) -> IResult<&str, ()> {
    value(
        (),
        many1_count(alt((
            value((), take_while1(is_separator_char)),
            value((), preceded(char('\\'), anychar)),
        ))),
    )(input)
}

/// Anything up to the next separator, escape, or `<=`.
fn word(input: &str) -> IResult<&str, &str> {
    let stop = alt((
        tag("<="),
        recognize(satisfy(|c| is_separator_char(c) || c == '\\')),
    ));
    recognize(many1_count(preceded(not(stop), anychar)))(input)
}

fn token(input: &str) -> IResult<&str, Token<'_>> {
    alt((value(Token::Le, tag("<=")), map(word, Token::Word)))(input)
}

fn lex_body(body: &str) -> DomainResult<Vec<Token<'_>>> {
    let mut tokens = Vec::new();
    let mut rest = body;
    loop {
        if let Ok((remaining, _)) = separator(rest) {
            rest = remaining;
        }
        if rest.is_empty() {
            return Ok(tokens);
        }
        let (remaining, tok) = token(rest)
            .map_err(|_| DomainError::format(format!("cannot tokenize label near `{}`", rest)))?;
        tokens.push(tok);
        rest = remaining;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::ErrorKind;
    use crate::domain::features::FeatureNames;
    use rstest::{fixture, rstest};

    #[fixture]
    fn names() -> FeatureNames {
        ["age", "income", "height"].into_iter().collect()
    }

    fn doc(names: &FeatureNames, text: &str) -> DomainResult<DotDocument> {
        DotTreeParser::new(names).parse(text)
    }

    #[test]
    fn test_lex_body_splits_on_delimiters() {
        let tokens = lex_body(r"0 1 <= 2.5\nsamples: 10").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Word("0"),
                Token::Word("1"),
                Token::Le,
                Token::Word("2.5"),
                Token::Word("samples"),
                Token::Word("10"),
            ]
        );
    }

    #[test]
    fn test_lex_body_glued_comparison() {
        let tokens = lex_body("1<=2.5 samples=3").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Word("1"),
                Token::Le,
                Token::Word("2.5"),
                Token::Word("samples"),
                Token::Word("3"),
            ]
        );
    }

    #[rstest]
    #[case(r#"n_0 [label="0 1 <= 2.5 samples 10"]"#)]
    #[case(r#"n_0 [label="1 <= 2.5 samples 10"]"#)]
    #[case(r#"n_0 [label="1 <= 2.5\nsamples: 10", shape=box]"#)]
    #[case(r#"  n_0[ label = "0 1 <= 2.5, samples = 10 gini = 0.3" ]"#)]
    fn given_split_variants_when_parsing_then_same_record(names: FeatureNames, #[case] stmt: &str) {
        let text = format!("digraph Tree {{\n{};\n}}\n", stmt);
        let doc = doc(&names, &text).unwrap();
        let split = &doc.splits[&0];
        assert_eq!(split.feature_index, 1);
        assert_eq!(split.feature, "income");
        assert_eq!(split.threshold, 2.5);
        assert_eq!(split.sample_count, 10);
        assert!(doc.leaves.is_empty());
    }

    #[rstest]
    #[case(r#"n_4 [label="4 yes samples 40 mistakes 2"]"#)]
    #[case(r#"n_4 [label="yes\nsamples: 40\nmistakes: 2"]"#)]
    fn given_leaf_variants_when_parsing_then_same_record(names: FeatureNames, #[case] stmt: &str) {
        let text = format!("digraph Tree {{\n{};\n}}\n", stmt);
        let doc = doc(&names, &text).unwrap();
        assert_eq!(
            doc.leaves[&4],
            LeafNode {
                id: 4,
                predicted_label: "yes".to_string(),
                sample_count: 40,
                mistake_count: 2,
            }
        );
    }

    #[rstest]
    fn given_edges_when_parsing_then_keeps_encounter_order(names: FeatureNames) {
        let text = "digraph Tree {\n\
                    n_0 -> n_2 [labeldistance=2.5, headlabel=\"True\"];\n\
                    n_0 -> n_1;\n\
                    }\n";
        let doc = doc(&names, text).unwrap();
        let pairs: Vec<_> = doc.edges.iter().map(|e| (e.parent, e.child, e.line)).collect();
        assert_eq!(pairs, vec![(0, 2, 2), (0, 1, 3)]);
    }

    #[rstest]
    fn given_several_statements_per_line_when_parsing_then_reads_all(names: FeatureNames) {
        let text = "digraph Tree {\n\
                    n_1 [label=\"A samples 1 mistakes 0\"]; n_2 [label=\"B samples 1 mistakes 0\"];\n\
                    node [shape=box];\n";
        let doc = doc(&names, text).unwrap();
        assert_eq!(doc.node_count(), 2);
    }

    #[rstest]
    fn given_header_line_when_parsing_then_it_is_ignored(names: FeatureNames) {
        let text = "n_9 [label=\"ignored samples 1 mistakes 0\"];\n";
        let doc = doc(&names, text).unwrap();
        assert_eq!(doc.node_count(), 0);
    }

    #[rstest]
    fn given_feature_index_out_of_range_when_parsing_then_range_error(names: FeatureNames) {
        let text = "digraph Tree {\nn_0 [label=\"0 5 <= 1.0 samples 3\"];\n";
        let err = doc(&names, text).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Range);
        assert_eq!(err.line(), Some(2));
    }

    #[rstest]
    #[case::neither_shape(r#"n_0 [label="0 what is this"]"#)]
    #[case::bad_threshold(r#"n_0 [label="0 1 <= abc samples 3"]"#)]
    #[case::infinite_threshold(r#"n_0 [label="0 1 <= inf samples 3"]"#)]
    #[case::negative_samples(r#"n_0 [label="A samples -3 mistakes 0"]"#)]
    #[case::missing_mistakes(r#"n_0 [label="A samples 3"]"#)]
    #[case::id_mismatch(r#"n_0 [label="7 A samples 3 mistakes 0"]"#)]
    #[case::no_label_attr(r#"n_0 [shape=box]"#)]
    fn given_malformed_label_when_parsing_then_format_error(
        names: FeatureNames,
        #[case] stmt: &str,
    ) {
        let text = format!("digraph Tree {{\n{};\n", stmt);
        let err = doc(&names, &text).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format, "{}", err);
        assert_eq!(err.line(), Some(2));
    }

    #[rstest]
    #[case::bare_child("n_0 -> 1;")]
    #[case::wrong_prefix("n_0 -> n_1;\nm_0 -> n_2;")]
    #[case::bare_parent("n_0 -> n_1;\n0 -> n_2;")]
    #[case::second_statement("n_0 -> n_1; node -> n_2;")]
    fn given_malformed_edge_when_parsing_then_format_error_at_its_line(
        names: FeatureNames,
        #[case] body: &str,
    ) {
        let text = format!("digraph Tree {{\n{}\n}}\n", body);
        let err = doc(&names, &text).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format, "{}", err);
        assert_eq!(err.line(), Some(1 + body.lines().count()));
    }

    #[rstest]
    fn given_edge_followed_by_closing_brace_when_parsing_then_accepted(names: FeatureNames) {
        let doc = doc(&names, "digraph Tree {\nn_0 -> n_1; }\n").unwrap();
        assert_eq!(doc.edges.len(), 1);
    }

    #[rstest]
    #[case::conflicting_kind("n_0 [label=\"0 1 <= 1.0 samples 3\"];\nn_0 [label=\"A samples 3 mistakes 0\"];")]
    #[case::same_kind("n_0 [label=\"A samples 3 mistakes 0\"];\nn_0 [label=\"A samples 3 mistakes 0\"];")]
    fn given_duplicate_id_when_parsing_then_format_error(names: FeatureNames, #[case] body: &str) {
        let text = format!("digraph Tree {{\n{}\n", body);
        let err = doc(&names, &text).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
        assert_eq!(err.line(), Some(3));
    }

    #[rstest]
    fn given_negative_and_exponent_thresholds_when_parsing_then_accepted(names: FeatureNames) {
        let text = "digraph Tree {\n\
                    n_0 [label=\"0 <= -1.5 samples 3\"];\n\
                    n_1 [label=\"2 <= 1e-3 samples 3\"];\n";
        let doc = doc(&names, text).unwrap();
        assert_eq!(doc.splits[&0].threshold, -1.5);
        assert_eq!(doc.splits[&1].threshold, 1e-3);
        assert_eq!(doc.splits[&1].feature, "height");
    }
}
