//! Property-based tests with proptest.
//!
//! Generate random literal text, bindings and loop bodies and check the
//! rendered output against what the template should expand to.

use proptest::prelude::*;
use yate::{Arrays, TokenKind, Values, render_to_string, tokenize};

// -- Leaf strategies --

/// Literal text that can neither open a tag nor escape one.
fn plain_text() -> impl Strategy<Value = String> {
    "[^{\\\\]{0,40}"
}

/// Text with lone braces, each followed by something other than `{`
/// or `\`.
fn braced_text() -> impl Strategy<Value = String> {
    prop::collection::vec(("[a-z }\n]{0,6}", prop::bool::ANY), 0..8).prop_map(|parts| {
        parts
            .into_iter()
            .map(|(text, brace)| if brace { format!("{{{text}") } else { text })
            .collect::<Vec<_>>()
            .join("x")
    })
}

fn identifier() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z0-9]{0,8}"
}

/// Element text safe to splice into expected output.
fn element() -> impl Strategy<Value = String> {
    "[a-z0-9 ]{0,10}"
}

proptest! {
    /// Templates without `{{` render unchanged.
    #[test]
    fn literal_text_is_unchanged(text in plain_text()) {
        let output = render_to_string(Values::new(), Arrays::new(), &text).unwrap();
        prop_assert_eq!(output, text);
    }

    /// Lone braces never open a tag.
    #[test]
    fn lone_braces_are_literal(text in braced_text()) {
        prop_assume!(!text.contains("{{"));
        let output = render_to_string(Values::new(), Arrays::new(), &text).unwrap();
        prop_assert_eq!(output, text);
    }

    /// `{\{` always renders as `{{`, whatever surrounds it.
    #[test]
    fn escaped_open_renders_literally(before in plain_text(), after in plain_text()) {
        let template = format!("{before}{{\\{{{after}");
        let output = render_to_string(Values::new(), Arrays::new(), &template).unwrap();
        prop_assert_eq!(output, format!("{before}{{{{{after}"));
    }

    /// A substitution renders the bound value between its literals.
    #[test]
    fn substitution_inserts_value(
        name in identifier(),
        value in ".{0,20}",
        before in plain_text(),
        after in plain_text(),
    ) {
        let values = Values::from([(name.clone(), value.clone())]);
        let template = format!("{before}{{{{ {name} }}}}{after}");
        let output = render_to_string(values, Arrays::new(), &template).unwrap();
        prop_assert_eq!(output, format!("{before}{value}{after}"));
    }

    /// A loop repeats its body once per element, in order.
    #[test]
    fn loop_expands_in_order(
        elements in prop::collection::vec(element(), 0..6),
        prefix in "[a-z]{0,4}",
    ) {
        let arrays = Arrays::from([("items".to_string(), elements.clone())]);
        let template = format!("<{{{{#loop items item}}}}{prefix}{{{{item}}}};{{{{/loop}}}}>");
        let output = render_to_string(Values::new(), arrays, &template).unwrap();
        let body: String = elements.iter().map(|e| format!("{prefix}{e};")).collect();
        prop_assert_eq!(output, format!("<{body}>"));
    }

    /// Nested loops produce the cross product, outer varying slowest.
    #[test]
    fn nested_loops_cross_product(
        outer in prop::collection::vec(element(), 0..4),
        inner in prop::collection::vec(element(), 0..4),
    ) {
        let arrays = Arrays::from([
            ("outer".to_string(), outer.clone()),
            ("inner".to_string(), inner.clone()),
        ]);
        let template =
            "{{#loop outer o}}{{#loop inner i}}({{o}},{{i}}){{/loop}}{{/loop}}";
        let output = render_to_string(Values::new(), arrays, template).unwrap();
        let mut expected = String::new();
        for o in &outer {
            for i in &inner {
                expected.push_str(&format!("({o},{i})"));
            }
        }
        prop_assert_eq!(output, expected);
    }

    /// Lexing always ends with exactly one end-of-input token.
    #[test]
    fn tokenize_ends_with_eof(text in plain_text(), name in identifier()) {
        let template = format!("{text}{{{{{name}}}}}{text}");
        let tokens = tokenize(&template).unwrap();
        let eofs = tokens.iter().filter(|t| t.kind == TokenKind::Eof).count();
        prop_assert_eq!(eofs, 1);
        prop_assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Eof));
    }
}
