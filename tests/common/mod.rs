#![allow(dead_code)]

use yate::{Arrays, Error, Values, render_to_string};

pub fn values(pairs: &[(&str, &str)]) -> Values {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

pub fn arrays(pairs: &[(&str, &[&str])]) -> Arrays {
    pairs
        .iter()
        .map(|(k, items)| {
            (
                (*k).to_string(),
                items.iter().map(|s| (*s).to_string()).collect(),
            )
        })
        .collect()
}

/// Render `input` and assert the output.
pub fn assert_renders(values: Values, arrays: Arrays, input: &str, expected: &str) {
    let output = render_to_string(values, arrays, input)
        .unwrap_or_else(|e| panic!("render failed: {e}\n--- template ---\n{input}"));
    assert_eq!(
        output, expected,
        "render mismatch:\n--- template ---\n{input}\n--- got ---\n{output}"
    );
}

/// Render `input`, expecting failure.
pub fn render_err(values: Values, arrays: Arrays, input: &str) -> Error {
    match render_to_string(values, arrays, input) {
        Ok(output) => panic!("expected an error, rendered: {output:?}"),
        Err(e) => e,
    }
}
