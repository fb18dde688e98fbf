#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use queryflow_core::{analyze, AnalysisOptions, AnalyzeRequest, Dialect};

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    sql: String,
    dialect_idx: u8,
    max_depth: u8,
}

fuzz_target!(|input: FuzzInput| {
    let dialect = Dialect::ALL[usize::from(input.dialect_idx) % Dialect::ALL.len()];
    let options = AnalysisOptions {
        max_depth: Some(usize::from(input.max_depth)),
        ..AnalysisOptions::default()
    };
    let request = AnalyzeRequest::new(input.sql, dialect).with_options(options);

    // Every statement must come back as a result, never as a panic
    let result = analyze(&request);
    assert_eq!(result.summary.statement_count, result.queries.len());
});
