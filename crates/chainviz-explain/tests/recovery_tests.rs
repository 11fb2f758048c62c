//! Recovery pipeline tests against realistic model output

use chainviz_explain::recovery::{
    recover_explanation, RecoveryStep, PARTIAL_EXTRACTION_SIMPLIFIED,
    STRUCTURED_FALLBACK_SIMPLIFIED,
};
use chainviz_explain::ExplanationResponse;
use rstest::rstest;

#[rstest]
#[case::plain(r#"{"explanation": "Locked."}"#, RecoveryStep::DirectParse)]
#[case::fenced("```json\n{\"explanation\": \"Locked.\"}\n```", RecoveryStep::DirectParse)]
#[case::fence_without_tag("```\n{\"explanation\": \"Locked.\"}\n```", RecoveryStep::DirectParse)]
#[case::truncated(r#"{"explanation": "Locked.""#, RecoveryStep::StructuralRepair)]
#[case::chatty_suffix(r#"{"explanation": "Locked."} Let me know if you need more!"#, RecoveryStep::StructuralRepair)]
#[case::single_quoted_keys(r#"{'explanation': "Locked."}"#, RecoveryStep::FieldExtraction)]
fn test_recovers_explanation(#[case] raw: &str, #[case] expected_step: RecoveryStep) {
    let recovered = recover_explanation(raw);
    assert_eq!(recovered.step, expected_step);
    assert_eq!(recovered.response.explanation, "Locked.");
}

#[test]
fn test_all_five_fields_survive_direct_parse() {
    let expected = ExplanationResponse::new("The pool prices the trade.")
        .with_technical_details("x * y = k")
        .with_technical_code("")
        .with_simplified("A shared pot of tokens.")
        .with_what_if_scenarios(vec!["What if reserves are thin? Slippage grows.".into()]);
    let raw = serde_json::to_string(&expected).unwrap();

    let recovered = recover_explanation(&raw);
    assert_eq!(recovered.step, RecoveryStep::DirectParse);
    assert_eq!(recovered.response, expected);
}

#[test]
fn test_partial_extraction_gets_apology_simplified() {
    let recovered = recover_explanation(
        "Sure! explanation: \"Votes are tallied after the deadline.\" (that is all)",
    );
    assert_eq!(recovered.step, RecoveryStep::FieldExtraction);
    assert_eq!(
        recovered.response.explanation,
        "Votes are tallied after the deadline."
    );
    assert_eq!(
        recovered.response.simplified_explanation.as_deref(),
        Some(PARTIAL_EXTRACTION_SIMPLIFIED)
    );
}

#[test]
fn test_prose_falls_through_to_raw_text() {
    let prose = "Multisig minting needs several signers to approve before new tokens exist.";
    let recovered = recover_explanation(prose);
    assert_eq!(recovered.step, RecoveryStep::RawText);
    assert_eq!(recovered.response.explanation, prose);
    assert_eq!(
        recovered.response.simplified_explanation.as_deref(),
        Some(STRUCTURED_FALLBACK_SIMPLIFIED)
    );
}

#[test]
fn test_strategy_names() {
    assert_eq!(RecoveryStep::StructuralRepair.to_string(), "structural_repair");
    assert_eq!(RecoveryStep::ORDER.first(), Some(&RecoveryStep::DirectParse));
    assert_eq!(RecoveryStep::ORDER.last(), Some(&RecoveryStep::RawText));
}
