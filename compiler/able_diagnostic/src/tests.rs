use super::*;
use able_ir::Span;
use pretty_assertions::assert_eq;

#[test]
fn builder_collects_labels_and_notes() {
    let diag = Diagnostic::error()
        .with_message("type mismatch")
        .with_label(Span::new(4, 9), "expected i32")
        .with_secondary_label(Span::new(0, 3), "declared here")
        .with_note("found String");

    assert!(diag.is_error());
    assert_eq!(diag.primary_span(), Some(Span::new(4, 9)));
    assert_eq!(
        diag.to_string(),
        "error: type mismatch\n  --> 4..9: expected i32\n      0..3: declared here\n  = note: found String"
    );
}

#[test]
fn fatal_policy_blocks_on_first_error() {
    let diags = vec![
        Diagnostic::warning().with_message("unused"),
        Diagnostic::error().with_message("first"),
        Diagnostic::error().with_message("second"),
    ];
    let blocking = DiagnosticPolicy::Fatal.first_blocking(&diags);
    assert_eq!(blocking.map(|d| d.message.as_str()), Some("first"));
}

#[test]
fn advisory_policy_never_blocks() {
    let diags = vec![Diagnostic::error().with_message("bad")];
    assert_eq!(DiagnosticPolicy::Advisory.first_blocking(&diags), None);
    assert_eq!(DiagnosticPolicy::default(), DiagnosticPolicy::Advisory);
}

#[test]
fn warnings_do_not_block_fatal_policy() {
    let diags = vec![Diagnostic::note().with_message("fyi")];
    assert!(DiagnosticPolicy::Fatal.first_blocking(&diags).is_none());
}
