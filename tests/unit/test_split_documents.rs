use krm_kcl::core::kube::parse_documents;
use krm_kcl::core::types::ErrorCategory;
use krm_kcl::core::yaml::split_documents;

#[test]
fn test_two_documents() {
    assert_eq!(split_documents("a\n---\nb\n").unwrap(), vec!["a\n", "b\n"]);
}

#[test]
fn test_separator_with_trailing_comment() {
    assert_eq!(
        split_documents("a: 1\n--- # second\nb: 2\n").unwrap(),
        vec!["a: 1\n", "b: 2\n"]
    );
}

#[test]
fn test_content_after_dashes_is_rejected() {
    let err = split_documents("a\n--- garbage\nb\n").unwrap_err();
    assert_eq!(err.category, ErrorCategory::MalformedSeparator);
    assert_eq!(err.code, "KCL-YAML-001");
    assert!(err.message.contains("--- garbage"));
}

#[test]
fn test_no_separator_is_single_document() {
    let text = "apiVersion: v1\nkind: ConfigMap\n";
    assert_eq!(split_documents(text).unwrap(), vec![text]);
}

#[test]
fn test_empty_input() {
    assert!(split_documents("").unwrap().is_empty());
}

#[test]
fn test_leading_separator_and_blank_segments() {
    assert_eq!(
        split_documents("---\na\n---\n   \n---\nb\n").unwrap(),
        vec!["a\n", "b\n"]
    );
}

#[test]
fn test_trailing_separator_keeps_empty_tail() {
    assert_eq!(split_documents("a\n---\n").unwrap(), vec!["a\n", ""]);
}

#[test]
fn test_dashes_inside_block_scalar_are_not_separators() {
    let text = "data:\n  script: |\n    echo\n    ---\n";
    assert_eq!(split_documents(text).unwrap(), vec![text]);
}

#[test]
fn test_parse_documents_skips_empty_and_reports_index() {
    let objects = parse_documents("kind: A\n---\n---\nkind: B\n---\n").unwrap();
    assert_eq!(objects.len(), 2);
    assert_eq!(objects[1].kind(), "B");

    let err = parse_documents("kind: A\n---\n- not\n- a mapping\n").unwrap_err();
    assert_eq!(err.category, ErrorCategory::DecodeFailed);
    assert_eq!(err.context.get("document_index"), Some(&"1".to_string()));
}
