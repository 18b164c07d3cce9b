use krm_kcl::core::kube::{parse_documents, KubeObject};
use krm_kcl::core::matcher::{matches, MatchConstraintsSpec, ResourceRule};

fn constraints(yaml: &str) -> MatchConstraintsSpec {
    serde_yaml::from_str(yaml).unwrap()
}

fn batch() -> Vec<KubeObject> {
    parse_documents(
        r#"
apiVersion: v1
kind: ConfigMap
metadata:
  name: app-config
  namespace: prod
  labels:
    env: prod
---
apiVersion: v1
kind: Secret
metadata:
  name: app-secret
  namespace: prod
  labels:
    env: dev
---
apiVersion: apps/v1
kind: Deployment
metadata:
  name: app
  namespace: staging
  annotations:
    config.kubernetes.io/local-config: "true"
"#,
    )
    .unwrap()
}

fn selected(spec: &MatchConstraintsSpec) -> Vec<String> {
    batch()
        .iter()
        .filter(|object| matches(object, spec))
        .map(|object| object.name().to_string())
        .collect()
}

#[test]
fn test_decoded_resource_rules() {
    let spec = constraints(
        r#"
resourceRules:
  - apiGroups: [""]
    apiVersions: [v1]
    kinds: [ConfigMap]
"#,
    );
    assert_eq!(selected(&spec), vec!["app-config"]);
}

#[test]
fn test_group_rule_selects_deployment() {
    let spec = constraints(
        r#"
resourceRules:
  - apiGroups: [apps]
    apiVersions: [apps/v1]
    kinds: [Deployment]
"#,
    );
    assert_eq!(selected(&spec), vec!["app"]);
}

#[test]
fn test_star_kind_selects_nothing() {
    let spec = constraints("resourceRules:
  - kinds: [\"*\"]
");
    assert!(selected(&spec).is_empty());
}

#[test]
fn test_namespace_and_label_filters() {
    let spec = constraints("namespaces: [prod]\nlabelSelector:\n  env: prod\n");
    assert_eq!(selected(&spec), vec!["app-config"]);

    let spec = constraints("namespaces: [prod]\n");
    assert_eq!(selected(&spec), vec!["app-config", "app-secret"]);
}

#[test]
fn test_annotation_selector_uses_string_values() {
    let spec = constraints("annotationSelector:\n  config.kubernetes.io/local-config: \"true\"\n");
    assert_eq!(selected(&spec), vec!["app"]);
}

#[test]
fn test_names_are_not_patterns() {
    let spec = constraints("names: [\"app.*\"]\n");
    assert!(selected(&spec).is_empty());
}

#[test]
fn test_empty_constraints_select_everything() {
    let spec = constraints("{}");
    assert!(spec.is_empty());
    assert_eq!(selected(&spec).len(), 3);
}

#[test]
fn test_for_kind_splits_group() {
    let rule = ResourceRule::for_kind("apps/v1", "Deployment");
    assert_eq!(rule.api_groups, vec!["apps"]);
    let spec = MatchConstraintsSpec {
        resource_rules: vec![rule],
        ..Default::default()
    };
    assert_eq!(selected(&spec), vec!["app"]);
}
