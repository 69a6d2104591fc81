//! Conversion of Kubernetes object labels into Prometheus label pairs

use std::collections::BTreeMap;

/// Prefix added to every converted Kubernetes label key
pub const LABEL_PREFIX: &str = "label_";

/// Make a string usable as a Prometheus label name
///
/// Every character outside `[a-zA-Z0-9_]` becomes `_`.
pub fn sanitize_label_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// `app.kubernetes.io/name=web` becomes `label_app_kubernetes_io_name=web`
///
/// The map is ordered, so output keys come out sorted by original key.
pub fn kube_labels_to_prometheus_labels(
    labels: &BTreeMap<String, String>,
) -> Vec<(String, String)> {
    labels
        .iter()
        .map(|(k, v)| (format!("{LABEL_PREFIX}{}", sanitize_label_name(k)), v.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_label_name() {
        assert_eq!(sanitize_label_name("app"), "app");
        assert_eq!(sanitize_label_name("app.kubernetes.io/name"), "app_kubernetes_io_name");
        assert_eq!(sanitize_label_name("team-a"), "team_a");
        assert_eq!(sanitize_label_name("snake_case9"), "snake_case9");
    }

    #[test]
    fn test_labels_sorted_and_prefixed() {
        let labels = BTreeMap::from([
            ("tier".to_string(), "backend".to_string()),
            ("app".to_string(), "foobar".to_string()),
        ]);

        assert_eq!(
            kube_labels_to_prometheus_labels(&labels),
            vec![
                ("label_app".to_string(), "foobar".to_string()),
                ("label_tier".to_string(), "backend".to_string()),
            ]
        );
    }

    #[test]
    fn test_no_labels() {
        assert!(kube_labels_to_prometheus_labels(&BTreeMap::new()).is_empty());
    }
}
