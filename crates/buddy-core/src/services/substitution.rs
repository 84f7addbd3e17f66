use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_yaml::{Mapping, Value};

use crate::models::DeploymentContext;

/// `$$`, `$name` or `${name}`.
static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$(?:(\$)|([A-Za-z_][A-Za-z0-9_]*)|\{([A-Za-z_][A-Za-z0-9_]*)\})").unwrap()
});

/// Substitute context variables into a single string.
/// Placeholders naming an unknown variable are kept as written.
pub fn interpolate<'a>(template: &'a str, context: &DeploymentContext) -> Cow<'a, str> {
    PLACEHOLDER_RE.replace_all(template, |caps: &Captures| {
        if caps.get(1).is_some() {
            return "$".to_string();
        }
        let name = caps
            .get(2)
            .or_else(|| caps.get(3))
            .map(|m| m.as_str())
            .unwrap_or_default();
        match context.get(name) {
            Some(value) => value.to_string(),
            None => caps[0].to_string(),
        }
    })
}

/// Return a copy of `value` with every string leaf interpolated.
/// Mapping keys and non-string scalars are left untouched.
pub fn substitute(value: &Value, context: &DeploymentContext) -> Value {
    match value {
        Value::String(s) => Value::String(interpolate(s, context).into_owned()),
        Value::Sequence(items) => {
            Value::Sequence(items.iter().map(|v| substitute(v, context)).collect())
        }
        Value::Mapping(mapping) => Value::Mapping(substitute_mapping(mapping, context)),
        Value::Tagged(tagged) => {
            let mut tagged = tagged.clone();
            tagged.value = substitute(&tagged.value, context);
            Value::Tagged(tagged)
        }
        other => other.clone(),
    }
}

pub fn substitute_mapping(mapping: &Mapping, context: &DeploymentContext) -> Mapping {
    mapping
        .iter()
        .map(|(k, v)| (k.clone(), substitute(v, context)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> DeploymentContext {
        DeploymentContext::new("web-task", "eu-west-1", "abc123")
    }

    #[test]
    fn interpolates_both_placeholder_forms() {
        assert_eq!(interpolate("rev-$build_rev", &context()), "rev-abc123");
        assert_eq!(interpolate("${task_name}-logs", &context()), "web-task-logs");
        assert_eq!(interpolate("$aws_region", &context()), "eu-west-1");
    }

    #[test]
    fn double_dollar_is_a_literal_dollar() {
        assert_eq!(interpolate("cost: $$5", &context()), "cost: $5");
        assert_eq!(interpolate("$$build_rev", &context()), "$build_rev");
    }

    #[test]
    fn unknown_placeholders_are_kept() {
        assert_eq!(interpolate("echo $HOME ${PATH}", &context()), "echo $HOME ${PATH}");
        assert_eq!(interpolate("$", &context()), "$");
    }

    #[test]
    fn substitutes_nested_string_leaves_only() {
        let value: Value = serde_yaml::from_str(
            r#"
command: [run, "--rev=$build_rev"]
memory: 256
dockerLabels:
  revision: $build_rev
  $build_rev: key
"#,
        )
        .unwrap();
        let original = value.clone();

        let result = substitute(&value, &context());

        assert_eq!(result["command"][1], Value::from("--rev=abc123"));
        assert_eq!(result["memory"].as_u64(), Some(256));
        assert_eq!(result["dockerLabels"]["revision"], Value::from("abc123"));
        assert_eq!(result["dockerLabels"]["$build_rev"], Value::from("key"));
        assert_eq!(value, original);
    }
}
