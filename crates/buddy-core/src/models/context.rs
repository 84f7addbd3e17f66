/// Values describing the current deploy, used to parameterize container definitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentContext {
    pub task_name: String,
    pub aws_region: String,
    pub build_rev: String,
}

impl DeploymentContext {
    pub fn new(
        task_name: impl Into<String>,
        aws_region: impl Into<String>,
        build_rev: impl Into<String>,
    ) -> Self {
        Self {
            task_name: task_name.into(),
            aws_region: aws_region.into(),
            build_rev: build_rev.into(),
        }
    }

    /// Look up a substitution variable by name.
    pub fn get(&self, key: &str) -> Option<&str> {
        match key {
            "task_name" => Some(&self.task_name),
            "aws_region" => Some(&self.aws_region),
            "build_rev" => Some(&self.build_rev),
            _ => None,
        }
    }
}
