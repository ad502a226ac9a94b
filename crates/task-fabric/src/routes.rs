use std::collections::HashMap;

/// Static `task_routes`-style table: a task's queue is chosen by the
/// longest matching prefix of its function name, falling back to
/// `default_queue` (spec.md §4.1 supplement, grounded in the original's
/// Celery `task_routes` config).
#[derive(Debug, Clone)]
pub struct TaskRoutes {
    prefixes: Vec<(String, String)>,
    default_queue: String,
}

impl TaskRoutes {
    pub fn new(default_queue: impl Into<String>) -> Self {
        Self {
            prefixes: Vec::new(),
            default_queue: default_queue.into(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>, queue: impl Into<String>) -> Self {
        self.prefixes.push((prefix.into(), queue.into()));
        self
    }

    pub fn route(&self, func_name: &str) -> &str {
        self.prefixes
            .iter()
            .filter(|(prefix, _)| func_name.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, queue)| queue.as_str())
            .unwrap_or(&self.default_queue)
    }

    /// The standard three-family routing from the original: `conductor.*`,
    /// `reconciler.*`, `ansible.*`.
    pub fn standard() -> Self {
        Self::new("default")
            .with_prefix("conductor.", "conductor")
            .with_prefix("reconciler.", "reconciler")
            .with_prefix("ansible.", "ansible")
    }
}

#[derive(Debug, Clone, Default)]
pub struct QueueConcurrency {
    limits: HashMap<String, usize>,
}

impl QueueConcurrency {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(mut self, queue: impl Into<String>, limit: usize) -> Self {
        self.limits.insert(queue.into(), limit);
        self
    }

    pub fn limit_for(&self, queue: &str) -> usize {
        self.limits.get(queue).copied().unwrap_or(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn longest_prefix_wins() {
        let routes = TaskRoutes::standard();
        assert_eq!(routes.route("conductor.sync_sonic"), "conductor");
        assert_eq!(routes.route("reconciler.sweep"), "reconciler");
        assert_eq!(routes.route("unregistered.task"), "default");
    }
}
