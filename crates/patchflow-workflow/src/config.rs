//! Workflow configuration

/// Tunables for one orchestrator instance
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    /// Maximum generation attempts per run
    ///
    /// Three allows one self-correction round for a syntax error and one for
    /// evaluator pushback while bounding cost against a misbehaving
    /// generator.
    pub max_iterations: u32,
    /// Capacity of the per-invocation stream event channel
    pub event_capacity: usize,
}

impl WorkflowConfig {
    /// Create the default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_iterations: 3,
            event_capacity: 64,
        }
    }

    /// Override the iteration bound
    #[inline]
    #[must_use]
    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max;
        self
    }

    /// Override the event channel capacity
    #[inline]
    #[must_use]
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = WorkflowConfig::new();
        assert_eq!(config.max_iterations, 3);
    }

    #[test]
    fn builder_overrides() {
        let config = WorkflowConfig::new().with_max_iterations(1).with_event_capacity(8);
        assert_eq!(config.max_iterations, 1);
        assert_eq!(config.event_capacity, 8);
    }
}
