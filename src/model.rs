/// Снимок состояния пула
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolMetrics {
    pub workers: usize,
    pub busy_workers: usize,
    pub queued_tasks: usize,
    pub submitted_tasks: usize,
    pub completed_tasks: usize,
    pub failed_tasks: usize,
    pub rejected_tasks: usize,
    pub scaling_threshold: usize,
}

impl PoolMetrics {
    pub fn utilization(&self) -> f64 {
        if self.workers == 0 {
            return 0.0;
        }
        self.busy_workers as f64 / self.workers as f64
    }

    pub fn success_rate(&self) -> f64 {
        let total = self.completed_tasks + self.failed_tasks;
        if total == 0 {
            return 1.0;
        }
        self.completed_tasks as f64 / total as f64
    }

    /// Задачи, принятые в очередь, но еще не завершенные
    pub fn in_flight(&self) -> usize {
        self.submitted_tasks
            .saturating_sub(self.completed_tasks + self.failed_tasks)
    }
}
