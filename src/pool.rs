use super::{
    errors::{PoolError, TaskError},
    model::PoolMetrics,
    queue::{Shared, State},
    task::{Task, TaskArg},
    worker,
};
use std::{
    fmt::Display,
    sync::Arc,
};
use parking_lot::Mutex;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;


/// Конфигурация пула потоков
#[derive(Debug, Clone)]
pub struct Config {
    pub num_threads: usize,
    /// 0 = очередь без ограничения
    pub max_queue_size: usize,
    /// 0 отключает масштабирование
    pub scaling_threshold: usize,
    /// 0 отключает масштабирование
    pub scaling_factor: usize,
    /// Потолок для масштабирования. `None` = половина логических CPU.
    pub max_threads: Option<usize>,
    pub thread_name_prefix: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            num_threads: 1,
            max_queue_size: 0,
            scaling_threshold: 0,
            scaling_factor: 0,
            max_threads: None,
            thread_name_prefix: "pool-worker".to_string(),
        }
    }
}

impl Config {
    /// Все воркеры сразу на потолке, растить нечего
    pub fn cpu_bound() -> Self {
        let num_cpus = num_cpus::get();
        Self {
            num_threads: hardware_ceiling().max(1),
            max_queue_size: num_cpus * 10,
            ..Default::default()
        }
    }

    /// Начинаем с одного воркера и растем под нагрузкой
    pub fn io_bound() -> Self {
        let num_cpus = num_cpus::get();
        Self {
            num_threads: 1,
            max_queue_size: 0,
            scaling_threshold: num_cpus,
            scaling_factor: 2,
            ..Default::default()
        }
    }
}

#[inline]
fn hardware_ceiling() -> usize {
    num_cpus::get() / 2
}


/// Решение о росте пула для одной постановки задачи
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ScaleStep {
    pub spawn: usize,
    pub next_threshold: usize,
}

/// Срабатывает, когда глубина очереди превысила порог. Порог сдвигается на `factor`
/// даже если на потолке уже нет места.
pub(crate) fn scale_step(
    queue_len: usize,
    threshold: usize,
    factor: usize,
    workers: usize,
    ceiling: usize,
) -> Option<ScaleStep> {
    if threshold == 0 || factor == 0 || queue_len <= threshold {
        return None;
    }
    let room = ceiling.saturating_sub(workers);
    Some(ScaleStep {
        spawn: factor.min(room),
        next_threshold: threshold + factor,
    })
}


/// Пул потоков с ограниченной FIFO очередью и динамическим ростом.
///
/// При drop пул останавливается: воркеры дорабатывают очередь и присоединяются.
pub struct ThreadPool {
    shared: Arc<Shared>,
    ceiling: usize,
    lifecycle: Mutex<()>,
}

impl ThreadPool {
    pub fn new(num_threads: usize) -> Result<Self, PoolError> {
        Self::with_config(Config {
            num_threads,
            ..Default::default()
        })
    }

    pub fn with_config(config: Config) -> Result<Self, PoolError> {
        if config.num_threads == 0 {
            return Err(PoolError::InvalidThreadCount);
        }

        let state = State::new(
            config.max_queue_size,
            config.scaling_threshold,
            config.scaling_factor,
        );
        let pool = Self {
            shared: Arc::new(Shared::new(state, config.thread_name_prefix)),
            ceiling: config.max_threads.unwrap_or_else(hardware_ceiling),
            lifecycle: Mutex::new(()),
        };

        pool.spawn_workers(config.num_threads)?;
        tracing::debug!(
            workers = config.num_threads,
            ceiling = pool.ceiling,
            "thread pool started"
        );
        Ok(pool)
    }

    fn spawn_workers(&self, count: usize) -> Result<(), PoolError> {
        let mut state = self.shared.state.lock();
        for _ in 0..count {
            let handle = worker::spawn(&self.shared, state.next_worker_id)?;
            state.next_worker_id += 1;
            state.workers.push(handle);
        }
        Ok(())
    }

    /// Новое ограничение очереди. Заблокированные в `submit` перепроверяют условие.
    pub fn configure_capacity(&self, max_queue_size: usize) {
        self.shared.state.lock().max_queue_size = max_queue_size;
        self.shared.space_available.notify_all();
    }

    pub fn configure_scaling(&self, threshold: usize, factor: usize) {
        let mut state = self.shared.state.lock();
        state.scaling_threshold = threshold;
        state.scaling_factor = factor;
    }

    /// Ставит задачу в очередь, блокируясь, пока очередь полна.
    ///
    /// После остановки пула задача молча отбрасывается.
    pub fn submit<F>(&self, name: impl Into<String>, action: F, arg: TaskArg)
    where
        F: FnOnce(TaskArg) + Send + 'static,
    {
        self.push_task(Task::new(name, move |arg| {
            action(arg);
            Ok(())
        }, arg));
    }

    /// Как `submit`, но ошибка из `action` логируется воркером как сбой задачи
    pub fn submit_fallible<F, E>(&self, name: impl Into<String>, action: F, arg: TaskArg)
    where
        F: FnOnce(TaskArg) -> Result<(), E> + Send + 'static,
        E: Display,
    {
        self.push_task(Task::new(name, move |arg| {
            action(arg).map_err(|e| TaskError::Failed(e.to_string()))
        }, arg));
    }

    fn push_task(&self, task: Task) {
        let Some(mut state) = self.shared.admit() else {
            tracing::debug!(task = %task.name, "pool is stopping, task dropped");
            return;
        };

        state.queue.push_back(task);
        state.submitted += 1;
        self.maybe_scale(&mut state);
        drop(state);

        self.shared.task_available.notify_one();
    }

    fn maybe_scale(&self, state: &mut State) {
        let Some(step) = scale_step(
            state.queue.len(),
            state.scaling_threshold,
            state.scaling_factor,
            state.workers.len(),
            self.ceiling,
        ) else {
            return;
        };

        let mut spawned = 0;
        for _ in 0..step.spawn {
            match worker::spawn(&self.shared, state.next_worker_id) {
                Ok(handle) => {
                    state.next_worker_id += 1;
                    state.workers.push(handle);
                    spawned += 1;
                }
                Err(error) => {
                    tracing::warn!(%error, "failed to grow thread pool");
                    break;
                }
            }
        }
        state.scaling_threshold = step.next_threshold;

        if spawned > 0 {
            tracing::info!(
                spawned,
                workers = state.workers.len(),
                queued = state.queue.len(),
                next_threshold = state.scaling_threshold,
                "thread pool scaled up"
            );
        }
    }

    /// Полный перезапуск: текущие воркеры дорабатывают очередь и присоединяются,
    /// затем запускается ровно `count` новых.
    pub fn resize(&self, count: usize) -> Result<(), PoolError> {
        if count == 0 {
            return Err(PoolError::InvalidThreadCount);
        }
        let _lifecycle = self.lifecycle.lock();
        if self.shared.state.lock().terminated {
            return Err(PoolError::ShutDown);
        }

        let joined = self.stop_and_join();
        self.shared.state.lock().stop = false;
        self.spawn_workers(count)?;

        tracing::info!(from = joined, to = count, "thread pool resized");
        Ok(())
    }

    /// Останавливает прием задач и ждет, пока воркеры доработают очередь.
    /// Повторный вызов ничего не делает.
    pub fn shutdown(&self) {
        let _lifecycle = self.lifecycle.lock();
        if self.shared.state.lock().terminated {
            return;
        }

        let joined = self.stop_and_join();
        self.shared.state.lock().terminated = true;
        tracing::info!(workers = joined, "thread pool shut down");
    }

    fn stop_and_join(&self) -> usize {
        let handles = self.shared.stop();
        let count = handles.len();
        for handle in handles {
            if handle.join().is_err() {
                tracing::warn!("worker thread panicked");
            }
        }
        count
    }

    #[inline]
    pub fn worker_count(&self) -> usize {
        self.shared.state.lock().workers.len()
    }

    #[inline]
    pub fn queued(&self) -> usize {
        self.shared.state.lock().queue.len()
    }

    #[inline]
    pub fn max_queue_size(&self) -> usize {
        self.shared.state.lock().max_queue_size
    }

    /// (порог, шаг)
    #[inline]
    pub fn scaling(&self) -> (usize, usize) {
        let state = self.shared.state.lock();
        (state.scaling_threshold, state.scaling_factor)
    }

    #[inline]
    pub fn ceiling(&self) -> usize {
        self.ceiling
    }

    #[inline]
    pub fn is_shutdown(&self) -> bool {
        self.shared.state.lock().terminated
    }

    #[inline]
    pub fn metrics(&self) -> PoolMetrics {
        self.shared.metrics()
    }

    /// Мониторинг метрик с callback
    /// ВАЖНО: нужен запущенный tokio runtime. Вызовите token.cancel() для остановки.
    pub fn start_monitoring<F>(&self, interval: Duration, callback: F) -> CancellationToken
    where
        F: Fn(PoolMetrics) + Send + 'static,
    {
        let shared = Arc::clone(&self.shared);
        let token = CancellationToken::new();
        let token_clone = token.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {
                        callback(shared.metrics());
                    }
                    _ = token_clone.cancelled() => {
                        break;
                    }
                }
            }
        });

        token
    }

    pub fn stop_monitoring(token: CancellationToken) {
        token.cancel();
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaling_disabled_by_zero_knobs() {
        assert_eq!(scale_step(100, 0, 2, 1, 8), None);
        assert_eq!(scale_step(100, 5, 0, 1, 8), None);
    }

    #[test]
    fn scaling_fires_only_above_threshold() {
        assert_eq!(scale_step(5, 5, 2, 3, 8), None);
        assert_eq!(
            scale_step(6, 5, 2, 3, 8),
            Some(ScaleStep { spawn: 2, next_threshold: 7 })
        );
    }

    #[test]
    fn scaling_respects_ceiling() {
        assert_eq!(
            scale_step(10, 5, 4, 6, 8),
            Some(ScaleStep { spawn: 2, next_threshold: 9 })
        );
        // на потолке порог все равно сдвигается
        assert_eq!(
            scale_step(10, 5, 4, 8, 8),
            Some(ScaleStep { spawn: 0, next_threshold: 9 })
        );
        assert_eq!(
            scale_step(10, 5, 4, 12, 8),
            Some(ScaleStep { spawn: 0, next_threshold: 9 })
        );
    }

    #[test]
    fn zero_threads_rejected() {
        assert_eq!(ThreadPool::new(0).err(), Some(PoolError::InvalidThreadCount));
    }
}
