use super::{
    model::PoolMetrics,
    task::Task,
};
use std::{
    collections::VecDeque,
    sync::atomic::{AtomicUsize, Ordering},
    thread::JoinHandle,
};
use crossbeam::utils::CachePadded;
use parking_lot::{Condvar, Mutex, MutexGuard};


/// Все, что защищено единственной блокировкой пула
pub(crate) struct State {
    pub queue: VecDeque<Task>,
    /// 0 = без ограничения
    pub max_queue_size: usize,
    pub scaling_threshold: usize,
    pub scaling_factor: usize,
    pub workers: Vec<JoinHandle<()>>,
    pub next_worker_id: usize,
    pub stop: bool,
    /// Выставляется только shutdown, обратно не сбрасывается
    pub terminated: bool,
    pub submitted: usize,
    pub rejected: usize,
}

impl State {
    pub fn new(max_queue_size: usize, scaling_threshold: usize, scaling_factor: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            max_queue_size,
            scaling_threshold,
            scaling_factor,
            workers: Vec::new(),
            next_worker_id: 0,
            stop: false,
            terminated: false,
            submitted: 0,
            rejected: 0,
        }
    }

    #[inline]
    pub fn has_room(&self) -> bool {
        self.max_queue_size == 0 || self.queue.len() < self.max_queue_size
    }
}


/// Общее состояние пула и воркеров.
///
/// `task_available` будит воркеров, `space_available` будит отправителей,
/// ожидающих места в очереди.
pub(crate) struct Shared {
    pub state: Mutex<State>,
    pub task_available: Condvar,
    pub space_available: Condvar,
    pub thread_name_prefix: String,
    pub busy_workers: CachePadded<AtomicUsize>,
    pub completed_tasks: CachePadded<AtomicUsize>,
    pub failed_tasks: CachePadded<AtomicUsize>,
}

impl Shared {
    pub fn new(state: State, thread_name_prefix: String) -> Self {
        Self {
            state: Mutex::new(state),
            task_available: Condvar::new(),
            space_available: Condvar::new(),
            thread_name_prefix,
            busy_workers: CachePadded::new(AtomicUsize::new(0)),
            completed_tasks: CachePadded::new(AtomicUsize::new(0)),
            failed_tasks: CachePadded::new(AtomicUsize::new(0)),
        }
    }

    /// Ждет места в очереди или остановки. Возвращает guard, если задачу можно поставить.
    pub fn admit(&self) -> Option<MutexGuard<'_, State>> {
        let mut state = self.state.lock();
        self.space_available
            .wait_while(&mut state, |s| !s.stop && !s.has_room());

        if state.stop {
            state.rejected += 1;
            return None;
        }
        Some(state)
    }

    /// Блокирует воркер до появления задачи. `None` означает, что пора выходить:
    /// пул остановлен и очередь пуста.
    pub fn next_task(&self) -> Option<Task> {
        let task = {
            let mut state = self.state.lock();
            self.task_available
                .wait_while(&mut state, |s| !s.stop && s.queue.is_empty());
            state.queue.pop_front()?
        };
        self.space_available.notify_one();
        Some(task)
    }

    /// Выставляет флаг остановки и забирает все JoinHandle воркеров
    pub fn stop(&self) -> Vec<JoinHandle<()>> {
        let handles = {
            let mut state = self.state.lock();
            state.stop = true;
            std::mem::take(&mut state.workers)
        };
        self.task_available.notify_all();
        self.space_available.notify_all();
        handles
    }

    pub fn metrics(&self) -> PoolMetrics {
        let state = self.state.lock();
        PoolMetrics {
            workers: state.workers.len(),
            busy_workers: self.busy_workers.load(Ordering::Relaxed),
            queued_tasks: state.queue.len(),
            submitted_tasks: state.submitted,
            completed_tasks: self.completed_tasks.load(Ordering::Relaxed),
            failed_tasks: self.failed_tasks.load(Ordering::Relaxed),
            rejected_tasks: state.rejected,
            scaling_threshold: state.scaling_threshold,
        }
    }
}
