use super::{
    errors::{PoolError, TaskError, TaskResult},
    queue::Shared,
    task::Task,
};
use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::Ordering,
        Arc,
    },
    thread::{self, JoinHandle},
};


pub(crate) fn spawn(shared: &Arc<Shared>, id: usize) -> Result<JoinHandle<()>, PoolError> {
    let shared = Arc::clone(shared);
    thread::Builder::new()
        .name(format!("{}-{}", shared.thread_name_prefix, id))
        .spawn(move || worker_loop(shared, id))
        .map_err(|e| PoolError::SpawnFailed(e.to_string()))
}

fn worker_loop(shared: Arc<Shared>, id: usize) {
    tracing::debug!(worker = id, "worker started");

    while let Some(task) = shared.next_task() {
        let name = task.name.clone();

        shared.busy_workers.fetch_add(1, Ordering::Relaxed);
        let result = execute(task);
        shared.busy_workers.fetch_sub(1, Ordering::Relaxed);

        match result {
            Ok(()) => {
                shared.completed_tasks.fetch_add(1, Ordering::Relaxed);
            }
            Err(error) => {
                shared.failed_tasks.fetch_add(1, Ordering::Relaxed);
                tracing::error!(worker = id, task = %name, %error, "task failed");
            }
        }
    }

    tracing::debug!(worker = id, "worker exited");
}

/// Выполняет задачу вне блокировки. Паника не выходит за пределы этой функции.
fn execute(task: Task) -> TaskResult {
    let Task { action, arg, .. } = task;
    panic::catch_unwind(AssertUnwindSafe(move || action(arg)))
        .unwrap_or_else(|payload| Err(TaskError::Panic(panic_message(payload.as_ref()))))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskArg;

    #[test]
    fn execute_captures_panic_message() {
        let task = Task::new("boom", |_| panic!("bad input {}", 3), TaskArg::none());
        assert_eq!(execute(task), Err(TaskError::Panic("bad input 3".into())));

        let task = Task::new("static", |_| panic!("static str"), TaskArg::none());
        assert_eq!(execute(task), Err(TaskError::Panic("static str".into())));
    }

    #[test]
    fn execute_passes_through_errors() {
        let task = Task::new("fails", |_| Err(TaskError::Failed("nope".into())), TaskArg::none());
        assert_eq!(execute(task), Err(TaskError::Failed("nope".into())));

        let task = Task::new("ok", |arg| {
            assert_eq!(arg.downcast_ref::<u8>(), Some(&1));
            Ok(())
        }, TaskArg::new(1_u8));
        assert_eq!(execute(task), Ok(()));
    }
}
