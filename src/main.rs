use dyn_pool::{ThreadPool, TaskArg};
use std::{
    thread,
    time::{Duration, Instant},
};
use tracing_subscriber::EnvFilter;


fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_thread_names(true)
        .init();

    let now = Instant::now();
    let pool = ThreadPool::new(3)?;
    pool.configure_capacity(10);
    pool.configure_scaling(5, 2);

    for i in 1..=20_i32 {
        let arg = TaskArg::with_release(i, |value| {
            tracing::debug!(arg = value, "argument released");
        });

        pool.submit(format!("Task{}", i), |arg| {
            if let Some(num) = arg.downcast_ref::<i32>() {
                tracing::info!(arg = num, thread = ?thread::current().id(), "task running");
            }
            thread::sleep(Duration::from_millis(200));
        }, arg);
    }

    let metrics = pool.metrics();
    tracing::info!(
        workers = metrics.workers,
        queued = metrics.queued_tasks,
        "all tasks submitted"
    );

    drop(pool);
    tracing::info!(elapsed = ?now.elapsed(), "done");
    Ok(())
}
