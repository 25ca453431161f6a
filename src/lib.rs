//! Пул потоков с ограниченной очередью задач и динамическим ростом числа воркеров
//!
//! # Features
//! - FIFO очередь с backpressure: `submit` блокируется, пока очередь полна
//! - Рост числа воркеров по глубине очереди, с потолком от числа CPU
//! - Изоляция паник и ошибок задач: воркер логирует сбой и продолжает работу
//! - Перезапуск пула с новым числом воркеров и graceful shutdown с дренажом очереди
//! - Метрики и мониторинг

pub mod errors;
pub mod model;
pub mod pool;
pub mod task;

mod queue;
mod worker;

pub use pool::{Config, ThreadPool};
pub use task::TaskArg;
