use super::errors::TaskResult;
use std::{
    any::Any,
    fmt,
    sync::Arc,
};


pub type Action = Box<dyn FnOnce(TaskArg) -> TaskResult + Send + 'static>;

/// Единица работы в очереди. Имя нужно только для диагностики.
pub struct Task {
    pub name: String,
    pub action: Action,
    pub arg: TaskArg,
}

impl Task {
    pub fn new<F>(name: impl Into<String>, action: F, arg: TaskArg) -> Self
    where
        F: FnOnce(TaskArg) -> TaskResult + Send + 'static,
    {
        Self {
            name: name.into(),
            action: Box::new(action),
            arg,
        }
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("arg", &self.arg)
            .finish_non_exhaustive()
    }
}


trait Payload: Send + Sync {
    fn as_any(&self) -> &dyn Any;
}

struct Plain<T>(T);

impl<T: Any + Send + Sync> Payload for Plain<T> {
    fn as_any(&self) -> &dyn Any {
        &self.0
    }
}

/// Значение с действием освобождения, которое вызывается при drop последней ссылки
struct Releasing<T, R>
where
    R: FnOnce(T),
{
    value: Option<T>,
    release: Option<R>,
}

impl<T, R> Payload for Releasing<T, R>
where
    T: Any + Send + Sync,
    R: FnOnce(T) + Send + Sync,
{
    fn as_any(&self) -> &dyn Any {
        match &self.value {
            Some(value) => value as &dyn Any,
            None => &() as &dyn Any,
        }
    }
}

impl<T, R> Drop for Releasing<T, R>
where
    R: FnOnce(T),
{
    fn drop(&mut self) {
        if let (Some(value), Some(release)) = (self.value.take(), self.release.take()) {
            release(value);
        }
    }
}


/// Непрозрачный аргумент задачи с разделяемым владением.
///
/// Клонирование дешевое (`Arc`). Последний владелец, будь то вызывающий код или
/// воркер, освобождает значение на своем потоке.
#[derive(Clone)]
pub struct TaskArg {
    payload: Arc<dyn Payload>,
}

impl TaskArg {
    pub fn new<T>(value: T) -> Self
    where
        T: Any + Send + Sync,
    {
        Self {
            payload: Arc::new(Plain(value)),
        }
    }

    /// `release` получает значение ровно один раз, когда дропается последняя ссылка
    pub fn with_release<T, R>(value: T, release: R) -> Self
    where
        T: Any + Send + Sync,
        R: FnOnce(T) + Send + Sync + 'static,
    {
        Self {
            payload: Arc::new(Releasing {
                value: Some(value),
                release: Some(release),
            }),
        }
    }

    #[inline]
    pub fn none() -> Self {
        Self::new(())
    }

    #[inline]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.payload.as_any().downcast_ref::<T>()
    }

    #[inline]
    pub fn is<T: Any>(&self) -> bool {
        self.payload.as_any().is::<T>()
    }

    #[inline]
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.payload)
    }
}

impl Default for TaskArg {
    fn default() -> Self {
        Self::none()
    }
}

impl fmt::Debug for TaskArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskArg")
            .field("refs", &self.ref_count())
            .finish()
    }
}
