use std::sync::{Arc, Mutex};

use log::{info, warn};
use tokio::sync::Semaphore;

use super::{Analyzer, EngineError, EngineOptions, UciEngine};

type Idle = Arc<Mutex<Vec<Box<dyn Analyzer>>>>;

/// Fixed set of engines; every query gets one engine to itself.
pub struct EnginePool {
    idle: Idle,
    permits: Arc<Semaphore>,
    name: String,
    size: usize,
}

impl EnginePool {
    pub fn new(engines: Vec<Box<dyn Analyzer>>) -> Self {
        let size = engines.len();
        let name = engines.first().map(|e| e.name().to_string()).unwrap_or_default();
        Self { idle: Arc::new(Mutex::new(engines)), permits: Arc::new(Semaphore::new(size)), name, size }
    }

    pub fn spawn_uci(opts: &EngineOptions, count: usize) -> Result<Self, EngineError> {
        let mut engines: Vec<Box<dyn Analyzer>> = Vec::with_capacity(count);
        for _ in 0..count.max(1) {
            engines.push(Box::new(UciEngine::spawn(opts.clone())?));
        }
        info!("engine pool ready: {} x '{}'", engines.len(), engines[0].name());
        Ok(Self::new(engines))
    }

    pub fn name(&self) -> &str { &self.name }

    pub fn size(&self) -> usize { self.size }

    /// Runs `f` against an idle engine on the blocking thread pool, waiting
    /// for one to free up if all are busy.
    pub async fn run<F, R>(&self, f: F) -> Result<R, EngineError>
    where
        F: FnOnce(&mut dyn Analyzer) -> Result<R, EngineError> + Send + 'static,
        R: Send + 'static,
    {
        let permit = self.permits.clone().acquire_owned().await
            .map_err(|_| EngineError::Unavailable("engine pool is shut down".into()))?;
        let engine = self.idle.lock()
            .map_err(|_| EngineError::Unavailable("engine pool lock poisoned".into()))?
            .pop()
            .ok_or_else(|| EngineError::Unavailable("no idle engine".into()))?;
        let mut checkout = Checkout { engine: Some(engine), idle: self.idle.clone() };
        let joined = tokio::task::spawn_blocking(move || {
            let out = match checkout.engine.as_deref_mut() {
                Some(engine) => f(engine),
                None => Err(EngineError::Unavailable("no idle engine".into())),
            };
            // engine back on the idle list before the next waiter is admitted
            drop(checkout);
            drop(permit);
            out
        })
        .await;
        joined.map_err(|e| EngineError::Unavailable(format!("engine task failed: {e}")))?
    }

    /// Waits for in-flight queries, then quits every engine.
    pub async fn shutdown(&self) {
        let Ok(all) = self.permits.acquire_many(self.size as u32).await else { return };
        self.permits.close();
        let engines: Vec<Box<dyn Analyzer>> = match self.idle.lock() {
            Ok(mut idle) => idle.drain(..).collect(),
            Err(_) => return,
        };
        drop(all);
        let quit = tokio::task::spawn_blocking(move || {
            for mut engine in engines {
                if let Err(e) = engine.quit() { warn!("engine '{}' quit failed: {e}", engine.name()); }
            }
        });
        if quit.await.is_err() { warn!("engine shutdown task panicked"); }
        info!("engine pool shut down");
    }
}

// Returns the engine to the idle list even if the query panics.
struct Checkout {
    engine: Option<Box<dyn Analyzer>>,
    idle: Idle,
}

impl Drop for Checkout {
    fn drop(&mut self) {
        if let (Some(engine), Ok(mut idle)) = (self.engine.take(), self.idle.lock()) {
            idle.push(engine);
        }
    }
}
