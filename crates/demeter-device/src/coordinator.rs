use crate::transport::DeviceTransport;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;

/// 总线协调器
///
/// 总线在一次完整的采集或一次投加序列期间只能有一个使用者。
/// 锁的粒度是“整个序列”，而不是单次读写：写入、等待、读取必须在同一个会话内完成，
/// 否则应答会被归到错误的设备上。
#[derive(Clone)]
pub struct BusCoordinator {
    transport: Arc<Mutex<Box<dyn DeviceTransport>>>,
    sequence: Arc<AtomicU64>,
}

impl BusCoordinator {
    pub fn new<T>(transport: T) -> Self
    where
        T: DeviceTransport + 'static,
    {
        Self::from_boxed(Box::new(transport))
    }

    pub fn from_boxed(transport: Box<dyn DeviceTransport>) -> Self {
        Self {
            transport: Arc::new(Mutex::new(transport)),
            sequence: Arc::new(AtomicU64::new(0)),
        }
    }

    /// 获取总线独占会话，会话结束（drop）时释放
    pub async fn lock(&self, purpose: &'static str) -> BusSession<'_> {
        let waited = Instant::now();
        let mut guard = self.transport.lock().await;
        let id = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        guard.session_started(id);

        debug!(
            sequence = id,
            purpose,
            waited_ms = waited.elapsed().as_millis() as u64,
            "Bus session started"
        );

        BusSession {
            guard,
            id,
            purpose,
            started: Instant::now(),
        }
    }

    /// 已开启的会话总数
    pub fn sessions(&self) -> u64 {
        self.sequence.load(Ordering::Relaxed)
    }
}

/// 总线独占会话
pub struct BusSession<'a> {
    guard: MutexGuard<'a, Box<dyn DeviceTransport>>,
    id: u64,
    purpose: &'static str,
    started: Instant,
}

impl BusSession<'_> {
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Deref for BusSession<'_> {
    type Target = dyn DeviceTransport;

    fn deref(&self) -> &Self::Target {
        &**self.guard
    }
}

impl DerefMut for BusSession<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut **self.guard
    }
}

impl Drop for BusSession<'_> {
    fn drop(&mut self) {
        self.guard.session_ended(self.id);
        debug!(
            sequence = self.id,
            purpose = self.purpose,
            held_ms = self.started.elapsed().as_millis() as u64,
            "Bus session released"
        );
    }
}
