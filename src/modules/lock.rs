use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

/// 按模块标识加锁，串行化同名模块的 create/update/delete/refresh
#[derive(Default)]
pub struct NameLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl NameLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, name: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            // 清理无人持有的锁
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(name.to_string()).or_default().clone()
        };
        lock.lock_owned().await
    }
}
