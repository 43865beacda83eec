//! 取消信号 - 基础设施层
//!
//! 基于 `tokio::sync::watch` 的一次性取消信号。`CancelSource` 持有发送端，
//! `CancelSignal` 可以任意克隆并在多个任务中等待。

use std::time::Duration;
use tokio::sync::watch;

/// 取消信号的发送端
#[derive(Debug)]
pub struct CancelSource {
    tx: watch::Sender<bool>,
}

impl CancelSource {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    /// 触发取消，重复调用无副作用
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// 获取一个可等待的信号
    pub fn signal(&self) -> CancelSignal {
        CancelSignal {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for CancelSource {
    fn default() -> Self {
        Self::new()
    }
}

/// 取消信号的接收端
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    /// 永远不会触发的信号
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// 等待取消触发；发送端在未取消的情况下被丢弃时永远挂起
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

/// 可被取消打断的等待
///
/// 返回 `true` 表示完整等待了 `delay`，`false` 表示被取消打断。
pub async fn wait_or_cancel(delay: Duration, cancel: &CancelSignal) -> bool {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}
