//! 批处理控制面
//!
//! 控制方与批处理任务之间只有两条通道：
//! - 入站 `watch`：暂停 / 恢复 / 停止标志
//! - 出站 `mpsc`：状态、进度、正确率、日志事件

use std::sync::Arc;
use tokio::sync::watch;

use crate::infrastructure::{CancelSignal, CancelSource};

/// 控制标志
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlState {
    pub paused: bool,
    pub stopped: bool,
}

/// 批处理运行状态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BatchRunState {
    #[default]
    Idle,
    Running,
    Paused,
    /// 终止状态：收到停止请求
    Stopped,
    /// 终止状态：全部图像处理完毕
    Completed,
}

impl BatchRunState {
    pub fn is_terminal(self) -> bool {
        matches!(self, BatchRunState::Stopped | BatchRunState::Completed)
    }
}

/// 批处理发出的事件
#[derive(Debug, Clone, PartialEq)]
pub enum BatchEvent {
    StateChanged(BatchRunState),
    Progress { current: usize, total: usize },
    Accuracy { correct: usize, labeled: usize },
    Log(String),
}

/// 控制句柄，可克隆后交给任意任务（例如 Ctrl-C 处理）
///
/// 所有句柄都被丢弃时，暂停中的批处理视为停止。
#[derive(Debug, Clone)]
pub struct BatchControl {
    tx: Arc<watch::Sender<ControlState>>,
    cancel: Arc<CancelSource>,
}

impl BatchControl {
    pub(crate) fn new() -> (Self, watch::Receiver<ControlState>, CancelSignal) {
        let (tx, rx) = watch::channel(ControlState::default());
        let cancel = CancelSource::new();
        let signal = cancel.signal();
        let control = Self {
            tx: Arc::new(tx),
            cancel: Arc::new(cancel),
        };
        (control, rx, signal)
    }

    pub fn request_pause(&self) {
        self.tx.send_modify(|state| state.paused = true);
    }

    pub fn request_resume(&self) {
        self.tx.send_modify(|state| state.paused = false);
    }

    /// 请求停止，同时中断正在进行的判定请求和等待
    pub fn request_stop(&self) {
        self.tx.send_modify(|state| state.stopped = true);
        self.cancel.cancel();
    }

    pub fn state(&self) -> ControlState {
        *self.tx.borrow()
    }
}
