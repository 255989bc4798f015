use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use tracing::{info, warn};

/// 退出标志，在采集循环与信号线程之间共享
#[derive(Debug, Clone, Default)]
pub struct ShutdownFlag(Arc<AtomicBool>);

impl ShutdownFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// 安装 SIGINT (Ctrl-C) 处理
///
/// 在独立线程中运行单线程tokio运行时等待信号，收到后置位 `flag`。
/// 线程不需要join，进程退出时随之结束。
pub fn install_ctrlc_handler(flag: ShutdownFlag) -> std::io::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    thread::Builder::new()
        .name("sigint".into())
        .spawn(move || {
            match runtime.block_on(tokio::signal::ctrl_c()) {
                Ok(()) => {
                    info!("received SIGINT");
                    flag.trigger();
                }
                Err(e) => warn!("无法捕获 SIGINT: {}", e),
            }
        })?;
    Ok(())
}
