use std::sync::{
    Arc, OnceLock,
    atomic::{AtomicBool, Ordering},
};
use std::time::{Duration, Instant};

use color_eyre::eyre::{Context, eyre};

static QUIT: OnceLock<Quit> = OnceLock::new();

/// Set once the OS has asked the program to quit.
#[derive(Clone, Debug)]
pub struct Quit(Arc<AtomicBool>);

impl Quit {
    /// Returns true once the program has been asked to quit by the OS.
    pub fn requested(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Sleep for `dur`, waking early if a quit is requested. Returns false if
    /// it woke early.
    pub fn sleep(&self, dur: Duration) -> bool {
        const STEP: Duration = Duration::from_millis(50);
        let deadline = Instant::now() + dur;
        loop {
            if self.requested() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            std::thread::sleep(STEP.min(deadline - now));
        }
    }
}

/// Get the process-wide quit flag, starting the signal watcher on first use.
///
/// The radio calls all block, so signals are caught on a separate thread with
/// its own runtime, which just flips the flag.
pub fn quit_watch() -> color_eyre::Result<Quit> {
    if let Some(quit) = QUIT.get() {
        return Ok(quit.clone());
    }

    // Only the caller that installs the flag starts a watcher for it.
    let quit = Quit(Arc::new(AtomicBool::new(false)));
    if QUIT.set(quit.clone()).is_err() {
        return QUIT
            .get()
            .cloned()
            .ok_or_else(|| eyre!("Quit flag vanished after being set"));
    }

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .wrap_err("Couldn't start the signal handling runtime")?;
    let flag = quit.clone();
    std::thread::Builder::new()
        .name(String::from("os-signal"))
        .spawn(move || rt.block_on(watch(flag)))
        .wrap_err("Couldn't start the signal handling thread")?;

    Ok(quit)
}

async fn watch(quit: Quit) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        for kind in [
            SignalKind::interrupt(),
            SignalKind::hangup(),
            SignalKind::terminate(),
            SignalKind::quit(),
        ] {
            let Ok(mut sig) = signal(kind) else {
                tracing::warn!("Couldn't install handler for signal {}", kind.as_raw_value());
                continue;
            };
            let quit = quit.clone();
            tokio::spawn(async move {
                sig.recv().await;
                quit.cancel();
            });
        }
    }
    #[cfg(not(unix))]
    {
        let quit = quit.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                quit.cancel();
            }
        });
    }
    std::future::pending::<()>().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sleep_wakes_early() {
        let quit = Quit(Arc::new(AtomicBool::new(false)));
        assert!(quit.sleep(Duration::from_millis(10)));
        quit.cancel();
        let start = Instant::now();
        assert!(!quit.sleep(Duration::from_secs(10)));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn one_flag_for_all_callers() {
        let handles: Vec<_> = (0..8).map(|_| std::thread::spawn(quit_watch)).collect();
        let quits: Vec<Quit> = handles
            .into_iter()
            .map(|h| h.join().unwrap().unwrap())
            .collect();
        assert!(quits.iter().all(|q| Arc::ptr_eq(&q.0, &quits[0].0)));
        assert!(Arc::ptr_eq(&quit_watch().unwrap().0, &quits[0].0));
        assert!(!quits[0].requested());
    }
}
