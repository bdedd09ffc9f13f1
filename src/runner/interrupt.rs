//! SIGINT handling around foreground runs.
//!
//! While at least one [`InterruptScope`] is alive, SIGINT only raises the
//! scope's flag. Outside of any scope the default action runs, so the
//! process stays killable with Ctrl-C after a blocking run returns.

use signal_hook::consts::signal::SIGINT;
use signal_hook::SigId;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

struct SigintState {
    idle: Arc<AtomicBool>,
    active: usize,
}

static STATE: Mutex<Option<SigintState>> = Mutex::new(None);

/// Catches SIGINT for its lifetime.
pub(crate) struct InterruptScope {
    flag: Arc<AtomicBool>,
    id: SigId,
}

impl InterruptScope {
    pub(crate) fn enter() -> io::Result<Self> {
        {
            let mut guard = STATE.lock().unwrap_or_else(|e| e.into_inner());
            if guard.is_none() {
                let idle = Arc::new(AtomicBool::new(true));
                signal_hook::flag::register_conditional_default(SIGINT, Arc::clone(&idle))?;
                *guard = Some(SigintState { idle, active: 0 });
            }
            if let Some(state) = guard.as_mut() {
                state.active += 1;
                state.idle.store(false, Ordering::SeqCst);
            }
        }

        let flag = Arc::new(AtomicBool::new(false));
        match signal_hook::flag::register(SIGINT, Arc::clone(&flag)) {
            Ok(id) => Ok(Self { flag, id }),
            Err(err) => {
                leave();
                Err(err)
            }
        }
    }

    pub(crate) fn interrupted(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

impl Drop for InterruptScope {
    fn drop(&mut self) {
        signal_hook::low_level::unregister(self.id);
        leave();
    }
}

fn leave() {
    let mut state = STATE.lock().unwrap_or_else(|e| e.into_inner());
    if let Some(state) = state.as_mut() {
        state.active = state.active.saturating_sub(1);
        if state.active == 0 {
            state.idle.store(true, Ordering::SeqCst);
        }
    }
}

#[cfg(test)]
fn is_idle() -> bool {
    let state = STATE.lock().unwrap_or_else(|e| e.into_inner());
    state
        .as_ref()
        .is_none_or(|s| s.idle.load(Ordering::SeqCst))
}
