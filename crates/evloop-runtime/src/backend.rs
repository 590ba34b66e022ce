//! `LoopBackend` implementations.
//!
//! Two backends, per the start-safe design rule:
//!
//! - `CondvarBackend` — portable Mutex<bool> + Condvar parker.
//! - `EventFdBackend` (unix) — eventfd wake, `poll(2)` + read wait.
//!   Coalescing: multiple `wake()` calls before the reactor reads the
//!   eventfd result in a single wakeup (eventfd counter semantics).
//!
//! `default_backend()` picks the eventfd backend on unix and the condvar
//! backend elsewhere.

use evloop_core::backend::LoopBackend;
use evloop_core::error::{LoopError, Result};
use std::sync::{Condvar, Mutex};

/// Portable parker backend. The flag is sticky: a `wake()` between two
/// `wait()` calls is never lost.
pub struct CondvarBackend {
    woken: Mutex<bool>,
    cv: Condvar,
}

impl CondvarBackend {
    pub fn create() -> Result<Self> {
        Ok(Self {
            woken: Mutex::new(false),
            cv: Condvar::new(),
        })
    }
}

impl LoopBackend for CondvarBackend {
    fn wake(&self) -> Result<()> {
        let mut woken = self.woken.lock().unwrap();
        *woken = true;
        self.cv.notify_one();
        Ok(())
    }

    fn wait(&self) {
        let mut woken = self.woken.lock().unwrap();
        while !*woken {
            woken = self.cv.wait(woken).unwrap();
        }
        *woken = false;
    }

    fn name(&self) -> &'static str {
        "condvar"
    }
}

#[cfg(unix)]
pub use self::unix::EventFdBackend;

#[cfg(unix)]
mod unix {
    use super::*;
    use std::os::unix::io::RawFd;

    /// eventfd-based backend.
    ///
    /// Owns the fd and closes it on Drop. Created with
    /// `EFD_NONBLOCK | EFD_CLOEXEC` so `wake()` can never block.
    pub struct EventFdBackend {
        fd: RawFd,
    }

    impl EventFdBackend {
        pub fn create() -> Result<Self> {
            let fd = unsafe { libc::eventfd(0, libc::EFD_NONBLOCK | libc::EFD_CLOEXEC) };
            if fd < 0 {
                return Err(LoopError::BackendInit(unsafe { *libc::__errno_location() }));
            }
            Ok(Self { fd })
        }

        pub fn fd(&self) -> RawFd {
            self.fd
        }
    }

    impl LoopBackend for EventFdBackend {
        fn wake(&self) -> Result<()> {
            let val: u64 = 1;
            let ret = unsafe {
                libc::write(
                    self.fd,
                    &val as *const u64 as *const libc::c_void,
                    std::mem::size_of::<u64>(),
                )
            };
            if ret < 0 {
                let errno = unsafe { *libc::__errno_location() };
                // EAGAIN means the counter would overflow, which implies
                // a wakeup is already pending. That's fine.
                if errno == libc::EAGAIN {
                    return Ok(());
                }
                return Err(LoopError::BackendWake(errno));
            }
            Ok(())
        }

        fn wait(&self) {
            loop {
                let mut pfd = libc::pollfd {
                    fd: self.fd,
                    events: libc::POLLIN,
                    revents: 0,
                };
                let ret = unsafe { libc::poll(&mut pfd, 1, -1) };
                if ret < 0 {
                    let errno = unsafe { *libc::__errno_location() };
                    if errno == libc::EINTR {
                        continue;
                    }
                    return;
                }
                // Drain the counter so the next wait blocks again.
                let mut val: u64 = 0;
                let ret = unsafe {
                    libc::read(
                        self.fd,
                        &mut val as *mut u64 as *mut libc::c_void,
                        std::mem::size_of::<u64>(),
                    )
                };
                if ret >= 0 || unsafe { *libc::__errno_location() } != libc::EINTR {
                    return;
                }
            }
        }

        fn name(&self) -> &'static str {
            "eventfd"
        }
    }

    impl Drop for EventFdBackend {
        fn drop(&mut self) {
            if self.fd >= 0 {
                unsafe {
                    libc::close(self.fd);
                }
                self.fd = -1;
            }
        }
    }
}

/// Platform default backend.
pub fn default_backend() -> Result<Box<dyn LoopBackend>> {
    cfg_if::cfg_if! {
        if #[cfg(unix)] {
            Ok(Box::new(EventFdBackend::create()?))
        } else {
            Ok(Box::new(CondvarBackend::create()?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    fn exercise(backend: Arc<dyn LoopBackend>) {
        // Sticky wake: wake before wait must not block.
        backend.wake().unwrap();
        backend.wait();

        // Cross-thread wake unblocks a parked waiter.
        let b2 = backend.clone();
        let t = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            b2.wake().unwrap();
        });
        backend.wait();
        t.join().unwrap();

        // Coalescing: many wakes, one wait consumes them all.
        for _ in 0..10 {
            backend.wake().unwrap();
        }
        backend.wait();
    }

    #[test]
    fn test_condvar_backend() {
        exercise(Arc::new(CondvarBackend::create().unwrap()));
    }

    #[cfg(unix)]
    #[test]
    fn test_eventfd_backend() {
        exercise(Arc::new(EventFdBackend::create().unwrap()));
    }

    #[test]
    fn test_default_backend_creates() {
        let b = default_backend().unwrap();
        b.wake().unwrap();
        b.wait();
        assert!(!b.name().is_empty());
    }
}
