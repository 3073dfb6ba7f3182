//! Accelerator decompression session.
//!
//! An [`Accelerator`] is a separate execution context that decompresses a
//! multi-section stream on its own resources. [`AcceleratorSession`] wraps a
//! device in the linear `Uninitialized -> Ready -> Destroyed` lifecycle and
//! releases the device when dropped in `Ready`, so early exits cannot leak
//! device resources.

mod pooled;

pub use pooled::PooledDevice;

use crate::error::{BenchError, CodecError, Result};
use std::fmt;
use tracing::debug;

/// Device level interface driven by [`AcceleratorSession`].
pub trait Accelerator {
    /// Acquires device resources sized for one stream.
    fn init(&mut self, input_len: usize, compressed_len: usize, sub_sections: u32) -> std::result::Result<(), String>;

    /// Decompresses `input` into `output`. Blocks until the device is done.
    fn decompress(&mut self, input: &[u8], output: &mut [u8], expected_len: usize) -> std::result::Result<usize, CodecError>;

    /// Releases everything `init` acquired.
    fn destroy(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Ready,
    Destroyed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Uninitialized => f.write_str("uninitialized"),
            SessionState::Ready => f.write_str("ready"),
            SessionState::Destroyed => f.write_str("destroyed"),
        }
    }
}

pub struct AcceleratorSession<A: Accelerator> {
    device: A,
    state: SessionState,
}

impl<A: Accelerator> AcceleratorSession<A> {
    pub fn new(device: A) -> Self {
        Self {
            device,
            state: SessionState::Uninitialized,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    fn expect_state(&self, expected: SessionState, operation: &'static str) -> Result<()> {
        if self.state != expected {
            return Err(BenchError::AcceleratorState {
                operation,
                state: self.state,
            });
        }
        Ok(())
    }

    /// `Uninitialized -> Ready`. A failed init ends the session; it cannot be
    /// retried.
    pub fn init(&mut self, input_len: usize, compressed_len: usize, sub_sections: u32) -> Result<()> {
        self.expect_state(SessionState::Uninitialized, "initialize")?;
        match self.device.init(input_len, compressed_len, sub_sections) {
            Ok(()) => {
                debug!(input_len, compressed_len, sub_sections, "accelerator session ready");
                self.state = SessionState::Ready;
                Ok(())
            }
            Err(reason) => {
                self.state = SessionState::Destroyed;
                Err(BenchError::AcceleratorInitFailure(reason))
            }
        }
    }

    /// Only valid in `Ready`; may be called any number of times.
    pub fn decompress(
        &mut self,
        input: &[u8],
        output: &mut [u8],
        expected_len: usize,
    ) -> std::result::Result<usize, SessionError> {
        if self.state != SessionState::Ready {
            return Err(SessionError::State(self.state));
        }
        self.device
            .decompress(input, output, expected_len)
            .map_err(SessionError::Codec)
    }

    /// `Ready -> Destroyed`. Calling it twice is an error.
    pub fn destroy(&mut self) -> Result<()> {
        self.expect_state(SessionState::Ready, "destroy")?;
        self.device.destroy();
        self.state = SessionState::Destroyed;
        debug!("accelerator session destroyed");
        Ok(())
    }
}

impl<A: Accelerator> Drop for AcceleratorSession<A> {
    fn drop(&mut self) {
        if self.state == SessionState::Ready {
            debug!("releasing accelerator session on early exit");
            self.device.destroy();
            self.state = SessionState::Destroyed;
        }
    }
}

/// Failure of [`AcceleratorSession::decompress`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("accelerator session is {0}")]
    State(SessionState),
    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl SessionError {
    pub(crate) fn into_bench(self, phase: crate::error::Phase) -> BenchError {
        match self {
            SessionError::State(state) => BenchError::AcceleratorState {
                operation: "decompress with",
                state,
            },
            SessionError::Codec(source) => BenchError::CodecFailure { phase, source },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Default, Clone)]
    struct Counters {
        inits: Rc<Cell<u32>>,
        destroys: Rc<Cell<u32>>,
    }

    struct FakeDevice {
        counters: Counters,
        fail_init: bool,
    }

    impl Accelerator for FakeDevice {
        fn init(&mut self, _: usize, _: usize, _: u32) -> std::result::Result<(), String> {
            self.counters.inits.set(self.counters.inits.get() + 1);
            if self.fail_init {
                Err("no device".into())
            } else {
                Ok(())
            }
        }

        fn decompress(&mut self, input: &[u8], output: &mut [u8], _: usize) -> std::result::Result<usize, CodecError> {
            output[..input.len()].copy_from_slice(input);
            Ok(input.len())
        }

        fn destroy(&mut self) {
            self.counters.destroys.set(self.counters.destroys.get() + 1);
        }
    }

    fn session(fail_init: bool) -> (AcceleratorSession<FakeDevice>, Counters) {
        let counters = Counters::default();
        let device = FakeDevice {
            counters: counters.clone(),
            fail_init,
        };
        (AcceleratorSession::new(device), counters)
    }

    #[test]
    fn decompress_before_init_fails_fast() {
        let (mut session, _) = session(false);
        let mut out = [0u8; 4];
        assert_eq!(
            session.decompress(b"ab", &mut out, 2),
            Err(SessionError::State(SessionState::Uninitialized))
        );
    }

    #[test]
    fn full_lifecycle_destroys_once() {
        let (mut session, counters) = session(false);
        session.init(2, 2, 1).unwrap();
        let mut out = [0u8; 4];
        for _ in 0..3 {
            assert_eq!(session.decompress(b"ab", &mut out, 2), Ok(2));
        }
        session.destroy().unwrap();
        assert_eq!(session.state(), SessionState::Destroyed);
        assert!(matches!(session.destroy(), Err(BenchError::AcceleratorState { .. })));
        assert_eq!(
            session.decompress(b"ab", &mut out, 2),
            Err(SessionError::State(SessionState::Destroyed))
        );
        drop(session);
        assert_eq!(counters.destroys.get(), 1);
    }

    #[test]
    fn drop_releases_a_ready_session() {
        let (mut session, counters) = session(false);
        session.init(2, 2, 1).unwrap();
        drop(session);
        assert_eq!(counters.destroys.get(), 1);
    }

    #[test]
    fn failed_init_holds_nothing_and_cannot_retry() {
        let (mut session, counters) = session(true);
        assert!(matches!(session.init(2, 2, 1), Err(BenchError::AcceleratorInitFailure(_))));
        assert!(matches!(session.init(2, 2, 1), Err(BenchError::AcceleratorState { .. })));
        drop(session);
        assert_eq!(counters.inits.get(), 1);
        assert_eq!(counters.destroys.get(), 0);
    }
}
