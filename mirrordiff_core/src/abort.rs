use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared cancellation token polled at every phase boundary.
///
/// Within one run the flag only ever transitions `false -> true`;
/// `request_abort` is idempotent and safe from any thread, including a
/// termination-signal handler.
#[derive(Debug, Clone, Default)]
pub struct AbortToken {
    flag: Arc<AtomicBool>,
}

impl AbortToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_abort(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abort_token_is_sticky_and_shared() {
        let token = AbortToken::new();
        let clone = token.clone();
        assert!(!token.is_aborted());

        clone.request_abort();
        clone.request_abort();
        assert!(token.is_aborted());
        assert!(clone.is_aborted());
    }
}
