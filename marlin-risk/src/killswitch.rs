use std::sync::atomic::{AtomicBool, Ordering};

/// The process-wide kill switch: once active, every new order is rejected
/// until an operator manually deactivates it.
///
/// Reads are lock-free. Activation and deactivation report whether they
/// changed the state, so a double activation publishes nothing twice.
#[derive(Debug, Default)]
pub struct KillSwitch {
    active: AtomicBool,
}

impl KillSwitch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }

    /// Activate; true only on the transition from inactive to active.
    pub fn activate(&self) -> bool {
        !self.active.swap(true, Ordering::SeqCst)
    }

    /// Deactivate; true only on the transition from active to inactive.
    pub fn deactivate(&self) -> bool {
        self.active.swap(false, Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_double_activation_is_a_no_op() {
        let switch = KillSwitch::new();
        assert!(switch.activate());
        assert!(switch.is_active());
        assert!(!switch.activate());

        assert!(switch.deactivate());
        assert!(!switch.deactivate());
        assert!(!switch.is_active());
    }
}
