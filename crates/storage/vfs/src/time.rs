//! Time sources the VFS core consumes but never produces.
//!
//! HPET, PIT and RTC access live outside this crate; the VFS only ever needs
//! "now" as whole seconds since boot plus an epoch offset, so that's the seam
//! exposed here.

/// Supplies "now" to the VFS without pulling in any concrete timer or clock.
pub trait BootClock: Send + Sync {
    /// Seconds elapsed since boot.
    fn uptime_seconds(&self) -> u64;

    /// Seconds since the Unix epoch at boot time (RTC reading taken once at
    /// init). Added to `uptime_seconds()` to stamp inode timestamps.
    fn boot_epoch_seconds(&self) -> u64;

    /// Current wall-clock time, seconds since epoch.
    fn now_seconds(&self) -> u64 {
        self.boot_epoch_seconds() + self.uptime_seconds()
    }
}

/// Seconds + nanoseconds, matching `st_atim`/`st_mtim`/`st_ctim`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Timespec {
    pub sec: u64,
    pub nsec: u32,
}

impl Timespec {
    pub fn now(clock: &dyn BootClock) -> Self {
        // The reference kernel zeroes the nanosecond field; it only has
        // second resolution available from its boot clock.
        Timespec { sec: clock.now_seconds(), nsec: 0 }
    }
}

/// Broken-down modification time carried directly on the inode, as distinct
/// from the stat timespecs carried on the tnode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

/// A fixed clock for tests: uptime advances only when told to.
#[cfg(test)]
pub struct TestClock {
    pub uptime: core::sync::atomic::AtomicU64,
    pub epoch: u64,
}

#[cfg(test)]
impl TestClock {
    pub fn new(epoch: u64) -> Self {
        TestClock { uptime: core::sync::atomic::AtomicU64::new(0), epoch }
    }
}

#[cfg(test)]
impl BootClock for TestClock {
    fn uptime_seconds(&self) -> u64 {
        self.uptime.load(core::sync::atomic::Ordering::Relaxed)
    }

    fn boot_epoch_seconds(&self) -> u64 {
        self.epoch
    }
}
