//! App manifest state bitmask.
//!
//! `StateFlags` in an appmanifest is an unsigned integer whose bits each
//! record one lifecycle condition. Bits are mutually non-exclusive and
//! change over the app's lifecycle (installed → update-pending →
//! downloading → running).

/// The `StateFlags` bitmask from an app manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StateFlags(pub u32);

/// Dominant condition derived from the bitmask, in fixed priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCondition {
    Running,
    Updating,
    UpdateRequired,
    Idle,
}

impl StateFlags {
    pub const UNINSTALLED: u32 = 1 << 0;
    pub const UPDATE_REQUIRED: u32 = 1 << 1;
    pub const FULLY_INSTALLED: u32 = 1 << 2;
    pub const FILES_MISSING: u32 = 1 << 5;
    pub const APP_RUNNING: u32 = 1 << 6;
    pub const FILES_CORRUPT: u32 = 1 << 7;
    pub const UPDATE_RUNNING: u32 = 1 << 8;
    pub const UPDATE_PAUSED: u32 = 1 << 9;
    pub const UPDATE_STARTED: u32 = 1 << 10;
    pub const UNINSTALLING: u32 = 1 << 11;

    /// Parses the decimal manifest value; malformed input counts as no
    /// flags set.
    pub fn parse(raw: &str) -> Self {
        Self(raw.trim().parse().unwrap_or(0))
    }

    pub fn contains(&self, bits: u32) -> bool {
        self.0 & bits != 0
    }

    pub fn is_installed(&self) -> bool {
        self.contains(Self::FULLY_INSTALLED)
    }

    pub fn is_running(&self) -> bool {
        self.contains(Self::APP_RUNNING)
    }

    /// An update is actively in progress (running, paused or started).
    pub fn is_updating(&self) -> bool {
        self.contains(Self::UPDATE_RUNNING | Self::UPDATE_PAUSED | Self::UPDATE_STARTED)
    }

    pub fn update_required(&self) -> bool {
        self.contains(Self::UPDATE_REQUIRED)
    }

    /// The dominant condition for badge display. Priority order is a
    /// product decision: running > updating > update-required > idle.
    pub fn condition(&self) -> AppCondition {
        if self.is_running() {
            AppCondition::Running
        } else if self.is_updating() {
            AppCondition::Updating
        } else if self.update_required() {
            AppCondition::UpdateRequired
        } else {
            AppCondition::Idle
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_decimal() {
        assert_eq!(StateFlags::parse("4").0, 4);
        assert_eq!(StateFlags::parse(" 1026 ").0, 1026);
    }

    #[test]
    fn malformed_input_is_empty() {
        assert_eq!(StateFlags::parse("").0, 0);
        assert_eq!(StateFlags::parse("junk").0, 0);
    }

    #[test]
    fn predicates() {
        let installed = StateFlags(StateFlags::FULLY_INSTALLED);
        assert!(installed.is_installed());
        assert!(!installed.is_running());

        let updating = StateFlags(StateFlags::FULLY_INSTALLED | StateFlags::UPDATE_RUNNING);
        assert!(updating.is_updating());
    }

    #[test]
    fn condition_priority_running_beats_updating() {
        let flags = StateFlags(
            StateFlags::APP_RUNNING | StateFlags::UPDATE_RUNNING | StateFlags::UPDATE_REQUIRED,
        );
        assert_eq!(flags.condition(), AppCondition::Running);
    }

    #[test]
    fn condition_priority_updating_beats_update_required() {
        let flags = StateFlags(StateFlags::UPDATE_STARTED | StateFlags::UPDATE_REQUIRED);
        assert_eq!(flags.condition(), AppCondition::Updating);
    }

    #[test]
    fn condition_idle_when_only_installed() {
        assert_eq!(
            StateFlags(StateFlags::FULLY_INSTALLED).condition(),
            AppCondition::Idle
        );
    }
}
