use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

/// How risky a command is
///
/// Ordering comes from [`DangerLevel::rank`], not from declaration order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DangerLevel {
    #[default]
    Safe,
    Low,
    Medium,
    High,
    Critical,
}

impl DangerLevel {
    pub const ALL: [DangerLevel; 5] = [
        DangerLevel::Safe,
        DangerLevel::Low,
        DangerLevel::Medium,
        DangerLevel::High,
        DangerLevel::Critical,
    ];

    pub fn rank(self) -> u8 {
        match self {
            DangerLevel::Safe => 0,
            DangerLevel::Low => 1,
            DangerLevel::Medium => 2,
            DangerLevel::High => 3,
            DangerLevel::Critical => 4,
        }
    }

    /// Upper-case name, as shown to users
    pub fn name(self) -> &'static str {
        match self {
            DangerLevel::Safe => "SAFE",
            DangerLevel::Low => "LOW",
            DangerLevel::Medium => "MEDIUM",
            DangerLevel::High => "HIGH",
            DangerLevel::Critical => "CRITICAL",
        }
    }

    /// Terminal colour name for this level
    pub fn color(self) -> &'static str {
        match self {
            DangerLevel::Safe => "green",
            DangerLevel::Low | DangerLevel::Medium => "yellow",
            DangerLevel::High | DangerLevel::Critical => "red",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            DangerLevel::Safe => "✅",
            DangerLevel::Low => "⚡",
            DangerLevel::Medium => "⚠️",
            DangerLevel::High => "🔥",
            DangerLevel::Critical => "💀",
        }
    }

    /// Whether the user must explicitly confirm before running
    pub fn requires_confirmation(self) -> bool {
        matches!(self, DangerLevel::High | DangerLevel::Critical)
    }

    /// The next level up, saturating at `Critical`
    pub fn escalate(self) -> Self {
        match self {
            DangerLevel::Safe => DangerLevel::Low,
            DangerLevel::Low => DangerLevel::Medium,
            DangerLevel::Medium => DangerLevel::High,
            DangerLevel::High | DangerLevel::Critical => DangerLevel::Critical,
        }
    }
}

impl PartialOrd for DangerLevel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DangerLevel {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl fmt::Display for DangerLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
