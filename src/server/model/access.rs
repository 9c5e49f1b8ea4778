/// Command category an access check is made for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandScope {
    /// License lifecycle commands (create, redeem, stop, ...)
    License,
    /// Ban management, exempt from the ban check so moderators can lift bans
    LicenseBan,
    Template,
    Premium,
    Other,
}

impl CommandScope {
    /// Whether a license ban blocks commands in this scope.
    pub fn is_ban_gated(&self) -> bool {
        matches!(self, Self::License | Self::Template)
    }
}

/// Outcome of an access gate check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    Deny { reason: String },
}

impl GateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}
