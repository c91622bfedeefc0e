use std::time::{Duration, Instant};

/// How long a status message defends its spot on the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keep {
    /// Replaceable by the next message.
    None,
    /// Blocks plain messages until the duration elapses.
    For(Duration),
    /// Blocks plain messages until explicitly overridden.
    Forever,
    /// Applies unconditionally and clears any standing expiry.
    Override,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expiry {
    At(Instant),
    Never,
}

/// The single status line under the player controls. A message posted with
/// an expiry suppresses routine updates until it lapses, so a deliberate
/// notice ("Screenshot Saved!") cannot be clobbered by the per-tick
/// download summary.
#[derive(Debug, Default)]
pub struct StatusLine {
    text: String,
    expiry: Option<Expiry>,
    failed: bool,
}

impl StatusLine {
    pub fn new() -> Self {
        StatusLine::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set(&mut self, text: impl Into<String>, keep: Keep) -> bool {
        self.set_at(text, keep, Instant::now())
    }

    /// Returns false when the message was rejected by a standing expiry.
    pub fn set_at(&mut self, text: impl Into<String>, keep: Keep, now: Instant) -> bool {
        if self.failed {
            return false;
        }
        if keep != Keep::Override {
            match self.expiry {
                Some(Expiry::Never) => return false,
                Some(Expiry::At(at)) if at > now => return false,
                _ => {}
            }
        }
        self.expiry = match keep {
            Keep::None | Keep::Override => None,
            Keep::For(duration) => Some(Expiry::At(now + duration)),
            Keep::Forever => Some(Expiry::Never),
        };
        self.text = text.into();
        true
    }

    /// Clear the line, but only if it still shows `expected`. Used for
    /// messages that time themselves out without claiming an expiry.
    pub fn clear_if(&mut self, expected: &str) {
        if self.text == expected {
            self.set(String::new(), Keep::Override);
        }
    }

    /// Latch a load failure: the reason stays up and every later write is
    /// dropped until reset.
    pub fn fail(&mut self, reason: impl Into<String>) {
        self.text = reason.into();
        self.expiry = None;
        self.failed = true;
    }

    pub fn reset(&mut self) {
        self.text.clear();
        self.expiry = None;
        self.failed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_messages_replace_each_other() {
        let mut line = StatusLine::new();
        let now = Instant::now();
        assert!(line.set_at("first", Keep::None, now));
        assert!(line.set_at("second", Keep::None, now));
        assert_eq!(line.text(), "second");
    }

    #[test]
    fn test_standing_expiry_rejects_plain_messages() {
        let mut line = StatusLine::new();
        let now = Instant::now();
        assert!(line.set_at("Saving 50%", Keep::Forever, now));
        // Routine auto-status arrives before expiry and must bounce.
        assert!(!line.set_at("4C ↓2.5MB/s 51%", Keep::None, now));
        assert_eq!(line.text(), "Saving 50%");
    }

    #[test]
    fn test_expired_message_is_replaceable() {
        let mut line = StatusLine::new();
        let now = Instant::now();
        assert!(line.set_at("held", Keep::For(Duration::from_secs(1)), now));
        assert!(!line.set_at("early", Keep::None, now));
        let later = now + Duration::from_secs(2);
        assert!(line.set_at("late", Keep::None, later));
        assert_eq!(line.text(), "late");
    }

    #[test]
    fn test_override_always_applies() {
        let mut line = StatusLine::new();
        let now = Instant::now();
        line.set_at("Taking screenshot...", Keep::Forever, now);
        assert!(line.set_at("", Keep::Override, now));
        // Expiry was cleared, so a held follow-up lands.
        assert!(line.set_at("Screenshot Saved!", Keep::For(Duration::from_secs(1)), now));
        assert_eq!(line.text(), "Screenshot Saved!");
    }

    #[test]
    fn test_clear_if_only_matches_own_text() {
        let mut line = StatusLine::new();
        line.set("welcome", Keep::None);
        line.clear_if("something else");
        assert_eq!(line.text(), "welcome");
        line.clear_if("welcome");
        assert_eq!(line.text(), "");
    }

    #[test]
    fn test_failure_latch_drops_all_writes() {
        let mut line = StatusLine::new();
        line.fail("Failed to load media");
        assert!(!line.set("100% Downloaded", Keep::Override));
        assert_eq!(line.text(), "Failed to load media");
        line.reset();
        assert!(line.set("back", Keep::None));
    }
}
