use core_types::SwitchEventKind;
use serde::{Deserialize, Serialize};

/// Trait for turning a line into a switch signal.
///
/// Implementations must be pure: the same bytes always classify the same
/// way, and no state is carried from one line to the next.
pub trait SignalClassifier: Send + Sync {
    /// Classify one line (without its newline).
    /// Returns None if the line is not a signal; such lines are ignored.
    fn classify(&self, line: &[u8]) -> Option<SwitchEventKind>;

    /// Get the unique id of this classifier (e.g. "vocabulary").
    fn id(&self) -> &'static str;

    /// Get a human-readable name.
    fn name(&self) -> &'static str;
}

/// A case-sensitive byte pattern a line is matched against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalPattern {
    EndsWith(String),
    StartsWith(String),
    Exact(String),
}

impl SignalPattern {
    pub fn matches(&self, line: &[u8]) -> bool {
        match self {
            Self::EndsWith(token) => line.ends_with(token.as_bytes()),
            Self::StartsWith(token) => line.starts_with(token.as_bytes()),
            Self::Exact(token) => line == token.as_bytes(),
        }
    }
}

/// Configurable signal vocabulary.
///
/// Patterns are tried in the order activate, deactivate, trigger and the
/// first match wins, so a line never maps to more than one event. With
/// `trim` set, surrounding ASCII whitespace (including a CR left by CRLF
/// senders) is stripped before matching.
///
/// The default recognizes a single signal: a line ending in `false` is a
/// trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalVocabulary {
    pub activate: Option<SignalPattern>,
    pub deactivate: Option<SignalPattern>,
    pub trigger: Option<SignalPattern>,
    pub trim: bool,
}

impl SignalVocabulary {
    /// Vocabulary that recognizes nothing; useful as a starting point.
    pub fn empty() -> Self {
        Self {
            activate: None,
            deactivate: None,
            trigger: None,
            trim: false,
        }
    }

    pub fn with_activate(mut self, pattern: SignalPattern) -> Self {
        self.activate = Some(pattern);
        self
    }

    pub fn with_deactivate(mut self, pattern: SignalPattern) -> Self {
        self.deactivate = Some(pattern);
        self
    }

    pub fn with_trigger(mut self, pattern: SignalPattern) -> Self {
        self.trigger = Some(pattern);
        self
    }

    pub fn with_trim(mut self, trim: bool) -> Self {
        self.trim = trim;
        self
    }
}

impl Default for SignalVocabulary {
    fn default() -> Self {
        Self::empty().with_trigger(SignalPattern::EndsWith("false".into()))
    }
}

impl SignalClassifier for SignalVocabulary {
    fn classify(&self, line: &[u8]) -> Option<SwitchEventKind> {
        let line = if self.trim { line.trim_ascii() } else { line };

        [
            (&self.activate, SwitchEventKind::Activate),
            (&self.deactivate, SwitchEventKind::Deactivate),
            (&self.trigger, SwitchEventKind::Trigger),
        ]
        .into_iter()
        .find_map(|(pattern, kind)| {
            pattern
                .as_ref()
                .filter(|p| p.matches(line))
                .map(|_| kind)
        })
    }

    fn id(&self) -> &'static str {
        "vocabulary"
    }

    fn name(&self) -> &'static str {
        "Configurable Signal Vocabulary"
    }
}
