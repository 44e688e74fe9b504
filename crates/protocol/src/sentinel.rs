//! Sentinel prefixes.

/// One of the three recognized line prefixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sentinel {
    FunctionCall,
    FinalAnswer,
    Error,
}

impl Sentinel {
    pub const ALL: [Sentinel; 3] = [Sentinel::FunctionCall, Sentinel::FinalAnswer, Sentinel::Error];

    /// The literal prefix, colon included. Matching is case-sensitive.
    pub fn prefix(self) -> &'static str {
        match self {
            Sentinel::FunctionCall => "FUNCTION_CALL:",
            Sentinel::FinalAnswer => "FINAL_ANSWER:",
            Sentinel::Error => "ERROR:",
        }
    }

    /// Split surrounding-whitespace-trimmed `text` into its sentinel and the
    /// trimmed payload after the prefix. `None` when no prefix matches.
    pub fn split(text: &str) -> Option<(Sentinel, &str)> {
        let text = text.trim();
        Self::ALL.into_iter().find_map(|sentinel| {
            text.strip_prefix(sentinel.prefix())
                .map(|payload| (sentinel, payload.trim()))
        })
    }
}
