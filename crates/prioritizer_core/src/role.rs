use std::fmt;

/// `agentType` of the frame that carries the final prioritized rows.
pub const TABLE_MARKER: &str = "Final_output_into_table";

/// Sender of a streamed fragment. Unknown tags are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AgentRole {
    ProductOwner,
    QualityAssurance,
    Developer,
    FinalPrioritization,
    Error,
    Other(String),
}

impl AgentRole {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "PO" => Self::ProductOwner,
            "QA" => Self::QualityAssurance,
            "developer" => Self::Developer,
            "Final Prioritization" => Self::FinalPrioritization,
            "error" => Self::Error,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_tag(&self) -> &str {
        match self {
            Self::ProductOwner => "PO",
            Self::QualityAssurance => "QA",
            Self::Developer => "developer",
            Self::FinalPrioritization => "Final Prioritization",
            Self::Error => "error",
            Self::Other(tag) => tag,
        }
    }

    /// The narrative role whose completion triggers the settle delay.
    pub fn is_terminal_narrative(&self) -> bool {
        matches!(self, Self::FinalPrioritization)
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}
