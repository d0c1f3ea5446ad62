//! Quick actions and free-form questions composed into a single prompt.

use serde::{Deserialize, Serialize};

/// Predefined instruction prepended to page content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QuickAction {
    Proofread,
    Summarize,
    Rewrite,
    MakeList,
}

impl QuickAction {
    pub fn all() -> &'static [QuickAction] {
        &[Self::Proofread, Self::Summarize, Self::Rewrite, Self::MakeList]
    }

    pub fn instruction(&self) -> &'static str {
        match self {
            Self::Proofread => "Please proofread this text:",
            Self::Summarize => "Please summarize this text:",
            Self::Rewrite => "Please rewrite this text:",
            Self::MakeList => "Please convert this text into a bullet point list:",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Proofread => "proofread",
            Self::Summarize => "summarize",
            Self::Rewrite => "rewrite",
            Self::MakeList => "makeList",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|a| a.name() == name)
    }

    pub fn compose(&self, content: &str) -> String {
        format!("{} {}", self.instruction(), content)
    }
}

impl std::fmt::Display for QuickAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Prompt for a question asked about page content.
pub fn compose_question(content: &str, question: &str) -> String {
    format!("Context: {}\n\nQuestion: {}", content, question)
}
