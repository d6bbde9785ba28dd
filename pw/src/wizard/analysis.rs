//! Keyword analysis of a request
//!
//! Deterministic, substring-based. Feeds the planner and synthesizer
//! instructions and the mentor's conversation context.

use serde::Serialize;
use tracing::debug;

use super::department::Department;

/// Coarse request flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ContextFlags {
    pub portfolio: bool,
    pub fresher: bool,
    pub data_engineering: bool,
    pub technical: bool,
}

impl ContextFlags {
    pub fn from_request(request: &str) -> Self {
        let lower = request.to_lowercase();
        let flags = Self {
            portfolio: lower.contains("portfolio"),
            fresher: ["fresher", "beginner", "entry"].iter().any(|w| lower.contains(w)),
            data_engineering: lower.contains("data engineering"),
            technical: ["project", "build", "create", "develop"].iter().any(|w| lower.contains(w)),
        };
        debug!(?flags, "ContextFlags::from_request: called");
        flags
    }
}

/// What is already known from the request and what will be assumed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RequestInsights {
    pub information_already_clear: Vec<String>,
    pub inferred_defaults: Vec<String>,
}

impl RequestInsights {
    pub fn derive(request: &str, department: Department, flags: &ContextFlags) -> Self {
        debug!(%department, "RequestInsights::derive: called");
        let lower = request.to_lowercase();
        let has = |words: &[&str]| words.iter().any(|w| lower.contains(w));

        let mut clear = Vec::new();
        if has(&["app", "application"]) {
            clear.push("App development project");
        }
        if has(&["campaign", "marketing"]) {
            clear.push("Marketing campaign");
        }
        if has(&["analyze", "data"]) {
            clear.push("Data analysis task");
        }
        if has(&["content", "blog", "article"]) {
            clear.push("Content creation");
        }
        if has(&["ai", "machine learning", "model"]) {
            clear.push("AI/ML development");
        }
        if flags.data_engineering {
            clear.push("Data engineering project");
        }
        if flags.portfolio {
            clear.push("Portfolio building for career development");
        }
        if flags.fresher {
            clear.push("Entry-level skill development");
        }

        let mut defaults: Vec<&str> = Vec::new();
        match department {
            Department::AiEngineering => {
                defaults.extend([
                    "Technical implementation approach",
                    "Industry-standard tools and technologies",
                    "Best practices for code quality and documentation",
                    "Performance and scalability considerations",
                ]);
                if flags.portfolio {
                    defaults.extend([
                        "Portfolio presentation and documentation",
                        "GitHub repository setup and management",
                        "README file with project overview",
                        "Technical skills demonstration for employers",
                    ]);
                }
                if flags.fresher {
                    defaults.extend([
                        "Learning objectives and skill development",
                        "Realistic timeline for entry-level developers",
                        "Common interview questions this project can help answer",
                        "Next steps for career advancement",
                    ]);
                }
            }
            Department::DigitalMarketing => defaults.extend([
                "Target audience: General consumers",
                "Channels: Social media and digital platforms",
                "Goal: Brand awareness and engagement",
            ]),
            Department::Content => defaults.extend([
                "Tone: Professional and engaging",
                "Format: Digital content",
                "Distribution: Online platforms",
            ]),
            _ => {}
        }

        Self {
            information_already_clear: clear.into_iter().map(String::from).collect(),
            inferred_defaults: defaults.into_iter().map(String::from).collect(),
        }
    }
}

/// Self-reported experience, as far as keywords tell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceLevel {
    Beginner,
    Intermediate,
    Advanced,
    Unknown,
}

impl std::fmt::Display for ExperienceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Beginner => write!(f, "beginner"),
            Self::Intermediate => write!(f, "intermediate"),
            Self::Advanced => write!(f, "advanced"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

// First match wins, so order matters
const PROJECT_TYPES: &[(&str, &str)] = &[
    ("website", "web development"),
    ("app", "application development"),
    ("data", "data analysis"),
    ("marketing", "marketing"),
    ("content", "content creation"),
    ("portfolio", "portfolio project"),
    ("optimization", "optimization project"),
];

/// Who the mentor is talking to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationContext {
    pub experience_level: ExperienceLevel,
    pub project_type: String,
}

impl ConversationContext {
    pub fn from_request(request: &str) -> Self {
        let lower = request.to_lowercase();
        let has = |words: &[&str]| words.iter().any(|w| lower.contains(w));

        let experience_level = if has(&["first", "beginner", "new", "start", "zero experience", "no experience"]) {
            ExperienceLevel::Beginner
        } else if has(&["intermediate", "some experience", "learning"]) {
            ExperienceLevel::Intermediate
        } else if has(&["expert", "advanced", "experienced"]) {
            ExperienceLevel::Advanced
        } else {
            ExperienceLevel::Unknown
        };

        let project_type = PROJECT_TYPES
            .iter()
            .find(|(keyword, _)| lower.contains(keyword))
            .map(|(_, project)| *project)
            .unwrap_or("general")
            .to_string();

        debug!(%experience_level, %project_type, "ConversationContext::from_request: called");
        Self {
            experience_level,
            project_type,
        }
    }

    /// Context block embedded in mentor instructions
    pub fn describe(&self, request: &str, intent: &str, confidence: &str) -> String {
        format!(
            "USER REQUEST: {}\nEXPERIENCE LEVEL: {}\nPROJECT TYPE: {}\nINTENT TYPE: {}\nCONFIDENCE: {}\nCONTEXT: User is seeking guidance for {} project as a {}",
            request,
            self.experience_level,
            self.project_type,
            intent,
            confidence,
            self.project_type,
            self.experience_level
        )
    }
}
