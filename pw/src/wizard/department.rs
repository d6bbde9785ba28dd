//! Department Classifier
//!
//! Maps a request onto one of seven fixed departments. The model names a
//! department; anything that is not one of the seven is treated as an
//! unparseable answer and replaced by the AI Engineering fallback.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::{debug, info};

use super::WizardError;
use super::pipeline::{Confidence, run_classification};
use crate::llm::{Gateway, roles};

/// The closed set of departments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Department {
    Content,
    Solutions,
    DigitalMarketing,
    DigitalAnalytics,
    DigitalOperations,
    Martech,
    AiEngineering,
}

impl Department {
    /// All departments in display order
    pub const ALL: [Department; 7] = [
        Self::Content,
        Self::Solutions,
        Self::DigitalMarketing,
        Self::DigitalAnalytics,
        Self::DigitalOperations,
        Self::Martech,
        Self::AiEngineering,
    ];

    /// Display label, the form the model is asked to answer with
    pub fn label(&self) -> &'static str {
        match self {
            Self::Content => "Content",
            Self::Solutions => "Solutions",
            Self::DigitalMarketing => "Digital Marketing",
            Self::DigitalAnalytics => "Digital Analytics",
            Self::DigitalOperations => "Digital Operations",
            Self::Martech => "Martech",
            Self::AiEngineering => "AI Engineering",
        }
    }

    /// Stable lowercase identifier
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Content => "content",
            Self::Solutions => "solutions",
            Self::DigitalMarketing => "digital_marketing",
            Self::DigitalAnalytics => "digital_analytics",
            Self::DigitalOperations => "digital_operations",
            Self::Martech => "martech",
            Self::AiEngineering => "ai_engineering",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Content => "Content creation, writing, storytelling, editorial work, blog posts, articles",
            Self::Solutions => "Problem-solving, consulting, strategy development, business solutions",
            Self::DigitalMarketing => "Marketing campaigns, user acquisition, brand promotion, social media, advertising",
            Self::DigitalAnalytics => "Data analysis, insights, reporting, metrics, business intelligence, dashboards",
            Self::DigitalOperations => "Process optimization, operational efficiency, workflow automation, business processes",
            Self::Martech => "Marketing technology, tools, automation, CRM, marketing platforms",
            Self::AiEngineering => {
                "Machine learning, AI development, algorithms, data engineering, model development, technical projects"
            }
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Self::Content => "📝",
            Self::Solutions => "🔧",
            Self::DigitalMarketing => "📈",
            Self::DigitalAnalytics => "📊",
            Self::DigitalOperations => "⚙️",
            Self::Martech => "🛠️",
            Self::AiEngineering => "🤖",
        }
    }

    /// Expertise areas the department covers
    pub fn expertise(&self) -> &'static [&'static str] {
        match self {
            Self::Content => &[
                "Content strategy and planning",
                "SEO and content optimization",
                "Social media content creation",
                "Email marketing and newsletters",
                "Brand voice and messaging",
                "Content performance analytics",
            ],
            Self::Solutions => &[
                "Solution architecture design",
                "Business consulting",
                "Digital transformation",
                "Project management",
                "Technology implementation",
                "Strategic planning",
            ],
            Self::DigitalMarketing => &[
                "Campaign planning and execution",
                "SEO/SEM strategies",
                "Social media marketing",
                "Email marketing automation",
                "Lead generation and nurturing",
                "Marketing analytics and ROI",
            ],
            Self::DigitalAnalytics => &[
                "Data analysis and interpretation",
                "KPI tracking and reporting",
                "Performance optimization",
                "Business intelligence",
                "Statistical analysis",
                "Data visualization",
            ],
            Self::DigitalOperations => &[
                "Process optimization",
                "Workflow automation",
                "Operational efficiency",
                "Digital transformation",
                "Change management",
                "Performance monitoring",
            ],
            Self::Martech => &[
                "Marketing technology stack",
                "Platform integration",
                "Marketing automation",
                "Tool evaluation and selection",
                "Technology implementation",
                "System optimization",
            ],
            Self::AiEngineering => &[
                "Machine learning model development",
                "AI/ML pipeline design",
                "Model optimization and tuning",
                "AI system integration",
                "Data preprocessing",
                "MLOps and deployment",
            ],
        }
    }

    /// What the planner should prioritize asking for this department
    pub fn question_priorities(&self) -> &'static str {
        match self {
            Self::Content => "Target audience, content type, tone, distribution channels (skip if obvious)",
            Self::Solutions => "Problem scope, success metrics, constraints, stakeholders (skip if clear)",
            Self::DigitalMarketing => "Target audience, campaign goals, budget, channels (skip if mentioned)",
            Self::DigitalAnalytics => "Data sources, KPIs, stakeholders, reporting needs (skip if obvious)",
            Self::DigitalOperations => "Process scope, efficiency goals, tools, team size (skip if clear)",
            Self::Martech => "Technology needs, integration requirements, user adoption (skip if mentioned)",
            Self::AiEngineering => {
                "Project type, technical requirements, skill level, timeline, career goals (skip if clear)"
            }
        }
    }
}

impl std::fmt::Display for Department {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for Department {
    type Err = String;

    /// Accepts the label or slug in any case, with spaces, dashes or underscores
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .collect();

        Self::ALL
            .into_iter()
            .find(|d| d.slug().replace('_', "") == normalized)
            .ok_or_else(|| format!("Unknown department: '{}'", s))
    }
}

impl Serialize for Department {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Department {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// What the model inferred about the user and project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextAnalysis {
    pub primary_goal: String,
    pub skill_level: String,
    pub project_type: String,
    #[serde(deserialize_with = "lenient_string")]
    pub technical_focus: String,
}

impl Default for ContextAnalysis {
    fn default() -> Self {
        Self {
            primary_goal: "unknown".to_string(),
            skill_level: "unknown".to_string(),
            project_type: "unknown".to_string(),
            technical_focus: "unknown".to_string(),
        }
    }
}

// technical_focus comes back as "yes", true, or null depending on the model's mood
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Bool(true) => "yes".to_string(),
        serde_json::Value::Bool(false) => "no".to_string(),
        serde_json::Value::Null => "unknown".to_string(),
        other => other.to_string(),
    })
}

/// Result of department classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartmentInfo {
    pub department: Department,

    #[serde(default)]
    pub confidence: Confidence,

    #[serde(default, alias = "reasoning")]
    pub rationale: String,

    #[serde(default)]
    pub keywords_detected: Vec<String>,

    #[serde(default)]
    pub context_analysis: ContextAnalysis,
}

impl DepartmentInfo {
    /// AI Engineering at low confidence
    pub fn fallback() -> Self {
        debug!("DepartmentInfo::fallback: called");
        Self {
            department: Department::AiEngineering,
            confidence: Confidence::Low,
            rationale: "Could not parse department detection response".to_string(),
            keywords_detected: Vec::new(),
            context_analysis: ContextAnalysis::default(),
        }
    }
}

#[derive(Serialize)]
struct DepartmentEntry {
    number: usize,
    label: &'static str,
    description: &'static str,
    expertise: String,
}

#[derive(Serialize)]
struct DepartmentPrompt<'a> {
    request: &'a str,
    departments: Vec<DepartmentEntry>,
}

/// Classify `request` into one of the seven departments with one gateway call
///
/// Re-invoking with an enriched request yields a fresh result; callers
/// replace the previous classification, they never merge.
pub async fn classify_department(gateway: &Gateway, request: &str) -> Result<DepartmentInfo, WizardError> {
    debug!(request_len = request.len(), "classify_department: called");
    let context = DepartmentPrompt {
        request,
        departments: Department::ALL
            .iter()
            .enumerate()
            .map(|(i, d)| DepartmentEntry {
                number: i + 1,
                label: d.label(),
                description: d.description(),
                expertise: d.expertise().join(", "),
            })
            .collect(),
    };

    let info = run_classification(
        gateway,
        "department",
        &context,
        roles::DEPARTMENT_DETECTOR,
        DepartmentInfo::fallback(),
    )
    .await?;

    info!(department = %info.department, confidence = %info.confidence, "Department classified");
    Ok(info)
}
