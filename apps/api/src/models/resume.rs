use serde::{Deserialize, Serialize};

/// Structured résumé recovered from (or rendered into) Typst markup.
///
/// List order mirrors document order. Entities carry no identity beyond their position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeDocument {
    #[serde(default)]
    pub positions: Vec<String>,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub education: Vec<Entry>,
    #[serde(default)]
    pub work_experience: Vec<Entry>,
    #[serde(default)]
    pub projects: Vec<Entry>,
    #[serde(default)]
    pub skills: Vec<SkillCategory>,
    #[serde(default)]
    pub interests: Vec<Interest>,
}

/// One education, job or project line item.
///
/// `content` is only set when a body block directly follows the entry header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub location: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub date: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillCategory {
    pub name: String,
    #[serde(default)]
    pub skills: Vec<SkillItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillItem {
    pub name: String,
    /// Emphasised with `strong(...)` somewhere in the same category block.
    #[serde(default)]
    pub strong: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interest {
    pub category: String,
    pub description: String,
}

/// Résumé author. Optional contact fields are omitted when empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub homepage: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub phone: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub github: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub twitter: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub birth: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub linkedin: String,
}

/// Everything the résumé template sees: the author plus the document sections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeData {
    pub author: Author,
    #[serde(flatten)]
    pub document: ResumeDocument,
}
