use serde::{Deserialize, Serialize};

/// Input record for the cover-letter template.
///
/// Optional contact fields are kept as `null` when absent so the template still
/// recognises them and substitutes an empty string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverLetterData {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub homepage: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub github: Option<String>,
    #[serde(default)]
    pub linkedin: Option<String>,
    pub position: String,
    pub addressee: String,
    pub opening: String,
    pub about_me: String,
    pub why_me: String,
    pub why_company: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "first_name": "Ada",
        "last_name": "Lovelace",
        "email": "ada@example.com",
        "position": "Systems Engineer",
        "addressee": "Hiring Manager",
        "opening": "Dear Hiring Manager,",
        "about_me": "About",
        "why_me": "Why me",
        "why_company": "Why you"
    }"#;

    #[test]
    fn test_optional_contacts_default_to_none() {
        let data: CoverLetterData = serde_json::from_str(MINIMAL).unwrap();
        assert_eq!(data.first_name, "Ada");
        assert!(data.homepage.is_none());
        assert!(data.linkedin.is_none());
    }

    #[test]
    fn test_absent_optionals_serialize_as_null() {
        let data: CoverLetterData = serde_json::from_str(MINIMAL).unwrap();
        let value = serde_json::to_value(&data).unwrap();
        assert!(value.get("github").unwrap().is_null());
    }

    #[test]
    fn test_missing_required_field_is_rejected() {
        let result = serde_json::from_str::<CoverLetterData>(r#"{"first_name": "Ada"}"#);
        assert!(result.is_err());
    }
}
