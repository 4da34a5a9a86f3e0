use crate::error::{FieldViolation, ValidationError};
use serde::{Deserialize, Serialize};

/// A construction-project brief as submitted by a client.
///
/// Every field defaults to empty during deserialization so that missing
/// fields are reported by [`ProjectInput::normalized`] together with any
/// other problems, rather than as an opaque decode error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectInput {
    #[serde(default, alias = "projectType")]
    pub project_type: String,
    #[serde(default, alias = "clientName")]
    pub client_name: String,
    #[serde(default, alias = "budgetRange")]
    pub budget_range: String,
    #[serde(default)]
    pub location: String,
    #[serde(default, alias = "desiredFeatures")]
    pub desired_features: Vec<String>,
    #[serde(default, alias = "initialIdeasUrl")]
    pub initial_ideas_url: Option<String>,
    #[serde(default, alias = "projectDescription")]
    pub project_description: String,
    #[serde(default, alias = "projectSize")]
    pub project_size: String,
}

impl ProjectInput {
    /// Validate the brief and return its normalized form.
    ///
    /// String fields are trimmed, blank desired features are dropped and a
    /// blank `initial_ideas_url` becomes `None`. Every required field must be
    /// non-empty after trimming; `initial_ideas_url`, when present, must be an
    /// absolute `http` or `https` URL.
    pub fn normalized(self) -> Result<ProjectInput, ValidationError> {
        let mut violations = Vec::new();

        let mut required = |field: &str, value: String| -> String {
            let trimmed = value.trim().to_string();
            if trimmed.is_empty() {
                violations.push(FieldViolation {
                    field: field.to_string(),
                    reason: "must not be empty".to_string(),
                });
            }
            trimmed
        };

        let project_type = required("project_type", self.project_type);
        let client_name = required("client_name", self.client_name);
        let budget_range = required("budget_range", self.budget_range);
        let location = required("location", self.location);
        let project_description = required("project_description", self.project_description);
        let project_size = required("project_size", self.project_size);

        let desired_features = self
            .desired_features
            .into_iter()
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty())
            .collect();

        let initial_ideas_url = match self.initial_ideas_url.map(|u| u.trim().to_string()) {
            Some(raw) if raw.is_empty() => None,
            Some(raw) => {
                match url::Url::parse(&raw) {
                    Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
                    Ok(parsed) => violations.push(FieldViolation {
                        field: "initial_ideas_url".to_string(),
                        reason: format!("unsupported scheme '{}'", parsed.scheme()),
                    }),
                    Err(e) => violations.push(FieldViolation {
                        field: "initial_ideas_url".to_string(),
                        reason: format!("not a valid URL: {e}"),
                    }),
                }
                Some(raw)
            }
            None => None,
        };

        if !violations.is_empty() {
            return Err(ValidationError { violations });
        }

        Ok(ProjectInput {
            project_type,
            client_name,
            budget_range,
            location,
            desired_features,
            initial_ideas_url,
            project_description,
            project_size,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn brief() -> ProjectInput {
        ProjectInput {
            project_type: "Residential".into(),
            client_name: "Ada Builders".into(),
            budget_range: "$500k-$750k".into(),
            location: "London, UK".into(),
            desired_features: vec!["Smart Home Tech".into(), "Green Roof".into()],
            initial_ideas_url: None,
            project_description: "A three-bedroom family home".into(),
            project_size: "Medium".into(),
        }
    }

    #[test]
    fn blank_features_are_dropped() {
        let mut input = brief();
        input.desired_features = vec!["Smart Home Tech".into(), "".into(), "Green Roof".into()];
        let normalized = input.normalized().unwrap();
        assert_eq!(
            normalized.desired_features,
            vec!["Smart Home Tech".to_string(), "Green Roof".to_string()]
        );
    }

    #[test]
    fn features_are_trimmed() {
        let mut input = brief();
        input.desired_features = vec!["  Solar Panels ".into(), "   ".into()];
        let normalized = input.normalized().unwrap();
        assert_eq!(normalized.desired_features, vec!["Solar Panels".to_string()]);
    }

    #[test]
    fn empty_feature_list_is_allowed() {
        let mut input = brief();
        input.desired_features.clear();
        assert!(input.normalized().is_ok());
    }

    #[test]
    fn every_missing_field_is_reported() {
        let mut input = brief();
        input.client_name = "   ".into();
        input.location = String::new();
        let err = input.normalized().unwrap_err();
        assert_eq!(err.violations.len(), 2);
        assert!(err.has_field("client_name"));
        assert!(err.has_field("location"));
    }

    #[test]
    fn blank_url_becomes_none() {
        let mut input = brief();
        input.initial_ideas_url = Some("  ".into());
        assert_eq!(input.normalized().unwrap().initial_ideas_url, None);
    }

    #[test]
    fn url_must_be_http() {
        let mut input = brief();
        input.initial_ideas_url = Some("ftp://example.com/ideas.pdf".into());
        let err = input.normalized().unwrap_err();
        assert!(err.has_field("initial_ideas_url"));

        let mut input = brief();
        input.initial_ideas_url = Some("not a url".into());
        assert!(input.normalized().is_err());

        let mut input = brief();
        input.initial_ideas_url = Some("https://example.com/board".into());
        assert_eq!(
            input.normalized().unwrap().initial_ideas_url.as_deref(),
            Some("https://example.com/board")
        );
    }

    #[test]
    fn accepts_camel_case_aliases() {
        let json = serde_json::json!({
            "projectType": "Commercial",
            "clientName": "Acme",
            "budgetRange": "$1M+",
            "location": "New York, USA",
            "desiredFeatures": ["Rooftop Terrace"],
            "projectDescription": "Office block",
            "projectSize": "Large"
        });
        let input: ProjectInput = serde_json::from_value(json).unwrap();
        assert_eq!(input.client_name, "Acme");
        assert!(input.normalized().is_ok());
    }

    #[test]
    fn missing_fields_decode_then_fail_validation() {
        let input: ProjectInput =
            serde_json::from_value(serde_json::json!({ "client_name": "Acme" })).unwrap();
        let err = input.normalized().unwrap_err();
        assert_eq!(err.violations.len(), 5);
    }
}
