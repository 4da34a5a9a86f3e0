//! Cross-cutting knowledge agents: data integration across the other
//! agents' outputs, and lessons learned for future projects.

use crate::names::{
    ARCHITECTURAL_DESIGN, CLIENT_ENGAGEMENT, COST_SUPPLY_CHAIN, DATA_INTEGRATION,
    EXPERIENTIAL_DESIGN, LEARNING_ADAPTATION, PROJECT_MANAGEMENT, SITE_INTELLIGENCE,
    SYSTEMS_ENGINEERING,
};
use crate::support::{ask_json, json_instruction, JsonTask};
use async_trait::async_trait;
use keystone_agent::ModelClient;
use keystone_core::{AgentCapability, AgentContext, AgentError, UpstreamOutput};
use serde_json::{Map, Value};
use std::sync::Arc;

const INTEGRATION_TASK: JsonTask = JsonTask {
    temperature: 0.3,
    required_keys: &[
        "data_domains",
        "integration_challenges",
        "suggested_ontologies",
    ],
    status: "data_integration_analysis_complete",
};

/// Reviews the shape of the data produced so far and proposes domains and
/// ontologies for interoperability.
pub struct DataIntegrationAgent {
    client: Arc<dyn ModelClient>,
}

impl DataIntegrationAgent {
    pub fn new(client: Arc<dyn ModelClient>) -> Self {
        Self { client }
    }

    /// Field names of each dependency's output; failed dependencies are
    /// listed with their error kind instead.
    fn schema_outline(ctx: &AgentContext) -> Value {
        let outline: Map<String, Value> = ctx
            .upstream()
            .iter()
            .map(|(agent, output)| {
                let entry = match output {
                    UpstreamOutput::Available { data } => Value::Array(
                        data.as_object()
                            .map(|o| o.keys().cloned().map(Value::String).collect())
                            .unwrap_or_default(),
                    ),
                    UpstreamOutput::Unavailable { error_kind } => serde_json::json!({
                        "upstream_unavailable": true,
                        "error_kind": error_kind,
                    }),
                };
                (agent.clone(), entry)
            })
            .collect();
        Value::Object(outline)
    }

    fn prompt(ctx: &AgentContext) -> String {
        format!(
            "As a semantic data integration and ontology expert for construction projects, \
             analyze the following data entities produced for the project of '{}' (field names \
             per producing agent): {}. Suggest key data domains (BIM, GIS, Cost, Schedule, HR), \
             potential data integration challenges, and relevant construction ontologies (IFC, \
             buildingSMART Data Dictionary, W3C BOT) for semantic interoperability.{}",
            ctx.input().client_name,
            serde_json::to_string_pretty(&Self::schema_outline(ctx)).unwrap_or_default(),
            json_instruction(&INTEGRATION_TASK)
        )
    }
}

#[async_trait]
impl AgentCapability for DataIntegrationAgent {
    fn name(&self) -> &str {
        DATA_INTEGRATION
    }

    fn display_name(&self) -> &str {
        "Semantic Data Integration & Ontology Agent"
    }

    fn output_key(&self) -> &str {
        "data_integration_analysis"
    }

    fn dependencies(&self) -> &[&'static str] {
        &[
            CLIENT_ENGAGEMENT,
            SITE_INTELLIGENCE,
            ARCHITECTURAL_DESIGN,
            SYSTEMS_ENGINEERING,
            EXPERIENTIAL_DESIGN,
            COST_SUPPLY_CHAIN,
            PROJECT_MANAGEMENT,
        ]
    }

    async fn execute(&self, ctx: &AgentContext) -> Result<Value, AgentError> {
        let map = ask_json(
            self.client.as_ref(),
            DATA_INTEGRATION,
            &Self::prompt(ctx),
            &INTEGRATION_TASK,
        )
        .await?;
        Ok(Value::Object(map))
    }
}

const LEARNING_TASK: JsonTask = JsonTask {
    temperature: 0.6,
    required_keys: &["lessons_learned", "adaptation_suggestions"],
    status: "learning_complete",
};

/// Lessons learned from comparable projects. Works from the brief alone.
pub struct LearningAdaptationAgent {
    client: Arc<dyn ModelClient>,
}

impl LearningAdaptationAgent {
    pub fn new(client: Arc<dyn ModelClient>) -> Self {
        Self { client }
    }

    fn prompt(ctx: &AgentContext) -> String {
        let input = ctx.input();
        format!(
            "Based on a '{}' project of '{}' size in '{}', what are common lessons learned or \
             areas for adaptation in similar construction projects? Suggest improvements for \
             efficiency, cost-effectiveness or quality for future projects.{}",
            input.project_description,
            input.project_size,
            input.location,
            json_instruction(&LEARNING_TASK)
        )
    }
}

#[async_trait]
impl AgentCapability for LearningAdaptationAgent {
    fn name(&self) -> &str {
        LEARNING_ADAPTATION
    }

    fn display_name(&self) -> &str {
        "Learning & Adaptation Agent"
    }

    fn output_key(&self) -> &str {
        "learning_adaptation_insights"
    }

    async fn execute(&self, ctx: &AgentContext) -> Result<Value, AgentError> {
        let map = ask_json(
            self.client.as_ref(),
            LEARNING_ADAPTATION,
            &Self::prompt(ctx),
            &LEARNING_TASK,
        )
        .await?;
        Ok(Value::Object(map))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::support::testing::{context, ScriptedClient};
    use keystone_core::AgentErrorKind;
    use serde_json::json;

    #[test]
    fn outline_lists_keys_and_failures() {
        let ctx = context()
            .with_upstream(
                SITE_INTELLIGENCE,
                UpstreamOutput::Available {
                    data: json!({ "summary": "x", "zoning_data": null }),
                },
            )
            .with_upstream(
                COST_SUPPLY_CHAIN,
                UpstreamOutput::Unavailable {
                    error_kind: AgentErrorKind::TransientServiceError,
                },
            );

        let outline = DataIntegrationAgent::schema_outline(&ctx);
        assert_eq!(outline[SITE_INTELLIGENCE], json!(["summary", "zoning_data"]));
        assert_eq!(
            outline[COST_SUPPLY_CHAIN]["error_kind"],
            "transient_service_error"
        );
    }

    #[tokio::test]
    async fn learning_runs_from_brief() {
        let client = Arc::new(ScriptedClient::replying(
            r#"{"lessons_learned": ["order long-lead items early"], "adaptation_suggestions": []}"#,
        ));
        let out = LearningAdaptationAgent::new(client.clone())
            .execute(&context())
            .await
            .unwrap();
        assert_eq!(out["status"], "learning_complete");
        assert!(client.last_prompt().contains("'3500 sq ft' size in 'London, UK'"));
        assert_eq!(*client.temperatures.lock().unwrap(), vec![Some(0.6)]);
    }
}
