//! Delivery planning agents: the master plan and the risk, quality and
//! workforce views derived from it.

use crate::names::{
    ARCHITECTURAL_DESIGN, COST_SUPPLY_CHAIN, PROJECT_MANAGEMENT, QUALITY_ASSURANCE, RISK_SAFETY,
    SITE_INTELLIGENCE, SYSTEMS_ENGINEERING, WORKFORCE_HR,
};
use crate::support::{ask_json, json_instruction, upstream_list, JsonTask};
use async_trait::async_trait;
use keystone_agent::ModelClient;
use keystone_core::{AgentCapability, AgentContext, AgentError};
use serde_json::Value;
use std::sync::Arc;

const PLAN_TASK: JsonTask = JsonTask {
    temperature: 0.4,
    required_keys: &[
        "budget_summary",
        "timeline_summary",
        "key_milestones_overview",
        "risks_identified",
        "next_steps",
    ],
    status: "master_plan_drafted",
};

/// Master project plan integrating cost, site and design outputs.
pub struct ProjectManagementAgent {
    client: Arc<dyn ModelClient>,
}

impl ProjectManagementAgent {
    pub fn new(client: Arc<dyn ModelClient>) -> Self {
        Self { client }
    }

    fn prompt(ctx: &AgentContext) -> String {
        let cost = ctx.dependency(COST_SUPPLY_CHAIN);
        let field = |name: &str| {
            cost.and_then(|c| c.get(name))
                .map_or_else(|| "N/A".to_string(), Value::to_string)
        };
        format!(
            "As a senior project manager for a construction project, synthesize a master project \
             plan for '{}'. Integrate the following information:\
             \n- Client Budget: {}\
             \n- Estimated Cost: {}\
             \n- Cost Breakdown: {}\
             \n- Procurement Strategy: {}\
             \n- Site Considerations: {}\
             \n- Architectural Style: {}\
             \n\nOutline the key phases with an overall timeline, the main milestones, \
             potential risks and the next steps for client approval.{}",
            ctx.input().project_description,
            ctx.input().budget_range,
            field("total_estimated_cost_usd"),
            field("cost_breakdown"),
            field("procurement_strategy"),
            ctx.upstream_str(SITE_INTELLIGENCE, "summary", "N/A"),
            ctx.upstream_str(ARCHITECTURAL_DESIGN, "design_summary", "N/A"),
            json_instruction(&PLAN_TASK)
        )
    }
}

#[async_trait]
impl AgentCapability for ProjectManagementAgent {
    fn name(&self) -> &str {
        PROJECT_MANAGEMENT
    }

    fn display_name(&self) -> &str {
        "Adaptive Project Management & Robotics Orchestration Agent"
    }

    fn output_key(&self) -> &str {
        "master_project_plan"
    }

    fn dependencies(&self) -> &[&'static str] {
        &[COST_SUPPLY_CHAIN, SITE_INTELLIGENCE, ARCHITECTURAL_DESIGN]
    }

    async fn execute(&self, ctx: &AgentContext) -> Result<Value, AgentError> {
        let map = ask_json(
            self.client.as_ref(),
            PROJECT_MANAGEMENT,
            &Self::prompt(ctx),
            &PLAN_TASK,
        )
        .await?;
        Ok(Value::Object(map))
    }
}

/// The plan's summary fields rendered for a downstream prompt.
fn plan_digest(ctx: &AgentContext) -> String {
    if ctx.is_unavailable(PROJECT_MANAGEMENT) {
        return "master plan unavailable".to_string();
    }
    format!(
        "{}; {}; milestones: {}",
        ctx.upstream_str(PROJECT_MANAGEMENT, "budget_summary", "budget not stated"),
        ctx.upstream_str(PROJECT_MANAGEMENT, "timeline_summary", "timeline not stated"),
        ctx.dependency(PROJECT_MANAGEMENT)
            .and_then(|p| p.get("key_milestones_overview"))
            .map_or_else(|| "not stated".to_string(), Value::to_string)
    )
}

const RISK_TASK: JsonTask = JsonTask {
    temperature: 0.5,
    required_keys: &[
        "identified_risks",
        "mitigation_strategies",
        "safety_highlights",
    ],
    status: "risk_safety_assessment_complete",
};

/// Financial, schedule, technical and safety risk assessment.
pub struct RiskSafetyAgent {
    client: Arc<dyn ModelClient>,
}

impl RiskSafetyAgent {
    pub fn new(client: Arc<dyn ModelClient>) -> Self {
        Self { client }
    }

    fn prompt(ctx: &AgentContext) -> String {
        let environmental = ctx
            .dependency(SITE_INTELLIGENCE)
            .and_then(|s| s.pointer("/zoning_data/environmental_risk"))
            .and_then(Value::as_str)
            .unwrap_or("not assessed");
        format!(
            "As a construction risk and safety manager, analyze the following project details \
             and identify potential risks (financial, schedule, technical, safety). Suggest \
             mitigation strategies for these risks.\
             \nProject Description: {}\
             \nMaster Plan Summary: {}\
             \nSite Environmental Risk: {environmental}\
             \nSite Compliance Challenges: {}{}",
            ctx.input().project_description,
            plan_digest(ctx),
            upstream_list(ctx, SITE_INTELLIGENCE, "compliance_challenges", "none reported"),
            json_instruction(&RISK_TASK)
        )
    }
}

#[async_trait]
impl AgentCapability for RiskSafetyAgent {
    fn name(&self) -> &str {
        RISK_SAFETY
    }

    fn display_name(&self) -> &str {
        "Proactive Risk & Safety Management Agent"
    }

    fn output_key(&self) -> &str {
        "risk_safety_assessment"
    }

    fn dependencies(&self) -> &[&'static str] {
        &[PROJECT_MANAGEMENT, SITE_INTELLIGENCE]
    }

    async fn execute(&self, ctx: &AgentContext) -> Result<Value, AgentError> {
        let map = ask_json(
            self.client.as_ref(),
            RISK_SAFETY,
            &Self::prompt(ctx),
            &RISK_TASK,
        )
        .await?;
        Ok(Value::Object(map))
    }
}

const QUALITY_TASK: JsonTask = JsonTask {
    temperature: 0.4,
    required_keys: &[
        "quality_standards",
        "inspection_checkpoints",
        "testing_protocols",
    ],
    status: "quality_plan_drafted",
};

/// Quality assurance and control plan keyed to the master plan's milestones.
pub struct QualityAssuranceAgent {
    client: Arc<dyn ModelClient>,
}

impl QualityAssuranceAgent {
    pub fn new(client: Arc<dyn ModelClient>) -> Self {
        Self { client }
    }

    fn prompt(ctx: &AgentContext) -> String {
        format!(
            "As a construction quality assurance and control lead, draft a quality plan for a \
             '{}' project. Align inspections with the master plan ({}) and the engineering \
             systems (structural: '{}'; MEP: '{}'). List the applicable quality standards, \
             inspection checkpoints per phase and testing protocols for materials and building \
             systems.{}",
            ctx.input().project_type,
            plan_digest(ctx),
            ctx.upstream_str(SYSTEMS_ENGINEERING, "structural_notes", "not available"),
            ctx.upstream_str(SYSTEMS_ENGINEERING, "mep_notes", "not available"),
            json_instruction(&QUALITY_TASK)
        )
    }
}

#[async_trait]
impl AgentCapability for QualityAssuranceAgent {
    fn name(&self) -> &str {
        QUALITY_ASSURANCE
    }

    fn display_name(&self) -> &str {
        "AI-Driven Quality Assurance & Control Agent"
    }

    fn output_key(&self) -> &str {
        "quality_assurance_plan"
    }

    fn dependencies(&self) -> &[&'static str] {
        &[PROJECT_MANAGEMENT, SYSTEMS_ENGINEERING]
    }

    async fn execute(&self, ctx: &AgentContext) -> Result<Value, AgentError> {
        let map = ask_json(
            self.client.as_ref(),
            QUALITY_ASSURANCE,
            &Self::prompt(ctx),
            &QUALITY_TASK,
        )
        .await?;
        Ok(Value::Object(map))
    }
}

const WORKFORCE_TASK: JsonTask = JsonTask {
    temperature: 0.5,
    required_keys: &[
        "workforce_needs",
        "hr_considerations",
        "labor_compliance_highlights",
    ],
    status: "workforce_hr_assessment_complete",
};

/// Trades, team size, HR and labor compliance needs.
pub struct WorkforceAgent {
    client: Arc<dyn ModelClient>,
}

impl WorkforceAgent {
    pub fn new(client: Arc<dyn ModelClient>) -> Self {
        Self { client }
    }

    fn prompt(ctx: &AgentContext) -> String {
        let input = ctx.input();
        format!(
            "As a construction workforce and HR manager, consider a '{}' project in '{}' with \
             the following timeline: {}. Outline the key workforce needs (required trades, \
             estimated team size), important HR considerations (recruitment challenges, training \
             needs, labor laws) and basic labor compliance aspects for this type of project.{}",
            input.project_size,
            input.location,
            ctx.upstream_str(PROJECT_MANAGEMENT, "timeline_summary", "not available"),
            json_instruction(&WORKFORCE_TASK)
        )
    }
}

#[async_trait]
impl AgentCapability for WorkforceAgent {
    fn name(&self) -> &str {
        WORKFORCE_HR
    }

    fn display_name(&self) -> &str {
        "Workforce Management & HR Agent"
    }

    fn output_key(&self) -> &str {
        "workforce_hr_analysis"
    }

    fn dependencies(&self) -> &[&'static str] {
        &[PROJECT_MANAGEMENT]
    }

    async fn execute(&self, ctx: &AgentContext) -> Result<Value, AgentError> {
        let map = ask_json(
            self.client.as_ref(),
            WORKFORCE_HR,
            &Self::prompt(ctx),
            &WORKFORCE_TASK,
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
    use keystone_core::{AgentErrorKind, UpstreamOutput};
    use serde_json::json;

    fn planned() -> AgentContext {
        context().with_upstream(
            PROJECT_MANAGEMENT,
            UpstreamOutput::Available {
                data: json!({
                    "budget_summary": "On budget at $1.5M",
                    "timeline_summary": "14 months",
                    "key_milestones_overview": ["Permits", "Foundations"]
                }),
            },
        )
    }

    #[tokio::test]
    async fn plan_overrides_model_status() {
        let client = Arc::new(ScriptedClient::replying(
            r#"{"status": "draft", "budget_summary": "b", "timeline_summary": "t",
                "key_milestones_overview": [], "risks_identified": [], "next_steps": []}"#,
        ));
        let ctx = context().with_upstream(
            COST_SUPPLY_CHAIN,
            UpstreamOutput::Available {
                data: json!({ "total_estimated_cost_usd": 1500000, "procurement_strategy": "design-build" }),
            },
        );
        let out = ProjectManagementAgent::new(client.clone())
            .execute(&ctx)
            .await
            .unwrap();

        assert_eq!(out["status"], "master_plan_drafted");
        let prompt = client.last_prompt();
        assert!(prompt.contains("Estimated Cost: 1500000"));
        assert!(prompt.contains("\"design-build\""));
        assert!(prompt.contains("Cost Breakdown: N/A"));
    }

    #[tokio::test]
    async fn risk_uses_plan_digest() {
        let client = Arc::new(ScriptedClient::replying(
            r#"{"identified_risks": [], "mitigation_strategies": [], "safety_highlights": []}"#,
        ));
        RiskSafetyAgent::new(client.clone())
            .execute(&planned())
            .await
            .unwrap();
        let prompt = client.last_prompt();
        assert!(prompt.contains("On budget at $1.5M; 14 months"));
        assert!(prompt.contains("Foundations"));
        assert!(prompt.contains("Site Environmental Risk: not assessed"));
    }

    #[tokio::test]
    async fn quality_plan_notes_missing_master_plan() {
        let client = Arc::new(ScriptedClient::replying(
            r#"{"quality_standards": [], "inspection_checkpoints": [], "testing_protocols": []}"#,
        ));
        let ctx = context().with_upstream(
            PROJECT_MANAGEMENT,
            UpstreamOutput::Unavailable {
                error_kind: AgentErrorKind::MalformedAgentOutput,
            },
        );
        let out = QualityAssuranceAgent::new(client.clone())
            .execute(&ctx)
            .await
            .unwrap();
        assert_eq!(out["status"], "quality_plan_drafted");
        assert!(client.last_prompt().contains("master plan unavailable"));
    }

    #[tokio::test]
    async fn workforce_reads_timeline() {
        let client = Arc::new(ScriptedClient::replying(
            r#"{"workforce_needs": [], "hr_considerations": [], "labor_compliance_highlights": []}"#,
        ));
        let out = WorkforceAgent::new(client.clone())
            .execute(&planned())
            .await
            .unwrap();
        assert_eq!(out["status"], "workforce_hr_assessment_complete");
        assert!(client.last_prompt().contains("timeline: 14 months"));
    }
}
