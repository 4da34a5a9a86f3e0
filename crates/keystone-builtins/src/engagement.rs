//! Client-facing agents: requirement intake, public communication and the
//! final human-review summary.

use crate::names::{
    CLIENT_ENGAGEMENT, HUMAN_COLLABORATION, PROJECT_MANAGEMENT, PUBLIC_RELATIONS,
    QUALITY_ASSURANCE, RISK_SAFETY,
};
use crate::support::{ask_json, brief_json, json_instruction, upstream_block, JsonTask};
use async_trait::async_trait;
use keystone_agent::ModelClient;
use keystone_core::{AgentCapability, AgentContext, AgentError};
use serde_json::Value;
use std::sync::Arc;

const CLIENT_TASK: JsonTask = JsonTask {
    temperature: 0.2,
    required_keys: &[
        "parsed_requirements",
        "clarification_needed",
        "suggested_next_steps",
    ],
    status: "requirements_parsed",
};

/// Entry point of the workflow: turns the raw brief into structured
/// requirements and flags ambiguities.
pub struct ClientEngagementAgent {
    client: Arc<dyn ModelClient>,
}

impl ClientEngagementAgent {
    pub fn new(client: Arc<dyn ModelClient>) -> Self {
        Self { client }
    }

    fn prompt(ctx: &AgentContext) -> String {
        format!(
            "Analyze the following client inquiry for a construction project and extract key, \
             structured requirements. Be precise about 'project_type', 'client_name', \
             'budget_range', 'location' and 'desired_features'. Identify any ambiguities or \
             areas requiring clarification, and suggest immediate next steps for the project \
             lifecycle.\n\nClient Inquiry: {}{}",
            brief_json(ctx.input()),
            json_instruction(&CLIENT_TASK)
        )
    }
}

#[async_trait]
impl AgentCapability for ClientEngagementAgent {
    fn name(&self) -> &str {
        CLIENT_ENGAGEMENT
    }

    fn display_name(&self) -> &str {
        "Strategic Client Engagement Agent"
    }

    fn output_key(&self) -> &str {
        "client_requirements"
    }

    async fn execute(&self, ctx: &AgentContext) -> Result<Value, AgentError> {
        let map = ask_json(
            self.client.as_ref(),
            CLIENT_ENGAGEMENT,
            &Self::prompt(ctx),
            &CLIENT_TASK,
        )
        .await?;
        Ok(Value::Object(map))
    }
}

const PR_TASK: JsonTask = JsonTask {
    temperature: 0.5,
    required_keys: &[
        "communication_overview",
        "key_stakeholders",
        "communication_channels",
        "key_messages",
    ],
    status: "pr_strategy_drafted",
};

/// Drafts the stakeholder communication strategy from the brief alone.
pub struct PublicRelationsAgent {
    client: Arc<dyn ModelClient>,
}

impl PublicRelationsAgent {
    pub fn new(client: Arc<dyn ModelClient>) -> Self {
        Self { client }
    }

    fn prompt(ctx: &AgentContext) -> String {
        let input = ctx.input();
        format!(
            "As a public relations and stakeholder communication expert for a construction \
             project, outline a preliminary communication strategy for the '{}' project in \
             '{}', initiated by '{}'. Identify key stakeholder groups (local community, \
             government, media, investors), suggest communication channels (press releases, \
             community meetings, social media) and propose key messages for transparency and a \
             positive public image.{}",
            input.project_description,
            input.location,
            input.client_name,
            json_instruction(&PR_TASK)
        )
    }
}

#[async_trait]
impl AgentCapability for PublicRelationsAgent {
    fn name(&self) -> &str {
        PUBLIC_RELATIONS
    }

    fn display_name(&self) -> &str {
        "Public Relations & Stakeholder Communication Agent"
    }

    fn output_key(&self) -> &str {
        "public_relations_strategy"
    }

    async fn execute(&self, ctx: &AgentContext) -> Result<Value, AgentError> {
        let map = ask_json(
            self.client.as_ref(),
            PUBLIC_RELATIONS,
            &Self::prompt(ctx),
            &PR_TASK,
        )
        .await?;
        Ok(Value::Object(map))
    }
}

const HUMAN_TASK: JsonTask = JsonTask {
    temperature: 0.5,
    required_keys: &[
        "summary_for_human",
        "key_findings",
        "recommended_human_actions",
    ],
    status: "summary_for_human_review_prepared",
};

/// Condenses the plan, risk and quality outputs into a summary addressed to
/// the client, with the decisions a human has to take next.
pub struct HumanCollaborationAgent {
    client: Arc<dyn ModelClient>,
}

impl HumanCollaborationAgent {
    pub fn new(client: Arc<dyn ModelClient>) -> Self {
        Self { client }
    }

    fn prompt(ctx: &AgentContext) -> String {
        format!(
            "As an AI system liaison, prepare a concise summary for human review of a \
             construction project. Consolidate the key information from the master project \
             plan, the risk and safety assessment and the quality assurance plan. Explain the \
             key findings clearly and suggest next human actions (for example 'review and \
             approve'). Address it to '{}'. Any input marked upstream_unavailable could not be \
             produced; say so rather than guessing its content.\
             \n\nMaster Project Plan: {}\nRisk & Safety Assessment: {}\nQuality Assurance Plan: {}{}",
            ctx.input().client_name,
            upstream_block(ctx, PROJECT_MANAGEMENT),
            upstream_block(ctx, RISK_SAFETY),
            upstream_block(ctx, QUALITY_ASSURANCE),
            json_instruction(&HUMAN_TASK)
        )
    }
}

#[async_trait]
impl AgentCapability for HumanCollaborationAgent {
    fn name(&self) -> &str {
        HUMAN_COLLABORATION
    }

    fn display_name(&self) -> &str {
        "Human-AI Collaboration & Explainability Agent"
    }

    fn output_key(&self) -> &str {
        "human_collaboration_summary"
    }

    fn dependencies(&self) -> &[&'static str] {
        &[PROJECT_MANAGEMENT, RISK_SAFETY, QUALITY_ASSURANCE]
    }

    async fn execute(&self, ctx: &AgentContext) -> Result<Value, AgentError> {
        let map = ask_json(
            self.client.as_ref(),
            HUMAN_COLLABORATION,
            &Self::prompt(ctx),
            &HUMAN_TASK,
        )
        .await?;
        Ok(Value::Object(map))
    }
}
