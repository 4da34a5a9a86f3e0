//! Design evaluation agents: cost and procurement, sustainability, and
//! long-term facility management.

use crate::names::{
    ARCHITECTURAL_DESIGN, COST_SUPPLY_CHAIN, EXPERIENTIAL_DESIGN, FACILITY_MANAGEMENT,
    SUSTAINABILITY, SYSTEMS_ENGINEERING,
};
use crate::support::{ask_json, json_instruction, JsonTask};
use async_trait::async_trait;
use keystone_agent::ModelClient;
use keystone_core::{AgentCapability, AgentContext, AgentError};
use serde_json::Value;
use std::sync::Arc;

const COST_TASK: JsonTask = JsonTask {
    temperature: 0.3,
    required_keys: &[
        "total_estimated_cost_usd",
        "cost_breakdown",
        "procurement_strategy",
    ],
    status: "cost_analysis_complete",
};

/// Cost breakdown and procurement strategy for the design.
pub struct CostSupplyChainAgent {
    client: Arc<dyn ModelClient>,
}

impl CostSupplyChainAgent {
    pub fn new(client: Arc<dyn ModelClient>) -> Self {
        Self { client }
    }

    fn prompt(ctx: &AgentContext) -> String {
        let input = ctx.input();
        format!(
            "As a construction cost estimator and supply chain analyst, provide a detailed cost \
             breakdown and preliminary procurement strategy for a '{}' project of '{}' size with \
             a client budget of '{}'. Consider the architectural concept ('{}'), the system \
             design notes ('{}', '{}') and the interior material palette ('{}'). Break costs \
             down into materials, labor, equipment, permits/fees and contingency. Suggest a \
             procurement strategy focused on efficiency and cost-effectiveness. \
             'total_estimated_cost_usd' must be a number and 'cost_breakdown' an object.{}",
            input.project_description,
            input.project_size,
            input.budget_range,
            ctx.upstream_str(ARCHITECTURAL_DESIGN, "design_summary", "not available"),
            ctx.upstream_str(SYSTEMS_ENGINEERING, "structural_notes", "not available"),
            ctx.upstream_str(SYSTEMS_ENGINEERING, "mep_notes", "not available"),
            ctx.upstream_str(EXPERIENTIAL_DESIGN, "material_palette_notes", "not available"),
            json_instruction(&COST_TASK)
        )
    }
}

#[async_trait]
impl AgentCapability for CostSupplyChainAgent {
    fn name(&self) -> &str {
        COST_SUPPLY_CHAIN
    }

    fn display_name(&self) -> &str {
        "Predictive Cost & Supply Chain Agent"
    }

    fn output_key(&self) -> &str {
        "cost_supply_chain_analysis"
    }

    fn dependencies(&self) -> &[&'static str] {
        &[ARCHITECTURAL_DESIGN, SYSTEMS_ENGINEERING, EXPERIENTIAL_DESIGN]
    }

    async fn execute(&self, ctx: &AgentContext) -> Result<Value, AgentError> {
        let map = ask_json(
            self.client.as_ref(),
            COST_SUPPLY_CHAIN,
            &Self::prompt(ctx),
            &COST_TASK,
        )
        .await?;
        Ok(Value::Object(map))
    }
}

const SUSTAINABILITY_TASK: JsonTask = JsonTask {
    temperature: 0.5,
    required_keys: &[
        "sustainability_potential",
        "green_strategies",
        "potential_certifications",
    ],
    status: "sustainability_assessment_complete",
};

/// Green building strategies and certification targets.
pub struct SustainabilityAgent {
    client: Arc<dyn ModelClient>,
}

impl SustainabilityAgent {
    pub fn new(client: Arc<dyn ModelClient>) -> Self {
        Self { client }
    }

    fn prompt(ctx: &AgentContext) -> String {
        format!(
            "As a sustainability and green building expert, evaluate the sustainability \
             potential of a project described as '{}' with architectural style '{}', structural \
             notes '{}', MEP notes '{}' and materials like '{}'. Suggest key green building \
             strategies (energy efficiency, water conservation, material sourcing) and the \
             certifications (LEED, BREEAM, Passive House) it could aim for.{}",
            ctx.input().project_description,
            ctx.upstream_str(ARCHITECTURAL_DESIGN, "design_summary", "not available"),
            ctx.upstream_str(SYSTEMS_ENGINEERING, "structural_notes", "not available"),
            ctx.upstream_str(SYSTEMS_ENGINEERING, "mep_notes", "not available"),
            ctx.upstream_str(EXPERIENTIAL_DESIGN, "material_palette_notes", "not available"),
            json_instruction(&SUSTAINABILITY_TASK)
        )
    }
}

#[async_trait]
impl AgentCapability for SustainabilityAgent {
    fn name(&self) -> &str {
        SUSTAINABILITY
    }

    fn display_name(&self) -> &str {
        "Sustainability & Green Building Agent"
    }

    fn output_key(&self) -> &str {
        "sustainability_analysis"
    }

    fn dependencies(&self) -> &[&'static str] {
        &[ARCHITECTURAL_DESIGN, SYSTEMS_ENGINEERING, EXPERIENTIAL_DESIGN]
    }

    async fn execute(&self, ctx: &AgentContext) -> Result<Value, AgentError> {
        let map = ask_json(
            self.client.as_ref(),
            SUSTAINABILITY,
            &Self::prompt(ctx),
            &SUSTAINABILITY_TASK,
        )
        .await?;
        Ok(Value::Object(map))
    }
}

const FACILITY_TASK: JsonTask = JsonTask {
    temperature: 0.5,
    required_keys: &[
        "fm_overview",
        "maintenance_requirements",
        "operational_challenges",
        "smart_building_tech_suggestions",
    ],
    status: "fm_assessment_complete",
};

/// Post-construction operation and maintenance outlook.
pub struct FacilityManagementAgent {
    client: Arc<dyn ModelClient>,
}

impl FacilityManagementAgent {
    pub fn new(client: Arc<dyn ModelClient>) -> Self {
        Self { client }
    }

    fn prompt(ctx: &AgentContext) -> String {
        let input = ctx.input();
        format!(
            "As a facility management expert, outline key post-construction and facility \
             management considerations for a '{}' project described as '{}'. Consider its \
             architectural style '{}' and system design elements such as '{}'. Suggest typical \
             maintenance requirements, potential operational challenges and smart building \
             technologies for long-term efficiency.{}",
            input.project_type,
            input.project_description,
            ctx.upstream_str(ARCHITECTURAL_DESIGN, "design_summary", "not available"),
            ctx.upstream_str(SYSTEMS_ENGINEERING, "mep_notes", "not available"),
            json_instruction(&FACILITY_TASK)
        )
    }
}

#[async_trait]
impl AgentCapability for FacilityManagementAgent {
    fn name(&self) -> &str {
        FACILITY_MANAGEMENT
    }

    fn display_name(&self) -> &str {
        "Post-Construction & Facility Management Agent"
    }

    fn output_key(&self) -> &str {
        "post_construction_fm_analysis"
    }

    fn dependencies(&self) -> &[&'static str] {
        &[ARCHITECTURAL_DESIGN, SYSTEMS_ENGINEERING]
    }

    async fn execute(&self, ctx: &AgentContext) -> Result<Value, AgentError> {
        let map = ask_json(
            self.client.as_ref(),
            FACILITY_MANAGEMENT,
            &Self::prompt(ctx),
            &FACILITY_TASK,
        )
        .await?;
        Ok(Value::Object(map))
    }
}
