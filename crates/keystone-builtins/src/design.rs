//! Design agents: architectural concept, engineering systems, interior and
//! landscape, and the rendered digital twin.

use crate::names::{
    ARCHITECTURAL_DESIGN, CLIENT_ENGAGEMENT, DIGITAL_TWIN, EXPERIENTIAL_DESIGN,
    SITE_INTELLIGENCE, SYSTEMS_ENGINEERING,
};
use crate::support::{ask_json, json_instruction, upstream_block, upstream_list, JsonTask};
use async_trait::async_trait;
use keystone_agent::{GenerationParams, ModelClient};
use keystone_core::{AgentCapability, AgentContext, AgentError};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::warn;

const ARCHITECTURE_TASK: JsonTask = JsonTask {
    temperature: 0.5,
    required_keys: &["design_summary", "key_elements", "considerations"],
    status: "concept_generated",
};

/// Architectural concept plus a conceptual sketch.
///
/// The sketch is best effort: if image generation fails the concept is still
/// returned, with `conceptual_render_base64` null and the reason in
/// `render_error`.
pub struct ArchitecturalDesignAgent {
    client: Arc<dyn ModelClient>,
}

impl ArchitecturalDesignAgent {
    pub fn new(client: Arc<dyn ModelClient>) -> Self {
        Self { client }
    }

    fn prompt(ctx: &AgentContext) -> String {
        let input = ctx.input();
        let max_height = ctx
            .dependency(SITE_INTELLIGENCE)
            .and_then(|site| site.pointer("/zoning_data/allowed_height_m"))
            .map_or_else(|| "N/A".to_string(), Value::to_string);
        format!(
            "Based on the following site feasibility report and client requirements, propose an \
             architectural concept for a '{}' project with desired features '{}', adhering to \
             zoning rules such as a maximum height of {max_height}m. Summarize the proposed \
             style, the key design elements and how the design addresses site constraints.\
             \n\nSite Report: {}\nClient Requirements: {}{}",
            input.project_type,
            input.desired_features.join(", "),
            upstream_block(ctx, SITE_INTELLIGENCE),
            upstream_block(ctx, CLIENT_ENGAGEMENT),
            json_instruction(&ARCHITECTURE_TASK)
        )
    }

    fn sketch_prompt(ctx: &AgentContext, design_summary: &str) -> String {
        let input = ctx.input();
        format!(
            "Architectural sketch of a {} in {} with features like {} and a {} style. Exterior \
             view, clear daylight, high detail, concept art.",
            input.project_type,
            input.location,
            input.desired_features.join(", "),
            design_summary
        )
    }
}

#[async_trait]
impl AgentCapability for ArchitecturalDesignAgent {
    fn name(&self) -> &str {
        ARCHITECTURAL_DESIGN
    }

    fn display_name(&self) -> &str {
        "Generative Architectural Design Agent"
    }

    fn output_key(&self) -> &str {
        "architectural_concept"
    }

    fn dependencies(&self) -> &[&'static str] {
        &[CLIENT_ENGAGEMENT, SITE_INTELLIGENCE]
    }

    async fn execute(&self, ctx: &AgentContext) -> Result<Value, AgentError> {
        let mut map = ask_json(
            self.client.as_ref(),
            ARCHITECTURAL_DESIGN,
            &Self::prompt(ctx),
            &ARCHITECTURE_TASK,
        )
        .await?;

        let summary = map
            .get("design_summary")
            .and_then(Value::as_str)
            .unwrap_or("contemporary");
        let sketch = Self::sketch_prompt(ctx, summary);
        match self
            .client
            .generate_image(&sketch, &GenerationParams::default())
            .await
        {
            Ok(image) => {
                map.insert("conceptual_render_base64".into(), Value::String(image));
            }
            Err(e) => {
                warn!(agent = ARCHITECTURAL_DESIGN, error = %e, "Conceptual render failed, continuing without it");
                map.insert("conceptual_render_base64".into(), Value::Null);
                map.insert("render_error".into(), Value::String(e.to_string()));
            }
        }
        Ok(Value::Object(map))
    }
}

const SYSTEMS_TASK: JsonTask = JsonTask {
    temperature: 0.4,
    required_keys: &["structural_notes", "mep_notes", "integration_challenges"],
    status: "system_design_drafted",
};

/// Preliminary structural and MEP recommendations.
pub struct SystemsEngineeringAgent {
    client: Arc<dyn ModelClient>,
}

impl SystemsEngineeringAgent {
    pub fn new(client: Arc<dyn ModelClient>) -> Self {
        Self { client }
    }

    fn prompt(ctx: &AgentContext) -> String {
        format!(
            "Given the architectural concept '{}' for a {} project and site conditions related to \
             '{}', propose preliminary structural considerations (foundation type, material \
             recommendations) and MEP (Mechanical, Electrical, Plumbing) system recommendations \
             (HVAC type, smart home integration, water efficiency). Highlight any potential \
             integration challenges.{}",
            ctx.upstream_str(ARCHITECTURAL_DESIGN, "design_summary", "not available"),
            ctx.input().project_type,
            site_risk(ctx),
            json_instruction(&SYSTEMS_TASK)
        )
    }
}

fn site_risk(ctx: &AgentContext) -> &str {
    ctx.dependency(SITE_INTELLIGENCE)
        .and_then(|site| site.pointer("/zoning_data/environmental_risk"))
        .and_then(Value::as_str)
        .unwrap_or_else(|| ctx.upstream_str(SITE_INTELLIGENCE, "summary", "unknown"))
}

#[async_trait]
impl AgentCapability for SystemsEngineeringAgent {
    fn name(&self) -> &str {
        SYSTEMS_ENGINEERING
    }

    fn display_name(&self) -> &str {
        "Integrated Systems Engineering Agent"
    }

    fn output_key(&self) -> &str {
        "system_design"
    }

    fn dependencies(&self) -> &[&'static str] {
        &[ARCHITECTURAL_DESIGN, SITE_INTELLIGENCE]
    }

    async fn execute(&self, ctx: &AgentContext) -> Result<Value, AgentError> {
        let map = ask_json(
            self.client.as_ref(),
            SYSTEMS_ENGINEERING,
            &Self::prompt(ctx),
            &SYSTEMS_TASK,
        )
        .await?;
        Ok(Value::Object(map))
    }
}

const EXPERIENTIAL_TASK: JsonTask = JsonTask {
    temperature: 0.6,
    required_keys: &["interior_style", "landscape_features", "material_palette_notes"],
    status: "experiential_design_drafted",
};

/// Interior and landscape design proposal.
pub struct ExperientialDesignAgent {
    client: Arc<dyn ModelClient>,
}

impl ExperientialDesignAgent {
    pub fn new(client: Arc<dyn ModelClient>) -> Self {
        Self { client }
    }

    fn prompt(ctx: &AgentContext) -> String {
        let input = ctx.input();
        format!(
            "Based on a '{}' project with architectural style '{}' and desired features '{}', \
             propose interior design elements (style, materials, key spaces) and landscape \
             design features (garden style, outdoor elements). Focus on enhancing user \
             experience and functionality. Key design elements: {}.{}",
            input.project_type,
            ctx.upstream_str(ARCHITECTURAL_DESIGN, "design_summary", "not available"),
            input.desired_features.join(", "),
            upstream_list(ctx, ARCHITECTURAL_DESIGN, "key_elements", "not available"),
            json_instruction(&EXPERIENTIAL_TASK)
        )
    }
}

#[async_trait]
impl AgentCapability for ExperientialDesignAgent {
    fn name(&self) -> &str {
        EXPERIENTIAL_DESIGN
    }

    fn display_name(&self) -> &str {
        "Interior Experiential Design Agent"
    }

    fn output_key(&self) -> &str {
        "experiential_design"
    }

    fn dependencies(&self) -> &[&'static str] {
        &[ARCHITECTURAL_DESIGN]
    }

    async fn execute(&self, ctx: &AgentContext) -> Result<Value, AgentError> {
        let map = ask_json(
            self.client.as_ref(),
            EXPERIENTIAL_DESIGN,
            &Self::prompt(ctx),
            &EXPERIENTIAL_TASK,
        )
        .await?;
        Ok(Value::Object(map))
    }
}

/// Exterior and interior photorealistic renders of the combined design.
///
/// The renders are this agent's whole output, so a failed render fails the
/// agent.
pub struct DigitalTwinAgent {
    client: Arc<dyn ModelClient>,
}

impl DigitalTwinAgent {
    pub fn new(client: Arc<dyn ModelClient>) -> Self {
        Self { client }
    }

    fn exterior_prompt(ctx: &AgentContext) -> String {
        format!(
            "Photorealistic 3D exterior render of a {} building at {} with a '{}' landscape. \
             Incorporate elements such as {}. High detail, natural lighting, daytime.",
            ctx.upstream_str(ARCHITECTURAL_DESIGN, "design_summary", "contemporary"),
            ctx.input().location,
            ctx.upstream_str(EXPERIENTIAL_DESIGN, "landscape_features", "simple garden"),
            upstream_list(ctx, ARCHITECTURAL_DESIGN, "key_elements", "clean lines"),
        )
    }

    fn interior_prompt(ctx: &AgentContext) -> String {
        format!(
            "Photorealistic 3D interior render of a {} building, with '{}' decor and materials \
             like '{}'. Warm lighting, cozy atmosphere, focus on a living area.",
            ctx.upstream_str(ARCHITECTURAL_DESIGN, "design_summary", "contemporary"),
            ctx.upstream_str(EXPERIENTIAL_DESIGN, "interior_style", "modern"),
            ctx.upstream_str(EXPERIENTIAL_DESIGN, "material_palette_notes", "natural materials"),
        )
    }
}

#[async_trait]
impl AgentCapability for DigitalTwinAgent {
    fn name(&self) -> &str {
        DIGITAL_TWIN
    }

    fn display_name(&self) -> &str {
        "Hyper-Realistic 3D Digital Twin Agent"
    }

    fn output_key(&self) -> &str {
        "digital_twin_output"
    }

    fn dependencies(&self) -> &[&'static str] {
        &[ARCHITECTURAL_DESIGN, EXPERIENTIAL_DESIGN, SITE_INTELLIGENCE]
    }

    async fn execute(&self, ctx: &AgentContext) -> Result<Value, AgentError> {
        let exterior_prompt = Self::exterior_prompt(ctx);
        let interior_prompt = Self::interior_prompt(ctx);
        let params = GenerationParams::default();

        let exterior = self.client.generate_image(&exterior_prompt, &params).await?;
        let interior = self.client.generate_image(&interior_prompt, &params).await?;

        Ok(json!({
            "status": "initial_twin_created",
            "exterior_render_base64": exterior,
            "interior_render_base64": interior,
            "generated_render_prompts": {
                "exterior": exterior_prompt,
                "interior": interior_prompt,
            },
        }))
    }
}
