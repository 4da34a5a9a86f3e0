//! Site feasibility, regulatory compliance and the legal/contract view that
//! builds on it.

use crate::names::{CLIENT_ENGAGEMENT, LEGAL_CONTRACT, SITE_INTELLIGENCE};
use crate::support::{ask_json, json_instruction, upstream_block, upstream_list, JsonTask};
use async_trait::async_trait;
use keystone_agent::ModelClient;
use keystone_core::{AgentCapability, AgentContext, AgentError};
use serde_json::{json, Value};
use std::sync::Arc;

/// Reference zoning limits for one project category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoningRule {
    pub allowed_height_m: u32,
    pub setback_front_m: u32,
    pub setback_sides_m: u32,
    pub setback_rear_m: u32,
}

/// Reference site data for a known location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SiteProfile {
    pub location: &'static str,
    pub residential: ZoningRule,
    pub commercial: ZoningRule,
    pub max_coverage_percent: u32,
    pub environmental_risk: &'static str,
    pub building_codes: &'static str,
}

const SITE_PROFILES: &[SiteProfile] = &[
    SiteProfile {
        location: "London, UK",
        residential: ZoningRule {
            allowed_height_m: 12,
            setback_front_m: 5,
            setback_sides_m: 3,
            setback_rear_m: 7,
        },
        commercial: ZoningRule {
            allowed_height_m: 20,
            setback_front_m: 3,
            setback_sides_m: 1,
            setback_rear_m: 5,
        },
        max_coverage_percent: 40,
        environmental_risk: "Low (potential for minor soil contamination near old industrial sites)",
        building_codes: "UK Building Regulations Part B (Fire Safety), Part M (Access to and use of buildings), Part L (Conservation of fuel and power)",
    },
    SiteProfile {
        location: "New York, USA",
        residential: ZoningRule {
            allowed_height_m: 150,
            setback_front_m: 0,
            setback_sides_m: 0,
            setback_rear_m: 0,
        },
        commercial: ZoningRule {
            allowed_height_m: 300,
            setback_front_m: 0,
            setback_sides_m: 0,
            setback_rear_m: 0,
        },
        max_coverage_percent: 100,
        environmental_risk: "Medium (urban heat island effect, historical underground infrastructure)",
        building_codes: "NYC Building Code, ADA Compliance",
    },
    SiteProfile {
        location: "Rural, California, USA",
        residential: ZoningRule {
            allowed_height_m: 10,
            setback_front_m: 10,
            setback_sides_m: 5,
            setback_rear_m: 10,
        },
        commercial: ZoningRule {
            allowed_height_m: 15,
            setback_front_m: 8,
            setback_sides_m: 4,
            setback_rear_m: 8,
        },
        max_coverage_percent: 25,
        environmental_risk: "High (wildfire risk, seismic activity, water scarcity, protected species habitats)",
        building_codes: "California Building Standards Code (Title 24), Wildland-Urban Interface (WUI) codes",
    },
];

/// Reference profile for `location`, matched case-insensitively.
pub fn site_profile(location: &str) -> Option<&'static SiteProfile> {
    let wanted = location.trim();
    SITE_PROFILES
        .iter()
        .find(|p| p.location.eq_ignore_ascii_case(wanted))
}

impl SiteProfile {
    /// Zoning rule for a free-form project type; commercial-like types use
    /// the commercial rule, everything else the residential one.
    pub fn rule_for(&self, project_type: &str) -> &ZoningRule {
        let lower = project_type.to_ascii_lowercase();
        if ["commercial", "office", "retail", "industrial"]
            .iter()
            .any(|k| lower.contains(k))
        {
            &self.commercial
        } else {
            &self.residential
        }
    }

    fn to_json(self, project_type: &str) -> Value {
        let rule = self.rule_for(project_type);
        json!({
            "location": self.location,
            "allowed_height_m": rule.allowed_height_m,
            "setbacks_m": {
                "front": rule.setback_front_m,
                "sides": rule.setback_sides_m,
                "rear": rule.setback_rear_m,
            },
            "max_coverage_percent": self.max_coverage_percent,
            "environmental_risk": self.environmental_risk,
            "common_building_codes": self.building_codes,
        })
    }
}

const SITE_TASK: JsonTask = JsonTask {
    temperature: 0.2,
    required_keys: &["summary", "compliance_challenges", "recommendations"],
    status: "initial_analysis_complete",
};

/// Site feasibility and regulatory compliance assessment.
///
/// Known locations are enriched with reference zoning data; for any other
/// location the model works from the brief alone and `zoning_data` is null.
pub struct SiteIntelligenceAgent {
    client: Arc<dyn ModelClient>,
}

impl SiteIntelligenceAgent {
    pub fn new(client: Arc<dyn ModelClient>) -> Self {
        Self { client }
    }

    fn prompt(ctx: &AgentContext, reference: &Value) -> String {
        let input = ctx.input();
        format!(
            "Given the following site information for a project located in '{}' of type '{}', \
             summarize the key regulatory constraints and primary environmental risks. Focus on \
             maximum height, setbacks and notable building code sections. Also identify any \
             potential compliance challenges given the client requirements.\
             \n\nReference Site Data: {}\nClient Requirements: {}{}",
            input.location,
            input.project_type,
            if reference.is_null() {
                "none available; rely on general knowledge of the location".to_string()
            } else {
                reference.to_string()
            },
            upstream_block(ctx, CLIENT_ENGAGEMENT),
            json_instruction(&SITE_TASK)
        )
    }
}

#[async_trait]
impl AgentCapability for SiteIntelligenceAgent {
    fn name(&self) -> &str {
        SITE_INTELLIGENCE
    }

    fn display_name(&self) -> &str {
        "Site Intelligence & Regulatory Compliance Agent"
    }

    fn output_key(&self) -> &str {
        "site_feasibility_report"
    }

    fn dependencies(&self) -> &[&'static str] {
        &[CLIENT_ENGAGEMENT]
    }

    async fn execute(&self, ctx: &AgentContext) -> Result<Value, AgentError> {
        let input = ctx.input();
        let reference = site_profile(&input.location)
            .map(|p| p.to_json(&input.project_type))
            .unwrap_or(Value::Null);

        let mut map = ask_json(
            self.client.as_ref(),
            SITE_INTELLIGENCE,
            &Self::prompt(ctx, &reference),
            &SITE_TASK,
        )
        .await?;
        map.insert("location".into(), json!(input.location));
        map.insert("project_type".into(), json!(input.project_type));
        map.insert("zoning_data".into(), reference);
        Ok(Value::Object(map))
    }
}

const LEGAL_TASK: JsonTask = JsonTask {
    temperature: 0.5,
    required_keys: &[
        "legal_overview",
        "common_contract_types",
        "key_contract_clauses",
        "required_permits_licenses",
    ],
    status: "legal_assessment_complete",
};

/// Legal considerations, contract types and permits for the project.
pub struct LegalContractAgent {
    client: Arc<dyn ModelClient>,
}

impl LegalContractAgent {
    pub fn new(client: Arc<dyn ModelClient>) -> Self {
        Self { client }
    }

    fn prompt(ctx: &AgentContext) -> String {
        let input = ctx.input();
        format!(
            "As a construction legal and contract management expert, outline key legal \
             considerations and common contract types for a '{}' project in '{}'. Consider the \
             regulatory summary from the site report: '{}' and the compliance challenges: {}. \
             Suggest important contract clauses and the permits or licenses required.{}",
            input.project_type,
            input.location,
            ctx.upstream_str(SITE_INTELLIGENCE, "summary", "not available"),
            upstream_list(ctx, SITE_INTELLIGENCE, "compliance_challenges", "none reported"),
            json_instruction(&LEGAL_TASK)
        )
    }
}

#[async_trait]
impl AgentCapability for LegalContractAgent {
    fn name(&self) -> &str {
        LEGAL_CONTRACT
    }

    fn display_name(&self) -> &str {
        "Legal & Contract Management Agent"
    }

    fn output_key(&self) -> &str {
        "legal_contract_analysis"
    }

    fn dependencies(&self) -> &[&'static str] {
        &[SITE_INTELLIGENCE]
    }

    async fn execute(&self, ctx: &AgentContext) -> Result<Value, AgentError> {
        let map = ask_json(
            self.client.as_ref(),
            LEGAL_CONTRACT,
            &Self::prompt(ctx),
            &LEGAL_TASK,
        )
        .await?;
        Ok(Value::Object(map))
    }
}
