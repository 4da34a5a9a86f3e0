//! Registry names of the built-in agents.

pub const CLIENT_ENGAGEMENT: &str = "strategic_client_engagement_agent";
pub const SITE_INTELLIGENCE: &str = "site_intelligence_regulatory_compliance_agent";
pub const ARCHITECTURAL_DESIGN: &str = "generative_architectural_design_agent";
pub const SYSTEMS_ENGINEERING: &str = "integrated_systems_engineering_agent";
pub const EXPERIENTIAL_DESIGN: &str = "interior_experiential_design_agent";
pub const DIGITAL_TWIN: &str = "hyper_realistic_3d_digital_twin_agent";
pub const COST_SUPPLY_CHAIN: &str = "predictive_cost_supply_chain_agent";
pub const SUSTAINABILITY: &str = "sustainability_green_building_agent";
pub const LEGAL_CONTRACT: &str = "legal_contract_management_agent";
pub const FACILITY_MANAGEMENT: &str = "post_construction_facility_management_agent";
pub const PROJECT_MANAGEMENT: &str = "adaptive_project_management_robotics_orchestration_agent";
pub const RISK_SAFETY: &str = "proactive_risk_safety_management_agent";
pub const QUALITY_ASSURANCE: &str = "ai_driven_quality_assurance_control_agent";
pub const WORKFORCE_HR: &str = "workforce_management_hr_agent";
pub const DATA_INTEGRATION: &str = "semantic_data_integration_ontology_agent";
pub const LEARNING_ADAPTATION: &str = "learning_adaptation_agent";
pub const PUBLIC_RELATIONS: &str = "public_relations_stakeholder_communication_agent";
pub const HUMAN_COLLABORATION: &str = "human_ai_collaboration_explainability_agent";

/// Every built-in agent, in registration order.
pub const ALL: [&str; 18] = [
    CLIENT_ENGAGEMENT,
    SITE_INTELLIGENCE,
    ARCHITECTURAL_DESIGN,
    SYSTEMS_ENGINEERING,
    EXPERIENTIAL_DESIGN,
    DIGITAL_TWIN,
    COST_SUPPLY_CHAIN,
    SUSTAINABILITY,
    LEGAL_CONTRACT,
    FACILITY_MANAGEMENT,
    PROJECT_MANAGEMENT,
    RISK_SAFETY,
    QUALITY_ASSURANCE,
    WORKFORCE_HR,
    DATA_INTEGRATION,
    LEARNING_ADAPTATION,
    PUBLIC_RELATIONS,
    HUMAN_COLLABORATION,
];
