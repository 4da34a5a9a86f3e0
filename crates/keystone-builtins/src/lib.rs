//! Built-in construction-domain agents for Keystone.
//!
//! Eighteen analysis agents covering the project lifecycle, from client
//! intake through design, costing, delivery planning and a final
//! human-review summary. Each agent prompts a [`ModelClient`] for a strict
//! JSON object and validates the keys it needs.
//!
//! # Main entry points
//!
//! - [`register_builtins()`] — Register every built-in agent, in wave order.
//! - [`names`] — Registry names of the built-in agents.

/// Design evaluation agents (cost, sustainability, facility management).
pub mod analysis;
/// Delivery planning agents (master plan, risk, quality, workforce).
pub mod delivery;
/// Design agents (architecture, systems, interior, digital twin).
pub mod design;
/// Client-facing agents (intake, public relations, human-review summary).
pub mod engagement;
/// Cross-cutting knowledge agents (data integration, learning).
pub mod knowledge;
pub mod names;
/// Site feasibility and legal agents.
pub mod site;
/// Prompting and reply-parsing helpers shared by the agents.
pub mod support;

pub use analysis::{CostSupplyChainAgent, FacilityManagementAgent, SustainabilityAgent};
pub use delivery::{ProjectManagementAgent, QualityAssuranceAgent, RiskSafetyAgent, WorkforceAgent};
pub use design::{
    ArchitecturalDesignAgent, DigitalTwinAgent, ExperientialDesignAgent, SystemsEngineeringAgent,
};
pub use engagement::{ClientEngagementAgent, HumanCollaborationAgent, PublicRelationsAgent};
pub use knowledge::{DataIntegrationAgent, LearningAdaptationAgent};
pub use site::{site_profile, LegalContractAgent, SiteIntelligenceAgent, SiteProfile};

use keystone_agent::ModelClient;
use keystone_orchestrator::AgentRegistry;
use std::sync::Arc;

/// Register all built-in agents into the given registry, sharing one model
/// client.
pub fn register_builtins(registry: &mut AgentRegistry, client: Arc<dyn ModelClient>) {
    registry.register(Arc::new(ClientEngagementAgent::new(client.clone())));
    registry.register(Arc::new(SiteIntelligenceAgent::new(client.clone())));
    registry.register(Arc::new(ArchitecturalDesignAgent::new(client.clone())));
    registry.register(Arc::new(SystemsEngineeringAgent::new(client.clone())));
    registry.register(Arc::new(ExperientialDesignAgent::new(client.clone())));
    registry.register(Arc::new(DigitalTwinAgent::new(client.clone())));
    registry.register(Arc::new(CostSupplyChainAgent::new(client.clone())));
    registry.register(Arc::new(SustainabilityAgent::new(client.clone())));
    registry.register(Arc::new(LegalContractAgent::new(client.clone())));
    registry.register(Arc::new(FacilityManagementAgent::new(client.clone())));
    registry.register(Arc::new(ProjectManagementAgent::new(client.clone())));
    registry.register(Arc::new(RiskSafetyAgent::new(client.clone())));
    registry.register(Arc::new(QualityAssuranceAgent::new(client.clone())));
    registry.register(Arc::new(WorkforceAgent::new(client.clone())));
    registry.register(Arc::new(DataIntegrationAgent::new(client.clone())));
    registry.register(Arc::new(LearningAdaptationAgent::new(client.clone())));
    registry.register(Arc::new(PublicRelationsAgent::new(client.clone())));
    registry.register(Arc::new(HumanCollaborationAgent::new(client)));
}
