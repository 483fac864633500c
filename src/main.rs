//! Demo runner: drives one two-party amendment workflow end to end with
//! scripted capabilities, logging every committed transition.

use std::error::Error;
use std::sync::Arc;

use serde_json::json;
use tracing_subscriber::EnvFilter;

use accord::adapters::{
    InMemoryCaseRegistry, ScriptedDecisionProvider, ScriptedMediator, ScriptedMerger,
    ScriptedReviewer, TracingEventSink,
};
use accord::application::OrchestrationEngine;
use accord::config::AppConfig;
use accord::domain::case::{CaseDefinition, ChangeDelta, ChangeItem, ChangeSet, Party};
use accord::domain::foundation::{ContractRef, PartyId};
use accord::ports::PartyEvaluation;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load()?;
    config.validate()?;

    // The vendor pushes back once, then accepts the mediated compromise.
    let provider = Arc::new(ScriptedDecisionProvider::approving());
    provider.enqueue_evaluation(
        "vendor",
        PartyEvaluation::rejected(json!({"summary": "rate increase too steep"})),
    );

    let mediator = Arc::new(ScriptedMediator::new().with_default_delta(
        ChangeDelta::from_items(vec![ChangeItem::new(
            "hourly_rate",
            json!("USD 150"),
            json!("USD 165"),
        )]),
    ));

    let engine = OrchestrationEngine::from_config(
        &config,
        Arc::new(InMemoryCaseRegistry::new()),
        Arc::new(TracingEventSink::new()),
        provider,
        mediator,
        Arc::new(ScriptedReviewer::new()),
        Arc::new(ScriptedMerger::new()),
    );

    let definition = CaseDefinition {
        contract: ContractRef::new("contracts/msa-2026")?,
        changes: ChangeSet::from_items(vec![
            ChangeItem::new("hourly_rate", json!("USD 150"), json!("USD 180")),
            ChangeItem::new("payment_terms", json!("net 30"), json!("net 45")),
        ]),
        parties: vec![
            Party::new(
                PartyId::new("customer")?,
                "providers/customer",
                json!({"risk_tolerance": "medium"}),
            ),
            Party::new(
                PartyId::new("vendor")?,
                "providers/vendor",
                json!({"risk_tolerance": "low"}),
            ),
        ],
        deadline: None,
    };

    let case_id = engine.initiate(definition).await?;
    let state = engine.run(case_id).await?;

    let case = engine.status(case_id).await?;
    tracing::info!(
        case_id = %case_id,
        state = %state,
        rounds = case.round(),
        attempts = case.attempts().len(),
        artifact = ?case.artifact().map(|a| a.reference.clone()),
        "workflow finished"
    );

    Ok(())
}
