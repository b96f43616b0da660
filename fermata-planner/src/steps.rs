//! Planning steps wiring the mock providers into the fermata engine.

use crate::memory::MemoryService;
use crate::providers::{
    estimate_transport_emissions, search_green_venues, TransportEstimate, Venue,
};
use fermata_core::prelude::*;
use std::sync::Arc;

const DEFAULT_CITY: &str = "Bengaluru";
const DEFAULT_ATTENDEES: u32 = 20;

fn step_failure(ctx: &StepContext, step_name: &str, cause: impl ToString) -> FermataError {
    FermataError::StepFailure {
        task_id: ctx.task_id,
        step_id: ctx.step_id,
        step_name: step_name.to_string(),
        cause: cause.to_string(),
    }
}

/// Extract a string field from the event request, with a fallback.
fn request_str<'a>(input: &'a serde_json::Value, field: &str, fallback: &'a str) -> &'a str {
    input.get(field).and_then(|v| v.as_str()).unwrap_or(fallback)
}

/// Looks up the company event policy in long-term memory.
///
/// Passes the original request through alongside the found policy so
/// downstream steps keep access to the event details.
pub struct PolicyCheckStep {
    memory: Arc<dyn MemoryService>,
}

impl PolicyCheckStep {
    /// Create the step over a memory service.
    #[must_use]
    pub fn new(memory: Arc<dyn MemoryService>) -> Self {
        Self { memory }
    }
}

impl Step for PolicyCheckStep {
    fn name(&self) -> &str {
        "check_company_policy"
    }

    fn execute<'a>(&'a self, ctx: StepContext) -> StepFuture<'a> {
        Box::pin(async move {
            let policy = self
                .memory
                .search("catering policy")
                .unwrap_or_else(|| "No policy on record.".to_string());

            tracing::debug!(task_id = %ctx.task_id, policy = %policy, "Policy lookup");

            let mut out = match ctx.input {
                serde_json::Value::Object(map) => map,
                other => {
                    let mut map = serde_json::Map::new();
                    map.insert("request".to_string(), other);
                    map
                }
            };
            out.insert("policy".to_string(), serde_json::Value::String(policy));
            Ok(StepOutput::Complete(serde_json::Value::Object(out)))
        })
    }
}

/// Searches for green venues in the requested city.
pub struct VenueScoutStep;

impl Step for VenueScoutStep {
    fn name(&self) -> &str {
        "venue_scout"
    }

    fn execute<'a>(&'a self, ctx: StepContext) -> StepFuture<'a> {
        Box::pin(async move {
            let city = request_str(&ctx.input, "city", DEFAULT_CITY);
            let venues = search_green_venues(city);
            tracing::debug!(task_id = %ctx.task_id, city = %city, found = venues.len(), "Venue scout");
            StepOutput::complete(&venues).map_err(|e| step_failure(&ctx, "venue_scout", e))
        })
    }
}

/// Estimates attendee transport emissions to the event city.
pub struct TransportEstimateStep;

impl Step for TransportEstimateStep {
    fn name(&self) -> &str {
        "transport_estimate"
    }

    fn execute<'a>(&'a self, ctx: StepContext) -> StepFuture<'a> {
        Box::pin(async move {
            let origin = request_str(&ctx.input, "origin", DEFAULT_CITY);
            let destination = request_str(&ctx.input, "city", DEFAULT_CITY);
            let attendees = ctx
                .input
                .get("attendees")
                .and_then(|v| v.as_u64())
                .map_or(DEFAULT_ATTENDEES, |n| n as u32);

            let estimate = estimate_transport_emissions(origin, destination, attendees);
            tracing::debug!(
                task_id = %ctx.task_id,
                route = %estimate.route,
                kg = estimate.total_transport_emissions_kg,
                "Transport estimate"
            );
            StepOutput::complete(&estimate).map_err(|e| step_failure(&ctx, "transport_estimate", e))
        })
    }
}

/// Totals the footprint and recommends the best venue.
///
/// Prefers certified venues, picking the lowest baseline emissions among
/// them; the grand total adds the transport estimate on top.
pub struct AuditStep;

impl Step for AuditStep {
    fn name(&self) -> &str {
        "audit"
    }

    fn execute<'a>(&'a self, ctx: StepContext) -> StepFuture<'a> {
        Box::pin(async move {
            let venues: Vec<Venue> = serde_json::from_value(
                ctx.input
                    .get("venue_scout")
                    .cloned()
                    .unwrap_or(serde_json::Value::Null),
            )
            .map_err(|e| step_failure(&ctx, "audit", format!("missing venue data: {}", e)))?;

            let transport: TransportEstimate = serde_json::from_value(
                ctx.input
                    .get("transport_estimate")
                    .cloned()
                    .unwrap_or(serde_json::Value::Null),
            )
            .map_err(|e| step_failure(&ctx, "audit", format!("missing transport data: {}", e)))?;

            let lowest = |a: &&Venue, b: &&Venue| {
                a.base_emissions_kg
                    .partial_cmp(&b.base_emissions_kg)
                    .unwrap_or(std::cmp::Ordering::Equal)
            };
            // Prefer certified venues; fall back to the overall lowest.
            let recommended = venues
                .iter()
                .filter(|v| v.certification != "None")
                .min_by(lowest)
                .or_else(|| venues.iter().min_by(lowest))
                .ok_or_else(|| step_failure(&ctx, "audit", "no venues to audit"))?;

            let total = recommended.base_emissions_kg + transport.total_transport_emissions_kg;
            let summary = format!(
                "I have selected {} with {} kg emissions.",
                recommended.name, total
            );
            tracing::info!(task_id = %ctx.task_id, venue = %recommended.name, total_kg = total, "Audit complete");

            Ok(StepOutput::Complete(serde_json::json!({
                "recommended_venue": recommended.name,
                "venue": recommended,
                "transport": transport,
                "total_emissions_kg": total,
                "summary": summary,
            })))
        })
    }
}

/// Pauses the task for a human to approve or reject the proposed venue.
///
/// On first entry there is no decision, so the step emits a suspension
/// request carrying the proposal; once the task is resumed the step is
/// re-entered with the decision and produces its terminal status.
pub struct ConfirmVenueStep {
    correlation_id: Option<String>,
}

impl ConfirmVenueStep {
    /// Create the step with a generated correlation ID per suspension.
    #[must_use]
    pub fn new() -> Self {
        Self {
            correlation_id: None,
        }
    }

    /// Fix the correlation ID, useful when the approver is wired up
    /// out-of-band (and in tests).
    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }
}

impl Default for ConfirmVenueStep {
    fn default() -> Self {
        Self::new()
    }
}

impl Step for ConfirmVenueStep {
    fn name(&self) -> &str {
        "confirm_venue"
    }

    fn execute<'a>(&'a self, ctx: StepContext) -> StepFuture<'a> {
        Box::pin(async move {
            let venue = request_str(&ctx.input, "recommended_venue", "the proposed venue").to_string();
            let total = ctx
                .input
                .get("total_emissions_kg")
                .and_then(|v| v.as_f64())
                .unwrap_or(0.0);

            match ctx.decision {
                None => {
                    let request = match &self.correlation_id {
                        Some(id) => SuspensionRequest::new(id.clone()),
                        None => SuspensionRequest::generated(),
                    };
                    Ok(StepOutput::Suspend(
                        request
                            .with_hint(format!(
                                "Do you approve booking '{}' with a total footprint of {} kgCO2e?",
                                venue, total
                            ))
                            .with_payload(serde_json::json!({
                                "venue": venue,
                                "emissions": total,
                            })),
                    ))
                }
                Some(decision) if decision.confirmed() => {
                    Ok(StepOutput::Complete(serde_json::json!({
                        "status": "confirmed",
                        "venue": venue,
                        "total_emissions_kg": total,
                        "message": "Venue approved by human.",
                    })))
                }
                Some(_) => Ok(StepOutput::Complete(serde_json::json!({
                    "status": "rejected",
                    "venue": venue,
                    "message": "Venue rejected by human.",
                }))),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryMemoryService;

    fn ctx(input: serde_json::Value) -> StepContext {
        StepContext::new(TaskId::new(), StepId::new(0), input)
    }

    #[tokio::test]
    async fn policy_step_merges_request_and_policy() {
        let memory = Arc::new(InMemoryMemoryService::with_company_policy());
        let step = PolicyCheckStep::new(memory);

        let out = step
            .execute(ctx(serde_json::json!({"city": "Berlin"})))
            .await
            .unwrap();
        let StepOutput::Complete(value) = out else {
            panic!("expected completion");
        };
        assert_eq!(value["city"], "Berlin");
        assert!(value["policy"].as_str().unwrap().contains("Vegan"));
    }

    #[tokio::test]
    async fn audit_prefers_certified_low_emission_venue() {
        let input = serde_json::json!({
            "venue_scout": search_green_venues("Berlin"),
            "transport_estimate": estimate_transport_emissions("Munich", "Berlin", 25),
        });

        let out = AuditStep.execute(ctx(input)).await.unwrap();
        let StepOutput::Complete(value) = out else {
            panic!("expected completion");
        };
        assert_eq!(value["recommended_venue"], "EcoHub Loft");
        assert_eq!(value["total_emissions_kg"], 570.0);
        assert!(value["summary"].as_str().unwrap().contains("EcoHub Loft"));
    }

    #[tokio::test]
    async fn audit_fails_without_scouting_data() {
        let result = AuditStep.execute(ctx(serde_json::json!({}))).await;
        assert!(matches!(result, Err(FermataError::StepFailure { .. })));
    }

    #[tokio::test]
    async fn confirm_suspends_then_honors_the_decision() {
        let step = ConfirmVenueStep::new().with_correlation_id("venue-approval");
        let proposal = serde_json::json!({
            "recommended_venue": "EcoHub Loft",
            "total_emissions_kg": 570.0,
        });

        let out = step.execute(ctx(proposal.clone())).await.unwrap();
        let StepOutput::Suspend(request) = out else {
            panic!("expected suspension");
        };
        assert_eq!(request.correlation_id, "venue-approval");
        assert!(request.hint.contains("EcoHub Loft"));
        assert_eq!(request.payload["venue"], "EcoHub Loft");

        let resumed = ctx(proposal).with_decision(Decision::approve());
        let out = step.execute(resumed).await.unwrap();
        let StepOutput::Complete(value) = out else {
            panic!("expected completion");
        };
        assert_eq!(value["status"], "confirmed");
        assert_eq!(value["venue"], "EcoHub Loft");
    }
}
