//! Belief revision loop: plan, execute, revise until success or budget exhaustion.

use std::time::Instant;

use chrono::Utc;
use construal_core::{
    derive_seed, Assignment, CatalogError, DeterministicRng, ItemIdx, Plan, ScoreWeights,
    SplitMix64,
};
use construal_planner::{CycleInputs, PlannerConfig};
use tracing::{debug, info};

use super::{EpisodeParams, EpisodePhase, EpisodeState};
use crate::actuator::{Actuator, Outcome};
use crate::context::EngineContext;
use crate::error::EpisodeError;
use crate::results::EpisodeRecord;

/// Seed stream for Plan Review tie-breaks.
pub const REVIEW_STREAM: u64 = 1;
/// Seed stream for the no-plan fallback location.
pub const FALLBACK_STREAM: u64 = 2;

/// Run one episode to termination and summarise it.
pub fn run_episode(
    context: &EngineContext,
    config: &PlannerConfig,
    params: &EpisodeParams,
    actuator: &mut dyn Actuator,
) -> Result<EpisodeRecord, EpisodeError> {
    if context.locations.named_len() == 0 {
        return Err(CatalogError::Invalid(format!(
            "location set {} has no named locations",
            context.set_id
        ))
        .into());
    }
    let target = context.resolve_target(&params.target)?;
    let planner = context.planner(config);
    let mut state = EpisodeState::new(context.initial_belief.clone(), target);
    let start_time = Utc::now();

    info!(
        episode_id = params.episode_id,
        target = %params.target,
        mode = %params.mode,
        set = %params.location_set,
        "episode start"
    );

    loop {
        state.phase = EpisodePhase::Planning;
        let planning = Instant::now();
        let cycle = u64::from(state.replan_count);
        state.replan_count += 1;

        let plans = planner.plan_cycle(&CycleInputs {
            belief: &state.belief,
            observations: &state.observations,
            possession: &state.possession,
            target,
            mode: params.mode,
            seed: derive_seed(params.seed, cycle, REVIEW_STREAM),
        })?;
        let converged = plans.first().is_some_and(Plan::is_converged);
        let selected: Vec<Plan> = if plans.is_empty() {
            state.no_plan_count += 1;
            let seed = derive_seed(params.seed, cycle, FALLBACK_STREAM);
            vec![fallback_plan(context, target, seed, &config.weights)]
        } else {
            plans
                .into_iter()
                .take(params.plans_per_replan.max(1))
                .collect()
        };
        state.plan_time += planning.elapsed();
        debug!(
            episode_id = params.episode_id,
            cycle,
            plans = selected.len(),
            score = selected[0].score(),
            converged,
            "cycle planned"
        );

        state.phase = EpisodePhase::Executing;
        let executing = Instant::now();
        let mut done = false;
        for plan in selected {
            let report = actuator.execute(&plan, &state)?;
            state.absorb(report);
            state.run_count += 1;
            state.last_plan = Some(plan);
            if state.is_success() || state.run_count >= params.max_runs {
                done = true;
                break;
            }
        }
        state.run_time += executing.elapsed();

        if done || (converged && params.stop_on_convergence) {
            break;
        }
        state.phase = EpisodePhase::ReviewingObservations;
        state.revise(&context.locations);
    }

    state.phase = EpisodePhase::Terminated;
    if !state.is_success() {
        state.outcome = Outcome::Failure;
    }
    let record = summarise(context, params, &state, start_time);
    info!(
        episode_id = params.episode_id,
        outcome = record.outcome,
        runs = record.run_count,
        replans = record.replan_count,
        "episode done"
    );
    Ok(record)
}

/// Single plan sending the target to a uniformly drawn named location.
pub fn fallback_plan(
    context: &EngineContext,
    target: ItemIdx,
    seed: u64,
    weights: &ScoreWeights,
) -> Plan {
    let named: Vec<_> = context.locations.named().collect();
    let loc = named[SplitMix64::new(seed).next_index(named.len())];
    let mut assignment = Assignment::empty(context.locations.len());
    assignment.assign(loc, target);
    Plan::new(assignment, 0, 0.0, weights)
}

fn summarise(
    context: &EngineContext,
    params: &EpisodeParams,
    state: &EpisodeState,
    start_time: chrono::DateTime<Utc>,
) -> EpisodeRecord {
    let plan_time = state.plan_time.as_secs_f64();
    let run_time = state.run_time.as_secs_f64();
    let final_plan = state
        .last_plan
        .as_ref()
        .map(|plan| {
            plan.to_named(&context.items, &context.locations)
                .visits()
                .cloned()
                .collect()
        })
        .unwrap_or_default();

    EpisodeRecord {
        sweep_id: None,
        episode_id: params.episode_id,
        target_item: params.target.clone(),
        abstraction_mode: params.mode,
        location_set: params.location_set.clone(),
        plans_per_replan: params.plans_per_replan,
        seed: params.seed,
        start_time,
        end_time: Utc::now(),
        plan_time,
        run_time,
        total_time: plan_time + run_time,
        actuator_time: state.stats.time,
        actuator_distance: state.stats.distance,
        observation_count: state.observations.present_count(),
        replan_count: state.replan_count,
        no_plan_count: state.no_plan_count,
        run_count: state.run_count,
        outcome: state.outcome.code(),
        outcome_name: state.outcome,
        final_plan,
    }
}
