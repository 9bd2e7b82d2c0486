//! Adaptive quiz sessions.
//!
//! The numeric kernels are stateless; a session's running state lives in
//! [`SessionState`], owned by the caller or kept in a [`SessionStore`].
//! [`AdaptiveTest`] drives one answer at a time:
//! online theta update, stopping rule, then next-item selection.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::estimation::{estimate_theta_with, standard_error_with, update_theta_online_with};
use crate::item::{AnswerEvent, Item, Response};
use crate::scoring::{AbilityBand, NormativeDistribution, ability_summary, iq_score};
use crate::selection::select_item;
use crate::stopping::StopReason;

/// Running state of one respondent's quiz.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    /// Online ability estimate.
    pub theta: f64,
    /// Ids of answered items.
    pub asked: HashSet<String>,
    /// Scored answers in the order given.
    pub answers: Vec<Response>,
    /// Set once the session has terminated.
    pub stop_reason: Option<StopReason>,
}

impl SessionState {
    pub fn is_finished(&self) -> bool {
        self.stop_reason.is_some()
    }

    pub fn correct_count(&self) -> usize {
        self.answers.iter().filter(|r| r.correct).count()
    }
}

/// Key-value storage for session state.
pub trait SessionStore: Send + Sync {
    fn get(&self, id: &str) -> Option<SessionState>;
    fn put(&self, id: &str, state: SessionState);
    fn delete(&self, id: &str) -> Option<SessionState>;
}

/// Process-local store. Distinct sessions never contend beyond the map lock.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, SessionState>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStore for InMemorySessionStore {
    fn get(&self, id: &str) -> Option<SessionState> {
        self.sessions
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(id)
            .cloned()
    }

    fn put(&self, id: &str, state: SessionState) {
        self.sessions
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id.to_string(), state);
    }

    fn delete(&self, id: &str) -> Option<SessionState> {
        self.sessions
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(id)
    }
}

/// Summary handed back to the caller when a session ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalReport {
    /// Maximum-likelihood theta re-fitted on the full history.
    pub theta: f64,
    /// Theta as tracked by the online updates.
    pub online_theta: f64,
    pub standard_error: Option<f64>,
    pub iq_score: f64,
    /// Present when a normative distribution is configured.
    pub percentile: Option<f64>,
    pub band: AbilityBand,
    pub items_answered: usize,
    pub correct: usize,
    pub stop_reason: Option<StopReason>,
}

/// Outcome of submitting one answer.
#[derive(Debug, Clone, PartialEq)]
pub enum Step<'a> {
    Next(&'a Item),
    Finished(FinalReport),
}

/// Session driver binding the engine configuration and norms.
#[derive(Debug, Clone, Default)]
pub struct AdaptiveTest {
    config: EngineConfig,
    norms: Option<NormativeDistribution>,
}

impl AdaptiveTest {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            norms: None,
        }
    }

    pub fn with_norms(mut self, norms: NormativeDistribution) -> Self {
        self.norms = Some(norms);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn norms(&self) -> Option<&NormativeDistribution> {
        self.norms.as_ref()
    }

    /// Fresh state at theta 0 and the first item to show.
    pub fn start<'a, R: Rng + ?Sized>(
        &self,
        pool: &'a [Item],
        rng: &mut R,
    ) -> (SessionState, Option<&'a Item>) {
        let state = SessionState::default();
        let first = self.next_item(&state, pool, rng);
        if first.is_none() {
            warn!("adaptive test started with an empty item pool");
        }
        (state, first)
    }

    /// Next item for the current state under the configured strategy.
    pub fn next_item<'a, R: Rng + ?Sized>(
        &self,
        state: &SessionState,
        pool: &'a [Item],
        rng: &mut R,
    ) -> Option<&'a Item> {
        let selection = &self.config.selection;
        select_item(
            selection.strategy,
            self.config.model,
            &selection.exposure,
            state.theta,
            &state.asked,
            pool,
            rng,
        )
    }

    /// Record one answer and decide what happens next.
    pub fn submit<'a, R: Rng + ?Sized>(
        &self,
        state: &mut SessionState,
        pool: &'a [Item],
        event: &AnswerEvent,
        rng: &mut R,
    ) -> Result<Step<'a>> {
        if state.is_finished() {
            return Err(EngineError::SessionFinished);
        }
        let item = pool
            .iter()
            .find(|item| item.id == event.item_id)
            .ok_or_else(|| EngineError::UnknownItem(event.item_id.clone()))?;
        if state.asked.contains(&item.id) {
            return Err(EngineError::AlreadyAnswered(item.id.clone()));
        }
        let response = item.score(event.selected_option)?;

        let model = self.config.model;
        let previous = state.theta;
        state.theta = update_theta_online_with(
            model,
            state.theta,
            &response,
            self.config.estimator.learning_rate,
        );
        state.asked.insert(item.id.clone());
        state.answers.push(response);

        debug!(
            item = %item.id,
            correct = response.correct,
            theta_before = previous,
            theta = state.theta,
            answered = state.answers.len(),
            "answer recorded"
        );

        if let Some(reason) = self
            .config
            .stopping
            .evaluate(model, state.theta, &state.answers)
        {
            return Ok(Step::Finished(self.stop(state, reason)));
        }

        match self.next_item(state, pool, rng) {
            Some(next) => Ok(Step::Next(next)),
            None => Ok(Step::Finished(self.stop(state, StopReason::PoolExhausted))),
        }
    }

    /// Load a session from `store`, submit the answer, and write it back.
    pub fn submit_to_store<'a, S, R>(
        &self,
        store: &S,
        session_id: &str,
        pool: &'a [Item],
        event: &AnswerEvent,
        rng: &mut R,
    ) -> Result<Step<'a>>
    where
        S: SessionStore + ?Sized,
        R: Rng + ?Sized,
    {
        let mut state = store
            .get(session_id)
            .ok_or_else(|| EngineError::SessionNotFound(session_id.to_string()))?;
        let step = self.submit(&mut state, pool, event, rng)?;
        store.put(session_id, state);
        Ok(step)
    }

    /// Final scores for a session, finished or not.
    pub fn finish(&self, state: &SessionState) -> FinalReport {
        let model = self.config.model;
        let theta = estimate_theta_with(model, &state.answers, self.config.estimator.iterations);
        let iq = iq_score(theta);

        FinalReport {
            theta,
            online_theta: state.theta,
            standard_error: standard_error_with(model, theta, &state.answers),
            iq_score: iq,
            percentile: self.norms.as_ref().map(|norms| norms.percentile(iq)),
            band: ability_summary(theta),
            items_answered: state.answers.len(),
            correct: state.correct_count(),
            stop_reason: state.stop_reason,
        }
    }

    fn stop(&self, state: &mut SessionState, reason: StopReason) -> FinalReport {
        state.stop_reason = Some(reason);
        let report = self.finish(state);
        info!(
            reason = ?reason,
            answered = report.items_answered,
            theta = report.theta,
            iq = report.iq_score,
            "adaptive test finished"
        );
        report
    }
}
