//! ThinkService: the conversation loop and the single-turn session call.
//!
//! The loop is strictly sequential: every model call is awaited before the
//! next one starts, and the first failure ends the run. Pairs are handed to
//! the sink the moment they exist; what the sink does with them (buffer,
//! flush, frame) is the delivery strategy's business.

use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use simulon_types::config::{LoopSettings, PersonaMode};
use simulon_types::error::ThinkError;
use simulon_types::event::LoopEvent;
use simulon_types::llm::{LlmError, Message};
use simulon_types::session::SessionId;
use simulon_types::think::{GENERIC_FAILURE, QaPair, ThinkFrame};

use crate::delivery::FrameSink;
use crate::event::EventBus;
use crate::session::SessionStore;

use super::engine::ThinkEngine;

/// One loop request.
#[derive(Debug, Clone)]
pub struct ThinkJob {
    pub seed: String,
    pub session_id: Option<SessionId>,
    /// Replaces the stored history of the session (or seeds a session-less run).
    pub history_override: Option<Vec<Message>>,
    /// Insert the configured pacing delay between iterations.
    pub paced: bool,
}

/// One single-turn request.
#[derive(Debug, Clone, Default)]
pub struct TurnJob {
    pub session_id: Option<SessionId>,
    pub query: Option<String>,
    pub messages: Option<Vec<Message>>,
}

/// Validate a seed query. Returns the trimmed seed.
pub fn validate_seed(seed: &str) -> Result<&str, ThinkError> {
    let seed = seed.trim();
    if seed.is_empty() {
        return Err(ThinkError::EmptyQuery);
    }
    Ok(seed)
}

/// Runs conversation loops and single turns against one provider and one
/// session store.
pub struct ThinkService<S: SessionStore> {
    engine: ThinkEngine,
    sessions: S,
    events: EventBus,
    settings: LoopSettings,
}

impl<S: SessionStore> ThinkService<S> {
    pub fn new(engine: ThinkEngine, sessions: S, events: EventBus, settings: LoopSettings) -> Self {
        Self {
            engine,
            sessions,
            events,
            settings,
        }
    }

    pub fn settings(&self) -> &LoopSettings {
        &self.settings
    }

    pub fn sessions(&self) -> &S {
        &self.sessions
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Run the loop, emitting `Data` frames as pairs are produced and
    /// exactly one terminal frame at the end.
    ///
    /// A blank seed is rejected before any model call. A failed model call
    /// ends the run; pairs already emitted stay emitted.
    pub async fn run_loop<K: FrameSink>(
        &self,
        job: ThinkJob,
        sink: &mut K,
    ) -> Result<Vec<QaPair>, ThinkError> {
        let seed = match validate_seed(&job.seed) {
            Ok(seed) => seed.to_string(),
            Err(e) => {
                sink.emit(ThinkFrame::Error {
                    reason: e.to_string(),
                })
                .await;
                return Err(e);
            }
        };

        let run_id = Uuid::now_v7();
        let started = Instant::now();
        let max_rounds = self.settings.max_rounds;
        let persona_mode = self.settings.persona;
        let pacing = if job.paced {
            Duration::from_millis(self.settings.pacing_ms)
        } else {
            Duration::ZERO
        };

        info!(%run_id, session = ?job.session_id, max_rounds, "starting think loop");
        self.events.publish(LoopEvent::LoopStarted {
            run_id,
            session_id: job.session_id.clone(),
            max_rounds,
            at: Utc::now(),
        });

        let mut context = self.starting_history(&job).await;
        let mut opening = Vec::with_capacity(2);
        if persona_mode != PersonaMode::Off {
            match self.engine.derive_persona(&seed).await {
                Ok(persona) => {
                    self.publish_persona(run_id, 0, &persona);
                    opening.push(Message::system(persona));
                }
                Err(e) => return Err(self.fail(run_id, 0, e, sink).await),
            }
        }
        opening.push(Message::user(seed));
        self.record(job.session_id.as_ref(), &opening).await;
        context.extend(opening);

        let mut pairs = Vec::with_capacity(max_rounds as usize);
        let mut attached = true;

        for round in 1..=max_rounds {
            if round > 1 && !pacing.is_zero() {
                tokio::time::sleep(pacing).await;
            }

            let question = match self.engine.follow_up(&context).await {
                Ok(q) => q,
                Err(e) => return Err(self.fail(run_id, round, e, sink).await),
            };
            let answer = match self.engine.answer(&question).await {
                Ok(a) => a,
                Err(e) => return Err(self.fail(run_id, round, e, sink).await),
            };

            let pair = QaPair::new(question, answer);
            if !sink.emit(ThinkFrame::Data(pair.clone())).await && attached {
                attached = false;
                debug!(%run_id, round, "client detached, loop keeps running");
            }
            self.events.publish(LoopEvent::PairProduced {
                run_id,
                round,
                at: Utc::now(),
            });

            let turn = [Message::user(pair.q.clone()), Message::assistant(pair.a.clone())];
            self.record(job.session_id.as_ref(), &turn).await;
            context.extend(turn);
            pairs.push(pair);

            if persona_mode == PersonaMode::EveryRound && round < max_rounds {
                let latest = &pairs[pairs.len() - 1];
                match self.engine.refresh_persona(latest).await {
                    Ok(persona) => {
                        self.publish_persona(run_id, round, &persona);
                        let line = [Message::system(persona)];
                        self.record(job.session_id.as_ref(), &line).await;
                        context.extend(line);
                    }
                    Err(e) => return Err(self.fail(run_id, round, e, sink).await),
                }
            }
        }

        sink.emit(ThinkFrame::Done).await;
        let duration_ms = started.elapsed().as_millis() as u64;
        info!(%run_id, pairs = pairs.len(), duration_ms, "think loop finished");
        self.events.publish(LoopEvent::LoopFinished {
            run_id,
            pairs: pairs.len() as u32,
            duration_ms,
            at: Utc::now(),
        });

        Ok(pairs)
    }

    /// One model call on the session context.
    ///
    /// `messages`, when given, replace the stored history; `query`, when
    /// given, is appended as the newest user message. The reply is stored as
    /// an assistant message.
    pub async fn single_turn(&self, job: TurnJob) -> Result<String, ThinkError> {
        let query = job
            .query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_string);
        let has_override = job.messages.as_ref().is_some_and(|m| !m.is_empty());
        if query.is_none() && !has_override {
            return Err(ThinkError::EmptyQuery);
        }

        let (mut context, replace) = match job.messages {
            Some(messages) if !messages.is_empty() => (messages, true),
            _ => (self.load(job.session_id.as_ref()).await, false),
        };
        let mut fresh = Vec::with_capacity(2);
        if let Some(q) = query {
            fresh.push(Message::user(q));
        }
        context.extend(fresh.iter().cloned());

        let reply = self.engine.reply(context.clone()).await.map_err(|e| {
            error!(error = %e, "single-turn model call failed");
            ThinkError::Remote(e)
        })?;
        fresh.push(Message::assistant(reply.clone()));

        if let Some(id) = job.session_id.as_ref() {
            let stored = if replace {
                context.push(Message::assistant(reply.clone()));
                self.sessions.replace(id, context).await
            } else {
                self.sessions.append(id, &fresh).await
            };
            if let Err(e) = stored {
                warn!(session = %id, error = %e, "failed to store single-turn exchange");
            }
        }

        Ok(reply)
    }

    /// Stored history of a session.
    pub async fn history(&self, id: &SessionId) -> Vec<Message> {
        self.load(Some(id)).await
    }

    /// Drop a session. Returns whether it existed.
    pub async fn forget(&self, id: &SessionId) -> bool {
        match self.sessions.remove(id).await {
            Ok(existed) => existed,
            Err(e) => {
                warn!(session = %id, error = %e, "failed to remove session");
                false
            }
        }
    }

    async fn starting_history(&self, job: &ThinkJob) -> Vec<Message> {
        match (&job.history_override, &job.session_id) {
            (Some(messages), Some(id)) => {
                if let Err(e) = self.sessions.replace(id, messages.clone()).await {
                    warn!(session = %id, error = %e, "failed to replace session history");
                }
                messages.clone()
            }
            (Some(messages), None) => messages.clone(),
            (None, id) => self.load(id.as_ref()).await,
        }
    }

    async fn load(&self, id: Option<&SessionId>) -> Vec<Message> {
        let Some(id) = id else {
            return Vec::new();
        };
        match self.sessions.load(id).await {
            Ok(history) => history,
            Err(e) => {
                warn!(session = %id, error = %e, "failed to load session history");
                Vec::new()
            }
        }
    }

    async fn record(&self, id: Option<&SessionId>, messages: &[Message]) {
        let Some(id) = id else {
            return;
        };
        if let Err(e) = self.sessions.append(id, messages).await {
            warn!(session = %id, error = %e, "failed to append to session");
        }
    }

    fn publish_persona(&self, run_id: Uuid, round: u32, persona: &str) {
        self.events.publish(LoopEvent::PersonaDerived {
            run_id,
            round,
            persona: persona.to_string(),
            at: Utc::now(),
        });
    }

    async fn fail<K: FrameSink>(
        &self,
        run_id: Uuid,
        round: u32,
        err: LlmError,
        sink: &mut K,
    ) -> ThinkError {
        error!(%run_id, round, error = %err, "remote model call failed, aborting loop");
        sink.emit(ThinkFrame::Error {
            reason: GENERIC_FAILURE.to_string(),
        })
        .await;
        self.events.publish(LoopEvent::LoopFailed {
            run_id,
            round,
            error: err.to_string(),
            at: Utc::now(),
        });
        ThinkError::Remote(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::box_provider::BoxLlmProvider;
    use crate::llm::provider::LlmProvider;
    use crate::think::prompt::{ANSWER_INSTRUCTION, FOLLOW_UP_INSTRUCTION, PERSONA_COMPLETION};
    use simulon_types::config::ProviderSettings;
    use simulon_types::error::RepositoryError;
    use simulon_types::llm::{
        CompletionRequest, CompletionResponse, MessageRole, ProviderCapabilities, StopReason,
        Usage,
    };
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Call {
        Persona,
        FollowUp,
        Answer,
        Reply,
    }

    fn classify(request: &CompletionRequest) -> Call {
        let first = &request.messages[0];
        let last = &request.messages[request.messages.len() - 1];
        if last.content == FOLLOW_UP_INSTRUCTION {
            Call::FollowUp
        } else if first.role == MessageRole::System && first.content == ANSWER_INSTRUCTION {
            Call::Answer
        } else if first.content.contains(PERSONA_COMPLETION) {
            Call::Persona
        } else {
            Call::Reply
        }
    }

    /// Answers follow-ups with `Q{n}`, answers with `A{n}`, personas with a
    /// fixed line, and fails the n-th call of one kind when asked to.
    #[derive(Default)]
    struct Scripted {
        calls: Mutex<Vec<(Call, CompletionRequest)>>,
        fail_on: Option<(Call, usize)>,
    }

    impl Scripted {
        fn failing(call: Call, nth: usize) -> Self {
            Self {
                fail_on: Some((call, nth)),
                ..Self::default()
            }
        }

        fn count(&self, kind: Call) -> usize {
            self.calls.lock().unwrap().iter().filter(|(c, _)| *c == kind).count()
        }

        fn requests(&self, kind: Call) -> Vec<CompletionRequest> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|(c, _)| *c == kind)
                .map(|(_, r)| r.clone())
                .collect()
        }
    }

    struct Shared(Arc<Scripted>);

    static CAPS: ProviderCapabilities = ProviderCapabilities {
        max_context_tokens: 8_192,
        max_output_tokens: 1_024,
    };

    impl LlmProvider for Shared {
        fn name(&self) -> &str {
            "scripted"
        }

        fn capabilities(&self) -> &ProviderCapabilities {
            &CAPS
        }

        async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
            let kind = classify(request);
            let nth = {
                let mut calls = self.0.calls.lock().unwrap();
                calls.push((kind, request.clone()));
                calls.iter().filter(|(c, _)| *c == kind).count()
            };
            if self.0.fail_on == Some((kind, nth)) {
                return Err(LlmError::Provider {
                    message: "status 502".to_string(),
                });
            }
            let content = match kind {
                Call::Persona => "curious philosopher".to_string(),
                Call::FollowUp => format!("Q{nth}"),
                Call::Answer => format!("A{nth}"),
                Call::Reply => format!("R{nth}"),
            };
            Ok(CompletionResponse {
                id: format!("resp-{nth}"),
                content,
                model: request.model.clone(),
                stop_reason: StopReason::EndTurn,
                usage: Usage::default(),
            })
        }
    }

    #[derive(Default)]
    struct MapStore(Mutex<HashMap<SessionId, Vec<Message>>>);

    impl SessionStore for Arc<MapStore> {
        async fn load(&self, id: &SessionId) -> Result<Vec<Message>, RepositoryError> {
            Ok(self.0.lock().unwrap().get(id).cloned().unwrap_or_default())
        }

        async fn append(&self, id: &SessionId, messages: &[Message]) -> Result<(), RepositoryError> {
            self.0
                .lock()
                .unwrap()
                .entry(id.clone())
                .or_default()
                .extend_from_slice(messages);
            Ok(())
        }

        async fn replace(&self, id: &SessionId, messages: Vec<Message>) -> Result<(), RepositoryError> {
            self.0.lock().unwrap().insert(id.clone(), messages);
            Ok(())
        }

        async fn remove(&self, id: &SessionId) -> Result<bool, RepositoryError> {
            Ok(self.0.lock().unwrap().remove(id).is_some())
        }

        async fn purge_expired(&self) -> Result<usize, RepositoryError> {
            Ok(0)
        }
    }

    fn service_with(
        script: &Arc<Scripted>,
        settings: LoopSettings,
    ) -> (ThinkService<Arc<MapStore>>, Arc<MapStore>) {
        let provider = Arc::new(BoxLlmProvider::new(Shared(script.clone())));
        let engine = ThinkEngine::new(provider, &ProviderSettings::default());
        let store = Arc::new(MapStore::default());
        let service = ThinkService::new(engine, store.clone(), EventBus::new(64), settings);
        (service, store)
    }

    fn job(seed: &str) -> ThinkJob {
        ThinkJob {
            seed: seed.to_string(),
            session_id: None,
            history_override: None,
            paced: false,
        }
    }

    fn session(id: &str) -> SessionId {
        id.parse().unwrap()
    }

    #[tokio::test]
    async fn produces_ten_pairs_in_order_then_done() {
        let script = Arc::new(Scripted::default());
        let (service, _) = service_with(&script, LoopSettings::default());
        let mut frames: Vec<ThinkFrame> = Vec::new();

        let pairs = service
            .run_loop(job("What is consciousness?"), &mut frames)
            .await
            .unwrap();

        let expected: Vec<QaPair> = (1..=10)
            .map(|i| QaPair::new(format!("Q{i}"), format!("A{i}")))
            .collect();
        assert_eq!(pairs, expected);
        assert_eq!(frames.len(), 11);
        for (frame, pair) in frames.iter().zip(&expected) {
            assert_eq!(frame, &ThinkFrame::Data(pair.clone()));
        }
        assert_eq!(frames.last(), Some(&ThinkFrame::Done));
    }

    #[tokio::test]
    async fn blank_seed_never_calls_the_model() {
        let script = Arc::new(Scripted::default());
        let (service, _) = service_with(&script, LoopSettings::default());
        let mut frames: Vec<ThinkFrame> = Vec::new();

        let result = service.run_loop(job("   \n\t"), &mut frames).await;

        assert!(matches!(result, Err(ThinkError::EmptyQuery)));
        assert!(script.calls.lock().unwrap().is_empty());
        assert_eq!(frames.len(), 1);
        assert!(matches!(frames[0], ThinkFrame::Error { .. }));
    }

    #[tokio::test]
    async fn failure_on_round_k_keeps_earlier_pairs_and_stops() {
        let script = Arc::new(Scripted::failing(Call::FollowUp, 4));
        let (service, _) = service_with(&script, LoopSettings::default());
        let mut frames: Vec<ThinkFrame> = Vec::new();

        let result = service.run_loop(job("Why?"), &mut frames).await;

        assert!(matches!(result, Err(ThinkError::Remote(_))));
        assert_eq!(frames.len(), 4);
        for (i, frame) in frames[..3].iter().enumerate() {
            let n = i + 1;
            assert_eq!(frame, &ThinkFrame::Data(QaPair::new(format!("Q{n}"), format!("A{n}"))));
        }
        assert_eq!(
            frames[3],
            ThinkFrame::Error {
                reason: GENERIC_FAILURE.to_string()
            }
        );
        assert_eq!(script.count(Call::Answer), 3);
    }

    #[tokio::test]
    async fn failing_seed_persona_produces_no_pairs() {
        let script = Arc::new(Scripted::failing(Call::Persona, 1));
        let (service, _) = service_with(&script, LoopSettings::default());
        let mut frames: Vec<ThinkFrame> = Vec::new();

        assert!(service.run_loop(job("Why?"), &mut frames).await.is_err());
        assert_eq!(frames.len(), 1);
        assert_eq!(script.count(Call::FollowUp), 0);
    }

    #[tokio::test]
    async fn persona_off_skips_persona_calls() {
        let script = Arc::new(Scripted::default());
        let settings = LoopSettings {
            max_rounds: 2,
            persona: PersonaMode::Off,
            ..LoopSettings::default()
        };
        let (service, _) = service_with(&script, settings);
        let mut frames: Vec<ThinkFrame> = Vec::new();

        service.run_loop(job("Why rain?"), &mut frames).await.unwrap();

        assert_eq!(script.count(Call::Persona), 0);
        let first = &script.requests(Call::FollowUp)[0];
        assert_eq!(
            first.messages,
            vec![Message::user("Why rain?"), Message::user(FOLLOW_UP_INSTRUCTION)]
        );
    }

    #[tokio::test]
    async fn persona_once_prefixes_context_without_refreshing() {
        let script = Arc::new(Scripted::default());
        let settings = LoopSettings {
            max_rounds: 3,
            persona: PersonaMode::Once,
            ..LoopSettings::default()
        };
        let (service, _) = service_with(&script, settings);
        let mut frames: Vec<ThinkFrame> = Vec::new();

        service.run_loop(job("Why rain?"), &mut frames).await.unwrap();

        assert_eq!(script.count(Call::Persona), 1);
        let first = &script.requests(Call::FollowUp)[0];
        assert_eq!(first.messages[0], Message::system("You are a curious philosopher"));
        assert_eq!(first.messages[1], Message::user("Why rain?"));
    }

    #[tokio::test]
    async fn every_round_persona_becomes_newest_system_message() {
        let script = Arc::new(Scripted::default());
        let settings = LoopSettings {
            max_rounds: 3,
            persona: PersonaMode::EveryRound,
            ..LoopSettings::default()
        };
        let (service, _) = service_with(&script, settings);
        let mut frames: Vec<ThinkFrame> = Vec::new();

        service.run_loop(job("Why rain?"), &mut frames).await.unwrap();

        // Seed persona plus one refresh between each pair of rounds.
        assert_eq!(script.count(Call::Persona), 3);
        let second = &script.requests(Call::FollowUp)[1];
        let n = second.messages.len();
        assert_eq!(second.messages[n - 4], Message::user("Q1"));
        assert_eq!(second.messages[n - 3], Message::assistant("A1"));
        assert_eq!(second.messages[n - 2], Message::system("You are a curious philosopher"));
        assert_eq!(second.messages[n - 1], Message::user(FOLLOW_UP_INSTRUCTION));
    }

    #[tokio::test]
    async fn answer_prompt_is_independent_of_context() {
        let script = Arc::new(Scripted::default());
        let settings = LoopSettings {
            max_rounds: 2,
            ..LoopSettings::default()
        };
        let (service, _) = service_with(&script, settings);
        let mut frames: Vec<ThinkFrame> = Vec::new();

        service.run_loop(job("Why rain?"), &mut frames).await.unwrap();

        for (i, request) in script.requests(Call::Answer).iter().enumerate() {
            assert_eq!(
                request.messages,
                vec![Message::system(ANSWER_INSTRUCTION), Message::user(format!("Q{}", i + 1))]
            );
        }
    }

    #[tokio::test]
    async fn same_session_sees_prior_turns_in_order() {
        let script = Arc::new(Scripted::default());
        let settings = LoopSettings {
            max_rounds: 2,
            persona: PersonaMode::Off,
            ..LoopSettings::default()
        };
        let (service, store) = service_with(&script, settings);
        let id = session("tab-1");

        let mut frames: Vec<ThinkFrame> = Vec::new();
        let first_job = ThinkJob {
            session_id: Some(id.clone()),
            ..job("First seed")
        };
        service.run_loop(first_job, &mut frames).await.unwrap();

        let after_first = store.load(&id).await.unwrap();
        assert_eq!(
            after_first,
            vec![
                Message::user("First seed"),
                Message::user("Q1"),
                Message::assistant("A1"),
                Message::user("Q2"),
                Message::assistant("A2"),
            ]
        );

        let second_job = ThinkJob {
            session_id: Some(id.clone()),
            ..job("Second seed")
        };
        service.run_loop(second_job, &mut frames).await.unwrap();

        let third_follow_up = &script.requests(Call::FollowUp)[2];
        assert!(third_follow_up.messages.starts_with(&after_first));
        assert_eq!(third_follow_up.messages[after_first.len()], Message::user("Second seed"));
    }

    #[tokio::test]
    async fn history_override_replaces_stored_session() {
        let script = Arc::new(Scripted::default());
        let settings = LoopSettings {
            max_rounds: 1,
            persona: PersonaMode::Off,
            ..LoopSettings::default()
        };
        let (service, store) = service_with(&script, settings);
        let id = session("tab-2");
        store.append(&id, &[Message::user("stale")]).await.unwrap();

        let override_job = ThinkJob {
            session_id: Some(id.clone()),
            history_override: Some(vec![Message::system("You are a pirate.")]),
            ..job("Ahoy?")
        };
        let mut frames: Vec<ThinkFrame> = Vec::new();
        service.run_loop(override_job, &mut frames).await.unwrap();

        let stored = store.load(&id).await.unwrap();
        assert_eq!(stored[0], Message::system("You are a pirate."));
        assert!(!stored.contains(&Message::user("stale")));
    }

    #[tokio::test(start_paused = true)]
    async fn paced_runs_wait_between_iterations_only() {
        let script = Arc::new(Scripted::default());
        let settings = LoopSettings {
            max_rounds: 3,
            pacing_ms: 1000,
            persona: PersonaMode::Off,
            ..LoopSettings::default()
        };
        let (service, _) = service_with(&script, settings);
        let mut frames: Vec<ThinkFrame> = Vec::new();

        let start = tokio::time::Instant::now();
        let paced = ThinkJob {
            paced: true,
            ..job("Why?")
        };
        service.run_loop(paced, &mut frames).await.unwrap();
        let elapsed = start.elapsed();

        assert!(elapsed >= Duration::from_millis(2000));
        assert!(elapsed < Duration::from_millis(3000));
    }

    #[tokio::test]
    async fn detached_receiver_does_not_stop_the_loop() {
        let script = Arc::new(Scripted::default());
        let (service, _) = service_with(&script, LoopSettings::default());
        let (mut tx, rx) = crate::delivery::frame_channel(10);
        drop(rx);

        let pairs = service.run_loop(job("Why?"), &mut tx).await.unwrap();
        assert_eq!(pairs.len(), 10);
        assert_eq!(script.count(Call::Answer), 10);
    }

    #[tokio::test]
    async fn loop_reports_events_in_order() {
        let script = Arc::new(Scripted::default());
        let settings = LoopSettings {
            max_rounds: 2,
            persona: PersonaMode::Once,
            ..LoopSettings::default()
        };
        let (service, _) = service_with(&script, settings);
        let mut rx = service.events().subscribe();
        let mut frames: Vec<ThinkFrame> = Vec::new();

        service.run_loop(job("Why?"), &mut frames).await.unwrap();

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        assert!(matches!(events[0], LoopEvent::LoopStarted { max_rounds: 2, .. }));
        assert!(matches!(&events[1], LoopEvent::PersonaDerived { round: 0, persona, .. } if persona == "You are a curious philosopher"));
        assert!(matches!(events[2], LoopEvent::PairProduced { round: 1, .. }));
        assert!(matches!(events[3], LoopEvent::PairProduced { round: 2, .. }));
        assert!(matches!(events[4], LoopEvent::LoopFinished { pairs: 2, .. }));
        let run_id = events[0].run_id();
        assert!(events.iter().all(|e| e.run_id() == run_id));
    }

    #[tokio::test]
    async fn single_turn_appends_to_session() {
        let script = Arc::new(Scripted::default());
        let (service, store) = service_with(&script, LoopSettings::default());
        let id = session("chat-1");

        let first = service
            .single_turn(TurnJob {
                session_id: Some(id.clone()),
                query: Some("Hello".to_string()),
                messages: None,
            })
            .await
            .unwrap();
        assert_eq!(first, "R1");

        service
            .single_turn(TurnJob {
                session_id: Some(id.clone()),
                query: Some("And then?".to_string()),
                messages: None,
            })
            .await
            .unwrap();

        let second_request = &script.requests(Call::Reply)[1];
        assert_eq!(
            second_request.messages,
            vec![
                Message::user("Hello"),
                Message::assistant("R1"),
                Message::user("And then?"),
            ]
        );
        assert_eq!(store.load(&id).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn single_turn_messages_override_history() {
        let script = Arc::new(Scripted::default());
        let (service, store) = service_with(&script, LoopSettings::default());
        let id = session("chat-2");
        store.append(&id, &[Message::user("old")]).await.unwrap();

        service
            .single_turn(TurnJob {
                session_id: Some(id.clone()),
                query: None,
                messages: Some(vec![Message::user("fresh start")]),
            })
            .await
            .unwrap();

        assert_eq!(
            store.load(&id).await.unwrap(),
            vec![Message::user("fresh start"), Message::assistant("R1")]
        );
    }

    #[tokio::test]
    async fn single_turn_without_input_is_rejected() {
        let script = Arc::new(Scripted::default());
        let (service, _) = service_with(&script, LoopSettings::default());

        let result = service
            .single_turn(TurnJob {
                session_id: Some(session("chat-3")),
                query: Some("  ".to_string()),
                messages: Some(Vec::new()),
            })
            .await;

        assert!(matches!(result, Err(ThinkError::EmptyQuery)));
        assert!(script.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn forget_drops_history() {
        let script = Arc::new(Scripted::default());
        let (service, store) = service_with(&script, LoopSettings::default());
        let id = session("gone");
        store.append(&id, &[Message::user("x")]).await.unwrap();

        assert!(service.forget(&id).await);
        assert!(service.history(&id).await.is_empty());
        assert!(!service.forget(&id).await);
    }
}
