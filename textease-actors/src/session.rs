//! Per-user conversation state and the transitions between its views.
//!
//! Derived results (the rewrite and the claim list) live inside the
//! [`Document`] they were computed from, so replacing the text discards them
//! with it. Every transition computes its results first and commits only
//! after all model calls succeeded; a failed or cancelled action leaves the
//! session exactly as it was.
use crate::action::{Action, ClaimRef, ExtractionId, Outcome, Reply, SessionView};
use crate::render;
use textease_common::{Result, TextEaseError};
use textease_pipeline::{AssistantContext, QualityReport, Strength};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionLimits {
    /// Longest text accepted from `submit_text` or `submit_document`.
    pub max_text_chars: usize,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            max_text_chars: 10_000,
        }
    }
}

/// A rewrite together with the strength that produced it and its score.
#[derive(Debug, Clone, PartialEq)]
pub struct Rewrite {
    pub text: String,
    pub strength: Strength,
    pub report: QualityReport,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClaimSet {
    pub id: ExtractionId,
    pub claims: Vec<String>,
}

impl ClaimSet {
    /// The claim `claim` points at, if it belongs to this extraction.
    pub fn resolve(&self, claim: ClaimRef) -> Result<&str> {
        if claim.extraction.is_some_and(|id| id != self.id) {
            return Err(TextEaseError::NotFound(
                "that claim belongs to an earlier extraction".to_string(),
            ));
        }
        self.claims.get(claim.index).map(String::as_str).ok_or_else(|| {
            TextEaseError::NotFound(format!(
                "claim #{} (there are {} claims)",
                claim.index + 1,
                self.claims.len()
            ))
        })
    }
}

/// The pending text and everything derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub text: String,
    pub simplified: Option<Rewrite>,
    pub claims: Option<ClaimSet>,
}

impl Document {
    fn new(text: String) -> Self {
        Self {
            text,
            simplified: None,
            claims: None,
        }
    }

    fn simplified(&self) -> Result<&Rewrite> {
        self.simplified
            .as_ref()
            .ok_or_else(|| TextEaseError::NotFound("no simplified text yet".to_string()))
    }

    fn claims(&self) -> Result<&ClaimSet> {
        self.claims
            .as_ref()
            .ok_or_else(|| TextEaseError::NotFound("no extracted claims yet".to_string()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum View {
    TextReceived,
    Simplified,
    Translated { translation: String },
    ClaimsExtracted,
    ClaimDetail {
        index: usize,
        rewrite: Rewrite,
        translation: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Active { document: Document, view: View },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Session {
    state: SessionState,
    last_strength: Strength,
    limits: SessionLimits,
}

impl Session {
    pub fn new(limits: SessionLimits) -> Self {
        Self {
            limits,
            ..Self::default()
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn last_strength(&self) -> Strength {
        self.last_strength
    }

    pub fn document(&self) -> Option<&Document> {
        match &self.state {
            SessionState::Idle => None,
            SessionState::Active { document, .. } => Some(document),
        }
    }

    pub fn view(&self) -> SessionView {
        match &self.state {
            SessionState::Idle => SessionView::Idle,
            SessionState::Active { view, .. } => match view {
                View::TextReceived => SessionView::TextReceived,
                View::Simplified => SessionView::Simplified,
                View::Translated { .. } => SessionView::Translated,
                View::ClaimsExtracted => SessionView::ClaimsExtracted,
                View::ClaimDetail { index, .. } => SessionView::ClaimDetail { index: *index },
            },
        }
    }

    /// Run one action against the session.
    pub async fn apply(&mut self, ctx: &AssistantContext, action: Action) -> Result<Reply> {
        tracing::debug!(action = action.name(), view = ?self.view(), "applying action");
        match action {
            Action::SubmitText { text } => self.submit(text, false),
            Action::SubmitDocument { text } => self.submit(text, true),
            Action::ChooseStrength { strength } => self.choose_strength(ctx, strength).await,
            Action::Translate => self.translate(ctx).await,
            Action::ExtractClaims => self.extract_claims(ctx),
            Action::SimplifyClaim { claim } => {
                let strength = self.last_strength;
                self.simplify_claim(ctx, claim, strength).await
            }
            Action::ChangeClaimStrength { claim, strength } => {
                self.simplify_claim(ctx, claim, strength).await
            }
            Action::ShowOriginal => self.show_original(ctx),
            Action::ShowSimplified => self.show_simplified(),
            Action::ShowClaims => self.show_claims(),
            Action::Back => self.back(),
        }
    }

    /// Reply describing `err` without touching the session.
    pub fn failure_reply(&self, err: &TextEaseError) -> Reply {
        Reply {
            messages: vec![render::failure(err)],
            actions: self.available_actions(),
            view: self.view(),
            outcome: Outcome::from(err),
        }
    }

    /// Actions that make sense from the current view.
    pub fn available_actions(&self) -> Vec<Action> {
        let SessionState::Active { document, view } = &self.state else {
            return Vec::new();
        };
        match view {
            View::TextReceived => level_choices(),
            View::Simplified => vec![
                Action::Translate,
                Action::Back,
                Action::ShowOriginal,
                Action::ExtractClaims,
            ],
            View::Translated { .. } => vec![Action::ShowSimplified, Action::Back],
            View::ClaimsExtracted => {
                let mut actions = document
                    .claims
                    .as_ref()
                    .map(claim_choices)
                    .unwrap_or_default();
                if document.simplified.is_some() {
                    actions.push(Action::ShowSimplified);
                }
                actions.push(Action::Back);
                actions
            }
            View::ClaimDetail { index, rewrite, .. } => {
                let mut actions: Vec<Action> = Strength::ALL
                    .into_iter()
                    .filter(|strength| *strength != rewrite.strength)
                    .map(|strength| Action::ChangeClaimStrength {
                        claim: claim_ref(document, *index),
                        strength,
                    })
                    .collect();
                actions.push(Action::Translate);
                actions.push(Action::ShowClaims);
                actions.push(Action::Back);
                actions
            }
        }
    }

    fn active(&self) -> Result<(&Document, &View)> {
        match &self.state {
            SessionState::Active { document, view } => Ok((document, view)),
            SessionState::Idle => Err(TextEaseError::NotFound("no text has been sent yet".to_string())),
        }
    }

    fn commit(&mut self, document: Document, view: View) {
        self.state = SessionState::Active { document, view };
    }

    fn reply(&self, messages: Vec<String>) -> Reply {
        Reply::done(messages, self.available_actions(), self.view())
    }

    fn submit(&mut self, text: String, from_document: bool) -> Result<Reply> {
        if text.trim().is_empty() {
            return Err(TextEaseError::EmptyInput);
        }
        let len = text.chars().count();
        if len > self.limits.max_text_chars {
            return Err(TextEaseError::TooLong {
                len,
                max: self.limits.max_text_chars,
            });
        }
        self.commit(Document::new(text), View::TextReceived);
        Ok(self.reply(vec![render::received(len, from_document)]))
    }

    async fn choose_strength(&mut self, ctx: &AssistantContext, strength: Strength) -> Result<Reply> {
        let (document, _) = self.active()?;
        let text = ctx.rewrite_long(&document.text, strength).await?;
        let report = ctx.evaluate(&document.text, &text);

        let mut document = document.clone();
        document.simplified = Some(Rewrite {
            text,
            strength,
            report,
        });
        self.last_strength = strength;
        self.commit(document, View::Simplified);
        self.show_simplified()
    }

    async fn translate(&mut self, ctx: &AssistantContext) -> Result<Reply> {
        let (document, view) = self.active()?;

        if let View::ClaimDetail { index, rewrite, .. } = view {
            let translation = ctx.translate(&rewrite.text).await?;
            let (index, rewrite) = (*index, rewrite.clone());
            let document = document.clone();
            let message = render::translation(&translation);
            self.commit(
                document,
                View::ClaimDetail {
                    index,
                    rewrite,
                    translation: Some(translation),
                },
            );
            return Ok(self.reply(vec![message]));
        }

        let source = document.simplified().map_err(|_| {
            TextEaseError::NotFound("no simplified text to translate".to_string())
        })?;
        let translation = ctx.translate(&source.text).await?;
        let document = document.clone();
        let message = render::translation(&translation);
        self.commit(document, View::Translated { translation });
        Ok(self.reply(vec![message]))
    }

    fn extract_claims(&mut self, ctx: &AssistantContext) -> Result<Reply> {
        let (document, _) = self.active()?;
        let claims = ctx.extract_claims(&document.text);
        if claims.is_empty() {
            return Ok(Reply {
                messages: vec![render::NO_CLAIMS.to_string()],
                actions: self.available_actions(),
                view: self.view(),
                outcome: Outcome::Empty,
            });
        }

        let message = render::claim_list(&claims);
        let mut document = document.clone();
        document.claims = Some(ClaimSet {
            id: ExtractionId::new(),
            claims,
        });
        self.commit(document, View::ClaimsExtracted);
        Ok(self.reply(vec![message]))
    }

    async fn simplify_claim(
        &mut self,
        ctx: &AssistantContext,
        claim: ClaimRef,
        strength: Strength,
    ) -> Result<Reply> {
        let (document, _) = self.active()?;
        let original = document.claims()?.resolve(claim)?;

        let text = ctx.rewrite(original, strength).await?;
        let report = ctx.evaluate(original, &text);
        let message = render::claim_detail(claim.index, original, strength, &text);
        let document = document.clone();
        self.commit(
            document,
            View::ClaimDetail {
                index: claim.index,
                rewrite: Rewrite {
                    text,
                    strength,
                    report,
                },
                translation: None,
            },
        );
        Ok(self.reply(vec![message]))
    }

    fn show_original(&mut self, ctx: &AssistantContext) -> Result<Reply> {
        let (document, _) = self.active()?;
        let parts = if document.text.chars().count() <= render::SINGLE_MESSAGE_CHARS {
            vec![document.text.clone()]
        } else {
            ctx.segment(&document.text, render::ORIGINAL_PART_CHARS)
        };
        let document = document.clone();
        self.commit(document, View::TextReceived);
        Ok(self.reply(render::original(&parts)))
    }

    fn show_simplified(&mut self) -> Result<Reply> {
        let (document, _) = self.active()?;
        let rewrite = document.simplified()?;
        let message = render::simplified(&rewrite.text, rewrite.strength, &rewrite.report);
        let document = document.clone();
        self.commit(document, View::Simplified);
        Ok(self.reply(vec![message]))
    }

    fn show_claims(&mut self) -> Result<Reply> {
        let (document, _) = self.active()?;
        let message = render::claim_list(&document.claims()?.claims);
        let document = document.clone();
        self.commit(document, View::ClaimsExtracted);
        Ok(self.reply(vec![message]))
    }

    fn back(&mut self) -> Result<Reply> {
        let (document, _) = self.active()?;
        let chars = document.text.chars().count();
        let document = document.clone();
        self.commit(document, View::TextReceived);
        Ok(self.reply(vec![render::back(chars)]))
    }
}

fn level_choices() -> Vec<Action> {
    let mut actions: Vec<Action> = Strength::ALL
        .into_iter()
        .map(|strength| Action::ChooseStrength { strength })
        .collect();
    actions.push(Action::ExtractClaims);
    actions
}

fn claim_choices(set: &ClaimSet) -> Vec<Action> {
    (0..set.claims.len())
        .map(|index| Action::SimplifyClaim {
            claim: ClaimRef::pinned(set.id, index),
        })
        .collect()
}

fn claim_ref(document: &Document, index: usize) -> ClaimRef {
    match &document.claims {
        Some(set) => ClaimRef::pinned(set.id, index),
        None => ClaimRef::at(index),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use textease_config::PipelineConfig;
    use textease_llm::mock::MockLlmClient;

    const TEXT: &str = "Главный герой романа пошёл в лес. Там он встретил старого волка.";

    fn ctx() -> AssistantContext {
        AssistantContext::with_models(
            Arc::new(MockLlmClient::echo("simplifier")),
            Arc::new(MockLlmClient::new("translator", |call| Ok(format!("EN {}", call.prompt)))),
            &PipelineConfig::default(),
        )
    }

    async fn run(session: &mut Session, ctx: &AssistantContext, action: Action) -> Result<Reply> {
        session.apply(ctx, action).await
    }

    fn submit(text: &str) -> Action {
        Action::SubmitText {
            text: text.to_string(),
        }
    }

    #[tokio::test]
    async fn translate_without_text_is_not_found_and_changes_nothing() {
        let ctx = ctx();
        let mut session = Session::default();
        let before = session.clone();

        let err = run(&mut session, &ctx, Action::Translate).await.unwrap_err();
        assert!(matches!(err, TextEaseError::NotFound(_)));
        assert_eq!(session, before);
        assert_eq!(session.view(), SessionView::Idle);
    }

    #[tokio::test]
    async fn translate_before_simplify_is_not_found() {
        let ctx = ctx();
        let mut session = Session::default();
        run(&mut session, &ctx, submit(TEXT)).await.unwrap();
        let before = session.clone();

        let err = run(&mut session, &ctx, Action::Translate).await.unwrap_err();
        assert!(matches!(err, TextEaseError::NotFound(_)));
        assert_eq!(session, before);
    }

    #[tokio::test]
    async fn simplify_then_translate_then_back() {
        let ctx = ctx();
        let mut session = Session::default();

        let reply = run(&mut session, &ctx, submit(TEXT)).await.unwrap();
        assert_eq!(reply.view, SessionView::TextReceived);
        assert!(reply.actions.contains(&Action::ChooseStrength {
            strength: Strength::Strong
        }));

        let reply = run(
            &mut session,
            &ctx,
            Action::ChooseStrength {
                strength: Strength::Strong,
            },
        )
        .await
        .unwrap();
        assert_eq!(reply.view, SessionView::Simplified);
        assert!(reply.text().contains("Simplified text (strong)"));
        assert!(reply.text().contains("BLEU"));
        assert_eq!(session.last_strength(), Strength::Strong);

        let reply = run(&mut session, &ctx, Action::Translate).await.unwrap();
        assert_eq!(reply.view, SessionView::Translated);
        assert!(reply.text().contains(&format!("EN {TEXT}")));
        assert_eq!(reply.actions, vec![Action::ShowSimplified, Action::Back]);
        let simplified = session.document().unwrap().simplified.clone();

        let reply = run(&mut session, &ctx, Action::Back).await.unwrap();
        assert_eq!(reply.view, SessionView::TextReceived);
        let document = session.document().unwrap();
        assert_eq!(document.text, TEXT);
        assert_eq!(document.simplified, simplified);
    }

    #[tokio::test]
    async fn new_text_discards_stale_results() {
        let ctx = ctx();
        let mut session = Session::default();
        run(&mut session, &ctx, submit(TEXT)).await.unwrap();
        run(
            &mut session,
            &ctx,
            Action::ChooseStrength {
                strength: Strength::Medium,
            },
        )
        .await
        .unwrap();
        run(&mut session, &ctx, Action::ExtractClaims).await.unwrap();

        run(&mut session, &ctx, submit("Совсем другой текст для работы.")).await.unwrap();
        let document = session.document().unwrap();
        assert!(document.simplified.is_none());
        assert!(document.claims.is_none());

        let err = run(&mut session, &ctx, Action::ShowSimplified).await.unwrap_err();
        assert!(matches!(err, TextEaseError::NotFound(_)));
    }

    #[tokio::test]
    async fn claim_index_out_of_range_is_not_found() {
        let ctx = ctx();
        let mut session = Session::default();
        run(&mut session, &ctx, submit(TEXT)).await.unwrap();
        let reply = run(&mut session, &ctx, Action::ExtractClaims).await.unwrap();
        assert_eq!(reply.view, SessionView::ClaimsExtracted);
        assert_eq!(session.document().unwrap().claims.as_ref().unwrap().claims.len(), 2);
        let before = session.clone();

        let err = run(
            &mut session,
            &ctx,
            Action::ChangeClaimStrength {
                claim: ClaimRef::at(2),
                strength: Strength::Strong,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, TextEaseError::NotFound(_)));
        assert_eq!(session, before);
    }

    #[tokio::test]
    async fn stale_claim_reference_is_not_found() {
        let ctx = ctx();
        let mut session = Session::default();
        run(&mut session, &ctx, submit(TEXT)).await.unwrap();
        let first = run(&mut session, &ctx, Action::ExtractClaims).await.unwrap();
        let Some(Action::SimplifyClaim { claim: stale }) = first.actions.first().cloned() else {
            panic!("claim list offers claim actions");
        };

        run(&mut session, &ctx, Action::ExtractClaims).await.unwrap();
        let err = run(&mut session, &ctx, Action::SimplifyClaim { claim: stale })
            .await
            .unwrap_err();
        assert!(matches!(err, TextEaseError::NotFound(_)));
    }

    #[tokio::test]
    async fn claim_detail_flow() {
        let ctx = ctx();
        let mut session = Session::default();
        run(&mut session, &ctx, submit(TEXT)).await.unwrap();
        let list = run(&mut session, &ctx, Action::ExtractClaims).await.unwrap();
        let second = list.actions[1].clone();

        let reply = run(&mut session, &ctx, second).await.unwrap();
        assert_eq!(reply.view, SessionView::ClaimDetail { index: 1 });
        assert!(reply.text().contains("Claim 2:"));
        assert!(reply.text().contains("Simplified (medium)"));
        assert!(reply.actions.contains(&Action::ShowClaims));
        assert_eq!(reply.actions.last(), Some(&Action::Back));

        let reply = run(&mut session, &ctx, Action::Translate).await.unwrap();
        assert_eq!(reply.view, SessionView::ClaimDetail { index: 1 });
        assert_eq!(reply.text(), "Translation:\n\nEN Там он встретил старого волка.");

        let reply = run(&mut session, &ctx, Action::ShowClaims).await.unwrap();
        assert_eq!(reply.view, SessionView::ClaimsExtracted);

        run(&mut session, &ctx, list.actions[0].clone()).await.unwrap();
        let reply = run(&mut session, &ctx, Action::Back).await.unwrap();
        assert_eq!(reply.view, SessionView::TextReceived);
        assert_eq!(session.document().unwrap().text, TEXT);
    }

    #[tokio::test]
    async fn blank_and_oversized_input_leave_session_alone() {
        let ctx = ctx();
        let mut session = Session::new(SessionLimits { max_text_chars: 20 });
        run(&mut session, &ctx, submit("Короткий текст.")).await.unwrap();
        let before = session.clone();

        let err = run(&mut session, &ctx, submit("   ")).await.unwrap_err();
        assert!(matches!(err, TextEaseError::EmptyInput));

        let err = run(
            &mut session,
            &ctx,
            Action::SubmitDocument {
                text: "Слишком длинный текст для лимита.".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, TextEaseError::TooLong { max: 20, .. }));
        assert_eq!(session, before);
    }

    #[tokio::test]
    async fn text_without_claims_reports_empty() {
        let ctx = ctx();
        let mut session = Session::default();
        run(&mut session, &ctx, submit("Да. Нет.")).await.unwrap();

        let reply = run(&mut session, &ctx, Action::ExtractClaims).await.unwrap();
        assert_eq!(reply.outcome, Outcome::Empty);
        assert_eq!(reply.view, SessionView::TextReceived);
        assert!(session.document().unwrap().claims.is_none());
    }

    #[tokio::test]
    async fn long_original_is_shown_in_parts() {
        let ctx = ctx();
        let mut session = Session::default();
        let text = vec![TEXT; 80].join(" ");
        run(&mut session, &ctx, submit(&text)).await.unwrap();

        let reply = run(&mut session, &ctx, Action::ShowOriginal).await.unwrap();
        assert!(reply.messages.len() > 1);
        assert!(reply.messages[0].starts_with("Original text (part 1):"));
        for message in &reply.messages {
            assert!(message.chars().count() <= render::ORIGINAL_PART_CHARS + 40);
        }
    }

    #[tokio::test]
    async fn transformation_failure_keeps_state_for_retry() {
        let ctx = AssistantContext::with_models(
            Arc::new(MockLlmClient::failing("simplifier", "model crashed")),
            Arc::new(MockLlmClient::echo("translator")),
            &PipelineConfig::default(),
        );
        let mut session = Session::default();
        run(&mut session, &ctx, submit(TEXT)).await.unwrap();
        let before = session.clone();

        let err = run(
            &mut session,
            &ctx,
            Action::ChooseStrength {
                strength: Strength::Light,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, TextEaseError::Transformation(_)));
        assert_eq!(session, before);

        let reply = session.failure_reply(&err);
        assert_eq!(reply.outcome, Outcome::Failed);
        assert!(reply.text().contains("model crashed"));
        assert_eq!(reply.view, SessionView::TextReceived);
    }
}
