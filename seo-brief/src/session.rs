//! The persisted session: everything needed to resume a brief where the
//! user left it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::analysis::AnalysisOutput;
use crate::brief::{BriefContext, View, WizardState};
use crate::services::SessionStore;
use crate::types::{
    CompetitorPage, GeneratedArticle, Keyword, LengthConstraints, MarketSettings, SubjectInputs,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub market: MarketSettings,
    #[serde(default)]
    pub subject: SubjectInputs,
    pub keywords: Vec<Keyword>,
    #[serde(default)]
    pub competitors: Vec<CompetitorPage>,
    #[serde(default)]
    pub paa_questions: Vec<String>,
    #[serde(default)]
    pub length_constraints: LengthConstraints,
    pub wizard: WizardState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article: Option<GeneratedArticle>,
}

/// One row of a session listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: String,
    pub name: String,
    pub view: View,
    pub step: u8,
    pub competitor_count: usize,
    pub updated_at: DateTime<Utc>,
}

impl SessionState {
    pub fn new(
        name: impl Into<String>,
        keywords: Vec<Keyword>,
        market: MarketSettings,
        subject: SubjectInputs,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            created_at: now,
            updated_at: now,
            market,
            subject,
            keywords,
            competitors: Vec::new(),
            paa_questions: Vec::new(),
            length_constraints: LengthConstraints::default(),
            wizard: WizardState::default(),
            article: None,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Keyword → volume, keyed by join key
    pub fn keyword_map(&self) -> BTreeMap<String, u64> {
        self.keywords
            .iter()
            .map(|k| (k.join_key(), k.volume))
            .collect()
    }

    /// Commit a successful analysis run
    pub fn apply_analysis(&mut self, output: AnalysisOutput) {
        self.competitors = output.competitors;
        self.paa_questions = output.paa_questions;
        self.touch();
    }

    /// Wizard state plus the read-only context its steps draw on
    pub fn split(&mut self) -> (&mut WizardState, BriefContext<'_>) {
        let ctx = BriefContext {
            competitors: &self.competitors,
            keywords: &self.keywords,
            paa_questions: &self.paa_questions,
            subject: &self.subject,
            length_constraints: &self.length_constraints,
            market: &self.market,
        };
        (&mut self.wizard, ctx)
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            view: self.wizard.view,
            step: self.wizard.step,
            competitor_count: self.competitors.len(),
            updated_at: self.updated_at,
        }
    }
}

/// Process-local store, mostly for tests and dry runs
#[derive(Debug, Default)]
pub struct MemoryStore {
    sessions: Mutex<HashMap<String, String>>,
    saves: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful writes so far
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Raw JSON as stored for `id`
    pub async fn raw(&self, id: &str) -> Option<String> {
        self.sessions.lock().await.get(id).cloned()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn save(&self, state: &SessionState) -> anyhow::Result<()> {
        let json = serde_json::to_string(state)?;
        self.sessions.lock().await.insert(state.id.clone(), json);
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn load(&self, id: &str) -> anyhow::Result<Option<SessionState>> {
        match self.sessions.lock().await.get(id) {
            Some(json) => Ok(Some(serde_json::from_str(json)?)),
            None => Ok(None),
        }
    }

    async fn list(&self) -> anyhow::Result<Vec<SessionSummary>> {
        let sessions = self.sessions.lock().await;
        let mut out = Vec::with_capacity(sessions.len());
        for json in sessions.values() {
            let state: SessionState = serde_json::from_str(json)?;
            out.push(state.summary());
        }
        out.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(out)
    }

    async fn delete(&self, id: &str) -> anyhow::Result<bool> {
        Ok(self.sessions.lock().await.remove(id).is_some())
    }
}
