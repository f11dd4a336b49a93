//! Two-phase refresh of widget instances.
//!
//! For every instance the orchestrator commits a base view built only from
//! cached preferences, then spawns a task that fetches the icon and commits
//! an enriched view. The base commit is issued before the task is spawned,
//! so for one instance the enriched commit always lands after the base one.
//! Instances do not wait on each other.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::host::{HostError, WidgetInstanceId, WidgetProvider, WidgetUpdateSurface};
use crate::icon::IconFetcher;
use crate::model::PreferenceSnapshot;
use crate::prefs::PreferenceStore;
use crate::render::{RenderPayload, apply_icon, render_base};

/// How far one instance got in a refresh cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshPhase {
    BasePainted,
    Enriched,
}

/// Enrichment tasks spawned by one `on_update` call.
///
/// Dropping the cycle detaches the tasks; they still run to completion.
#[derive(Debug, Default)]
pub struct RefreshCycle {
    tasks: Vec<(WidgetInstanceId, JoinHandle<RefreshPhase>)>,
}

impl RefreshCycle {
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn ids(&self) -> Vec<WidgetInstanceId> {
        self.tasks.iter().map(|(id, _)| *id).collect()
    }

    pub fn extend(&mut self, other: RefreshCycle) {
        self.tasks.extend(other.tasks);
    }

    /// Wait for every enrichment task and report the phase each instance reached.
    pub async fn wait(self) -> Vec<(WidgetInstanceId, RefreshPhase)> {
        let mut outcomes = Vec::with_capacity(self.tasks.len());
        for (id, task) in self.tasks {
            let phase = match task.await {
                Ok(phase) => phase,
                Err(e) => {
                    tracing::warn!(%id, "enrichment task did not complete: {}", e);
                    RefreshPhase::BasePainted
                }
            };
            outcomes.push((id, phase));
        }
        outcomes
    }
}

#[derive(Debug, Clone)]
pub struct RefreshOrchestrator {
    prefs: Arc<dyn PreferenceStore>,
    fetcher: Arc<dyn IconFetcher>,
    surface: Arc<dyn WidgetUpdateSurface>,
    entry_target: String,
    runtime: Handle,
}

impl RefreshOrchestrator {
    pub fn new(
        prefs: Arc<dyn PreferenceStore>,
        fetcher: Arc<dyn IconFetcher>,
        surface: Arc<dyn WidgetUpdateSurface>,
        entry_target: impl Into<String>,
        runtime: Handle,
    ) -> Self {
        Self {
            prefs,
            fetcher,
            surface,
            entry_target: entry_target.into(),
            runtime,
        }
    }

    /// Paint every instance from cached state, then enrich each in the background.
    pub fn refresh(&self, ids: &[WidgetInstanceId]) -> RefreshCycle {
        let unique: BTreeSet<WidgetInstanceId> = ids.iter().copied().collect();

        let mut cycle = RefreshCycle::default();
        for id in unique {
            let snapshot = PreferenceSnapshot::read(self.prefs.as_ref());
            let payload = render_base(&snapshot, &self.entry_target);

            commit(self.surface.as_ref(), id, &payload);
            tracing::debug!(%id, city = %payload.city, "base painted");

            let task = self.runtime.spawn(enrich(
                id,
                payload,
                snapshot.icon_url,
                Arc::clone(&self.fetcher),
                Arc::clone(&self.surface),
            ));
            cycle.tasks.push((id, task));
        }

        cycle
    }
}

impl WidgetProvider for RefreshOrchestrator {
    fn on_update(&self, ids: &[WidgetInstanceId]) -> RefreshCycle {
        self.refresh(ids)
    }
}

async fn enrich(
    id: WidgetInstanceId,
    payload: RenderPayload,
    icon_url: String,
    fetcher: Arc<dyn IconFetcher>,
    surface: Arc<dyn WidgetUpdateSurface>,
) -> RefreshPhase {
    let Some(icon) = fetcher.fetch(Some(icon_url.as_str())).await else {
        tracing::debug!(%id, "no icon, keeping base render");
        return RefreshPhase::BasePainted;
    };

    let payload = apply_icon(payload, Some(icon));
    commit(surface.as_ref(), id, &payload);
    tracing::debug!(%id, "enriched");

    RefreshPhase::Enriched
}

fn commit(surface: &dyn WidgetUpdateSurface, id: WidgetInstanceId, payload: &RenderPayload) {
    match surface.commit(id, payload) {
        Ok(()) => {}
        Err(HostError::UnknownInstance(_)) => {
            tracing::debug!(%id, "instance removed before commit, skipping");
        }
        Err(e) => {
            tracing::warn!(%id, "commit failed: {}", e);
        }
    }
}
