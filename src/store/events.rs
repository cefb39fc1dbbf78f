// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Events and event applications.
//!
//! Applying touches two documents with no transaction between them. The
//! event update goes first; if the application record then fails, the
//! previous event document is written back.

use super::{next_timestamp_id, Store};
use crate::db::remote::Write;
use crate::error::{AppError, Result};
use crate::models::{Event, EventApplication, EventDraft, EventStatus};
use crate::time_utils::now_rfc3339;
use validator::Validate;

impl Store {
    /// Events as displayed today, with the recruitment projection applied.
    pub fn events(&self) -> Vec<Event> {
        let today = self.today();
        self.events.iter().map(|e| e.projected(today)).collect()
    }

    /// One event as displayed today.
    pub fn event(&self, id: i64) -> Option<Event> {
        let today = self.today();
        self.events.iter().find(|e| e.id == id).map(|e| e.projected(today))
    }

    fn existing_event(&self, id: i64) -> Result<&Event> {
        self.events
            .iter()
            .find(|e| e.id == id)
            .ok_or_else(|| AppError::NotFound(format!("event {}", id)))
    }

    // ─── Admin Event Management ─────────────────────────────────

    pub async fn create_event(&mut self, draft: EventDraft) -> Result<Event> {
        draft.validate()?;
        self.require_admin()?;
        let event = Event {
            id: next_timestamp_id(self.events.iter().map(|e| e.id)),
            title: draft.title,
            description: draft.description,
            location: draft.location,
            event_date: draft.event_date,
            recruitment_start_date: draft.recruitment_start_date,
            recruitment_end_date: draft.recruitment_end_date,
            capacity: draft.capacity,
            participants: 0,
            status: EventStatus::Recruiting,
            created_at: now_rfc3339(),
        };

        self.authorized_write(Write::Create(&event)).await?;
        tracing::info!(event_id = event.id, capacity = event.capacity, "Event created");
        self.events.insert(0, event.clone());
        Ok(event)
    }

    /// Edit an event (admin). Capacity cannot drop below current participants.
    pub async fn update_event(&mut self, id: i64, draft: EventDraft) -> Result<Event> {
        draft.validate()?;
        self.require_admin()?;
        let event = self.existing_event(id)?.clone();
        if draft.capacity < event.participants {
            return Err(AppError::Rejected(format!(
                "Capacity cannot be lower than the current {} participants",
                event.participants
            )));
        }

        let status = match event.status {
            EventStatus::Recruiting if event.participants == draft.capacity => EventStatus::Closed,
            EventStatus::Closed if event.is_full() && event.participants < draft.capacity => {
                EventStatus::Recruiting
            }
            other => other,
        };
        let next = Event {
            title: draft.title,
            description: draft.description,
            location: draft.location,
            event_date: draft.event_date,
            recruitment_start_date: draft.recruitment_start_date,
            recruitment_end_date: draft.recruitment_end_date,
            capacity: draft.capacity,
            status,
            ..event
        };

        self.authorized_write(Write::Update(&next)).await?;
        self.replace_event(next.clone());
        Ok(next)
    }

    /// Set an event's stored status (admin), e.g. to mark it finished.
    pub async fn set_event_status(&mut self, id: i64, status: EventStatus) -> Result<Event> {
        self.require_admin()?;
        let next = Event {
            status,
            ..self.existing_event(id)?.clone()
        };
        self.authorized_write(Write::Update(&next)).await?;
        self.replace_event(next.clone());
        Ok(next)
    }

    /// Delete an event (admin), then its applications on a best-effort basis.
    pub async fn delete_event(&mut self, id: i64) -> Result<()> {
        self.require_admin()?;
        self.existing_event(id)?;
        let doc_id = id.to_string();
        self.authorized_write(Write::<Event>::Delete(&doc_id)).await?;
        tracing::info!(event_id = id, "Event deleted");
        self.events.retain(|e| e.id != id);

        let orphaned: Vec<i64> = self
            .applications
            .iter()
            .filter(|a| a.event_id == id)
            .map(|a| a.id)
            .collect();
        for application_id in orphaned {
            let doc_id = application_id.to_string();
            match self
                .authorized_write(Write::<EventApplication>::Delete(&doc_id))
                .await
            {
                Ok(()) => self.applications.retain(|a| a.id != application_id),
                Err(e) => {
                    tracing::warn!(event_id = id, application_id, error = %e, "Application left behind")
                }
            }
        }
        Ok(())
    }

    /// Applications filed for an event (admin), refreshed from the backend.
    pub async fn applications_for_event(&mut self, event_id: i64) -> Result<Vec<EventApplication>> {
        let token = self.admin_token().await?;
        if let Some(applications) = self
            .remote
            .fetch_list::<EventApplication>(Some(&token))
            .await
        {
            self.applications = applications;
        }
        let mut list: Vec<EventApplication> = self
            .applications
            .iter()
            .filter(|a| a.event_id == event_id)
            .cloned()
            .collect();
        list.sort_by_key(|a| a.id);
        Ok(list)
    }

    // ─── Member Applications ────────────────────────────────────

    /// The logged-in user's applications.
    pub fn my_applications(&self) -> Vec<&EventApplication> {
        match &self.current_user {
            Some(user) => self
                .applications
                .iter()
                .filter(|a| a.user_id == user.id)
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn has_applied(&self, event_id: i64) -> bool {
        self.current_user.as_ref().is_some_and(|user| {
            self.applications
                .iter()
                .any(|a| a.event_id == event_id && a.user_id == user.id)
        })
    }

    /// Apply for an event as the logged-in user.
    pub async fn apply_for_event(&mut self, event_id: i64, note: &str) -> Result<EventApplication> {
        let user = self.require_login()?.clone();
        let event = self.existing_event(event_id)?.clone();

        if self.has_applied(event_id) {
            return Err(AppError::Rejected("You have already applied for this event".to_string()));
        }
        if event.projected_status(self.today()) != EventStatus::Recruiting {
            return Err(AppError::Rejected("Recruitment for this event is closed".to_string()));
        }
        let next = event
            .with_participant_added()
            .ok_or_else(|| AppError::Rejected("This event is full".to_string()))?;

        let application = EventApplication {
            id: next_timestamp_id(self.applications.iter().map(|a| a.id)),
            event_id,
            user_id: user.id.clone(),
            user_name: user.name.clone(),
            phone: user.phone.clone(),
            note: note.trim().to_string(),
            applied_at: now_rfc3339(),
        };

        self.authorized_write(Write::Update(&next)).await?;
        if let Err(e) = self.authorized_write(Write::Create(&application)).await {
            self.compensate_event(&event).await;
            return Err(e);
        }

        tracing::info!(
            event_id,
            user_id = %user.id,
            participants = next.participants,
            capacity = next.capacity,
            "Event application filed"
        );
        self.replace_event(next);
        self.applications.push(application.clone());
        Ok(application)
    }

    /// Withdraw the logged-in user's application for an event.
    pub async fn cancel_application(&mut self, event_id: i64) -> Result<()> {
        let user_id = self.require_login()?.id.clone();
        let application_id = self
            .applications
            .iter()
            .find(|a| a.event_id == event_id && a.user_id == user_id)
            .map(|a| a.id)
            .ok_or_else(|| AppError::NotFound("application".to_string()))?;
        let event = self.existing_event(event_id)?.clone();
        let next = event.with_participant_removed(self.today());

        self.authorized_write(Write::Update(&next)).await?;
        let doc_id = application_id.to_string();
        if let Err(e) = self
            .authorized_write(Write::<EventApplication>::Delete(&doc_id))
            .await
        {
            self.compensate_event(&event).await;
            return Err(e);
        }

        tracing::info!(event_id, user_id = %user_id, "Event application cancelled");
        self.replace_event(next);
        self.applications.retain(|a| a.id != application_id);
        Ok(())
    }

    /// Write the previous event document back after a failed second step.
    async fn compensate_event(&mut self, previous: &Event) {
        match self.authorized_write(Write::Update(previous)).await {
            Ok(()) => tracing::info!(event_id = previous.id, "Event update rolled back"),
            Err(e) => tracing::error!(
                event_id = previous.id,
                error = %e,
                "Event rollback failed; participant count no longer matches applications"
            ),
        }
    }

    fn replace_event(&mut self, event: Event) {
        if let Some(slot) = self.events.iter_mut().find(|e| e.id == event.id) {
            *slot = event;
        }
    }
}
