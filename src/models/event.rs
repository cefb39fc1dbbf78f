// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Capacity-bounded events and the applications members file for them.

use crate::db::collections;
use crate::db::remote::{numeric_id, FirestoreRecord};
use crate::db::value::{read_count, read_int, read_string, Document, Fields, FieldsBuilder};
use crate::error::DecodeError;
use crate::time_utils::parse_calendar_date;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// Event lifecycle status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    #[default]
    Recruiting,
    Closed,
    Finished,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Recruiting => "recruiting",
            EventStatus::Closed => "closed",
            EventStatus::Finished => "finished",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "closed" => EventStatus::Closed,
            "finished" => EventStatus::Finished,
            _ => EventStatus::Recruiting,
        }
    }
}

/// Event in `events/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: i64,
    pub title: String,
    pub description: String,
    pub location: String,
    /// Day the event takes place (`YYYY-MM-DD`)
    pub event_date: String,
    pub recruitment_start_date: String,
    /// Last day applications are accepted (`YYYY-MM-DD`)
    pub recruitment_end_date: String,
    pub capacity: u32,
    pub participants: u32,
    pub status: EventStatus,
    pub created_at: String,
}

impl Event {
    /// Status as it should be displayed on `today`.
    ///
    /// A recruiting event whose recruitment end date is strictly before
    /// `today` shows as closed. Nothing is written back.
    pub fn projected_status(&self, today: NaiveDate) -> EventStatus {
        if self.status != EventStatus::Recruiting {
            return self.status;
        }
        match parse_calendar_date(&self.recruitment_end_date) {
            Some(end) if end < today => EventStatus::Closed,
            _ => EventStatus::Recruiting,
        }
    }

    /// Copy of the event with the projected status applied.
    pub fn projected(&self, today: NaiveDate) -> Self {
        Self {
            status: self.projected_status(today),
            ..self.clone()
        }
    }

    pub fn is_full(&self) -> bool {
        self.participants >= self.capacity
    }

    /// Next state after one more participant, `None` when at capacity.
    pub fn with_participant_added(&self) -> Option<Self> {
        if self.is_full() {
            return None;
        }
        let participants = self.participants + 1;
        let status = if participants == self.capacity {
            EventStatus::Closed
        } else {
            self.status
        };
        Some(Self {
            participants,
            status,
            ..self.clone()
        })
    }

    /// Next state after one participant withdrew.
    ///
    /// An event that had closed because it filled up reopens, unless its
    /// recruitment window is over on `today`.
    pub fn with_participant_removed(&self, today: NaiveDate) -> Self {
        let participants = self.participants.saturating_sub(1);
        let mut next = Self {
            participants,
            ..self.clone()
        };
        if self.status == EventStatus::Closed && self.is_full() {
            let window_open = parse_calendar_date(&self.recruitment_end_date)
                .map_or(true, |end| end >= today);
            if window_open {
                next.status = EventStatus::Recruiting;
            }
        }
        next
    }
}

impl FirestoreRecord for Event {
    const COLLECTION: &'static str = collections::EVENTS;
    const KIND: &'static str = "Event";

    fn document_id(&self) -> String {
        self.id.to_string()
    }

    fn to_fields(&self) -> Fields {
        FieldsBuilder::new()
            .integer("id", self.id)
            .string("title", &self.title)
            .string("description", &self.description)
            .string("location", &self.location)
            .string("eventDate", &self.event_date)
            .string("recruitmentStartDate", &self.recruitment_start_date)
            .string("recruitmentEndDate", &self.recruitment_end_date)
            .integer("capacity", i64::from(self.capacity))
            .integer("participants", i64::from(self.participants))
            .string("status", self.status.as_str())
            .string("createdAt", &self.created_at)
            .build()
    }

    fn from_document(doc: &Document) -> Result<Self, DecodeError> {
        let f = &doc.fields;
        Ok(Self {
            id: numeric_id(doc, "event")?,
            title: read_string(f, "title"),
            description: read_string(f, "description"),
            location: read_string(f, "location"),
            event_date: read_string(f, "eventDate"),
            recruitment_start_date: read_string(f, "recruitmentStartDate"),
            recruitment_end_date: read_string(f, "recruitmentEndDate"),
            capacity: read_count(f, "capacity"),
            participants: read_count(f, "participants"),
            status: EventStatus::parse(&read_string(f, "status")),
            created_at: read_string(f, "createdAt"),
        })
    }
}

/// Fields an admin fills in when creating or editing an event.
#[derive(Debug, Clone, Validate)]
pub struct EventDraft {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub description: String,
    pub location: String,
    pub event_date: String,
    pub recruitment_start_date: String,
    pub recruitment_end_date: String,
    #[validate(range(min = 1, max = 10000))]
    pub capacity: u32,
}

/// Application record in `eventApplications/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct EventApplication {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: i64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub event_id: i64,
    pub user_id: String,
    pub user_name: String,
    pub phone: String,
    pub note: String,
    pub applied_at: String,
}

impl FirestoreRecord for EventApplication {
    const COLLECTION: &'static str = collections::EVENT_APPLICATIONS;
    const KIND: &'static str = "Event application";

    fn document_id(&self) -> String {
        self.id.to_string()
    }

    fn to_fields(&self) -> Fields {
        FieldsBuilder::new()
            .integer("id", self.id)
            .integer("eventId", self.event_id)
            .string("userId", &self.user_id)
            .string("userName", &self.user_name)
            .string("phone", &self.phone)
            .string("note", &self.note)
            .string("appliedAt", &self.applied_at)
            .build()
    }

    fn from_document(doc: &Document) -> Result<Self, DecodeError> {
        let f = &doc.fields;
        Ok(Self {
            id: numeric_id(doc, "event application")?,
            event_id: read_int(f, "eventId"),
            user_id: read_string(f, "userId"),
            user_name: read_string(f, "userName"),
            phone: read_string(f, "phone"),
            note: read_string(f, "note"),
            applied_at: read_string(f, "appliedAt"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(capacity: u32, participants: u32, end: &str) -> Event {
        Event {
            id: 1,
            title: "Tree planting".to_string(),
            description: String::new(),
            location: "Riverside".to_string(),
            event_date: "2024-04-20".to_string(),
            recruitment_start_date: "2024-04-01".to_string(),
            recruitment_end_date: end.to_string(),
            capacity,
            participants,
            status: EventStatus::Recruiting,
            created_at: String::new(),
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_projection_closes_after_end_date() {
        let e = event(10, 2, "2024-04-10");
        assert_eq!(e.projected_status(day(2024, 4, 10)), EventStatus::Recruiting);
        assert_eq!(e.projected_status(day(2024, 4, 11)), EventStatus::Closed);
        // the stored record is untouched
        assert_eq!(e.status, EventStatus::Recruiting);
    }

    #[test]
    fn test_projection_ignores_unparseable_dates() {
        let e = event(10, 2, "next friday");
        assert_eq!(e.projected_status(day(2030, 1, 1)), EventStatus::Recruiting);
    }

    #[test]
    fn test_finished_is_never_projected() {
        let mut e = event(10, 2, "2024-04-10");
        e.status = EventStatus::Finished;
        assert_eq!(e.projected_status(day(2025, 1, 1)), EventStatus::Finished);
    }

    #[test]
    fn test_participant_added_closes_at_capacity() {
        let e = event(2, 0, "2024-04-10");
        let one = e.with_participant_added().unwrap();
        assert_eq!((one.participants, one.status), (1, EventStatus::Recruiting));
        let two = one.with_participant_added().unwrap();
        assert_eq!((two.participants, two.status), (2, EventStatus::Closed));
        assert!(two.with_participant_added().is_none());
    }

    #[test]
    fn test_participant_removed_reopens_full_event() {
        let full = event(1, 0, "2024-04-10").with_participant_added().unwrap();
        let reopened = full.with_participant_removed(day(2024, 4, 5));
        assert_eq!((reopened.participants, reopened.status), (0, EventStatus::Recruiting));

        let late = full.with_participant_removed(day(2024, 4, 12));
        assert_eq!(late.status, EventStatus::Closed);
    }
}
