//! Personal itinerary projection for a single participant.
//!
//! Finds every unit the user belongs to within an event, loads the
//! encounters referencing those units, and derives a time-ordered itinerary
//! with human-readable "time until" strings. Purely a projection; no writes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::{CourtId, DivisionId, EncounterId, EventId, PhaseId, UnitId, UserId};
use crate::db::repository::{FullRepository, RepositoryResult};
use crate::models::EncounterStatus;

/// One itinerary line for the participant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItineraryEntry {
    pub encounter_id: EncounterId,
    pub division_id: DivisionId,
    pub phase_id: Option<PhaseId>,
    pub status: EncounterStatus,
    /// The participant's own unit in this encounter.
    pub unit_id: UnitId,
    pub opponent_names: Vec<String>,
    pub court_id: Option<CourtId>,
    pub court_label: Option<String>,
    pub start: Option<DateTime<Utc>>,
    /// Bucketed countdown, e.g. "45m", "3h 20m", "2d 5h"; `None` when the
    /// encounter has no time yet.
    pub time_until: Option<String>,
}

/// A participant's schedule within one event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerItinerary {
    pub event_id: EventId,
    pub user_id: UserId,
    pub entries: Vec<ItineraryEntry>,
}

/// Human-readable time until `start`, bucketed by magnitude:
/// under an hour as minutes, under a day as hours+minutes, else days+hours.
/// A start at or before `now` reads "now".
pub fn format_time_until(start: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let delta = start - now;
    let total_minutes = delta.num_minutes();
    if total_minutes <= 0 {
        return "now".to_string();
    }
    if total_minutes < 60 {
        return format!("{}m", total_minutes);
    }
    let total_hours = delta.num_hours();
    if total_hours < 24 {
        return format!("{}h {}m", total_hours, total_minutes - total_hours * 60);
    }
    let days = delta.num_days();
    format!("{}d {}h", days, total_hours - days * 24)
}

/// Build a participant's itinerary, computing countdowns relative to `now`.
pub async fn get_player_schedule_at<R>(
    repo: &R,
    event_id: EventId,
    user_id: UserId,
    now: DateTime<Utc>,
) -> RepositoryResult<PlayerItinerary>
where
    R: FullRepository + ?Sized,
{
    let units = repo.units_for_user(event_id, user_id).await?;
    let unit_ids: Vec<UnitId> = units.iter().map(|u| u.id).collect();
    if unit_ids.is_empty() {
        return Ok(PlayerItinerary {
            event_id,
            user_id,
            entries: Vec::new(),
        });
    }

    let mut encounters = repo.encounters_for_units(&unit_ids).await?;
    // Timed encounters first in chronological order, untimed ones last.
    encounters.sort_by_key(|e| (e.estimated_start.is_none(), e.estimated_start, e.id));

    let mut entries = Vec::with_capacity(encounters.len());
    for encounter in encounters {
        let Some(own_unit) = encounter.unit_ids.iter().find(|u| unit_ids.contains(u)) else {
            continue;
        };
        let mut opponent_names = Vec::new();
        for unit_id in encounter.unit_ids.iter().filter(|u| *u != own_unit) {
            match repo.fetch_unit(*unit_id).await {
                Ok(unit) => opponent_names.push(unit.name),
                Err(err) if err.is_not_found() => {}
                Err(err) => return Err(err),
            }
        }
        let court_label = match encounter.court_id {
            Some(court_id) => match repo.fetch_court(court_id).await {
                Ok(court) => Some(court.label),
                Err(err) if err.is_not_found() => None,
                Err(err) => return Err(err),
            },
            None => None,
        };
        entries.push(ItineraryEntry {
            encounter_id: encounter.id,
            division_id: encounter.division_id,
            phase_id: encounter.phase_id,
            status: encounter.status,
            unit_id: *own_unit,
            opponent_names,
            court_id: encounter.court_id,
            court_label,
            start: encounter.estimated_start,
            time_until: encounter
                .estimated_start
                .map(|start| format_time_until(start, now)),
        });
    }

    Ok(PlayerItinerary {
        event_id,
        user_id,
        entries,
    })
}

/// Build a participant's itinerary relative to the current time.
pub async fn get_player_schedule<R>(
    repo: &R,
    event_id: EventId,
    user_id: UserId,
) -> RepositoryResult<PlayerItinerary>
where
    R: FullRepository + ?Sized,
{
    get_player_schedule_at(repo, event_id, user_id, Utc::now()).await
}

#[cfg(test)]
#[path = "player_schedule_tests.rs"]
mod player_schedule_tests;
