use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};
use validator::Validate;

use crate::{
    error::{AppError, Result},
    models::calendar::{
        Calendar, CalendarListResponse, CalendarResponse, CreateCalendarRequest,
        EditCalendarRequest, TravelStop,
    },
    services::store::Store,
};

/// Trip itineraries. Calendars are private to their author: every
/// read and write checks ownership, unlike reviews and posts which are
/// public to read.
#[derive(Clone)]
pub struct CalendarService {
    store: Arc<Store>,
}

impl CalendarService {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    pub async fn create_calendar(
        &self,
        author_id: &str,
        request: CreateCalendarRequest,
    ) -> Result<CalendarResponse> {
        request.validate()?;
        if !self.store.member_exists(author_id) {
            return Err(AppError::not_found("Member", author_id));
        }

        let stops = request
            .travels
            .into_iter()
            .map(|stop| TravelStop {
                id: Store::next_id(),
                location_name: stop.location_name,
                latitude: stop.latitude,
                longitude: stop.longitude,
                memo: stop.memo,
                day: stop.day,
                order: stop.order,
            })
            .collect();

        let calendar = Calendar {
            id: Store::next_id(),
            author_id: author_id.to_string(),
            title: request.title,
            start_date: request.start_date,
            end_date: request.end_date,
            area: request.area,
            stops,
            created_at: Utc::now(),
        };
        debug!("Member {} created calendar {}", author_id, calendar.id);
        self.store.insert_calendar(calendar.clone());

        Ok(CalendarResponse::from(&calendar))
    }

    pub async fn get_calendar(
        &self,
        calendar_id: &str,
        requester_id: &str,
    ) -> Result<CalendarResponse> {
        let calendar = self.fetch_owned(calendar_id, requester_id)?;
        Ok(CalendarResponse::from(&calendar))
    }

    /// The requester's own calendars, newest first.
    pub async fn my_calendars(
        &self,
        requester_id: &str,
        page: usize,
        per_page: usize,
    ) -> Result<Vec<CalendarListResponse>> {
        if !self.store.member_exists(requester_id) {
            return Err(AppError::not_found("Member", requester_id));
        }
        Ok(self
            .store
            .calendars_by_author(requester_id, page, per_page)
            .iter()
            .map(CalendarListResponse::from)
            .collect())
    }

    /// The most recent calendars across all members, for the main page.
    pub async fn recent_calendars(&self, limit: usize) -> Result<Vec<CalendarListResponse>> {
        Ok(self
            .store
            .recent_calendars(limit)
            .iter()
            .map(CalendarListResponse::from)
            .collect())
    }

    /// Replaces the scalar fields and applies the stop delta list:
    /// entries without an id are added, entries with an id update the
    /// matching stop, and `deleted` entries are removed. An edit
    /// naming a stop this calendar does not have is rejected before
    /// any change is applied.
    pub async fn update_calendar(
        &self,
        calendar_id: &str,
        requester_id: &str,
        request: EditCalendarRequest,
    ) -> Result<CalendarResponse> {
        request.validate()?;
        let calendar = self.fetch_owned(calendar_id, requester_id)?;

        for edit in &request.travels {
            if let Some(id) = &edit.id {
                if !calendar.stops.iter().any(|s| &s.id == id) {
                    return Err(AppError::not_found("Travel stop", id));
                }
            }
        }

        let updated = self.store.update_calendar(calendar_id, |calendar| {
            calendar.title = request.title;
            calendar.start_date = request.start_date;
            calendar.end_date = request.end_date;
            calendar.area = request.area;

            for edit in request.travels {
                match edit.id {
                    Some(id) if edit.deleted => {
                        calendar.stops.retain(|s| s.id != id);
                    }
                    Some(id) => {
                        if let Some(stop) = calendar.stops.iter_mut().find(|s| s.id == id) {
                            stop.location_name = edit.location_name;
                            stop.latitude = edit.latitude;
                            stop.longitude = edit.longitude;
                            stop.memo = edit.memo;
                            stop.day = edit.day;
                            stop.order = edit.order;
                        }
                    }
                    None => {
                        calendar.stops.push(TravelStop {
                            id: Store::next_id(),
                            location_name: edit.location_name,
                            latitude: edit.latitude,
                            longitude: edit.longitude,
                            memo: edit.memo,
                            day: edit.day,
                            order: edit.order,
                        });
                    }
                }
            }
        });

        let updated = updated.ok_or_else(|| AppError::not_found("Calendar", calendar_id))?;
        Ok(CalendarResponse::from(&updated))
    }

    pub async fn delete_calendar(&self, calendar_id: &str, requester_id: &str) -> Result<()> {
        self.fetch_owned(calendar_id, requester_id)?;
        info!("Deleting calendar {}", calendar_id);
        self.store.delete_calendar(calendar_id);
        Ok(())
    }

    /// Bulk delete. Every id must name an existing calendar owned by
    /// the requester, otherwise nothing is deleted.
    pub async fn delete_calendars(&self, requester_id: &str, calendar_ids: &[String]) -> Result<()> {
        for id in calendar_ids {
            self.fetch_owned(id, requester_id)?;
        }
        for id in calendar_ids {
            self.store.delete_calendar(id);
        }
        info!("Member {} deleted {} calendars", requester_id, calendar_ids.len());
        Ok(())
    }

    fn fetch_owned(&self, calendar_id: &str, requester_id: &str) -> Result<Calendar> {
        if !self.store.member_exists(requester_id) {
            return Err(AppError::not_found("Member", requester_id));
        }
        let calendar = self
            .store
            .get_calendar(calendar_id)
            .ok_or_else(|| AppError::not_found("Calendar", calendar_id))?;
        if calendar.author_id != requester_id {
            return Err(AppError::Unauthorized(format!(
                "member {} is not the author of calendar {}",
                requester_id, calendar_id
            )));
        }
        Ok(calendar)
    }
}
