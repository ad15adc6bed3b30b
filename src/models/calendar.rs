use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::review::Area;

/// A trip itinerary: scalar fields plus the ordered stops the member
/// plans to visit. Stops live inside the calendar record and are
/// removed with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Calendar {
    pub id: String,
    pub author_id: String,
    pub title: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub area: Area,
    pub stops: Vec<TravelStop>,
    pub created_at: DateTime<Utc>,
}

/// One planned stop: where, which day of the trip, and its position
/// within that day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelStop {
    pub id: String,
    pub location_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub memo: Option<String>,
    pub day: i32,
    pub order: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewTravelStop {
    #[validate(length(min = 1, max = 100))]
    pub location_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub memo: Option<String>,
    pub day: i32,
    pub order: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateCalendarRequest {
    #[validate(length(min = 1, max = 100))]
    pub title: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub area: Area,
    #[serde(default)]
    #[validate]
    pub travels: Vec<NewTravelStop>,
}

/// Edit payload covering the scalar fields and a stop delta list: an
/// entry without an id adds a stop, an entry with an id updates the
/// matching stop, and `deleted: true` removes it.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EditCalendarRequest {
    #[validate(length(min = 1, max = 100))]
    pub title: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub area: Area,
    #[serde(default)]
    #[validate]
    pub travels: Vec<TravelStopEdit>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TravelStopEdit {
    pub id: Option<String>,
    #[serde(default)]
    pub deleted: bool,
    #[validate(length(min = 1, max = 100))]
    pub location_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub memo: Option<String>,
    pub day: i32,
    pub order: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteCalendarsRequest {
    pub calendar_ids: Vec<String>,
}

/// Detail view; stops come back sorted by day, then order within the
/// day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarResponse {
    pub id: String,
    pub author_id: String,
    pub title: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub area: Area,
    pub stops: Vec<TravelStop>,
    pub created_at: DateTime<Utc>,
}

impl From<&Calendar> for CalendarResponse {
    fn from(calendar: &Calendar) -> Self {
        let mut stops = calendar.stops.clone();
        stops.sort_by(|a, b| a.day.cmp(&b.day).then_with(|| a.order.cmp(&b.order)));

        CalendarResponse {
            id: calendar.id.clone(),
            author_id: calendar.author_id.clone(),
            title: calendar.title.clone(),
            start_date: calendar.start_date,
            end_date: calendar.end_date,
            area: calendar.area,
            stops,
            created_at: calendar.created_at,
        }
    }
}

/// Summary row for calendar listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarListResponse {
    pub id: String,
    pub title: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub area: Area,
    pub created_at: DateTime<Utc>,
}

impl From<&Calendar> for CalendarListResponse {
    fn from(calendar: &Calendar) -> Self {
        CalendarListResponse {
            id: calendar.id.clone(),
            title: calendar.title.clone(),
            start_date: calendar.start_date,
            end_date: calendar.end_date,
            area: calendar.area,
            created_at: calendar.created_at,
        }
    }
}
