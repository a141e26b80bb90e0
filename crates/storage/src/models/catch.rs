use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Catch {
    pub id: i32,
    pub species: String,
    pub location: String,
    pub catch_date: NaiveDate,
    pub weight_lbs: Option<Decimal>,
    pub length_in: Option<Decimal>,
    pub notes: Option<String>,
    pub image_url: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
