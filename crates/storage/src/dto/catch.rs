use std::borrow::Cow;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

use super::common::{PaginationMeta, PaginationParams};
use crate::models::Catch;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Orderings the list view can be sorted by. Each maps to a fixed ORDER BY clause.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    DateDesc,
    DateAsc,
    Species,
    WeightDesc,
}

impl SortOrder {
    pub const ALL: [SortOrder; 4] = [
        SortOrder::DateDesc,
        SortOrder::DateAsc,
        SortOrder::Species,
        SortOrder::WeightDesc,
    ];

    /// Unknown or missing values fall back to newest first.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("date_asc") => Self::DateAsc,
            Some("species") => Self::Species,
            Some("weight_desc") => Self::WeightDesc,
            _ => Self::DateDesc,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DateDesc => "date_desc",
            Self::DateAsc => "date_asc",
            Self::Species => "species",
            Self::WeightDesc => "weight_desc",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::DateDesc => "Newest first",
            Self::DateAsc => "Oldest first",
            Self::Species => "Species",
            Self::WeightDesc => "Heaviest first",
        }
    }

    pub fn order_clause(&self) -> &'static str {
        match self {
            Self::DateDesc => " ORDER BY catch_date DESC, id DESC",
            Self::DateAsc => " ORDER BY catch_date ASC, id ASC",
            Self::Species => " ORDER BY species ASC, id ASC",
            Self::WeightDesc => " ORDER BY weight_lbs DESC NULLS LAST, id ASC",
        }
    }
}

/// Escapes LIKE wildcards so the search text only ever matches literally.
pub fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// `ILIKE` pattern matching `search` anywhere in the column.
pub fn search_pattern(search: &str) -> String {
    format!("%{}%", escape_like(search))
}

/// Raw query string of the list view.
#[derive(Debug, Default, Deserialize)]
pub struct CatchListQuery {
    pub page: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
    pub page_size: Option<String>,
}

impl CatchListQuery {
    pub fn page(&self) -> Result<i64, String> {
        Ok(parse_int_param("page", self.page.as_deref())?.unwrap_or(1))
    }

    pub fn page_size(&self) -> Result<Option<i64>, String> {
        parse_int_param("page_size", self.page_size.as_deref())
    }

    pub fn search(&self) -> &str {
        self.search.as_deref().unwrap_or_default()
    }

    pub fn sort(&self) -> SortOrder {
        SortOrder::parse(self.sort.as_deref())
    }
}

fn parse_int_param(name: &str, raw: Option<&str>) -> Result<Option<i64>, String> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| format!("{name} must be an integer")),
    }
}

#[derive(Debug, Clone)]
pub struct CatchListFilter {
    pub search: String,
    pub sort: SortOrder,
    pub pagination: PaginationParams,
}

impl CatchListFilter {
    pub fn validate(&self) -> Result<(), String> {
        self.pagination.validate()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CatchListPage {
    pub catches: Vec<Catch>,
    pub pagination: PaginationMeta,
    /// Number of records matching the active search.
    pub total_records: i64,
    pub avg_weight: Decimal,
    pub max_weight: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MostCommonSpecies {
    pub species: String,
    pub count: i64,
}

impl Default for MostCommonSpecies {
    fn default() -> Self {
        Self {
            species: "N/A".to_string(),
            count: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct BiggestFish {
    pub id: i32,
    pub species: String,
    pub weight_lbs: Option<Decimal>,
    pub length_in: Option<Decimal>,
    pub catch_date: NaiveDate,
    pub image_url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CatchStats {
    pub total_records: i64,
    pub most_common: MostCommonSpecies,
    pub avg_weight: Decimal,
    pub biggest_fish: Option<BiggestFish>,
}

/// Form fields exactly as submitted. Everything is optional text until parsed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatchForm {
    pub species: Option<String>,
    pub location: Option<String>,
    pub catch_date: Option<String>,
    pub weight_lbs: Option<String>,
    pub length_in: Option<String>,
    pub notes: Option<String>,
    pub image_url: Option<String>,
}

impl From<&Catch> for CatchForm {
    fn from(catch: &Catch) -> Self {
        Self {
            species: Some(catch.species.clone()),
            location: Some(catch.location.clone()),
            catch_date: Some(catch.catch_date.format(DATE_FORMAT).to_string()),
            weight_lbs: catch.weight_lbs.map(|w| w.to_string()),
            length_in: catch.length_in.map(|l| l.to_string()),
            notes: catch.notes.clone(),
            image_url: Some(catch.image_url.clone()),
        }
    }
}

impl CatchForm {
    /// Turns the submitted text into a typed record, or reports every bad field.
    pub fn parse(&self) -> Result<CatchInput, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let species = required(&mut errors, "species", &self.species);
        let location = required(&mut errors, "location", &self.location);
        let image_url = required(&mut errors, "image_url", &self.image_url);

        let catch_date = required(&mut errors, "catch_date", &self.catch_date).and_then(|raw| {
            match NaiveDate::parse_from_str(&raw, DATE_FORMAT) {
                Ok(date) => Some(date),
                Err(_) => {
                    errors.add(
                        "catch_date",
                        field_error("invalid_date", "Catch date must be a date (YYYY-MM-DD)"),
                    );
                    None
                }
            }
        });

        let weight_lbs = optional_decimal(&mut errors, "weight_lbs", &self.weight_lbs);
        let length_in = optional_decimal(&mut errors, "length_in", &self.length_in);
        let notes = non_blank(&self.notes);

        let (
            Some(species),
            Some(location),
            Some(catch_date),
            Some(image_url),
            Ok(weight_lbs),
            Ok(length_in),
        ) = (species, location, catch_date, image_url, weight_lbs, length_in)
        else {
            return Err(errors);
        };

        let input = CatchInput {
            species,
            location,
            catch_date,
            weight_lbs,
            length_in,
            notes,
            image_url,
        };
        input.validate()?;

        Ok(input)
    }
}

/// A fully parsed set of mutable catch fields, ready to be written.
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct CatchInput {
    #[validate(length(max = 255, code = "too_long", message = "Species must be at most 255 characters"))]
    pub species: String,

    #[validate(length(max = 255, code = "too_long", message = "Location must be at most 255 characters"))]
    pub location: String,

    pub catch_date: NaiveDate,

    #[validate(custom(function = "validate_measurement"))]
    pub weight_lbs: Option<Decimal>,

    #[validate(custom(function = "validate_measurement"))]
    pub length_in: Option<Decimal>,

    pub notes: Option<String>,

    #[validate(length(max = 500, code = "too_long", message = "Image URL must be at most 500 characters"))]
    pub image_url: String,
}

/// Measurements are stored as NUMERIC(8, 2).
fn validate_measurement(value: &Decimal) -> Result<(), ValidationError> {
    if *value < Decimal::ZERO {
        return Err(field_error("negative", "Must not be negative"));
    }
    if *value >= Decimal::from(1_000_000) {
        return Err(field_error("too_large", "Must be less than 1000000"));
    }
    Ok(())
}

fn field_error(code: &'static str, message: impl Into<Cow<'static, str>>) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    error
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

fn required(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: &Option<String>,
) -> Option<String> {
    let value = non_blank(value);
    if value.is_none() {
        errors.add(field, field_error("required", "This field is required"));
    }
    value
}

fn optional_decimal(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: &Option<String>,
) -> Result<Option<Decimal>, ()> {
    let Some(raw) = non_blank(value) else {
        return Ok(None);
    };

    Decimal::from_str(&raw).map(Some).map_err(|_| {
        errors.add(field, field_error("invalid_number", "Must be a number"));
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_form() -> CatchForm {
        CatchForm {
            species: Some("Largemouth Bass".to_string()),
            location: Some("Lake Travis".to_string()),
            catch_date: Some("2024-05-18".to_string()),
            weight_lbs: Some("4.25".to_string()),
            length_in: Some("18".to_string()),
            notes: Some("Caught on a spinnerbait".to_string()),
            image_url: Some("https://example.com/bass.jpg".to_string()),
        }
    }

    fn error_codes(errors: &ValidationErrors, field: &str) -> Vec<String> {
        errors
            .field_errors()
            .get(field)
            .map(|errs| errs.iter().map(|e| e.code.to_string()).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_parse_valid_form() {
        let input = valid_form().parse().unwrap();
        assert_eq!(input.species, "Largemouth Bass");
        assert_eq!(input.catch_date, NaiveDate::from_ymd_opt(2024, 5, 18).unwrap());
        assert_eq!(input.weight_lbs, Some(Decimal::new(425, 2)));
        assert_eq!(input.length_in, Some(Decimal::from(18)));
        assert_eq!(input.notes.as_deref(), Some("Caught on a spinnerbait"));
    }

    #[test]
    fn test_parse_trims_text() {
        let form = CatchForm {
            species: Some("  Walleye ".to_string()),
            ..valid_form()
        };
        assert_eq!(form.parse().unwrap().species, "Walleye");
    }

    #[test]
    fn test_blank_optional_fields_become_null() {
        let form = CatchForm {
            weight_lbs: Some("".to_string()),
            length_in: Some("   ".to_string()),
            notes: Some("".to_string()),
            ..valid_form()
        };
        let input = form.parse().unwrap();
        assert_eq!(input.weight_lbs, None);
        assert_eq!(input.length_in, None);
        assert_eq!(input.notes, None);
    }

    #[test]
    fn test_missing_required_fields_are_all_reported() {
        let errors = CatchForm::default().parse().unwrap_err();
        for field in ["species", "location", "catch_date", "image_url"] {
            assert_eq!(error_codes(&errors, field), vec!["required"], "{field}");
        }
        assert!(error_codes(&errors, "weight_lbs").is_empty());
    }

    #[test]
    fn test_blank_required_field_is_missing() {
        let form = CatchForm {
            location: Some("   ".to_string()),
            ..valid_form()
        };
        let errors = form.parse().unwrap_err();
        assert_eq!(error_codes(&errors, "location"), vec!["required"]);
    }

    #[test]
    fn test_malformed_date_and_numbers() {
        let form = CatchForm {
            catch_date: Some("18/05/2024".to_string()),
            weight_lbs: Some("heavy".to_string()),
            length_in: Some("12in".to_string()),
            ..valid_form()
        };
        let errors = form.parse().unwrap_err();
        assert_eq!(error_codes(&errors, "catch_date"), vec!["invalid_date"]);
        assert_eq!(error_codes(&errors, "weight_lbs"), vec!["invalid_number"]);
        assert_eq!(error_codes(&errors, "length_in"), vec!["invalid_number"]);
    }

    #[test]
    fn test_negative_measurements_rejected() {
        let form = CatchForm {
            weight_lbs: Some("-1.5".to_string()),
            ..valid_form()
        };
        let errors = form.parse().unwrap_err();
        assert_eq!(error_codes(&errors, "weight_lbs"), vec!["negative"]);
    }

    #[test]
    fn test_oversized_measurement_rejected() {
        let form = CatchForm {
            length_in: Some("1000000".to_string()),
            ..valid_form()
        };
        let errors = form.parse().unwrap_err();
        assert_eq!(error_codes(&errors, "length_in"), vec!["too_large"]);
    }

    #[test]
    fn test_zero_weight_allowed() {
        let form = CatchForm {
            weight_lbs: Some("0".to_string()),
            ..valid_form()
        };
        assert_eq!(form.parse().unwrap().weight_lbs, Some(Decimal::ZERO));
    }

    #[test]
    fn test_overlong_species_rejected() {
        let form = CatchForm {
            species: Some("x".repeat(256)),
            image_url: Some(format!("https://example.com/{}", "x".repeat(500))),
            ..valid_form()
        };
        let errors = form.parse().unwrap_err();
        assert_eq!(error_codes(&errors, "species"), vec!["too_long"]);
        assert_eq!(error_codes(&errors, "image_url"), vec!["too_long"]);
        assert!(error_codes(&errors, "location").is_empty());
    }

    #[test]
    fn test_form_from_catch_round_trips_date() {
        let input = valid_form().parse().unwrap();
        let catch = Catch {
            id: 7,
            species: input.species,
            location: input.location,
            catch_date: input.catch_date,
            weight_lbs: input.weight_lbs,
            length_in: None,
            notes: None,
            image_url: input.image_url,
            created_at: chrono::NaiveDateTime::default(),
            updated_at: chrono::NaiveDateTime::default(),
        };
        let form = CatchForm::from(&catch);
        assert_eq!(form.catch_date.as_deref(), Some("2024-05-18"));
        assert_eq!(form.weight_lbs.as_deref(), Some("4.25"));
        assert_eq!(form.length_in, None);
    }

    #[test]
    fn test_sort_order_parse_falls_back() {
        assert_eq!(SortOrder::parse(None), SortOrder::DateDesc);
        assert_eq!(SortOrder::parse(Some("date_asc")), SortOrder::DateAsc);
        assert_eq!(SortOrder::parse(Some("species")), SortOrder::Species);
        assert_eq!(SortOrder::parse(Some("weight_desc")), SortOrder::WeightDesc);
        assert_eq!(SortOrder::parse(Some("id; DROP TABLE catches")), SortOrder::DateDesc);
    }

    #[test]
    fn test_sort_order_round_trips_through_str() {
        for order in SortOrder::ALL {
            assert_eq!(SortOrder::parse(Some(order.as_str())), order);
        }
    }

    #[test]
    fn test_weight_sort_puts_nulls_last() {
        assert!(SortOrder::WeightDesc.order_clause().contains("weight_lbs DESC NULLS LAST"));
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("bass"), "bass");
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b\\c"), "a\\_b\\\\c");
        assert_eq!(search_pattern(""), "%%");
        assert_eq!(search_pattern("pike"), "%pike%");
    }

    #[test]
    fn test_list_query_defaults() {
        let query = CatchListQuery::default();
        assert_eq!(query.page(), Ok(1));
        assert_eq!(query.page_size(), Ok(None));
        assert_eq!(query.search(), "");
        assert_eq!(query.sort(), SortOrder::DateDesc);
    }

    #[test]
    fn test_list_query_blank_page_size_is_absent() {
        let query = CatchListQuery {
            page_size: Some("".to_string()),
            ..Default::default()
        };
        assert_eq!(query.page_size(), Ok(None));
    }

    #[test]
    fn test_list_query_rejects_non_numeric_page() {
        let query = CatchListQuery {
            page: Some("two".to_string()),
            ..Default::default()
        };
        assert!(query.page().is_err());
    }
}
