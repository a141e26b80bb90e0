use rust_decimal::Decimal;
use sqlx::{PgConnection, Postgres, QueryBuilder};

use crate::dto::catch::{BiggestFish, CatchInput, CatchListFilter, MostCommonSpecies, search_pattern};
use crate::error::{Result, StorageError};
use crate::models::Catch;

/// Repository for catch records. Borrows a single connection (or transaction)
/// for the duration of one unit of work.
pub struct CatchRepository<'a> {
    conn: &'a mut PgConnection,
}

impl<'a> CatchRepository<'a> {
    pub fn new(conn: &'a mut PgConnection) -> Self {
        Self { conn }
    }

    /// One page of records matching the filter, plus how many match in total.
    pub async fn list(&mut self, filter: &CatchListFilter) -> Result<(Vec<Catch>, i64)> {
        let pattern = search_pattern(&filter.search);

        let total_items = self.count_matching(&pattern).await?;

        let mut query = QueryBuilder::<Postgres>::new(
            r#"
            SELECT id, species, location, catch_date, weight_lbs, length_in,
                   notes, image_url, created_at, updated_at
            FROM catches
            WHERE species ILIKE
            "#,
        );
        query.push_bind(&pattern);
        query.push(" OR location ILIKE ");
        query.push_bind(&pattern);
        query.push(filter.sort.order_clause());
        query.push(" LIMIT ");
        query.push_bind(filter.pagination.limit());
        query.push(" OFFSET ");
        query.push_bind(filter.pagination.offset());

        let catches: Vec<Catch> = query.build_query_as().fetch_all(&mut *self.conn).await?;

        Ok((catches, total_items))
    }

    async fn count_matching(&mut self, pattern: &str) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM catches WHERE species ILIKE $1 OR location ILIKE $1",
        )
        .bind(pattern)
        .fetch_one(&mut *self.conn)
        .await?;

        Ok(count)
    }

    pub async fn count(&mut self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM catches")
            .fetch_one(&mut *self.conn)
            .await?;

        Ok(count)
    }

    /// Mean of all recorded weights rounded to two places, 0 when there are none.
    pub async fn average_weight(&mut self) -> Result<Decimal> {
        let avg = sqlx::query_scalar::<_, Decimal>(
            "SELECT COALESCE(ROUND(AVG(weight_lbs), 2), 0) FROM catches",
        )
        .fetch_one(&mut *self.conn)
        .await?;

        Ok(avg)
    }

    pub async fn max_weight(&mut self) -> Result<Decimal> {
        let max = sqlx::query_scalar::<_, Decimal>("SELECT COALESCE(MAX(weight_lbs), 0) FROM catches")
            .fetch_one(&mut *self.conn)
            .await?;

        Ok(max)
    }

    pub async fn most_common_species(&mut self) -> Result<Option<MostCommonSpecies>> {
        let row = sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT species, COUNT(*)
            FROM catches
            GROUP BY species
            ORDER BY COUNT(*) DESC, species ASC
            LIMIT 1
            "#,
        )
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(row.map(|(species, count)| MostCommonSpecies { species, count }))
    }

    /// Heaviest catch, then longest. Missing measurements count as zero.
    pub async fn biggest_fish(&mut self) -> Result<Option<BiggestFish>> {
        let fish = sqlx::query_as::<_, BiggestFish>(
            r#"
            SELECT id, species, weight_lbs, length_in, catch_date, image_url
            FROM catches
            WHERE weight_lbs IS NOT NULL OR length_in IS NOT NULL
            ORDER BY
                COALESCE(weight_lbs, 0) DESC,
                COALESCE(length_in, 0) DESC,
                id ASC
            LIMIT 1
            "#,
        )
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(fish)
    }

    pub async fn find_by_id(&mut self, id: i32) -> Result<Catch> {
        let catch = sqlx::query_as::<_, Catch>(
            r#"
            SELECT id, species, location, catch_date, weight_lbs, length_in,
                   notes, image_url, created_at, updated_at
            FROM catches
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.conn)
        .await?
        .ok_or(StorageError::NotFound)?;

        Ok(catch)
    }

    pub async fn create(&mut self, input: &CatchInput) -> Result<Catch> {
        let catch = sqlx::query_as::<_, Catch>(
            r#"
            INSERT INTO catches (species, location, catch_date, weight_lbs, length_in, notes, image_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, species, location, catch_date, weight_lbs, length_in,
                      notes, image_url, created_at, updated_at
            "#,
        )
        .bind(&input.species)
        .bind(&input.location)
        .bind(input.catch_date)
        .bind(input.weight_lbs)
        .bind(input.length_in)
        .bind(&input.notes)
        .bind(&input.image_url)
        .fetch_one(&mut *self.conn)
        .await?;

        Ok(catch)
    }

    /// Replaces every mutable field and stamps `updated_at`.
    pub async fn update(&mut self, id: i32, input: &CatchInput) -> Result<Catch> {
        let catch = sqlx::query_as::<_, Catch>(
            r#"
            UPDATE catches
            SET species = $2,
                location = $3,
                catch_date = $4,
                weight_lbs = $5,
                length_in = $6,
                notes = $7,
                image_url = $8,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $1
            RETURNING id, species, location, catch_date, weight_lbs, length_in,
                      notes, image_url, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&input.species)
        .bind(&input.location)
        .bind(input.catch_date)
        .bind(input.weight_lbs)
        .bind(input.length_in)
        .bind(&input.notes)
        .bind(&input.image_url)
        .fetch_optional(&mut *self.conn)
        .await?
        .ok_or(StorageError::NotFound)?;

        Ok(catch)
    }

    /// Deletes by id. Returns whether a row was removed; a missing id is not an error.
    pub async fn delete(&mut self, id: i32) -> Result<bool> {
        let result = sqlx::query("DELETE FROM catches WHERE id = $1")
            .bind(id)
            .execute(&mut *self.conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
