//! PostgreSQL quote store

use super::{QuoteContents, QuoteStore, RevisionChange, StoreError, StoreResult};
use crate::allocator::{format_quote_number, next_daily_seq};
use crate::token::PublicToken;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use shared::models::{Quote, QuoteLine, QuoteStatus};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgConnection, PgPool};

const QUOTE_COLUMNS: &str = "id, quote_number, quote_date, daily_seq, status, revision, email, \
     company, reference, notes, subtotal_ex_vat, privacy_acknowledged, privacy_acknowledged_at, \
     public_token, public_token_expires_at, issued_at, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct PgQuoteStore {
    pool: PgPool,
}

impl PgQuoteStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect with a bounded pool
    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Apply pending migrations
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl QuoteStore for PgQuoteStore {
    async fn insert_next_in_day(
        &self,
        quote_date: NaiveDate,
        contents: &QuoteContents,
    ) -> StoreResult<Quote> {
        let mut tx = self.pool.begin().await?;

        let current_max: Option<i32> =
            sqlx::query_scalar("SELECT MAX(daily_seq) FROM quotes WHERE quote_date = $1")
                .bind(quote_date)
                .fetch_one(&mut *tx)
                .await?;
        let daily_seq =
            next_daily_seq(current_max).ok_or(StoreError::SequenceExhausted(quote_date))?;
        let quote_number = format_quote_number(quote_date, daily_seq);

        let quote_id: i64 = sqlx::query_scalar(
            "INSERT INTO quotes (quote_number, quote_date, daily_seq, status, revision, email, \
             company, reference, notes, subtotal_ex_vat, privacy_acknowledged, \
             privacy_acknowledged_at, created_at, updated_at) \
             VALUES ($1, $2, $3, 'draft', 0, $4, $5, $6, $7, $8, $9, $10, $11, $11) \
             RETURNING id",
        )
        .bind(&quote_number)
        .bind(quote_date)
        .bind(daily_seq)
        .bind(&contents.email)
        .bind(&contents.company)
        .bind(&contents.reference)
        .bind(&contents.notes)
        .bind(contents.subtotal_ex_vat)
        .bind(contents.privacy_acknowledged)
        .bind(contents.privacy_acknowledged_at)
        .bind(contents.written_at)
        .fetch_one(&mut *tx)
        .await?;

        insert_lines(&mut tx, quote_id, &contents.lines).await?;
        let quote = load(&mut tx, &quote_number)
            .await?
            .ok_or_else(|| StoreError::NotFound(quote_number.clone()))?;
        tx.commit().await?;

        tracing::debug!(quote_number = %quote_number, daily_seq, "Quote row inserted");
        Ok(quote)
    }

    async fn find_by_number(&self, quote_number: &str) -> StoreResult<Option<Quote>> {
        let mut conn = self.pool.acquire().await?;
        load(&mut conn, quote_number).await
    }

    async fn replace_contents(
        &self,
        quote_number: &str,
        contents: &QuoteContents,
    ) -> StoreResult<Quote> {
        let mut tx = self.pool.begin().await?;

        let quote_id: Option<i64> = sqlx::query_scalar(
            "UPDATE quotes SET email = $2, company = $3, reference = $4, notes = $5, \
             subtotal_ex_vat = $6, privacy_acknowledged = $7, privacy_acknowledged_at = $8, \
             updated_at = $9 \
             WHERE quote_number = $1 RETURNING id",
        )
        .bind(quote_number)
        .bind(&contents.email)
        .bind(&contents.company)
        .bind(&contents.reference)
        .bind(&contents.notes)
        .bind(contents.subtotal_ex_vat)
        .bind(contents.privacy_acknowledged)
        .bind(contents.privacy_acknowledged_at)
        .bind(contents.written_at)
        .fetch_optional(&mut *tx)
        .await?;
        let quote_id = quote_id.ok_or_else(|| StoreError::NotFound(quote_number.to_string()))?;

        sqlx::query("DELETE FROM quote_lines WHERE quote_id = $1")
            .bind(quote_id)
            .execute(&mut *tx)
            .await?;
        insert_lines(&mut tx, quote_id, &contents.lines).await?;

        let quote = load(&mut tx, quote_number)
            .await?
            .ok_or_else(|| StoreError::NotFound(quote_number.to_string()))?;
        tx.commit().await?;
        Ok(quote)
    }

    async fn mark_issued(
        &self,
        quote_number: &str,
        issued_at: DateTime<Utc>,
        revision: RevisionChange,
    ) -> StoreResult<Quote> {
        let (explicit, increment) = match revision {
            RevisionChange::Keep => (None, false),
            RevisionChange::Set(revision) => (Some(revision), false),
            RevisionChange::Increment => (None, true),
        };
        let mut conn = self.pool.acquire().await?;
        let updated = sqlx::query(
            "UPDATE quotes SET status = 'issued', issued_at = $2, \
             revision = CASE WHEN $4 THEN revision + 1 ELSE COALESCE($3, revision) END, \
             updated_at = $2 \
             WHERE quote_number = $1",
        )
        .bind(quote_number)
        .bind(issued_at)
        .bind(explicit)
        .bind(increment)
        .execute(&mut *conn)
        .await?;
        if updated.rows_affected() == 0 {
            return Err(StoreError::NotFound(quote_number.to_string()));
        }
        load(&mut conn, quote_number)
            .await?
            .ok_or_else(|| StoreError::NotFound(quote_number.to_string()))
    }

    async fn set_public_token(
        &self,
        quote_number: &str,
        token: &PublicToken,
    ) -> StoreResult<Quote> {
        let mut conn = self.pool.acquire().await?;
        let updated = sqlx::query(
            "UPDATE quotes SET public_token = $2, public_token_expires_at = $3 \
             WHERE quote_number = $1",
        )
        .bind(quote_number)
        .bind(&token.value)
        .bind(token.expires_at)
        .execute(&mut *conn)
        .await?;
        if updated.rows_affected() == 0 {
            return Err(StoreError::NotFound(quote_number.to_string()));
        }
        load(&mut conn, quote_number)
            .await?
            .ok_or_else(|| StoreError::NotFound(quote_number.to_string()))
    }
}

async fn insert_lines(
    conn: &mut PgConnection,
    quote_id: i64,
    lines: &[QuoteLine],
) -> StoreResult<()> {
    for line in lines {
        sqlx::query(
            "INSERT INTO quote_lines (quote_id, position, sku, name, qty, \
             unit_price_ex_vat, line_total_ex_vat) VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(quote_id)
        .bind(line.position)
        .bind(&line.sku)
        .bind(&line.name)
        .bind(line.qty)
        .bind(line.unit_price_ex_vat)
        .bind(line.line_total_ex_vat)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

async fn load(conn: &mut PgConnection, quote_number: &str) -> StoreResult<Option<Quote>> {
    let row: Option<QuoteRow> = sqlx::query_as(&format!(
        "SELECT {QUOTE_COLUMNS} FROM quotes WHERE quote_number = $1"
    ))
    .bind(quote_number)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let lines: Vec<QuoteLineRow> = sqlx::query_as(
        "SELECT position, sku, name, qty, unit_price_ex_vat, line_total_ex_vat \
         FROM quote_lines WHERE quote_id = $1 ORDER BY position",
    )
    .bind(row.id)
    .fetch_all(&mut *conn)
    .await?;

    row.into_quote(lines).map(Some)
}

#[derive(sqlx::FromRow)]
struct QuoteRow {
    id: i64,
    quote_number: String,
    quote_date: NaiveDate,
    daily_seq: i32,
    status: String,
    revision: i32,
    email: String,
    company: Option<String>,
    reference: Option<String>,
    notes: Option<String>,
    subtotal_ex_vat: Decimal,
    privacy_acknowledged: bool,
    privacy_acknowledged_at: Option<DateTime<Utc>>,
    public_token: Option<String>,
    public_token_expires_at: Option<DateTime<Utc>>,
    issued_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct QuoteLineRow {
    position: i32,
    sku: String,
    name: String,
    qty: i32,
    unit_price_ex_vat: Decimal,
    line_total_ex_vat: Decimal,
}

impl QuoteRow {
    fn into_quote(self, lines: Vec<QuoteLineRow>) -> StoreResult<Quote> {
        let status: QuoteStatus = self
            .status
            .parse()
            .map_err(|e: String| StoreError::Corrupt(format!("{}: {e}", self.quote_number)))?;

        Ok(Quote {
            id: self.id,
            quote_number: self.quote_number,
            quote_date: self.quote_date,
            daily_seq: self.daily_seq,
            status,
            revision: self.revision,
            email: self.email,
            company: self.company,
            reference: self.reference,
            notes: self.notes,
            subtotal_ex_vat: self.subtotal_ex_vat,
            privacy_acknowledged: self.privacy_acknowledged,
            privacy_acknowledged_at: self.privacy_acknowledged_at,
            public_token: self.public_token,
            public_token_expires_at: self.public_token_expires_at,
            issued_at: self.issued_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
            lines: lines
                .into_iter()
                .map(|l| QuoteLine {
                    position: l.position,
                    sku: l.sku,
                    name: l.name,
                    qty: l.qty,
                    unit_price_ex_vat: l.unit_price_ex_vat,
                    line_total_ex_vat: l.line_total_ex_vat,
                })
                .collect(),
        })
    }
}
