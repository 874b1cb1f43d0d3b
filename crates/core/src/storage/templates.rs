use crate::domain::template::{NewTemplate, StoredEntry, TemplateRow};
use anyhow::Context;
use rust_decimal::Decimal;

#[async_trait::async_trait]
pub trait TemplateStore: Send + Sync {
    async fn fetch_templates(&self, owner_id: i64) -> anyhow::Result<Vec<TemplateRow>>;

    async fn fetch_entries(&self, owner_id: i64) -> anyhow::Result<Vec<StoredEntry>>;

    async fn insert_template(&self, owner_id: i64, template: &NewTemplate) -> anyhow::Result<i64>;

    /// Returns `false` when no template has this id.
    async fn update_template(&self, id: i64, template: &NewTemplate) -> anyhow::Result<bool>;

    async fn delete_template(&self, id: i64) -> anyhow::Result<bool>;
}

#[derive(Debug, Clone)]
pub struct PgTemplateStore {
    pool: sqlx::PgPool,
}

impl PgTemplateStore {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

type EntryRecord = (i64, i64, String, Decimal, Option<String>, String);

#[async_trait::async_trait]
impl TemplateStore for PgTemplateStore {
    async fn fetch_templates(&self, owner_id: i64) -> anyhow::Result<Vec<TemplateRow>> {
        let rows = sqlx::query_as::<_, (String, Decimal, Option<String>, String)>(
            "SELECT description, amount, frequency, start_date \
             FROM budget_templates \
             WHERE owner_id = $1 \
             ORDER BY id ASC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("select budget_templates failed (owner_id={owner_id})"))?;

        tracing::debug!(owner_id, rows = rows.len(), "fetched budget templates");

        Ok(rows
            .into_iter()
            .map(|(description, amount, frequency, start_date)| TemplateRow {
                description,
                amount,
                frequency,
                start_date,
            })
            .collect())
    }

    async fn fetch_entries(&self, owner_id: i64) -> anyhow::Result<Vec<StoredEntry>> {
        let rows = sqlx::query_as::<_, EntryRecord>(
            "SELECT id, owner_id, description, amount, frequency, start_date \
             FROM budget_templates \
             WHERE owner_id = $1 \
             ORDER BY id ASC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("select budget entries failed (owner_id={owner_id})"))?;

        Ok(rows
            .into_iter()
            .map(
                |(id, owner_id, description, amount, frequency, start_date)| StoredEntry {
                    id,
                    owner_id,
                    row: TemplateRow {
                        description,
                        amount,
                        frequency,
                        start_date,
                    },
                },
            )
            .collect())
    }

    async fn insert_template(&self, owner_id: i64, template: &NewTemplate) -> anyhow::Result<i64> {
        let row = template.to_row();
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO budget_templates (owner_id, description, amount, frequency, start_date) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id",
        )
        .bind(owner_id)
        .bind(&row.description)
        .bind(row.amount)
        .bind(&row.frequency)
        .bind(&row.start_date)
        .fetch_one(&self.pool)
        .await
        .context("insert budget_templates failed")?;

        Ok(id)
    }

    async fn update_template(&self, id: i64, template: &NewTemplate) -> anyhow::Result<bool> {
        let row = template.to_row();
        let res = sqlx::query(
            "UPDATE budget_templates \
             SET description = $2, amount = $3, frequency = $4, start_date = $5, updated_at = now() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(&row.description)
        .bind(row.amount)
        .bind(&row.frequency)
        .bind(&row.start_date)
        .execute(&self.pool)
        .await
        .with_context(|| format!("update budget_templates failed (id={id})"))?;

        Ok(res.rows_affected() > 0)
    }

    async fn delete_template(&self, id: i64) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM budget_templates WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("delete budget_templates failed (id={id})"))?;

        Ok(res.rows_affected() > 0)
    }
}
