use crate::domain::template::{EntryInput, StoredEntry};
use crate::projection::{expand_with, ExpandOptions, MonthView};
use crate::storage::TemplateStore;
use crate::time::calendar::YearMonth;
use chrono::NaiveDate;

/// Budget operations for one store. Validation failures surface as
/// [`crate::domain::error::ValidationError`] inside the returned `anyhow::Error`.
pub struct BudgetService<S> {
    store: S,
    opts: ExpandOptions,
}

impl<S: TemplateStore> BudgetService<S> {
    pub fn new(store: S, opts: ExpandOptions) -> Self {
        Self { store, opts }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn add_entry(&self, owner_id: i64, input: EntryInput) -> anyhow::Result<i64> {
        let template = input.validate()?;
        let id = self.store.insert_template(owner_id, &template).await?;
        tracing::info!(
            owner_id,
            id,
            frequency = %template.frequency,
            start_date = %template.start_date,
            "budget entry added"
        );
        Ok(id)
    }

    pub async fn edit_entry(&self, id: i64, input: EntryInput) -> anyhow::Result<bool> {
        let template = input.validate()?;
        let updated = self.store.update_template(id, &template).await?;
        if updated {
            tracing::info!(id, "budget entry updated");
        } else {
            tracing::warn!(id, "budget entry not found for update");
        }
        Ok(updated)
    }

    pub async fn remove_entry(&self, id: i64) -> anyhow::Result<bool> {
        let removed = self.store.delete_template(id).await?;
        tracing::info!(id, removed, "budget entry delete");
        Ok(removed)
    }

    pub async fn entries(&self, owner_id: i64) -> anyhow::Result<Vec<StoredEntry>> {
        self.store.fetch_entries(owner_id).await
    }

    pub async fn month_view(
        &self,
        owner_id: i64,
        month: Option<YearMonth>,
        today: NaiveDate,
    ) -> anyhow::Result<MonthView> {
        let templates = self.store.fetch_templates(owner_id).await?;
        let occurrences = expand_with(&templates, today, &self.opts)?;
        Ok(MonthView::for_selection(occurrences, month, today))
    }
}
