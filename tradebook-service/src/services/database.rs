//! Database service for tradebook-service.

use crate::models::{
    net_due, reconcile_row, resolve_expected_rate, BillEntry, CreateSupplier, DailyRates,
    LedgerLine, LedgerTransaction, MarkupFormula, MarkupRule, NewBillRow, Supplier,
    TransactionType, UpdateSupplier,
};
use crate::services::metrics::DB_QUERY_DURATION;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

/// Outcome of a transactional bill save.
#[derive(Debug, Clone)]
pub struct BillSaveOutcome {
    pub rows_saved: usize,
    pub total_amount: Decimal,
    pub overwritten: bool,
}

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "tradebook-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Supplier Operations
    // -------------------------------------------------------------------------

    /// Create a new supplier.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_supplier(&self, input: &CreateSupplier) -> Result<Supplier, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_supplier"])
            .start_timer();

        let supplier_id = Uuid::new_v4();
        let supplier = sqlx::query_as::<_, Supplier>(
            r#"
            INSERT INTO suppliers (supplier_id, name, phone, preferred_payment_type, payment_frequency, vendor_type, markup_required)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING supplier_id, name, phone, preferred_payment_type, payment_frequency, vendor_type, markup_required, created_utc, updated_utc
            "#,
        )
        .bind(supplier_id)
        .bind(&input.name)
        .bind(&input.phone)
        .bind(&input.preferred_payment_type)
        .bind(&input.payment_frequency)
        .bind(input.vendor_type.as_str())
        .bind(input.markup_required)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!(
                    "Supplier '{}' already exists",
                    input.name
                ))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to create supplier: {}", e)),
        })?;

        timer.observe_duration();

        info!(
            supplier_id = %supplier.supplier_id,
            vendor_type = %supplier.vendor_type,
            "Supplier created"
        );

        Ok(supplier)
    }

    /// List all suppliers ordered by name.
    #[instrument(skip(self))]
    pub async fn list_suppliers(&self) -> Result<Vec<Supplier>, AppError> {
        let suppliers = sqlx::query_as::<_, Supplier>(
            r#"
            SELECT supplier_id, name, phone, preferred_payment_type, payment_frequency, vendor_type, markup_required, created_utc, updated_utc
            FROM suppliers
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list suppliers: {}", e)))?;

        Ok(suppliers)
    }

    /// Get a supplier by id.
    #[instrument(skip(self))]
    pub async fn get_supplier(&self, supplier_id: Uuid) -> Result<Supplier, AppError> {
        let supplier = sqlx::query_as::<_, Supplier>(
            r#"
            SELECT supplier_id, name, phone, preferred_payment_type, payment_frequency, vendor_type, markup_required, created_utc, updated_utc
            FROM suppliers
            WHERE supplier_id = $1
            "#,
        )
        .bind(supplier_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get supplier: {}", e)))?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Supplier {} not found", supplier_id)))?;

        Ok(supplier)
    }

    /// Update a supplier's details.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn update_supplier(
        &self,
        supplier_id: Uuid,
        input: &UpdateSupplier,
    ) -> Result<Supplier, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_supplier"])
            .start_timer();

        let supplier = sqlx::query_as::<_, Supplier>(
            r#"
            UPDATE suppliers
            SET name = $2, phone = $3, preferred_payment_type = $4, payment_frequency = $5, vendor_type = $6, markup_required = $7, updated_utc = now()
            WHERE supplier_id = $1
            RETURNING supplier_id, name, phone, preferred_payment_type, payment_frequency, vendor_type, markup_required, created_utc, updated_utc
            "#,
        )
        .bind(supplier_id)
        .bind(&input.name)
        .bind(&input.phone)
        .bind(&input.preferred_payment_type)
        .bind(&input.payment_frequency)
        .bind(input.vendor_type.as_str())
        .bind(input.markup_required)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!(
                    "Supplier '{}' already exists",
                    input.name
                ))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to update supplier: {}", e)),
        })?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Supplier {} not found", supplier_id)))?;

        timer.observe_duration();

        Ok(supplier)
    }

    /// Delete a supplier and cascade to markup rules, bill entries, and
    /// ledger transactions, all-or-nothing.
    #[instrument(skip(self))]
    pub async fn delete_supplier(&self, supplier_id: Uuid) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_supplier"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        sqlx::query("DELETE FROM ledger_transactions WHERE supplier_id = $1")
            .bind(supplier_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete ledger: {}", e))
            })?;

        sqlx::query("DELETE FROM bill_entries WHERE supplier_id = $1")
            .bind(supplier_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete bill entries: {}", e))
            })?;

        sqlx::query("DELETE FROM markup_rules WHERE supplier_id = $1")
            .bind(supplier_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete markup rules: {}", e))
            })?;

        let result = sqlx::query("DELETE FROM suppliers WHERE supplier_id = $1")
            .bind(supplier_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete supplier: {}", e))
            })?;

        if result.rows_affected() == 0 {
            tx.rollback().await.ok();
            return Err(AppError::NotFound(anyhow::anyhow!(
                "Supplier {} not found",
                supplier_id
            )));
        }

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();

        info!(supplier_id = %supplier_id, "Supplier and associated data deleted");

        Ok(())
    }

    // -------------------------------------------------------------------------
    // Markup Rule Operations
    // -------------------------------------------------------------------------

    /// List a supplier's markup rules ordered by item name.
    #[instrument(skip(self))]
    pub async fn list_markup_rules(&self, supplier_id: Uuid) -> Result<Vec<MarkupRule>, AppError> {
        let rules = sqlx::query_as::<_, MarkupRule>(
            r#"
            SELECT rule_id, supplier_id, item_name, base_category, op1, value1, op2, value2, created_utc, updated_utc
            FROM markup_rules
            WHERE supplier_id = $1
            ORDER BY item_name
            "#,
        )
        .bind(supplier_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list markup rules: {}", e)))?;

        Ok(rules)
    }

    /// Ordered item names configured for a supplier. An empty list is a valid
    /// "no rules configured" state.
    #[instrument(skip(self))]
    pub async fn list_item_names(&self, supplier_id: Uuid) -> Result<Vec<String>, AppError> {
        let items = sqlx::query_scalar::<_, String>(
            "SELECT item_name FROM markup_rules WHERE supplier_id = $1 ORDER BY item_name",
        )
        .bind(supplier_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list items: {}", e)))?;

        Ok(items)
    }

    /// Get the markup rule for a (supplier, item) pair.
    #[instrument(skip(self))]
    pub async fn get_markup_rule(
        &self,
        supplier_id: Uuid,
        item_name: &str,
    ) -> Result<Option<MarkupRule>, AppError> {
        let rule = sqlx::query_as::<_, MarkupRule>(
            r#"
            SELECT rule_id, supplier_id, item_name, base_category, op1, value1, op2, value2, created_utc, updated_utc
            FROM markup_rules
            WHERE supplier_id = $1 AND item_name = $2
            "#,
        )
        .bind(supplier_id)
        .bind(item_name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get markup rule: {}", e)))?;

        Ok(rule)
    }

    /// Upsert a markup rule. Rule saves overwrite directly, without the
    /// confirmation bill saves require.
    #[instrument(skip(self, formula), fields(supplier_id = %supplier_id, item_name = %item_name))]
    pub async fn upsert_markup_rule(
        &self,
        supplier_id: Uuid,
        item_name: &str,
        formula: &MarkupFormula,
    ) -> Result<MarkupRule, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["upsert_markup_rule"])
            .start_timer();

        let rule = sqlx::query_as::<_, MarkupRule>(
            r#"
            INSERT INTO markup_rules (rule_id, supplier_id, item_name, base_category, op1, value1, op2, value2)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (supplier_id, item_name)
            DO UPDATE SET base_category = EXCLUDED.base_category, op1 = EXCLUDED.op1, value1 = EXCLUDED.value1, op2 = EXCLUDED.op2, value2 = EXCLUDED.value2, updated_utc = now()
            RETURNING rule_id, supplier_id, item_name, base_category, op1, value1, op2, value2, created_utc, updated_utc
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(supplier_id)
        .bind(item_name)
        .bind(formula.category.as_str())
        .bind(formula.step_one.op.as_str())
        .bind(formula.step_one.operand)
        .bind(formula.step_two.as_ref().map(|s| s.op.as_str()))
        .bind(formula.step_two.as_ref().map(|s| s.operand))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to upsert markup rule: {}", e)))?;

        timer.observe_duration();

        Ok(rule)
    }

    /// Delete a markup rule.
    #[instrument(skip(self))]
    pub async fn delete_markup_rule(
        &self,
        supplier_id: Uuid,
        item_name: &str,
    ) -> Result<(), AppError> {
        let result =
            sqlx::query("DELETE FROM markup_rules WHERE supplier_id = $1 AND item_name = $2")
                .bind(supplier_id)
                .bind(item_name)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to delete markup rule: {}", e))
                })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(anyhow::anyhow!(
                "No markup rule for item '{}'",
                item_name
            )));
        }

        Ok(())
    }

    /// Insert the default chicken markup rules for a supplier, skipping items
    /// that already have a rule.
    #[instrument(skip(self))]
    pub async fn seed_default_markup_rules(&self, supplier_id: Uuid) -> Result<u64, AppError> {
        let mut inserted = 0;
        for (item_name, formula) in crate::models::default_chicken_rules() {
            let result = sqlx::query(
                r#"
                INSERT INTO markup_rules (rule_id, supplier_id, item_name, base_category, op1, value1, op2, value2)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                ON CONFLICT (supplier_id, item_name) DO NOTHING
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(supplier_id)
            .bind(item_name)
            .bind(formula.category.as_str())
            .bind(formula.step_one.op.as_str())
            .bind(formula.step_one.operand)
            .bind(formula.step_two.as_ref().map(|s| s.op.as_str()))
            .bind(formula.step_two.as_ref().map(|s| s.operand))
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to seed markup rules: {}", e))
            })?;
            inserted += result.rows_affected();
        }

        info!(supplier_id = %supplier_id, inserted = inserted, "Default markup rules seeded");

        Ok(inserted)
    }

    // -------------------------------------------------------------------------
    // Daily Rate Operations
    // -------------------------------------------------------------------------

    /// Get the raw rates for a date.
    #[instrument(skip(self))]
    pub async fn get_daily_rates(&self, date: NaiveDate) -> Result<Option<DailyRates>, AppError> {
        let rates = sqlx::query_as::<_, DailyRates>(
            "SELECT rate_date, tandoor_rate, boiler_rate, egg_rate, updated_utc FROM daily_rates WHERE rate_date = $1",
        )
        .bind(date)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get daily rates: {}", e)))?;

        Ok(rates)
    }

    /// Rate history, newest first.
    #[instrument(skip(self))]
    pub async fn list_daily_rates(&self) -> Result<Vec<DailyRates>, AppError> {
        let rates = sqlx::query_as::<_, DailyRates>(
            "SELECT rate_date, tandoor_rate, boiler_rate, egg_rate, updated_utc FROM daily_rates ORDER BY rate_date DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list daily rates: {}", e)))?;

        Ok(rates)
    }

    /// Upsert the raw rates for a date.
    #[instrument(skip(self))]
    pub async fn upsert_daily_rates(
        &self,
        date: NaiveDate,
        tandoor_rate: Decimal,
        boiler_rate: Decimal,
        egg_rate: Decimal,
    ) -> Result<DailyRates, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["upsert_daily_rates"])
            .start_timer();

        let rates = sqlx::query_as::<_, DailyRates>(
            r#"
            INSERT INTO daily_rates (rate_date, tandoor_rate, boiler_rate, egg_rate)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (rate_date)
            DO UPDATE SET tandoor_rate = EXCLUDED.tandoor_rate, boiler_rate = EXCLUDED.boiler_rate, egg_rate = EXCLUDED.egg_rate, updated_utc = now()
            RETURNING rate_date, tandoor_rate, boiler_rate, egg_rate, updated_utc
            "#,
        )
        .bind(date)
        .bind(tandoor_rate)
        .bind(boiler_rate)
        .bind(egg_rate)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to upsert daily rates: {}", e)))?;

        timer.observe_duration();

        Ok(rates)
    }

    /// Recompute expected rate, variance, and status for every bill row on a
    /// date after its raw rates change. Returns the number of rows updated.
    #[instrument(skip(self, rates), fields(rate_date = %rates.rate_date))]
    pub async fn refresh_bill_entries_for_date(
        &self,
        rates: &DailyRates,
    ) -> Result<u64, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["refresh_bill_entries_for_date"])
            .start_timer();

        let entries = sqlx::query_as::<_, BillEntry>(
            r#"
            SELECT entry_id, bill_date, supplier_id, item_name, net_qty, vendor_rate, expected_rate, variance, status, created_utc
            FROM bill_entries
            WHERE bill_date = $1
            "#,
        )
        .bind(rates.rate_date)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to fetch bill entries: {}", e)))?;

        let mut updated = 0;
        for entry in entries {
            let rule = self
                .get_markup_rule(entry.supplier_id, &entry.item_name)
                .await?;
            let formula = match rule {
                Some(rule) => Some(rule.formula().ok_or_else(|| {
                    AppError::DatabaseError(anyhow::anyhow!(
                        "Stored markup rule for item '{}' is not decodable",
                        entry.item_name
                    ))
                })?),
                None => None,
            };
            let expected_rate = resolve_expected_rate(Some(rates), formula.as_ref());
            let row = reconcile_row(entry.net_qty, Decimal::ZERO, entry.vendor_rate, expected_rate);

            sqlx::query(
                "UPDATE bill_entries SET expected_rate = $2, variance = $3, status = $4 WHERE entry_id = $1",
            )
            .bind(entry.entry_id)
            .bind(expected_rate)
            .bind(row.variance)
            .bind(row.status.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to refresh bill entry: {}", e))
            })?;
            updated += 1;
        }

        timer.observe_duration();

        Ok(updated)
    }

    // -------------------------------------------------------------------------
    // Bill Operations
    // -------------------------------------------------------------------------

    /// Persisted bill rows for a supplier and date.
    #[instrument(skip(self))]
    pub async fn list_bill_entries(
        &self,
        supplier_id: Uuid,
        bill_date: NaiveDate,
    ) -> Result<Vec<BillEntry>, AppError> {
        let entries = sqlx::query_as::<_, BillEntry>(
            r#"
            SELECT entry_id, bill_date, supplier_id, item_name, net_qty, vendor_rate, expected_rate, variance, status, created_utc
            FROM bill_entries
            WHERE supplier_id = $1 AND bill_date = $2
            ORDER BY item_name
            "#,
        )
        .bind(supplier_id)
        .bind(bill_date)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list bill entries: {}", e)))?;

        Ok(entries)
    }

    /// Save a bill: all rows plus the aggregated ledger transaction, in one
    /// database transaction.
    ///
    /// A bill already on file for the (supplier, date) requires `overwrite`;
    /// the overwrite deletes the prior rows and the prior Bill ledger
    /// transaction for that date before inserting, so the date never
    /// accumulates duplicate Bill transactions.
    #[instrument(skip(self, rows), fields(supplier_id = %supplier_id, bill_date = %bill_date, row_count = rows.len()))]
    pub async fn save_bill(
        &self,
        supplier_id: Uuid,
        bill_date: NaiveDate,
        rows: &[NewBillRow],
        overwrite: bool,
    ) -> Result<BillSaveOutcome, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["save_bill"])
            .start_timer();

        if rows.is_empty() {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "No entries with positive net quantity to save"
            )));
        }

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let existing: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM bill_entries WHERE supplier_id = $1 AND bill_date = $2",
        )
        .bind(supplier_id)
        .bind(bill_date)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to check existing bill: {}", e))
        })?;

        let overwritten = existing > 0;
        if overwritten {
            if !overwrite {
                tx.rollback().await.ok();
                return Err(AppError::Conflict(anyhow::anyhow!(
                    "Bill entries already exist for this supplier on {}; set overwrite to replace them",
                    bill_date
                )));
            }

            sqlx::query("DELETE FROM bill_entries WHERE supplier_id = $1 AND bill_date = $2")
                .bind(supplier_id)
                .bind(bill_date)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to delete prior bill: {}", e))
                })?;

            sqlx::query(
                "DELETE FROM ledger_transactions WHERE supplier_id = $1 AND txn_date = $2 AND txn_type = $3",
            )
            .bind(supplier_id)
            .bind(bill_date)
            .bind(TransactionType::Bill.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!(
                    "Failed to delete prior bill ledger transaction: {}",
                    e
                ))
            })?;
        }

        let mut total_amount = Decimal::ZERO;
        for row in rows {
            sqlx::query(
                r#"
                INSERT INTO bill_entries (entry_id, bill_date, supplier_id, item_name, net_qty, vendor_rate, expected_rate, variance, status)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(bill_date)
            .bind(supplier_id)
            .bind(&row.item_name)
            .bind(row.net_qty)
            .bind(row.vendor_rate)
            .bind(row.expected_rate)
            .bind(row.variance)
            .bind(row.status.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to insert bill row: {}", e))
            })?;

            total_amount += (row.net_qty * row.vendor_rate).round_dp(2);
        }

        sqlx::query(
            r#"
            INSERT INTO ledger_transactions (transaction_id, txn_date, supplier_id, txn_type, amount, details)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(bill_date)
        .bind(supplier_id)
        .bind(TransactionType::Bill.as_str())
        .bind(total_amount)
        .bind(format!("Total Bill Amount for {}", bill_date))
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!(
                "Failed to insert bill ledger transaction: {}",
                e
            ))
        })?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();

        info!(
            supplier_id = %supplier_id,
            bill_date = %bill_date,
            rows_saved = rows.len(),
            total_amount = %total_amount,
            overwritten = overwritten,
            "Bill saved"
        );

        Ok(BillSaveOutcome {
            rows_saved: rows.len(),
            total_amount,
            overwritten,
        })
    }

    // -------------------------------------------------------------------------
    // Ledger Operations
    // -------------------------------------------------------------------------

    /// Record a vendor payment. The amount is stored negative.
    #[instrument(skip(self), fields(supplier_id = %supplier_id, txn_date = %txn_date))]
    pub async fn record_payment(
        &self,
        supplier_id: Uuid,
        txn_date: NaiveDate,
        amount: Decimal,
        details: Option<String>,
    ) -> Result<LedgerTransaction, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["record_payment"])
            .start_timer();

        let details =
            details.unwrap_or_else(|| format!("Payment recorded on {}", txn_date));

        let transaction = sqlx::query_as::<_, LedgerTransaction>(
            r#"
            INSERT INTO ledger_transactions (transaction_id, txn_date, supplier_id, txn_type, amount, details)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING transaction_id, txn_date, supplier_id, txn_type, amount, details, created_utc
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(txn_date)
        .bind(supplier_id)
        .bind(TransactionType::Payment.as_str())
        .bind(-amount.abs())
        .bind(details)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to record payment: {}", e)))?;

        timer.observe_duration();

        info!(
            transaction_id = %transaction.transaction_id,
            amount = %transaction.amount,
            "Payment recorded"
        );

        Ok(transaction)
    }

    /// Raw ledger transactions for a supplier, newest first.
    #[instrument(skip(self))]
    pub async fn list_ledger_transactions(
        &self,
        supplier_id: Uuid,
    ) -> Result<Vec<LedgerTransaction>, AppError> {
        let transactions = sqlx::query_as::<_, LedgerTransaction>(
            r#"
            SELECT transaction_id, txn_date, supplier_id, txn_type, amount, details, created_utc
            FROM ledger_transactions
            WHERE supplier_id = $1
            ORDER BY txn_date DESC, created_utc DESC
            "#,
        )
        .bind(supplier_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to list ledger transactions: {}", e))
        })?;

        Ok(transactions)
    }

    /// Merged statement for a supplier: per-date bill totals plus payment
    /// transactions, newest first.
    #[instrument(skip(self))]
    pub async fn ledger_statement(&self, supplier_id: Uuid) -> Result<Vec<LedgerLine>, AppError> {
        let lines = sqlx::query_as::<_, LedgerLine>(
            r#"
            SELECT bill_date AS txn_date, 'Bill'::text AS txn_type, SUM(net_qty * vendor_rate) AS amount, 'Bill Total'::text AS details
            FROM bill_entries
            WHERE supplier_id = $1
            GROUP BY bill_date
            UNION ALL
            SELECT txn_date, txn_type, amount, details
            FROM ledger_transactions
            WHERE supplier_id = $1 AND txn_type = 'Payment'
            ORDER BY txn_date DESC
            "#,
        )
        .bind(supplier_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to load ledger: {}", e)))?;

        Ok(lines)
    }

    /// Signed net-due balance for a supplier: bill totals plus (negative)
    /// payment totals.
    #[instrument(skip(self))]
    pub async fn compute_net_due(&self, supplier_id: Uuid) -> Result<Decimal, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["compute_net_due"])
            .start_timer();

        let total_bills: Decimal = sqlx::query_scalar(
            "SELECT COALESCE(SUM(net_qty * vendor_rate), 0) FROM bill_entries WHERE supplier_id = $1",
        )
        .bind(supplier_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to sum bills: {}", e)))?;

        let total_payments: Decimal = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount), 0) FROM ledger_transactions WHERE supplier_id = $1 AND txn_type = 'Payment'",
        )
        .bind(supplier_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to sum payments: {}", e)))?;

        timer.observe_duration();

        Ok(net_due(total_bills, total_payments))
    }

    // -------------------------------------------------------------------------
    // Report Operations
    // -------------------------------------------------------------------------

    /// Supplier count and total outstanding dues across all suppliers.
    #[instrument(skip(self))]
    pub async fn overview(&self) -> Result<(i64, Decimal), AppError> {
        let supplier_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM suppliers")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to count suppliers: {}", e))
            })?;

        let total_outstanding: Decimal = sqlx::query_scalar(
            r#"
            SELECT COALESCE((SELECT SUM(net_qty * vendor_rate) FROM bill_entries), 0)
                 + COALESCE((SELECT SUM(amount) FROM ledger_transactions WHERE txn_type = 'Payment'), 0)
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to sum outstanding dues: {}", e))
        })?;

        Ok((supplier_count, total_outstanding.round_dp(2)))
    }

    /// Bill rows with non-zero variance, newest first, optionally filtered by
    /// supplier.
    #[instrument(skip(self))]
    pub async fn variance_entries(
        &self,
        supplier_id: Option<Uuid>,
    ) -> Result<Vec<BillEntry>, AppError> {
        let entries = sqlx::query_as::<_, BillEntry>(
            r#"
            SELECT entry_id, bill_date, supplier_id, item_name, net_qty, vendor_rate, expected_rate, variance, status, created_utc
            FROM bill_entries
            WHERE variance <> 0 AND ($1::uuid IS NULL OR supplier_id = $1)
            ORDER BY bill_date DESC, item_name
            "#,
        )
        .bind(supplier_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list variances: {}", e)))?;

        Ok(entries)
    }
}
