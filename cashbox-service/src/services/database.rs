//! PostgreSQL gateway for cashbox-service.

use crate::models::{
    AuditLog, BusinessUnit, BusinessUnitUpdate, CashMovement, CategoryUpdate, ClosedPeriod,
    ConfigEntry, MovementCategory, MovementFilter, MovementType, NewAuditLog, NewBusinessUnit,
    NewCategory, NewMovement, NewPartner, NewPartnerAccount, NewPointOfSale, Partner,
    PartnerAccount, PartnerUpdate, PointOfSale,
};
use crate::services::metrics::DB_QUERY_DURATION;
use crate::services::store::CashboxStore;
use async_trait::async_trait;
use rust_decimal::Decimal;
use service_core::error::AppError;
use sqlx::postgres::{PgConnection, PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{error, info, instrument};
use uuid::Uuid;

/// Map a sqlx error, turning unique violations into `Conflict`.
fn db_error(operation: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| match e {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            AppError::Conflict(anyhow::anyhow!("{}: duplicate value", operation))
        }
        _ => {
            error!(operation, error = %e, "Database operation failed");
            AppError::DatabaseError(anyhow::anyhow!("Failed to {}: {}", operation, e))
        }
    }
}

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "cashbox-service"))]
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

    /// Lock the unit row so sequence assignment for the unit is serialized.
    async fn lock_business_unit(
        conn: &mut PgConnection,
        business_unit_id: Uuid,
    ) -> Result<(), AppError> {
        let locked: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM business_units WHERE id = $1 FOR UPDATE")
                .bind(business_unit_id)
                .fetch_optional(&mut *conn)
                .await
                .map_err(db_error("lock business unit"))?;

        if locked.is_none() {
            return Err(AppError::NotFound(anyhow::anyhow!(
                "Business unit {} not found",
                business_unit_id
            )));
        }
        Ok(())
    }

    /// Insert a movement with the next sequence number. Caller holds the unit lock.
    async fn insert_movement_locked(
        conn: &mut PgConnection,
        input: &NewMovement,
    ) -> Result<CashMovement, AppError> {
        let next_sequence: i64 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(sequence_number), 0) + 1 FROM cash_movements WHERE business_unit_id = $1",
        )
        .bind(input.business_unit_id)
        .fetch_one(&mut *conn)
        .await
        .map_err(db_error("read next sequence number"))?;

        sqlx::query_as::<_, CashMovement>(
            r#"
            INSERT INTO cash_movements (id, business_unit_id, movement_type, category_id, amount, description,
                transaction_date, sequence_number, partner_account_id, point_of_sale_id, created_by, is_opening_balance)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING id, business_unit_id, movement_type, category_id, amount, description, transaction_date,
                sequence_number, partner_account_id, point_of_sale_id, created_by, is_opening_balance, is_active, closed_period, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(input.business_unit_id)
        .bind(input.movement_type.as_str())
        .bind(input.category_id)
        .bind(input.amount)
        .bind(&input.description)
        .bind(input.transaction_date)
        .bind(next_sequence)
        .bind(input.partner_account_id)
        .bind(input.point_of_sale_id)
        .bind(&input.created_by)
        .bind(input.is_opening_balance)
        .fetch_one(&mut *conn)
        .await
        .map_err(db_error("insert movement"))
    }
}

#[async_trait]
impl CashboxStore for Database {
    /// Check database health.
    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Business Unit Operations
    // -------------------------------------------------------------------------

    #[instrument(skip(self, input), fields(name = %input.name))]
    async fn insert_business_unit(
        &self,
        input: &NewBusinessUnit,
    ) -> Result<BusinessUnit, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["insert_business_unit"])
            .start_timer();

        let unit = sqlx::query_as::<_, BusinessUnit>(
            r#"
            INSERT INTO business_units (id, name, color, display_order)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, color, display_order, is_active, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&input.name)
        .bind(&input.color)
        .bind(input.display_order)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("create business unit"))?;

        timer.observe_duration();
        Ok(unit)
    }

    #[instrument(skip(self))]
    async fn get_business_unit(&self, id: Uuid) -> Result<Option<BusinessUnit>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_business_unit"])
            .start_timer();

        let unit = sqlx::query_as::<_, BusinessUnit>(
            r#"
            SELECT id, name, color, display_order, is_active, created_at
            FROM business_units
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("get business unit"))?;

        timer.observe_duration();
        Ok(unit)
    }

    #[instrument(skip(self))]
    async fn list_business_units(
        &self,
        include_inactive: bool,
    ) -> Result<Vec<BusinessUnit>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_business_units"])
            .start_timer();

        let units = sqlx::query_as::<_, BusinessUnit>(
            r#"
            SELECT id, name, color, display_order, is_active, created_at
            FROM business_units
            WHERE ($1 OR is_active)
            ORDER BY display_order, name
            "#,
        )
        .bind(include_inactive)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("list business units"))?;

        timer.observe_duration();
        Ok(units)
    }

    #[instrument(skip(self, update))]
    async fn update_business_unit(
        &self,
        id: Uuid,
        update: &BusinessUnitUpdate,
    ) -> Result<Option<BusinessUnit>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_business_unit"])
            .start_timer();

        let unit = sqlx::query_as::<_, BusinessUnit>(
            r#"
            UPDATE business_units
            SET name = COALESCE($2, name),
                color = COALESCE($3, color),
                display_order = COALESCE($4, display_order),
                is_active = COALESCE($5, is_active)
            WHERE id = $1
            RETURNING id, name, color, display_order, is_active, created_at
            "#,
        )
        .bind(id)
        .bind(&update.name)
        .bind(&update.color)
        .bind(update.display_order)
        .bind(update.is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("update business unit"))?;

        timer.observe_duration();
        Ok(unit)
    }

    // -------------------------------------------------------------------------
    // Category Operations
    // -------------------------------------------------------------------------

    #[instrument(skip(self, input), fields(name = %input.name))]
    async fn insert_category(&self, input: &NewCategory) -> Result<MovementCategory, AppError> {
        sqlx::query_as::<_, MovementCategory>(
            r#"
            INSERT INTO movement_categories (id, name, movement_type)
            VALUES ($1, $2, $3)
            RETURNING id, name, movement_type, is_active, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&input.name)
        .bind(input.movement_type.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("create category"))
    }

    #[instrument(skip(self))]
    async fn get_category(&self, id: Uuid) -> Result<Option<MovementCategory>, AppError> {
        sqlx::query_as::<_, MovementCategory>(
            r#"
            SELECT id, name, movement_type, is_active, created_at
            FROM movement_categories
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("get category"))
    }

    #[instrument(skip(self))]
    async fn list_categories(
        &self,
        movement_type: Option<MovementType>,
        include_inactive: bool,
    ) -> Result<Vec<MovementCategory>, AppError> {
        sqlx::query_as::<_, MovementCategory>(
            r#"
            SELECT id, name, movement_type, is_active, created_at
            FROM movement_categories
            WHERE ($1::varchar IS NULL OR movement_type = $1)
              AND ($2 OR is_active)
            ORDER BY name
            "#,
        )
        .bind(movement_type.map(|t| t.as_str()))
        .bind(include_inactive)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("list categories"))
    }

    #[instrument(skip(self, update))]
    async fn update_category(
        &self,
        id: Uuid,
        update: &CategoryUpdate,
    ) -> Result<Option<MovementCategory>, AppError> {
        sqlx::query_as::<_, MovementCategory>(
            r#"
            UPDATE movement_categories
            SET name = COALESCE($2, name),
                is_active = COALESCE($3, is_active)
            WHERE id = $1
            RETURNING id, name, movement_type, is_active, created_at
            "#,
        )
        .bind(id)
        .bind(&update.name)
        .bind(update.is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("update category"))
    }

    // -------------------------------------------------------------------------
    // Point of Sale Operations
    // -------------------------------------------------------------------------

    #[instrument(skip(self, input), fields(business_unit_id = %input.business_unit_id))]
    async fn insert_point_of_sale(
        &self,
        input: &NewPointOfSale,
    ) -> Result<PointOfSale, AppError> {
        sqlx::query_as::<_, PointOfSale>(
            r#"
            INSERT INTO points_of_sale (id, business_unit_id, name)
            VALUES ($1, $2, $3)
            RETURNING id, business_unit_id, name, is_active, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(input.business_unit_id)
        .bind(&input.name)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("create point of sale"))
    }

    #[instrument(skip(self))]
    async fn get_point_of_sale(&self, id: Uuid) -> Result<Option<PointOfSale>, AppError> {
        sqlx::query_as::<_, PointOfSale>(
            r#"
            SELECT id, business_unit_id, name, is_active, created_at
            FROM points_of_sale
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("get point of sale"))
    }

    #[instrument(skip(self))]
    async fn list_points_of_sale(
        &self,
        business_unit_id: Uuid,
        include_inactive: bool,
    ) -> Result<Vec<PointOfSale>, AppError> {
        sqlx::query_as::<_, PointOfSale>(
            r#"
            SELECT id, business_unit_id, name, is_active, created_at
            FROM points_of_sale
            WHERE business_unit_id = $1 AND ($2 OR is_active)
            ORDER BY name
            "#,
        )
        .bind(business_unit_id)
        .bind(include_inactive)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("list points of sale"))
    }

    #[instrument(skip(self))]
    async fn set_point_of_sale_active(
        &self,
        id: Uuid,
        is_active: bool,
    ) -> Result<Option<PointOfSale>, AppError> {
        sqlx::query_as::<_, PointOfSale>(
            r#"
            UPDATE points_of_sale SET is_active = $2
            WHERE id = $1
            RETURNING id, business_unit_id, name, is_active, created_at
            "#,
        )
        .bind(id)
        .bind(is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("update point of sale"))
    }

    // -------------------------------------------------------------------------
    // Movement Operations
    // -------------------------------------------------------------------------

    #[instrument(skip(self, input), fields(business_unit_id = %input.business_unit_id, movement_type = %input.movement_type))]
    async fn insert_movement(&self, input: &NewMovement) -> Result<CashMovement, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["insert_movement"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        Self::lock_business_unit(&mut tx, input.business_unit_id).await?;
        let movement = Self::insert_movement_locked(&mut tx, input).await?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();

        info!(
            movement_id = %movement.id,
            sequence_number = movement.sequence_number,
            "Movement inserted"
        );

        Ok(movement)
    }

    #[instrument(skip(self))]
    async fn get_movement(&self, id: Uuid) -> Result<Option<CashMovement>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_movement"])
            .start_timer();

        let movement = sqlx::query_as::<_, CashMovement>(
            r#"
            SELECT id, business_unit_id, movement_type, category_id, amount, description, transaction_date,
                sequence_number, partner_account_id, point_of_sale_id, created_by, is_opening_balance, is_active, closed_period, created_at
            FROM cash_movements
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("get movement"))?;

        timer.observe_duration();
        Ok(movement)
    }

    #[instrument(skip(self, filter), fields(business_unit_id = ?filter.business_unit_id))]
    async fn list_movements(
        &self,
        filter: &MovementFilter,
    ) -> Result<Vec<CashMovement>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_movements"])
            .start_timer();

        // NULL limit means LIMIT ALL.
        let movements = sqlx::query_as::<_, CashMovement>(
            r#"
            SELECT id, business_unit_id, movement_type, category_id, amount, description, transaction_date,
                sequence_number, partner_account_id, point_of_sale_id, created_by, is_opening_balance, is_active, closed_period, created_at
            FROM cash_movements
            WHERE ($1::uuid IS NULL OR business_unit_id = $1)
              AND ($2::varchar IS NULL OR movement_type = $2)
              AND ($3::uuid IS NULL OR category_id = $3)
              AND ($4::date IS NULL OR transaction_date >= $4)
              AND ($5::date IS NULL OR transaction_date <= $5)
              AND ($6 OR is_active)
              AND ($7 OR closed_period IS NULL)
              AND (NOT $8 OR business_unit_id IN (SELECT id FROM business_units WHERE is_active))
            ORDER BY transaction_date DESC, sequence_number DESC, created_at DESC
            OFFSET $9
            LIMIT $10
            "#,
        )
        .bind(filter.business_unit_id)
        .bind(filter.movement_type.map(|t| t.as_str()))
        .bind(filter.category_id)
        .bind(filter.from)
        .bind(filter.to)
        .bind(filter.include_inactive)
        .bind(filter.include_closed)
        .bind(filter.active_units_only)
        .bind(filter.offset.max(0))
        .bind(filter.limit)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("list movements"))?;

        timer.observe_duration();
        Ok(movements)
    }

    #[instrument(skip(self))]
    async fn deactivate_last_movement(
        &self,
        business_unit_id: Uuid,
        id: Uuid,
    ) -> Result<Option<CashMovement>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["deactivate_last_movement"])
            .start_timer();

        let movement = sqlx::query_as::<_, CashMovement>(
            r#"
            UPDATE cash_movements
            SET is_active = FALSE
            WHERE id = $1
              AND business_unit_id = $2
              AND is_active
              AND closed_period IS NULL
              AND sequence_number = (
                  SELECT MAX(sequence_number)
                  FROM cash_movements
                  WHERE business_unit_id = $2 AND is_active
              )
            RETURNING id, business_unit_id, movement_type, category_id, amount, description, transaction_date,
                sequence_number, partner_account_id, point_of_sale_id, created_by, is_opening_balance, is_active, closed_period, created_at
            "#,
        )
        .bind(id)
        .bind(business_unit_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("delete movement"))?;

        timer.observe_duration();
        Ok(movement)
    }

    #[instrument(skip(self, carry_forward))]
    async fn close_period(
        &self,
        business_unit_id: Uuid,
        label: &str,
        carry_forward: Option<&NewMovement>,
    ) -> Result<ClosedPeriod, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["close_period"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        Self::lock_business_unit(&mut tx, business_unit_id).await?;

        let closed = sqlx::query(
            r#"
            UPDATE cash_movements
            SET closed_period = $2
            WHERE business_unit_id = $1 AND is_active AND closed_period IS NULL
            "#,
        )
        .bind(business_unit_id)
        .bind(label)
        .execute(&mut *tx)
        .await
        .map_err(db_error("close period"))?;

        let carry_forward = match carry_forward {
            Some(input) => Some(Self::insert_movement_locked(&mut tx, input).await?),
            None => None,
        };

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();

        Ok(ClosedPeriod {
            business_unit_id,
            label: label.to_string(),
            closed_count: closed.rows_affected(),
            carry_forward,
        })
    }

    #[instrument(skip(self))]
    async fn period_exists(&self, business_unit_id: Uuid, label: &str) -> Result<bool, AppError> {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM cash_movements WHERE business_unit_id = $1 AND closed_period = $2)",
        )
        .bind(business_unit_id)
        .bind(label)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("check period"))
    }

    // -------------------------------------------------------------------------
    // Partner Operations
    // -------------------------------------------------------------------------

    #[instrument(skip(self, input), fields(name = %input.name))]
    async fn insert_partner(&self, input: &NewPartner) -> Result<Partner, AppError> {
        sqlx::query_as::<_, Partner>(
            r#"
            INSERT INTO partners (id, name, email, equity_percentage)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, email, equity_percentage, is_managing_partner, is_active, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&input.name)
        .bind(&input.email)
        .bind(input.equity_percentage)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("create partner"))
    }

    #[instrument(skip(self))]
    async fn get_partner(&self, id: Uuid) -> Result<Option<Partner>, AppError> {
        sqlx::query_as::<_, Partner>(
            r#"
            SELECT id, name, email, equity_percentage, is_managing_partner, is_active, created_at
            FROM partners
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("get partner"))
    }

    #[instrument(skip(self))]
    async fn list_partners(&self, include_inactive: bool) -> Result<Vec<Partner>, AppError> {
        sqlx::query_as::<_, Partner>(
            r#"
            SELECT id, name, email, equity_percentage, is_managing_partner, is_active, created_at
            FROM partners
            WHERE ($1 OR is_active)
            ORDER BY name
            "#,
        )
        .bind(include_inactive)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("list partners"))
    }

    #[instrument(skip(self, update))]
    async fn update_partner(
        &self,
        id: Uuid,
        update: &PartnerUpdate,
    ) -> Result<Option<Partner>, AppError> {
        sqlx::query_as::<_, Partner>(
            r#"
            UPDATE partners
            SET name = COALESCE($2, name),
                email = COALESCE($3, email),
                equity_percentage = COALESCE($4, equity_percentage),
                is_active = COALESCE($5, is_active)
            WHERE id = $1
            RETURNING id, name, email, equity_percentage, is_managing_partner, is_active, created_at
            "#,
        )
        .bind(id)
        .bind(&update.name)
        .bind(&update.email)
        .bind(update.equity_percentage)
        .bind(update.is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("update partner"))
    }

    #[instrument(skip(self))]
    async fn set_managing_partner(&self, id: Uuid) -> Result<Option<Partner>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["set_managing_partner"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let target: Option<Uuid> = sqlx::query_scalar(
            "SELECT id FROM partners WHERE id = $1 AND is_active FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("lock partner"))?;

        if target.is_none() {
            return Ok(None);
        }

        sqlx::query(
            "UPDATE partners SET is_managing_partner = FALSE WHERE is_managing_partner AND id <> $1",
        )
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(db_error("demote managing partner"))?;

        let partner = sqlx::query_as::<_, Partner>(
            r#"
            UPDATE partners SET is_managing_partner = TRUE
            WHERE id = $1
            RETURNING id, name, email, equity_percentage, is_managing_partner, is_active, created_at
            "#,
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error("promote managing partner"))?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();
        Ok(Some(partner))
    }

    #[instrument(skip(self, input), fields(partner_id = %input.partner_id))]
    async fn insert_partner_account(
        &self,
        input: &NewPartnerAccount,
    ) -> Result<PartnerAccount, AppError> {
        sqlx::query_as::<_, PartnerAccount>(
            r#"
            INSERT INTO partner_accounts (id, partner_id, name)
            VALUES ($1, $2, $3)
            RETURNING id, partner_id, name, balance, is_active, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(input.partner_id)
        .bind(&input.name)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("create partner account"))
    }

    #[instrument(skip(self))]
    async fn get_partner_account(&self, id: Uuid) -> Result<Option<PartnerAccount>, AppError> {
        sqlx::query_as::<_, PartnerAccount>(
            r#"
            SELECT id, partner_id, name, balance, is_active, created_at, updated_at
            FROM partner_accounts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("get partner account"))
    }

    #[instrument(skip(self))]
    async fn list_partner_accounts(
        &self,
        partner_id: Uuid,
    ) -> Result<Vec<PartnerAccount>, AppError> {
        sqlx::query_as::<_, PartnerAccount>(
            r#"
            SELECT id, partner_id, name, balance, is_active, created_at, updated_at
            FROM partner_accounts
            WHERE partner_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(partner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("list partner accounts"))
    }

    #[instrument(skip(self))]
    async fn adjust_partner_account(
        &self,
        id: Uuid,
        delta: Decimal,
    ) -> Result<Option<PartnerAccount>, AppError> {
        sqlx::query_as::<_, PartnerAccount>(
            r#"
            UPDATE partner_accounts
            SET balance = balance + $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, partner_id, name, balance, is_active, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(delta)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("adjust partner account"))
    }

    // -------------------------------------------------------------------------
    // Config & Audit Operations
    // -------------------------------------------------------------------------

    #[instrument(skip(self))]
    async fn get_config(&self, key: &str) -> Result<Option<ConfigEntry>, AppError> {
        sqlx::query_as::<_, ConfigEntry>(
            "SELECT key, value, updated_at FROM app_config WHERE key = $1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("get config"))
    }

    #[instrument(skip(self))]
    async fn list_config(&self) -> Result<Vec<ConfigEntry>, AppError> {
        sqlx::query_as::<_, ConfigEntry>("SELECT key, value, updated_at FROM app_config ORDER BY key")
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("list config"))
    }

    #[instrument(skip(self, value))]
    async fn upsert_config(
        &self,
        key: &str,
        value: &serde_json::Value,
    ) -> Result<ConfigEntry, AppError> {
        sqlx::query_as::<_, ConfigEntry>(
            r#"
            INSERT INTO app_config (key, value, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()
            RETURNING key, value, updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("set config"))
    }

    #[instrument(skip(self, input), fields(action = %input.action, entity = %input.entity))]
    async fn insert_audit_log(&self, input: &NewAuditLog) -> Result<AuditLog, AppError> {
        sqlx::query_as::<_, AuditLog>(
            r#"
            INSERT INTO audit_logs (id, action, entity, entity_id, actor, details)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, action, entity, entity_id, actor, details, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&input.action)
        .bind(&input.entity)
        .bind(input.entity_id)
        .bind(&input.actor)
        .bind(&input.details)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("write audit log"))
    }

    #[instrument(skip(self))]
    async fn list_audit_logs(&self, limit: i64) -> Result<Vec<AuditLog>, AppError> {
        sqlx::query_as::<_, AuditLog>(
            r#"
            SELECT id, action, entity, entity_id, actor, details, created_at
            FROM audit_logs
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("list audit logs"))
    }
}
