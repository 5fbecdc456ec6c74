// src/db/process_repo.rs

use async_trait::async_trait;
use sqlx::{types::Json, PgPool};

use crate::{
    common::error::{map_unique_violation, AppError},
    db::ProcessRepository,
    models::{
        digest::OverdueRow,
        process::{HistoryChange, HistoryUpdate, NewProcess, Process, ProcessFilter},
    },
};

const UNIQUE_FIELDS: &[(&str, &str)] = &[(
    "process_record_key",
    "Já existe um processo com esse registro.",
)];

#[derive(Clone)]
pub struct PgProcessRepository {
    pool: PgPool,
}

impl PgProcessRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProcessRepository for PgProcessRepository {
    async fn find_by_record(&self, record: &str) -> Result<Option<Process>, AppError> {
        let process = sqlx::query_as::<_, Process>("SELECT * FROM process WHERE record = $1")
            .bind(record)
            .fetch_optional(&self.pool)
            .await?;
        Ok(process)
    }

    async fn find_all(&self, filter: ProcessFilter) -> Result<Vec<Process>, AppError> {
        let processes = sqlx::query_as::<_, Process>(
            r#"
            SELECT * FROM process
            WHERE ($1::int IS NULL OR flow_id = $1)
              AND ($2::int IS NULL OR unit_id = $2)
              AND ($3::bool IS NULL OR archived = $3)
            ORDER BY created_at DESC
            "#,
        )
        .bind(filter.flow_id)
        .bind(filter.unit_id)
        .bind(filter.archived)
        .fetch_all(&self.pool)
        .await?;
        Ok(processes)
    }

    async fn create(&self, input: &NewProcess) -> Result<Process, AppError> {
        sqlx::query_as::<_, Process>(
            r#"
            INSERT INTO process (record, nickname, current_stage_id, flow_id, unit_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&input.record)
        .bind(&input.nickname)
        .bind(input.current_stage_id)
        .bind(input.flow_id)
        .bind(input.unit_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, UNIQUE_FIELDS))
    }

    async fn update_nickname(
        &self,
        record: &str,
        nickname: Option<&str>,
    ) -> Result<Option<Process>, AppError> {
        let process = sqlx::query_as::<_, Process>(
            "UPDATE process SET nickname = $1, updated_at = NOW() WHERE record = $2 RETURNING *",
        )
        .bind(nickname)
        .bind(record)
        .fetch_optional(&self.pool)
        .await?;
        Ok(process)
    }

    async fn modify_history(
        &self,
        record: &str,
        change: HistoryChange,
    ) -> Result<Option<HistoryUpdate>, AppError> {
        let mut tx = self.pool.begin().await?;

        // FOR UPDATE: outra passagem no mesmo processo espera este commit
        let process = sqlx::query_as::<_, Process>(
            "SELECT * FROM process WHERE record = $1 FOR UPDATE",
        )
        .bind(record)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(mut process) = process else {
            return Ok(None);
        };

        // Sem alteração: o drop do `tx` faz o rollback e solta a trava
        let Some(outcome) = process.apply(change) else {
            return Ok(Some(HistoryUpdate { process, outcome: None }));
        };

        let process = sqlx::query_as::<_, Process>(
            r#"
            UPDATE process
            SET current_stage_id = $1, stage_history = $2, updated_at = NOW()
            WHERE id = $3
            RETURNING *
            "#,
        )
        .bind(process.current_stage_id)
        .bind(Json(process.stage_history.clone()))
        .bind(process.id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(HistoryUpdate { process, outcome: Some(outcome) }))
    }

    async fn set_archived(&self, record: &str, archived: bool) -> Result<Option<Process>, AppError> {
        let process = sqlx::query_as::<_, Process>(
            "UPDATE process SET archived = $1, updated_at = NOW() WHERE record = $2 RETURNING *",
        )
        .bind(archived)
        .bind(record)
        .fetch_optional(&self.pool)
        .await?;
        Ok(process)
    }

    async fn delete(&self, record: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM process WHERE record = $1")
            .bind(record)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_overdue(&self) -> Result<Vec<OverdueRow>, AppError> {
        // Entrada na etapa atual = createdAt da entrada do histórico cujo destino
        // é a etapa atual; sem entrada, vale a criação do processo.
        let rows = sqlx::query_as::<_, OverdueRow>(
            r#"
            WITH in_stage AS (
                SELECT
                    p.record, p.nickname, p.flow_id, p.current_stage_id,
                    COALESCE(
                        (
                            SELECT (h->>'createdAt')::timestamptz
                            FROM jsonb_array_elements(p.stage_history) AS h
                            WHERE (h->>'stageIdTo')::int = p.current_stage_id
                            LIMIT 1
                        ),
                        p.created_at
                    ) AS entered_at
                FROM process p
                WHERE p.archived = FALSE AND p.current_stage_id IS NOT NULL
            )
            SELECT
                c.record, c.nickname,
                s.name AS stage_name,
                f.name AS flow_name,
                s.duration,
                c.entered_at,
                u.email,
                u.full_name
            FROM in_stage c
            JOIN stage s ON s.id = c.current_stage_id
            JOIN flow f ON f.id = c.flow_id
            JOIN flow_user fu ON fu.flow_id = f.id
            JOIN users u ON u.cpf = fu.cpf
            WHERE c.entered_at + make_interval(days => s.duration) < NOW()
            ORDER BY u.email, c.entered_at
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
