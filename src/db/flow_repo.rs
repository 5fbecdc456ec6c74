// src/db/flow_repo.rs

use async_trait::async_trait;
use sqlx::{Executor, PgPool, Postgres};
use std::collections::HashMap;

use crate::{
    common::error::AppError,
    db::FlowRepository,
    models::flow::{Flow, FlowFilter, FlowPayload, FlowRow},
};

#[derive(Clone)]
pub struct PgFlowRepository {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct FlowStageLink {
    flow_id: i32,
    stage_id: i32,
}

#[derive(sqlx::FromRow)]
struct FlowUserLink {
    flow_id: i32,
    cpf: String,
}

impl PgFlowRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Monta os fluxos completos a partir das linhas + associações (2 queries, sem N+1)
    async fn hydrate(&self, rows: Vec<FlowRow>) -> Result<Vec<Flow>, AppError> {
        if rows.is_empty() {
            return Ok(vec![]);
        }
        let ids: Vec<i32> = rows.iter().map(|r| r.id).collect();

        let stage_links = sqlx::query_as::<_, FlowStageLink>(
            r#"
            SELECT flow_id, stage_id FROM flow_stage
            WHERE flow_id = ANY($1)
            ORDER BY flow_id, position
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let user_links = sqlx::query_as::<_, FlowUserLink>(
            "SELECT flow_id, cpf FROM flow_user WHERE flow_id = ANY($1) ORDER BY cpf",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut stages: HashMap<i32, Vec<i32>> = HashMap::new();
        for link in stage_links {
            stages.entry(link.flow_id).or_default().push(link.stage_id);
        }
        let mut users: HashMap<i32, Vec<String>> = HashMap::new();
        for link in user_links {
            users.entry(link.flow_id).or_default().push(link.cpf);
        }

        Ok(rows
            .into_iter()
            .map(|header| Flow {
                stages: stages.remove(&header.id).unwrap_or_default(),
                notify_users: users.remove(&header.id).unwrap_or_default(),
                header,
            })
            .collect())
    }

    // Regrava as associações do fluxo (etapas na ordem recebida + usuários)
    async fn write_links<'e, E>(
        executor: E,
        flow_id: i32,
        input: &FlowPayload,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // Uma única query com CTEs: posição = ordinalidade no array
        sqlx::query(
            r#"
            WITH stages AS (
                INSERT INTO flow_stage (flow_id, stage_id, position)
                SELECT $1, s.stage_id, s.ord::int
                FROM UNNEST($2::int[]) WITH ORDINALITY AS s(stage_id, ord)
            )
            INSERT INTO flow_user (flow_id, cpf)
            SELECT $1, u.cpf FROM UNNEST($3::text[]) AS u(cpf)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(flow_id)
        .bind(&input.stages)
        .bind(&input.notify_users)
        .execute(executor)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl FlowRepository for PgFlowRepository {
    async fn find_by_id(&self, id: i32) -> Result<Option<Flow>, AppError> {
        let row = sqlx::query_as::<_, FlowRow>("SELECT * FROM flow WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn find_all(&self, filter: FlowFilter) -> Result<Vec<Flow>, AppError> {
        let rows = sqlx::query_as::<_, FlowRow>(
            "SELECT * FROM flow WHERE ($1::int IS NULL OR unit_id = $1) ORDER BY id",
        )
        .bind(filter.unit_id)
        .fetch_all(&self.pool)
        .await?;
        self.hydrate(rows).await
    }

    async fn create(&self, input: &FlowPayload) -> Result<Flow, AppError> {
        // Fluxo + associações numa transação: ou grava tudo, ou nada.
        let mut tx = self.pool.begin().await?;

        let header = sqlx::query_as::<_, FlowRow>(
            "INSERT INTO flow (name, unit_id) VALUES ($1, $2) RETURNING *",
        )
        .bind(&input.name)
        .bind(input.unit_id)
        .fetch_one(&mut *tx)
        .await?;

        Self::write_links(&mut *tx, header.id, input).await?;

        tx.commit().await?;

        Ok(Flow {
            header,
            stages: input.stages.clone(),
            notify_users: input.notify_users.clone(),
        })
    }

    async fn update(&self, id: i32, input: &FlowPayload) -> Result<Option<Flow>, AppError> {
        let mut tx = self.pool.begin().await?;

        let header = sqlx::query_as::<_, FlowRow>(
            r#"
            UPDATE flow SET name = $1, unit_id = $2, updated_at = NOW()
            WHERE id = $3
            RETURNING *
            "#,
        )
        .bind(&input.name)
        .bind(input.unit_id)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        // Sem linha: o drop do `tx` faz o rollback
        let Some(header) = header else {
            return Ok(None);
        };

        sqlx::query("DELETE FROM flow_stage WHERE flow_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM flow_user WHERE flow_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        Self::write_links(&mut *tx, id, input).await?;

        tx.commit().await?;

        Ok(Some(Flow {
            header,
            stages: input.stages.clone(),
            notify_users: input.notify_users.clone(),
        }))
    }

    async fn delete(&self, id: i32) -> Result<bool, AppError> {
        // flow_stage e flow_user caem junto (ON DELETE CASCADE)
        let result = sqlx::query("DELETE FROM flow WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn remove_stage(&self, flow_id: i32, stage_id: i32) -> Result<bool, AppError> {
        // Não deixa o fluxo com menos de duas etapas
        let result = sqlx::query(
            r#"
            DELETE FROM flow_stage
            WHERE flow_id = $1 AND stage_id = $2
              AND (SELECT COUNT(*) FROM flow_stage WHERE flow_id = $1) > 2
            "#,
        )
        .bind(flow_id)
        .bind(stage_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn add_notify_user(&self, flow_id: i32, cpf: &str) -> Result<(), AppError> {
        sqlx::query("INSERT INTO flow_user (flow_id, cpf) VALUES ($1, $2) ON CONFLICT DO NOTHING")
            .bind(flow_id)
            .bind(cpf)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn remove_notify_user(&self, flow_id: i32, cpf: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM flow_user WHERE flow_id = $1 AND cpf = $2")
            .bind(flow_id)
            .bind(cpf)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
