//! Player persistence: a thin pass-through to PostgreSQL.
//!
//! `AppState` holds an `Arc<dyn PlayerStore>`; handlers never issue SQL directly.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::analysis::models::{AnalysisSource, PlayerAnalysis};
use crate::errors::AppError;
use crate::models::player::{AnalysisRow, NewPlayer, PlayerRow};

/// One analysis to be stored for a player.
#[derive(Debug, Clone)]
pub struct NewAnalysis<'a> {
    pub player_id: Uuid,
    pub video_url: Option<&'a str>,
    pub analysis: &'a PlayerAnalysis,
    pub source: AnalysisSource,
}

#[async_trait]
pub trait PlayerStore: Send + Sync {
    async fn find_player(&self, id: Uuid) -> Result<Option<PlayerRow>, AppError>;

    async fn find_player_by_email(&self, email: &str) -> Result<Option<PlayerRow>, AppError>;

    /// Inserts the player or refreshes the existing row with the same email.
    async fn upsert_player(&self, player: &NewPlayer) -> Result<PlayerRow, AppError>;

    /// Stores the analysis and sets it as the player's current global score.
    /// Both writes commit together or not at all.
    async fn record_analysis(&self, record: &NewAnalysis<'_>) -> Result<AnalysisRow, AppError>;

    /// Newest first.
    async fn list_analyses(&self, player_id: Uuid) -> Result<Vec<AnalysisRow>, AppError>;

    async fn ping(&self) -> Result<(), AppError>;
}

pub struct PgPlayerStore {
    pool: PgPool,
}

impl PgPlayerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PlayerStore for PgPlayerStore {
    async fn find_player(&self, id: Uuid) -> Result<Option<PlayerRow>, AppError> {
        let player = sqlx::query_as::<_, PlayerRow>("SELECT * FROM players WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(player)
    }

    async fn find_player_by_email(&self, email: &str) -> Result<Option<PlayerRow>, AppError> {
        let player = sqlx::query_as::<_, PlayerRow>("SELECT * FROM players WHERE email = $1")
            .bind(email.trim().to_lowercase())
            .fetch_optional(&self.pool)
            .await?;
        Ok(player)
    }

    async fn upsert_player(&self, player: &NewPlayer) -> Result<PlayerRow, AppError> {
        let row = sqlx::query_as::<_, PlayerRow>(
            r#"
            INSERT INTO players (name, email, position, age, club)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (email) DO UPDATE SET
                name = EXCLUDED.name,
                position = COALESCE(EXCLUDED.position, players.position),
                age = COALESCE(EXCLUDED.age, players.age),
                club = COALESCE(EXCLUDED.club, players.club),
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(&player.name)
        .bind(&player.email)
        .bind(&player.position)
        .bind(player.age)
        .bind(&player.club)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn record_analysis(&self, record: &NewAnalysis<'_>) -> Result<AnalysisRow, AppError> {
        let a = record.analysis;
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, AnalysisRow>(
            r#"
            INSERT INTO video_analyses
                (player_id, video_url, global_score, technique, vitesse, physique, mental,
                 tactique, "precision", strengths, weaknesses, recommendations,
                 position_analysis, potential, summary, source, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, 'completed')
            RETURNING *
            "#,
        )
        .bind(record.player_id)
        .bind(record.video_url)
        .bind(i32::from(a.global_score))
        .bind(i32::from(a.technique))
        .bind(i32::from(a.speed))
        .bind(i32::from(a.physical))
        .bind(i32::from(a.mental))
        .bind(i32::from(a.tactical))
        .bind(i32::from(a.precision))
        .bind(&a.strengths)
        .bind(&a.weaknesses)
        .bind(&a.recommendations)
        .bind(&a.position_analysis)
        .bind(&a.potential)
        .bind(&a.summary)
        .bind(record.source.as_str())
        .fetch_one(&mut *tx)
        .await?;

        let updated =
            sqlx::query("UPDATE players SET global_score = $1, updated_at = NOW() WHERE id = $2")
                .bind(i32::from(a.global_score))
                .bind(record.player_id)
                .execute(&mut *tx)
                .await?;
        if updated.rows_affected() == 0 {
            // Dropping the transaction rolls back the insert
            return Err(AppError::NotFound(format!(
                "Player {} not found",
                record.player_id
            )));
        }

        tx.commit().await?;
        Ok(row)
    }

    async fn list_analyses(&self, player_id: Uuid) -> Result<Vec<AnalysisRow>, AppError> {
        let rows = sqlx::query_as::<_, AnalysisRow>(
            "SELECT * FROM video_analyses WHERE player_id = $1 ORDER BY created_at DESC",
        )
        .bind(player_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
