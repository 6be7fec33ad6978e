use anyhow::{Context, Result as AnyResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use sqlx::{FromRow, QueryBuilder};
use uuid::Uuid;

use super::{Result, Storage, StoreError};
use crate::models::{
    Curriculum, CurriculumPatch, CurriculumTopic, NewCurriculum, NewSubject, NewTopic, NewTutor,
    NewUser, NewVideo, Role, SearchFilters, Subject, TopicPatch, Tutor, TutorStatus, User, Video,
};

/// Relational implementation of [`Storage`] on a Postgres-compatible
/// database. Mirrors the in-memory store's contract; filter composition
/// is translated into SQL predicates instead of in-process scans.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connects to the database and ensures the schema exists.
    pub async fn connect(database_url: &str) -> AnyResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(std::time::Duration::from_secs(10))
            .connect(database_url)
            .await
            .context("Failed to connect to the application database")?;
        let store = PgStore { pool };
        store.initialize_schema().await?;
        Ok(store)
    }

    async fn initialize_schema(&self) -> AnyResult<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS users (
                id UUID PRIMARY KEY,
                username TEXT NOT NULL,
                email TEXT NOT NULL,
                hashed_password TEXT NOT NULL,
                full_name TEXT NOT NULL,
                role TEXT NOT NULL,
                is_email_verified BOOLEAN NOT NULL DEFAULT FALSE,
                last_login_at TIMESTAMPTZ,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .context("Failed to create users table")?;

        sqlx::query("CREATE UNIQUE INDEX IF NOT EXISTS uq_users_username ON users (username)")
            .execute(&self.pool)
            .await
            .context("Failed to create username index")?;
        sqlx::query("CREATE UNIQUE INDEX IF NOT EXISTS uq_users_email ON users (email)")
            .execute(&self.pool)
            .await
            .context("Failed to create email index")?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS tutors (
                id UUID PRIMARY KEY,
                name TEXT NOT NULL,
                subjects TEXT[] NOT NULL DEFAULT '{}',
                grades TEXT[] NOT NULL DEFAULT '{}',
                education TEXT NOT NULL DEFAULT '',
                experience TEXT NOT NULL DEFAULT '',
                price_per_hour BIGINT NOT NULL,
                rating TEXT NOT NULL DEFAULT '0',
                review_count BIGINT NOT NULL DEFAULT 0,
                status TEXT NOT NULL DEFAULT 'offline',
                is_verified BOOLEAN NOT NULL DEFAULT FALSE,
                is_top_rated BOOLEAN NOT NULL DEFAULT FALSE,
                badges TEXT[] NOT NULL DEFAULT '{}',
                profile_image TEXT,
                time_slots TEXT[] NOT NULL DEFAULT '{}',
                description TEXT NOT NULL DEFAULT '',
                created_at TIMESTAMPTZ NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .context("Failed to create tutors table")?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS videos (
                id UUID PRIMARY KEY,
                tutor_id UUID NOT NULL,
                subject TEXT NOT NULL,
                title TEXT NOT NULL,
                duration TEXT NOT NULL DEFAULT '',
                thumbnail_color TEXT NOT NULL DEFAULT '',
                created_at TIMESTAMPTZ NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .context("Failed to create videos table")?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS subjects (
                id UUID PRIMARY KEY,
                name TEXT NOT NULL,
                name_vi TEXT NOT NULL,
                icon TEXT NOT NULL DEFAULT '',
                color TEXT NOT NULL DEFAULT '',
                is_active BOOLEAN NOT NULL DEFAULT TRUE
            )",
        )
        .execute(&self.pool)
        .await
        .context("Failed to create subjects table")?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS curriculums (
                id UUID PRIMARY KEY,
                tutor_id UUID NOT NULL,
                subject_name TEXT NOT NULL,
                grade TEXT NOT NULL,
                title TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                difficulty TEXT NOT NULL DEFAULT 'beginner',
                estimated_hours INTEGER NOT NULL DEFAULT 0,
                price BIGINT NOT NULL DEFAULT 0,
                is_active BOOLEAN NOT NULL DEFAULT TRUE,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .context("Failed to create curriculums table")?;

        // "order" is reserved in SQL; the column is sort_order.
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS curriculum_topics (
                id UUID PRIMARY KEY,
                curriculum_id UUID NOT NULL REFERENCES curriculums (id) ON DELETE CASCADE,
                title TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                sort_order INTEGER NOT NULL,
                estimated_minutes INTEGER NOT NULL DEFAULT 0,
                objectives JSONB NOT NULL DEFAULT '[]',
                resources JSONB NOT NULL DEFAULT '{}'
            )",
        )
        .execute(&self.pool)
        .await
        .context("Failed to create curriculum_topics table")?;

        Ok(())
    }

    async fn topics_for(&self, curriculum_ids: &[Uuid]) -> Result<Vec<CurriculumTopic>> {
        let rows: Vec<TopicRow> = sqlx::query_as(
            "SELECT id, curriculum_id, title, description, sort_order, estimated_minutes,
                    objectives, resources
             FROM curriculum_topics
             WHERE curriculum_id = ANY($1)
             ORDER BY sort_order ASC, id ASC",
        )
        .bind(curriculum_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(CurriculumTopic::from).collect())
    }
}

#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    hashed_password: String,
    full_name: String,
    role: String,
    is_email_verified: bool,
    last_login_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<User> {
        Ok(User {
            id: row.id,
            username: row.username,
            email: row.email,
            hashed_password: row.hashed_password,
            full_name: row.full_name,
            role: row.role.parse::<Role>().map_err(StoreError::Corrupt)?,
            is_email_verified: row.is_email_verified,
            last_login_at: row.last_login_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct TutorRow {
    id: Uuid,
    name: String,
    subjects: Vec<String>,
    grades: Vec<String>,
    education: String,
    experience: String,
    price_per_hour: i64,
    rating: String,
    review_count: i64,
    status: String,
    is_verified: bool,
    is_top_rated: bool,
    badges: Vec<String>,
    profile_image: Option<String>,
    time_slots: Vec<String>,
    description: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<TutorRow> for Tutor {
    type Error = StoreError;

    fn try_from(row: TutorRow) -> Result<Tutor> {
        Ok(Tutor {
            id: row.id,
            name: row.name,
            subjects: row.subjects,
            grades: row.grades,
            education: row.education,
            experience: row.experience,
            price_per_hour: row.price_per_hour,
            rating: row.rating,
            review_count: row.review_count,
            status: row
                .status
                .parse::<TutorStatus>()
                .map_err(StoreError::Corrupt)?,
            is_verified: row.is_verified,
            is_top_rated: row.is_top_rated,
            badges: row.badges,
            profile_image: row.profile_image,
            time_slots: row.time_slots,
            description: row.description,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct CurriculumRow {
    id: Uuid,
    tutor_id: Uuid,
    subject_name: String,
    grade: String,
    title: String,
    description: String,
    difficulty: String,
    estimated_hours: i32,
    price: i64,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CurriculumRow {
    fn into_curriculum(self, topics: Vec<CurriculumTopic>) -> Result<Curriculum> {
        Ok(Curriculum {
            id: self.id,
            tutor_id: self.tutor_id,
            subject_name: self.subject_name,
            grade: self.grade,
            title: self.title,
            description: self.description,
            difficulty: self
                .difficulty
                .parse()
                .map_err(StoreError::Corrupt)?,
            estimated_hours: self.estimated_hours,
            price: self.price,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
            topics,
        })
    }
}

#[derive(FromRow)]
struct TopicRow {
    id: Uuid,
    curriculum_id: Uuid,
    title: String,
    description: String,
    sort_order: i32,
    estimated_minutes: i32,
    objectives: Json<Vec<String>>,
    resources: Json<crate::models::TopicResources>,
}

impl From<TopicRow> for CurriculumTopic {
    fn from(row: TopicRow) -> Self {
        CurriculumTopic {
            id: row.id,
            curriculum_id: row.curriculum_id,
            title: row.title,
            description: row.description,
            order: row.sort_order,
            estimated_minutes: row.estimated_minutes,
            objectives: row.objectives.0,
            resources: row.resources.0,
        }
    }
}

/// Maps a unique-index violation onto the conflict variants so callers
/// see the same error shape as the in-memory store.
fn map_unique_violation(err: sqlx::Error, data: &NewUser) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some("23505") {
            let constraint = db_err.constraint().unwrap_or_default();
            if constraint.contains("username") {
                return StoreError::UsernameTaken(data.username.clone());
            }
            if constraint.contains("email") {
                return StoreError::EmailTaken(data.email.clone());
            }
        }
    }
    StoreError::Database(err)
}

#[async_trait]
impl Storage for PgStore {
    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(User::try_from).transpose()
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        row.map(User::try_from).transpose()
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        row.map(User::try_from).transpose()
    }

    async fn create_user(&self, data: NewUser) -> Result<User> {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: data.username.clone(),
            email: data.email.clone(),
            hashed_password: data.hashed_password.clone(),
            full_name: data.full_name.clone(),
            role: data.role.unwrap_or(Role::Student),
            is_email_verified: false,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };
        sqlx::query(
            "INSERT INTO users (id, username, email, hashed_password, full_name, role,
                                is_email_verified, last_login_at, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.hashed_password)
        .bind(&user.full_name)
        .bind(user.role.as_str())
        .bind(user.is_email_verified)
        .bind(user.last_login_at)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, &data))?;
        Ok(user)
    }

    async fn update_user_last_login(&self, id: Uuid) -> Result<()> {
        let now = Utc::now();
        sqlx::query("UPDATE users SET last_login_at = $1, updated_at = $1 WHERE id = $2")
            .bind(now)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_tutors(&self, filters: &SearchFilters) -> Result<Vec<Tutor>> {
        let mut qb: QueryBuilder<sqlx::Postgres> =
            QueryBuilder::new("SELECT * FROM tutors WHERE TRUE");
        if let Some(subject) = &filters.subject {
            qb.push(" AND EXISTS (SELECT 1 FROM unnest(subjects) AS s WHERE lower(s) = lower(");
            qb.push_bind(subject.clone());
            qb.push("))");
        }
        if let Some(course_type) = &filters.course_type {
            qb.push(" AND EXISTS (SELECT 1 FROM unnest(grades) AS g WHERE lower(g) = lower(");
            qb.push_bind(course_type.clone());
            qb.push("))");
        }
        if let Some(min) = filters.min_price {
            qb.push(" AND price_per_hour >= ");
            qb.push_bind(min);
        }
        if let Some(max) = filters.max_price {
            qb.push(" AND price_per_hour <= ");
            qb.push_bind(max);
        }
        if !filters.time_slots.is_empty() {
            qb.push(" AND time_slots && ");
            qb.push_bind(filters.time_slots.clone());
        }
        if let Some(keywords) = &filters.keywords {
            let pattern = format!("%{keywords}%");
            qb.push(" AND (name ILIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" OR education ILIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" OR description ILIKE ");
            qb.push_bind(pattern);
            qb.push(")");
        }
        // Popularity score, read-time computed like the memory store; an
        // unparseable rating counts as zero.
        qb.push(
            " ORDER BY (CASE WHEN rating ~ '^[0-9]+(\\.[0-9]+)?$' THEN rating::numeric ELSE 0 END)
                       * review_count DESC, created_at DESC, id ASC",
        );

        let rows: Vec<TutorRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        rows.into_iter().map(Tutor::try_from).collect()
    }

    async fn get_tutor(&self, id: Uuid) -> Result<Option<Tutor>> {
        let row: Option<TutorRow> = sqlx::query_as("SELECT * FROM tutors WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Tutor::try_from).transpose()
    }

    async fn create_tutor(&self, data: NewTutor) -> Result<Tutor> {
        let tutor = Tutor {
            id: Uuid::new_v4(),
            name: data.name,
            subjects: data.subjects,
            grades: data.grades,
            education: data.education,
            experience: data.experience,
            price_per_hour: data.price_per_hour,
            rating: data.rating,
            review_count: data.review_count,
            status: data.status,
            is_verified: data.is_verified,
            is_top_rated: data.is_top_rated,
            badges: data.badges,
            profile_image: data.profile_image,
            time_slots: data.time_slots,
            description: data.description,
            created_at: Utc::now(),
        };
        sqlx::query(
            "INSERT INTO tutors (id, name, subjects, grades, education, experience,
                                 price_per_hour, rating, review_count, status, is_verified,
                                 is_top_rated, badges, profile_image, time_slots, description,
                                 created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)",
        )
        .bind(tutor.id)
        .bind(&tutor.name)
        .bind(&tutor.subjects)
        .bind(&tutor.grades)
        .bind(&tutor.education)
        .bind(&tutor.experience)
        .bind(tutor.price_per_hour)
        .bind(&tutor.rating)
        .bind(tutor.review_count)
        .bind(tutor.status.as_str())
        .bind(tutor.is_verified)
        .bind(tutor.is_top_rated)
        .bind(&tutor.badges)
        .bind(&tutor.profile_image)
        .bind(&tutor.time_slots)
        .bind(&tutor.description)
        .bind(tutor.created_at)
        .execute(&self.pool)
        .await?;
        Ok(tutor)
    }

    async fn get_videos(&self) -> Result<Vec<Video>> {
        let videos: Vec<Video> = sqlx::query_as::<_, VideoRow>(
            "SELECT * FROM videos ORDER BY created_at DESC, id ASC",
        )
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Video::from)
        .collect();
        Ok(videos)
    }

    async fn create_video(&self, data: NewVideo) -> Result<Video> {
        let video = Video {
            id: Uuid::new_v4(),
            tutor_id: data.tutor_id,
            subject: data.subject,
            title: data.title,
            duration: data.duration,
            thumbnail_color: data.thumbnail_color,
            created_at: Utc::now(),
        };
        sqlx::query(
            "INSERT INTO videos (id, tutor_id, subject, title, duration, thumbnail_color, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(video.id)
        .bind(video.tutor_id)
        .bind(&video.subject)
        .bind(&video.title)
        .bind(&video.duration)
        .bind(&video.thumbnail_color)
        .bind(video.created_at)
        .execute(&self.pool)
        .await?;
        Ok(video)
    }

    async fn get_subjects(&self) -> Result<Vec<Subject>> {
        let subjects: Vec<Subject> = sqlx::query_as::<_, SubjectRow>(
            "SELECT * FROM subjects WHERE is_active ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Subject::from)
        .collect();
        Ok(subjects)
    }

    async fn create_subject(&self, data: NewSubject) -> Result<Subject> {
        let subject = Subject {
            id: Uuid::new_v4(),
            name: data.name,
            name_vi: data.name_vi,
            icon: data.icon,
            color: data.color,
            is_active: data.is_active,
        };
        sqlx::query(
            "INSERT INTO subjects (id, name, name_vi, icon, color, is_active)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(subject.id)
        .bind(&subject.name)
        .bind(&subject.name_vi)
        .bind(&subject.icon)
        .bind(&subject.color)
        .bind(subject.is_active)
        .execute(&self.pool)
        .await?;
        Ok(subject)
    }

    async fn get_curriculums(&self, tutor_id: Uuid) -> Result<Vec<Curriculum>> {
        let rows: Vec<CurriculumRow> = sqlx::query_as(
            "SELECT * FROM curriculums WHERE tutor_id = $1 ORDER BY created_at DESC, id ASC",
        )
        .bind(tutor_id)
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut by_curriculum: std::collections::HashMap<Uuid, Vec<CurriculumTopic>> =
            std::collections::HashMap::new();
        for topic in self.topics_for(&ids).await? {
            by_curriculum.entry(topic.curriculum_id).or_default().push(topic);
        }

        rows.into_iter()
            .map(|row| {
                let topics = by_curriculum.remove(&row.id).unwrap_or_default();
                row.into_curriculum(topics)
            })
            .collect()
    }

    async fn get_curriculum(&self, id: Uuid) -> Result<Option<Curriculum>> {
        let row: Option<CurriculumRow> = sqlx::query_as("SELECT * FROM curriculums WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        let topics = self.topics_for(&[row.id]).await?;
        row.into_curriculum(topics).map(Some)
    }

    async fn create_curriculum(&self, data: NewCurriculum) -> Result<Curriculum> {
        let now = Utc::now();
        let curriculum_id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO curriculums (id, tutor_id, subject_name, grade, title, description,
                                      difficulty, estimated_hours, price, is_active,
                                      created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(curriculum_id)
        .bind(data.tutor_id)
        .bind(&data.subject_name)
        .bind(&data.grade)
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.difficulty.as_str())
        .bind(data.estimated_hours)
        .bind(data.price)
        .bind(data.is_active)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let mut topics = Vec::with_capacity(data.topics.len());
        for inline in data.topics {
            let topic = CurriculumTopic {
                id: Uuid::new_v4(),
                curriculum_id,
                title: inline.title,
                description: inline.description,
                order: inline.order,
                estimated_minutes: inline.estimated_minutes,
                objectives: inline.objectives,
                resources: inline.resources,
            };
            sqlx::query(
                "INSERT INTO curriculum_topics (id, curriculum_id, title, description,
                                                sort_order, estimated_minutes, objectives, resources)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            )
            .bind(topic.id)
            .bind(topic.curriculum_id)
            .bind(&topic.title)
            .bind(&topic.description)
            .bind(topic.order)
            .bind(topic.estimated_minutes)
            .bind(Json(&topic.objectives))
            .bind(Json(&topic.resources))
            .execute(&self.pool)
            .await?;
            topics.push(topic);
        }
        topics.sort_by_key(|t| t.order);

        Ok(Curriculum {
            id: curriculum_id,
            tutor_id: data.tutor_id,
            subject_name: data.subject_name,
            grade: data.grade,
            title: data.title,
            description: data.description,
            difficulty: data.difficulty,
            estimated_hours: data.estimated_hours,
            price: data.price,
            is_active: data.is_active,
            created_at: now,
            updated_at: now,
            topics,
        })
    }

    async fn update_curriculum(
        &self,
        id: Uuid,
        patch: CurriculumPatch,
    ) -> Result<Option<Curriculum>> {
        let Some(mut current) = self.get_curriculum(id).await? else {
            return Ok(None);
        };
        if let Some(subject_name) = patch.subject_name {
            current.subject_name = subject_name;
        }
        if let Some(grade) = patch.grade {
            current.grade = grade;
        }
        if let Some(title) = patch.title {
            current.title = title;
        }
        if let Some(description) = patch.description {
            current.description = description;
        }
        if let Some(difficulty) = patch.difficulty {
            current.difficulty = difficulty;
        }
        if let Some(estimated_hours) = patch.estimated_hours {
            current.estimated_hours = estimated_hours;
        }
        if let Some(price) = patch.price {
            current.price = price;
        }
        if let Some(is_active) = patch.is_active {
            current.is_active = is_active;
        }
        current.updated_at = Utc::now();

        sqlx::query(
            "UPDATE curriculums SET subject_name = $1, grade = $2, title = $3, description = $4,
                                    difficulty = $5, estimated_hours = $6, price = $7,
                                    is_active = $8, updated_at = $9
             WHERE id = $10",
        )
        .bind(&current.subject_name)
        .bind(&current.grade)
        .bind(&current.title)
        .bind(&current.description)
        .bind(current.difficulty.as_str())
        .bind(current.estimated_hours)
        .bind(current.price)
        .bind(current.is_active)
        .bind(current.updated_at)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(Some(current))
    }

    async fn delete_curriculum(&self, id: Uuid) -> Result<bool> {
        // Topics go with it via ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM curriculums WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_curriculum_topics(&self, curriculum_id: Uuid) -> Result<Vec<CurriculumTopic>> {
        self.topics_for(&[curriculum_id]).await
    }

    async fn create_curriculum_topic(&self, data: NewTopic) -> Result<CurriculumTopic> {
        let topic = CurriculumTopic {
            id: Uuid::new_v4(),
            curriculum_id: data.curriculum_id,
            title: data.title,
            description: data.description,
            order: data.order,
            estimated_minutes: data.estimated_minutes,
            objectives: data.objectives,
            resources: data.resources,
        };
        sqlx::query(
            "INSERT INTO curriculum_topics (id, curriculum_id, title, description,
                                            sort_order, estimated_minutes, objectives, resources)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(topic.id)
        .bind(topic.curriculum_id)
        .bind(&topic.title)
        .bind(&topic.description)
        .bind(topic.order)
        .bind(topic.estimated_minutes)
        .bind(Json(&topic.objectives))
        .bind(Json(&topic.resources))
        .execute(&self.pool)
        .await?;
        Ok(topic)
    }

    async fn update_curriculum_topic(
        &self,
        id: Uuid,
        patch: TopicPatch,
    ) -> Result<Option<CurriculumTopic>> {
        let row: Option<TopicRow> = sqlx::query_as("SELECT * FROM curriculum_topics WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        let mut topic = CurriculumTopic::from(row);
        if let Some(title) = patch.title {
            topic.title = title;
        }
        if let Some(description) = patch.description {
            topic.description = description;
        }
        if let Some(order) = patch.order {
            topic.order = order;
        }
        if let Some(estimated_minutes) = patch.estimated_minutes {
            topic.estimated_minutes = estimated_minutes;
        }
        if let Some(objectives) = patch.objectives {
            topic.objectives = objectives;
        }
        if let Some(resources) = patch.resources {
            topic.resources = resources;
        }
        sqlx::query(
            "UPDATE curriculum_topics SET title = $1, description = $2, sort_order = $3,
                                          estimated_minutes = $4, objectives = $5, resources = $6
             WHERE id = $7",
        )
        .bind(&topic.title)
        .bind(&topic.description)
        .bind(topic.order)
        .bind(topic.estimated_minutes)
        .bind(Json(&topic.objectives))
        .bind(Json(&topic.resources))
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(Some(topic))
    }

    async fn delete_curriculum_topic(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM curriculum_topics WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[derive(FromRow)]
struct VideoRow {
    id: Uuid,
    tutor_id: Uuid,
    subject: String,
    title: String,
    duration: String,
    thumbnail_color: String,
    created_at: DateTime<Utc>,
}

impl From<VideoRow> for Video {
    fn from(row: VideoRow) -> Self {
        Video {
            id: row.id,
            tutor_id: row.tutor_id,
            subject: row.subject,
            title: row.title,
            duration: row.duration,
            thumbnail_color: row.thumbnail_color,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct SubjectRow {
    id: Uuid,
    name: String,
    name_vi: String,
    icon: String,
    color: String,
    is_active: bool,
}

impl From<SubjectRow> for Subject {
    fn from(row: SubjectRow) -> Self {
        Subject {
            id: row.id,
            name: row.name,
            name_vi: row.name_vi,
            icon: row.icon,
            color: row.color,
            is_active: row.is_active,
        }
    }
}
