// Copyright (C) 2025 Kevin Exton
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.
use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{
    Curriculum, CurriculumPatch, CurriculumTopic, NewCurriculum, NewSubject, NewTopic, NewTutor,
    NewUser, NewVideo, SearchFilters, Subject, TopicPatch, Tutor, User, Video,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Username '{0}' is already taken")]
    UsernameTaken(String),
    #[error("Email '{0}' is already taken")]
    EmailTaken(String),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Stored row could not be decoded: {0}")]
    Corrupt(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// The persistence contract shared by the in-memory and relational
/// backends. All data access from the route layer and the auth service
/// goes through this trait.
///
/// Lookups on unknown ids are `Ok(None)` (or `Ok(false)` for deletes),
/// never an error; only infrastructure faults surface as `Err`.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn get_user(&self, id: Uuid) -> Result<Option<User>>;
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Inserts a new user, enforcing username/email uniqueness atomically.
    /// A duplicate surfaces as [`StoreError::UsernameTaken`] or
    /// [`StoreError::EmailTaken`] and leaves the store unchanged.
    async fn create_user(&self, data: NewUser) -> Result<User>;

    async fn update_user_last_login(&self, id: Uuid) -> Result<()>;

    /// All tutors matching every supplied filter dimension (AND across
    /// dimensions, OR within `time_slots`), ordered by descending
    /// popularity score.
    async fn get_tutors(&self, filters: &SearchFilters) -> Result<Vec<Tutor>>;
    async fn get_tutor(&self, id: Uuid) -> Result<Option<Tutor>>;
    async fn create_tutor(&self, data: NewTutor) -> Result<Tutor>;

    async fn get_videos(&self) -> Result<Vec<Video>>;
    async fn create_video(&self, data: NewVideo) -> Result<Video>;

    /// Active subjects only.
    async fn get_subjects(&self) -> Result<Vec<Subject>>;
    async fn create_subject(&self, data: NewSubject) -> Result<Subject>;

    /// All curricula owned by a tutor, newest first.
    async fn get_curriculums(&self, tutor_id: Uuid) -> Result<Vec<Curriculum>>;
    async fn get_curriculum(&self, id: Uuid) -> Result<Option<Curriculum>>;
    async fn create_curriculum(&self, data: NewCurriculum) -> Result<Curriculum>;
    async fn update_curriculum(&self, id: Uuid, patch: CurriculumPatch)
        -> Result<Option<Curriculum>>;

    /// Deletes a curriculum and all of its topics. Returns whether the
    /// curriculum existed.
    async fn delete_curriculum(&self, id: Uuid) -> Result<bool>;

    /// Topics of a curriculum, ascending by `order`.
    async fn get_curriculum_topics(&self, curriculum_id: Uuid) -> Result<Vec<CurriculumTopic>>;
    async fn create_curriculum_topic(&self, data: NewTopic) -> Result<CurriculumTopic>;
    async fn update_curriculum_topic(
        &self,
        id: Uuid,
        patch: TopicPatch,
    ) -> Result<Option<CurriculumTopic>>;
    async fn delete_curriculum_topic(&self, id: Uuid) -> Result<bool>;
}
