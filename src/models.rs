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
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Student,
    Tutor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Tutor => "tutor",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Role::Student),
            "tutor" => Ok(Role::Tutor),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TutorStatus {
    Online,
    #[default]
    Offline,
    Busy,
}

impl TutorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TutorStatus::Online => "online",
            TutorStatus::Offline => "offline",
            TutorStatus::Busy => "busy",
        }
    }
}

impl std::str::FromStr for TutorStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "online" => Ok(TutorStatus::Online),
            "offline" => Ok(TutorStatus::Offline),
            "busy" => Ok(TutorStatus::Busy),
            other => Err(format!("unknown tutor status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        }
    }
}

impl std::str::FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "beginner" => Ok(Difficulty::Beginner),
            "intermediate" => Ok(Difficulty::Intermediate),
            "advanced" => Ok(Difficulty::Advanced),
            other => Err(format!("unknown difficulty: {other}")),
        }
    }
}

/// Full user record as held by the store. Never serialized to clients;
/// convert to [`PublicUser`] first.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub hashed_password: String,
    pub full_name: String,
    pub role: Role,
    pub is_email_verified: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Client-facing user projection with the password hash stripped.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub is_email_verified: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        PublicUser {
            id: user.id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            role: user.role,
            is_email_verified: user.is_email_verified,
            last_login_at: user.last_login_at,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Input shape for user creation. Built by the auth service, not taken
/// directly off the wire.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub hashed_password: String,
    pub full_name: String,
    pub role: Option<Role>,
}

/// A teaching-offer profile. Independent of a platform [`User`] account;
/// no foreign key is enforced between the two.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tutor {
    pub id: Uuid,
    pub name: String,
    pub subjects: Vec<String>,
    pub grades: Vec<String>,
    pub education: String,
    pub experience: String,
    /// Hourly rate in VND.
    pub price_per_hour: i64,
    /// Decimal string in "0".."5", e.g. "4.8".
    pub rating: String,
    pub review_count: i64,
    pub status: TutorStatus,
    pub is_verified: bool,
    pub is_top_rated: bool,
    pub badges: Vec<String>,
    pub profile_image: Option<String>,
    pub time_slots: Vec<String>,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl Tutor {
    /// Popularity score used as the default tutor ordering. Computed at
    /// read time, never stored. An unparseable rating counts as zero.
    pub fn popularity(&self) -> f64 {
        self.rating.parse::<f64>().unwrap_or(0.0) * self.review_count as f64
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTutor {
    pub name: String,
    #[serde(default)]
    pub subjects: Vec<String>,
    #[serde(default)]
    pub grades: Vec<String>,
    #[serde(default)]
    pub education: String,
    #[serde(default)]
    pub experience: String,
    pub price_per_hour: i64,
    #[serde(default = "default_rating")]
    pub rating: String,
    #[serde(default)]
    pub review_count: i64,
    #[serde(default)]
    pub status: TutorStatus,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub is_top_rated: bool,
    #[serde(default)]
    pub badges: Vec<String>,
    #[serde(default)]
    pub profile_image: Option<String>,
    #[serde(default)]
    pub time_slots: Vec<String>,
    #[serde(default)]
    pub description: String,
}

fn default_rating() -> String {
    "0".to_string()
}

/// A media asset owned by a tutor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: Uuid,
    pub tutor_id: Uuid,
    pub subject: String,
    pub title: String,
    /// Display duration, e.g. "12:30".
    pub duration: String,
    pub thumbnail_color: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVideo {
    pub tutor_id: Uuid,
    pub subject: String,
    pub title: String,
    pub duration: String,
    #[serde(default)]
    pub thumbnail_color: String,
}

/// Taxonomy entry for the subject picker. Not foreign-keyed to
/// `Tutor.subjects`, which stay free text (see DESIGN.md).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: Uuid,
    pub name: String,
    pub name_vi: String,
    pub icon: String,
    pub color: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSubject {
    pub name: String,
    pub name_vi: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub color: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

/// A structured course plan owned by a tutor, composed of ordered topics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Curriculum {
    pub id: Uuid,
    pub tutor_id: Uuid,
    pub subject_name: String,
    pub grade: String,
    pub title: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub estimated_hours: i32,
    pub price: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub topics: Vec<CurriculumTopic>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCurriculum {
    pub tutor_id: Uuid,
    pub subject_name: String,
    pub grade: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub estimated_hours: i32,
    #[serde(default)]
    pub price: i64,
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Topics may be submitted inline with the plan.
    #[serde(default)]
    pub topics: Vec<NewTopicInline>,
}

/// Partial update; absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurriculumPatch {
    pub subject_name: Option<String>,
    pub grade: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub estimated_hours: Option<i32>,
    pub price: Option<i64>,
    pub is_active: Option<bool>,
}

/// Grouped reference lists attached to a topic.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicResources {
    #[serde(default)]
    pub videos: Vec<String>,
    #[serde(default)]
    pub documents: Vec<String>,
    #[serde(default)]
    pub exercises: Vec<String>,
}

/// An ordered unit within a curriculum. `order` defines display order;
/// it is not guaranteed contiguous.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurriculumTopic {
    pub id: Uuid,
    pub curriculum_id: Uuid,
    pub title: String,
    pub description: String,
    pub order: i32,
    pub estimated_minutes: i32,
    pub objectives: Vec<String>,
    pub resources: TopicResources,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTopic {
    pub curriculum_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub order: i32,
    #[serde(default)]
    pub estimated_minutes: i32,
    #[serde(default)]
    pub objectives: Vec<String>,
    #[serde(default)]
    pub resources: TopicResources,
}

/// Topic shape accepted inline in a curriculum creation body, where the
/// curriculum id is not yet known.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTopicInline {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub order: i32,
    #[serde(default)]
    pub estimated_minutes: i32,
    #[serde(default)]
    pub objectives: Vec<String>,
    #[serde(default)]
    pub resources: TopicResources,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub order: Option<i32>,
    pub estimated_minutes: Option<i32>,
    pub objectives: Option<Vec<String>>,
    pub resources: Option<TopicResources>,
}

/// Transient tutor query shape. Never persisted; every dimension is
/// optional and dimensions combine with AND.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchFilters {
    pub subject: Option<String>,
    pub course_type: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub time_slots: Vec<String>,
    pub keywords: Option<String>,
}

impl SearchFilters {
    pub fn is_empty(&self) -> bool {
        self.subject.is_none()
            && self.course_type.is_none()
            && self.min_price.is_none()
            && self.max_price.is_none()
            && self.time_slots.is_empty()
            && self.keywords.is_none()
    }
}
