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
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Result, Storage, StoreError};
use crate::models::{
    Curriculum, CurriculumPatch, CurriculumTopic, NewCurriculum, NewSubject, NewTopic, NewTutor,
    NewUser, NewVideo, Role, SearchFilters, Subject, TopicPatch, Tutor, TutorStatus, User, Video,
};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    // Secondary key maps; kept in lockstep with `users` under the same
    // write lock so uniqueness checks are atomic with the insert.
    users_by_username: HashMap<String, Uuid>,
    users_by_email: HashMap<String, Uuid>,
    tutors: HashMap<Uuid, Tutor>,
    videos: HashMap<Uuid, Video>,
    subjects: HashMap<Uuid, Subject>,
    curriculums: HashMap<Uuid, Curriculum>,
    topics: HashMap<Uuid, CurriculumTopic>,
}

/// Map-backed reference implementation of [`Storage`]. Filtering is a
/// linear scan and the popularity ordering is recomputed per call;
/// fine at fixture scale, not built for large datasets.
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore {
            tables: RwLock::new(Tables::default()),
        }
    }

    /// An empty store pre-populated with the fixture catalog.
    pub async fn with_fixtures() -> Self {
        let store = MemoryStore::new();
        store.seed().await;
        store
    }

    async fn seed(&self) {
        let mut tables = self.tables.write().await;
        let now = Utc::now();

        let subjects = [
            ("Toán", "Toán học", "calculator", "#2563eb"),
            ("Ngữ Văn", "Ngữ văn", "book-open", "#db2777"),
            ("Tiếng Anh", "Tiếng Anh", "globe", "#16a34a"),
            ("Vật Lý", "Vật lý", "zap", "#d97706"),
            ("Hóa Học", "Hóa học", "flask", "#7c3aed"),
        ];
        for (name, name_vi, icon, color) in subjects {
            let subject = Subject {
                id: Uuid::new_v4(),
                name: name.to_string(),
                name_vi: name_vi.to_string(),
                icon: icon.to_string(),
                color: color.to_string(),
                is_active: true,
            };
            tables.subjects.insert(subject.id, subject);
        }

        struct Fixture {
            name: &'static str,
            subjects: &'static [&'static str],
            grades: &'static [&'static str],
            education: &'static str,
            experience: &'static str,
            price_per_hour: i64,
            rating: &'static str,
            review_count: i64,
            status: TutorStatus,
            is_top_rated: bool,
            badges: &'static [&'static str],
            time_slots: &'static [&'static str],
            description: &'static str,
        }

        let fixtures = [
            Fixture {
                name: "Cô Nguyễn Thị Hoa",
                subjects: &["Toán"],
                grades: &["Lớp 8", "Lớp 9"],
                education: "Đại học Sư phạm Hà Nội",
                experience: "8 năm",
                price_per_hour: 150_000,
                rating: "4.9",
                review_count: 132,
                status: TutorStatus::Online,
                is_top_rated: true,
                badges: &["Gia sư xuất sắc"],
                time_slots: &["toi-t2-t6", "cuoi-tuan"],
                description: "Chuyên luyện thi vào 10 môn Toán, lớp học nhỏ.",
            },
            Fixture {
                name: "Thầy Trần Văn Minh",
                subjects: &["Vật Lý", "Toán"],
                grades: &["Lớp 10", "Lớp 11", "Lớp 12"],
                education: "Đại học Bách khoa Hà Nội",
                experience: "12 năm",
                price_per_hour: 220_000,
                rating: "4.8",
                review_count: 210,
                status: TutorStatus::Busy,
                is_top_rated: true,
                badges: &["Luyện thi đại học"],
                time_slots: &["toi-t2-t6"],
                description: "Luyện thi đại học khối A, nhiều học sinh đạt 9+.",
            },
            Fixture {
                name: "Cô Lê Thu Trang",
                subjects: &["Tiếng Anh"],
                grades: &["Lớp 6", "Lớp 7", "Lớp 8"],
                education: "Đại học Ngoại ngữ - ĐHQG Hà Nội",
                experience: "6 năm",
                price_per_hour: 180_000,
                rating: "4.7",
                review_count: 95,
                status: TutorStatus::Online,
                is_top_rated: false,
                badges: &["IELTS 8.0"],
                time_slots: &["chieu-t7", "cuoi-tuan"],
                description: "Giao tiếp phản xạ và ngữ pháp nền tảng cho THCS.",
            },
            Fixture {
                name: "Thầy Phạm Quốc Bảo",
                subjects: &["Hóa Học"],
                grades: &["Lớp 10", "Lớp 11", "Lớp 12"],
                education: "Đại học Khoa học Tự nhiên TP.HCM",
                experience: "9 năm",
                price_per_hour: 200_000,
                rating: "4.6",
                review_count: 78,
                status: TutorStatus::Offline,
                is_top_rated: false,
                badges: &[],
                time_slots: &["toi-t2-t6", "chieu-t7"],
                description: "Hóa hữu cơ và vô cơ bám sát đề thi THPT quốc gia.",
            },
            Fixture {
                name: "Cô Vũ Minh Anh",
                subjects: &["Ngữ Văn"],
                grades: &["Lớp 9", "Lớp 12"],
                education: "Đại học Sư phạm TP.HCM",
                experience: "7 năm",
                price_per_hour: 130_000,
                rating: "4.9",
                review_count: 64,
                status: TutorStatus::Online,
                is_top_rated: false,
                badges: &["Chuyên văn"],
                time_slots: &["cuoi-tuan"],
                description: "Nghị luận văn học và kỹ năng viết cho kỳ thi chuyển cấp.",
            },
            Fixture {
                name: "Thầy Hoàng Đức Long",
                subjects: &["Toán", "Tiếng Anh"],
                grades: &["Lớp 4", "Lớp 5"],
                education: "Đại học Giáo dục - ĐHQG Hà Nội",
                experience: "4 năm",
                price_per_hour: 100_000,
                rating: "4.5",
                review_count: 41,
                status: TutorStatus::Online,
                is_top_rated: false,
                badges: &[],
                time_slots: &["chieu-t7"],
                description: "Toán tư duy và tiếng Anh tiểu học, học qua trò chơi.",
            },
        ];

        let mut first_tutors: Vec<(Uuid, &'static str)> = Vec::new();
        for (i, f) in fixtures.iter().enumerate() {
            let tutor = Tutor {
                id: Uuid::new_v4(),
                name: f.name.to_string(),
                subjects: f.subjects.iter().map(|s| s.to_string()).collect(),
                grades: f.grades.iter().map(|s| s.to_string()).collect(),
                education: f.education.to_string(),
                experience: f.experience.to_string(),
                price_per_hour: f.price_per_hour,
                rating: f.rating.to_string(),
                review_count: f.review_count,
                status: f.status,
                is_verified: true,
                is_top_rated: f.is_top_rated,
                badges: f.badges.iter().map(|s| s.to_string()).collect(),
                profile_image: None,
                time_slots: f.time_slots.iter().map(|s| s.to_string()).collect(),
                description: f.description.to_string(),
                // Staggered so the popularity tie-break stays deterministic.
                created_at: now - Duration::minutes(i as i64),
            };
            if i < 2 {
                first_tutors.push((tutor.id, f.subjects[0]));
            }
            tables.tutors.insert(tutor.id, tutor);
        }

        for (tutor_id, subject) in first_tutors {
            let video = Video {
                id: Uuid::new_v4(),
                tutor_id,
                subject: subject.to_string(),
                title: format!("Bài giảng mẫu môn {subject}"),
                duration: "12:30".to_string(),
                thumbnail_color: "#2563eb".to_string(),
                created_at: now,
            };
            tables.videos.insert(video.id, video);
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        MemoryStore::new()
    }
}

/// Predicate for one tutor against one filter set. AND across
/// dimensions; OR inside `time_slots`.
fn matches_filters(tutor: &Tutor, filters: &SearchFilters) -> bool {
    if let Some(subject) = &filters.subject {
        let wanted = subject.to_lowercase();
        if !tutor.subjects.iter().any(|s| s.to_lowercase() == wanted) {
            return false;
        }
    }
    if let Some(course_type) = &filters.course_type {
        let wanted = course_type.to_lowercase();
        if !tutor.grades.iter().any(|g| g.to_lowercase() == wanted) {
            return false;
        }
    }
    if let Some(min) = filters.min_price {
        if tutor.price_per_hour < min {
            return false;
        }
    }
    if let Some(max) = filters.max_price {
        if tutor.price_per_hour > max {
            return false;
        }
    }
    if !filters.time_slots.is_empty()
        && !filters.time_slots.iter().any(|s| tutor.time_slots.contains(s))
    {
        return false;
    }
    if let Some(keywords) = &filters.keywords {
        let needle = keywords.to_lowercase();
        let haystacks = [&tutor.name, &tutor.education, &tutor.description];
        if !haystacks.iter().any(|h| h.to_lowercase().contains(&needle)) {
            return false;
        }
    }
    true
}

fn by_popularity(tutors: &mut Vec<Tutor>) {
    tutors.sort_by(|a, b| {
        b.popularity()
            .partial_cmp(&a.popularity())
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.created_at.cmp(&a.created_at))
            .then_with(|| a.id.cmp(&b.id))
    });
}

#[async_trait]
impl Storage for MemoryStore {
    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users_by_username
            .get(username)
            .and_then(|id| tables.users.get(id))
            .cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users_by_email
            .get(email)
            .and_then(|id| tables.users.get(id))
            .cloned())
    }

    async fn create_user(&self, data: NewUser) -> Result<User> {
        let mut tables = self.tables.write().await;
        if tables.users_by_username.contains_key(&data.username) {
            return Err(StoreError::UsernameTaken(data.username));
        }
        if tables.users_by_email.contains_key(&data.email) {
            return Err(StoreError::EmailTaken(data.email));
        }
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: data.username,
            email: data.email,
            hashed_password: data.hashed_password,
            full_name: data.full_name,
            role: data.role.unwrap_or(Role::Student),
            is_email_verified: false,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };
        tables
            .users_by_username
            .insert(user.username.clone(), user.id);
        tables.users_by_email.insert(user.email.clone(), user.id);
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_user_last_login(&self, id: Uuid) -> Result<()> {
        let mut tables = self.tables.write().await;
        if let Some(user) = tables.users.get_mut(&id) {
            let now = Utc::now();
            user.last_login_at = Some(now);
            user.updated_at = now;
        }
        Ok(())
    }

    async fn get_tutors(&self, filters: &SearchFilters) -> Result<Vec<Tutor>> {
        let tables = self.tables.read().await;
        let mut matched: Vec<Tutor> = tables
            .tutors
            .values()
            .filter(|t| matches_filters(t, filters))
            .cloned()
            .collect();
        by_popularity(&mut matched);
        Ok(matched)
    }

    async fn get_tutor(&self, id: Uuid) -> Result<Option<Tutor>> {
        Ok(self.tables.read().await.tutors.get(&id).cloned())
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
        self.tables
            .write()
            .await
            .tutors
            .insert(tutor.id, tutor.clone());
        Ok(tutor)
    }

    async fn get_videos(&self) -> Result<Vec<Video>> {
        let tables = self.tables.read().await;
        let mut videos: Vec<Video> = tables.videos.values().cloned().collect();
        videos.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
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
        self.tables
            .write()
            .await
            .videos
            .insert(video.id, video.clone());
        Ok(video)
    }

    async fn get_subjects(&self) -> Result<Vec<Subject>> {
        let tables = self.tables.read().await;
        let mut subjects: Vec<Subject> = tables
            .subjects
            .values()
            .filter(|s| s.is_active)
            .cloned()
            .collect();
        subjects.sort_by(|a, b| a.name.cmp(&b.name));
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
        self.tables
            .write()
            .await
            .subjects
            .insert(subject.id, subject.clone());
        Ok(subject)
    }

    async fn get_curriculums(&self, tutor_id: Uuid) -> Result<Vec<Curriculum>> {
        let tables = self.tables.read().await;
        let mut curriculums: Vec<Curriculum> = tables
            .curriculums
            .values()
            .filter(|c| c.tutor_id == tutor_id)
            .cloned()
            .collect();
        curriculums.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(curriculums)
    }

    async fn get_curriculum(&self, id: Uuid) -> Result<Option<Curriculum>> {
        Ok(self.tables.read().await.curriculums.get(&id).cloned())
    }

    async fn create_curriculum(&self, data: NewCurriculum) -> Result<Curriculum> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let curriculum_id = Uuid::new_v4();
        let mut topics: Vec<CurriculumTopic> = data
            .topics
            .into_iter()
            .map(|t| CurriculumTopic {
                id: Uuid::new_v4(),
                curriculum_id,
                title: t.title,
                description: t.description,
                order: t.order,
                estimated_minutes: t.estimated_minutes,
                objectives: t.objectives,
                resources: t.resources,
            })
            .collect();
        topics.sort_by_key(|t| t.order);
        for topic in &topics {
            tables.topics.insert(topic.id, topic.clone());
        }
        let curriculum = Curriculum {
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
        };
        tables.curriculums.insert(curriculum.id, curriculum.clone());
        Ok(curriculum)
    }

    async fn update_curriculum(
        &self,
        id: Uuid,
        patch: CurriculumPatch,
    ) -> Result<Option<Curriculum>> {
        let mut tables = self.tables.write().await;
        let Some(curriculum) = tables.curriculums.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(subject_name) = patch.subject_name {
            curriculum.subject_name = subject_name;
        }
        if let Some(grade) = patch.grade {
            curriculum.grade = grade;
        }
        if let Some(title) = patch.title {
            curriculum.title = title;
        }
        if let Some(description) = patch.description {
            curriculum.description = description;
        }
        if let Some(difficulty) = patch.difficulty {
            curriculum.difficulty = difficulty;
        }
        if let Some(estimated_hours) = patch.estimated_hours {
            curriculum.estimated_hours = estimated_hours;
        }
        if let Some(price) = patch.price {
            curriculum.price = price;
        }
        if let Some(is_active) = patch.is_active {
            curriculum.is_active = is_active;
        }
        curriculum.updated_at = Utc::now();
        Ok(Some(curriculum.clone()))
    }

    async fn delete_curriculum(&self, id: Uuid) -> Result<bool> {
        let mut tables = self.tables.write().await;
        tables.topics.retain(|_, t| t.curriculum_id != id);
        Ok(tables.curriculums.remove(&id).is_some())
    }

    async fn get_curriculum_topics(&self, curriculum_id: Uuid) -> Result<Vec<CurriculumTopic>> {
        let tables = self.tables.read().await;
        let mut topics: Vec<CurriculumTopic> = tables
            .topics
            .values()
            .filter(|t| t.curriculum_id == curriculum_id)
            .cloned()
            .collect();
        topics.sort_by(|a, b| a.order.cmp(&b.order).then(a.id.cmp(&b.id)));
        Ok(topics)
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
        let mut tables = self.tables.write().await;
        tables.topics.insert(topic.id, topic.clone());
        if let Some(curriculum) = tables.curriculums.get_mut(&topic.curriculum_id) {
            curriculum.topics.push(topic.clone());
            curriculum.topics.sort_by_key(|t| t.order);
        }
        Ok(topic)
    }

    async fn update_curriculum_topic(
        &self,
        id: Uuid,
        patch: TopicPatch,
    ) -> Result<Option<CurriculumTopic>> {
        let mut tables = self.tables.write().await;
        let Some(topic) = tables.topics.get_mut(&id) else {
            return Ok(None);
        };
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
        let updated = topic.clone();
        if let Some(curriculum) = tables.curriculums.get_mut(&updated.curriculum_id) {
            if let Some(embedded) = curriculum.topics.iter_mut().find(|t| t.id == id) {
                *embedded = updated.clone();
            }
            curriculum.topics.sort_by_key(|t| t.order);
        }
        Ok(Some(updated))
    }

    async fn delete_curriculum_topic(&self, id: Uuid) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let Some(topic) = tables.topics.remove(&id) else {
            return Ok(false);
        };
        if let Some(curriculum) = tables.curriculums.get_mut(&topic.curriculum_id) {
            curriculum.topics.retain(|t| t.id != id);
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    fn new_tutor(name: &str, price: i64, subjects: &[&str]) -> NewTutor {
        NewTutor {
            name: name.to_string(),
            subjects: subjects.iter().map(|s| s.to_string()).collect(),
            grades: vec!["Lớp 9".to_string()],
            education: "Đại học Sư phạm".to_string(),
            experience: "5 năm".to_string(),
            price_per_hour: price,
            rating: "4.5".to_string(),
            review_count: 10,
            status: TutorStatus::Online,
            is_verified: false,
            is_top_rated: false,
            badges: vec![],
            profile_image: None,
            time_slots: vec!["toi-t2-t6".to_string()],
            description: "Dạy kèm tại nhà".to_string(),
        }
    }

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: email.to_string(),
            hashed_password: "$2b$12$not-a-real-hash".to_string(),
            full_name: "Nguyễn Văn A".to_string(),
            role: None,
        }
    }

    #[tokio::test]
    async fn create_user_assigns_defaults() -> Result<()> {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("hocsinh1", "hs1@example.com")).await?;

        assert_eq!(user.role, Role::Student);
        assert!(!user.is_email_verified);
        assert!(user.last_login_at.is_none());

        let fetched = store.get_user(user.id).await?.expect("user should exist");
        assert_eq!(fetched, user);
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_username_and_email_are_rejected() -> Result<()> {
        let store = MemoryStore::new();
        store.create_user(new_user("hocsinh1", "hs1@example.com")).await?;

        let err = store
            .create_user(new_user("hocsinh1", "other@example.com"))
            .await
            .expect_err("duplicate username must fail");
        assert!(matches!(err, StoreError::UsernameTaken(ref u) if u == "hocsinh1"));

        let err = store
            .create_user(new_user("hocsinh2", "hs1@example.com"))
            .await
            .expect_err("duplicate email must fail");
        assert!(matches!(err, StoreError::EmailTaken(ref e) if e == "hs1@example.com"));

        // The failed attempts must not have left partial entries behind.
        assert!(store.get_user_by_username("hocsinh2").await?.is_none());
        assert!(store.get_user_by_email("other@example.com").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn create_tutor_round_trips() -> Result<()> {
        let store = MemoryStore::new();
        let created = store.create_tutor(new_tutor("Cô A", 150_000, &["Toán"])).await?;

        let fetched = store.get_tutor(created.id).await?.expect("tutor should exist");
        assert_eq!(fetched, created);
        assert_eq!(fetched.price_per_hour, 150_000);
        Ok(())
    }

    #[tokio::test]
    async fn price_range_filter_is_inclusive() -> Result<()> {
        let store = MemoryStore::new();
        store.create_tutor(new_tutor("A", 90_000, &["Toán"])).await?;
        store.create_tutor(new_tutor("B", 100_000, &["Toán"])).await?;
        store.create_tutor(new_tutor("C", 200_000, &["Toán"])).await?;
        store.create_tutor(new_tutor("D", 250_000, &["Toán"])).await?;

        let filters = SearchFilters {
            min_price: Some(100_000),
            max_price: Some(200_000),
            ..Default::default()
        };
        let tutors = store.get_tutors(&filters).await?;
        assert_eq!(tutors.len(), 2);
        assert!(tutors
            .iter()
            .all(|t| (100_000..=200_000).contains(&t.price_per_hour)));
        Ok(())
    }

    #[tokio::test]
    async fn keyword_filter_is_case_insensitive() -> Result<()> {
        let store = MemoryStore::new();
        let mut matching = new_tutor("Cô B", 120_000, &["Toán"]);
        matching.description = "Chuyên Toán luyện thi vào 10".to_string();
        store.create_tutor(matching).await?;

        let mut other = new_tutor("Cô C", 120_000, &["Tiếng Anh"]);
        other.description = "Tiếng Anh giao tiếp".to_string();
        other.education = "Đại học Ngoại ngữ".to_string();
        store.create_tutor(other).await?;

        let filters = SearchFilters {
            keywords: Some("toán".to_string()),
            ..Default::default()
        };
        let tutors = store.get_tutors(&filters).await?;
        assert_eq!(tutors.len(), 1);
        assert_eq!(tutors[0].name, "Cô B");
        Ok(())
    }

    #[tokio::test]
    async fn subject_filter_includes_and_excludes() -> Result<()> {
        let store = MemoryStore::new();
        store.create_tutor(new_tutor("Cô A", 150_000, &["Toán"])).await?;

        let toan = store
            .get_tutors(&SearchFilters {
                subject: Some("Toán".to_string()),
                max_price: Some(200_000),
                ..Default::default()
            })
            .await?;
        assert_eq!(toan.len(), 1);
        assert_eq!(toan[0].name, "Cô A");

        let van = store
            .get_tutors(&SearchFilters {
                subject: Some("Văn".to_string()),
                ..Default::default()
            })
            .await?;
        assert!(van.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn time_slot_filter_matches_any_overlap() -> Result<()> {
        let store = MemoryStore::new();
        let mut weekend = new_tutor("Cuối tuần", 150_000, &["Toán"]);
        weekend.time_slots = vec!["cuoi-tuan".to_string()];
        store.create_tutor(weekend).await?;

        let mut evening = new_tutor("Buổi tối", 150_000, &["Toán"]);
        evening.time_slots = vec!["toi-t2-t6".to_string()];
        store.create_tutor(evening).await?;

        let filters = SearchFilters {
            time_slots: vec!["cuoi-tuan".to_string(), "chieu-t7".to_string()],
            ..Default::default()
        };
        let tutors = store.get_tutors(&filters).await?;
        assert_eq!(tutors.len(), 1);
        assert_eq!(tutors[0].name, "Cuối tuần");
        Ok(())
    }

    #[tokio::test]
    async fn tutors_are_ordered_by_popularity() -> Result<()> {
        let store = MemoryStore::new();
        let mut low = new_tutor("Ít đánh giá", 150_000, &["Toán"]);
        low.rating = "4.0".to_string();
        low.review_count = 5;
        store.create_tutor(low).await?;

        let mut high = new_tutor("Nhiều đánh giá", 150_000, &["Toán"]);
        high.rating = "4.8".to_string();
        high.review_count = 200;
        store.create_tutor(high).await?;

        let tutors = store.get_tutors(&SearchFilters::default()).await?;
        assert_eq!(tutors[0].name, "Nhiều đánh giá");
        assert_eq!(tutors[1].name, "Ít đánh giá");
        Ok(())
    }

    #[tokio::test]
    async fn filtering_is_idempotent() -> Result<()> {
        let store = MemoryStore::with_fixtures().await;
        let filters = SearchFilters {
            subject: Some("Toán".to_string()),
            ..Default::default()
        };
        let first = store.get_tutors(&filters).await?;
        let second = store.get_tutors(&filters).await?;
        assert_eq!(first, second);
        Ok(())
    }

    #[tokio::test]
    async fn fixtures_are_seeded() -> Result<()> {
        let store = MemoryStore::with_fixtures().await;
        assert!(!store.get_tutors(&SearchFilters::default()).await?.is_empty());
        assert!(!store.get_subjects().await?.is_empty());
        assert!(!store.get_videos().await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn inactive_subjects_are_hidden() -> Result<()> {
        let store = MemoryStore::new();
        store
            .create_subject(NewSubject {
                name: "Toán".to_string(),
                name_vi: "Toán học".to_string(),
                icon: String::new(),
                color: String::new(),
                is_active: true,
            })
            .await?;
        store
            .create_subject(NewSubject {
                name: "Tin Học".to_string(),
                name_vi: "Tin học".to_string(),
                icon: String::new(),
                color: String::new(),
                is_active: false,
            })
            .await?;

        let subjects = store.get_subjects().await?;
        assert_eq!(subjects.len(), 1);
        assert_eq!(subjects[0].name, "Toán");
        Ok(())
    }

    fn new_curriculum(tutor_id: Uuid) -> NewCurriculum {
        NewCurriculum {
            tutor_id,
            subject_name: "Toán".to_string(),
            grade: "Lớp 9".to_string(),
            title: "Luyện thi vào 10".to_string(),
            description: "Lộ trình 6 tháng".to_string(),
            difficulty: crate::models::Difficulty::Intermediate,
            estimated_hours: 48,
            price: 3_000_000,
            is_active: true,
            topics: vec![],
        }
    }

    #[tokio::test]
    async fn curriculum_update_merges_and_bumps_updated_at() -> Result<()> {
        let store = MemoryStore::new();
        let created = store.create_curriculum(new_curriculum(Uuid::new_v4())).await?;

        let updated = store
            .update_curriculum(
                created.id,
                CurriculumPatch {
                    title: Some("Luyện thi chuyên".to_string()),
                    price: Some(3_500_000),
                    ..Default::default()
                },
            )
            .await?
            .expect("curriculum should exist");

        assert_eq!(updated.title, "Luyện thi chuyên");
        assert_eq!(updated.price, 3_500_000);
        assert_eq!(updated.grade, created.grade);
        assert!(updated.updated_at >= created.updated_at);

        let missing = store
            .update_curriculum(Uuid::new_v4(), CurriculumPatch::default())
            .await?;
        assert!(missing.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn deleting_curriculum_cascades_to_topics() -> Result<()> {
        let store = MemoryStore::new();
        let curriculum = store.create_curriculum(new_curriculum(Uuid::new_v4())).await?;
        for order in [1, 2, 3] {
            store
                .create_curriculum_topic(NewTopic {
                    curriculum_id: curriculum.id,
                    title: format!("Chuyên đề {order}"),
                    description: String::new(),
                    order,
                    estimated_minutes: 90,
                    objectives: vec![],
                    resources: Default::default(),
                })
                .await?;
        }
        assert_eq!(store.get_curriculum_topics(curriculum.id).await?.len(), 3);

        assert!(store.delete_curriculum(curriculum.id).await?);
        assert!(store.get_curriculum(curriculum.id).await?.is_none());
        assert!(store.get_curriculum_topics(curriculum.id).await?.is_empty());

        // Deleting again reports the curriculum as already gone.
        assert!(!store.delete_curriculum(curriculum.id).await?);
        Ok(())
    }

    #[tokio::test]
    async fn topics_come_back_in_order() -> Result<()> {
        let store = MemoryStore::new();
        let curriculum = store.create_curriculum(new_curriculum(Uuid::new_v4())).await?;
        for order in [30, 10, 20] {
            store
                .create_curriculum_topic(NewTopic {
                    curriculum_id: curriculum.id,
                    title: format!("Chuyên đề {order}"),
                    description: String::new(),
                    order,
                    estimated_minutes: 60,
                    objectives: vec![],
                    resources: Default::default(),
                })
                .await?;
        }
        let topics = store.get_curriculum_topics(curriculum.id).await?;
        let orders: Vec<i32> = topics.iter().map(|t| t.order).collect();
        assert_eq!(orders, vec![10, 20, 30]);
        Ok(())
    }

    #[tokio::test]
    async fn curriculums_are_listed_newest_first_per_tutor() -> Result<()> {
        let store = MemoryStore::new();
        let tutor_id = Uuid::new_v4();
        let first = store.create_curriculum(new_curriculum(tutor_id)).await?;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = store.create_curriculum(new_curriculum(tutor_id)).await?;
        store.create_curriculum(new_curriculum(Uuid::new_v4())).await?;

        let listed = store.get_curriculums(tutor_id).await?;
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, second.id);
        assert_eq!(listed[1].id, first.id);
        Ok(())
    }

    #[tokio::test]
    async fn inline_topics_are_created_with_the_curriculum() -> Result<()> {
        let store = MemoryStore::new();
        let mut data = new_curriculum(Uuid::new_v4());
        data.topics = vec![
            crate::models::NewTopicInline {
                title: "Hệ phương trình".to_string(),
                description: String::new(),
                order: 2,
                estimated_minutes: 90,
                objectives: vec!["Giải hệ bằng phương pháp thế".to_string()],
                resources: Default::default(),
            },
            crate::models::NewTopicInline {
                title: "Căn bậc hai".to_string(),
                description: String::new(),
                order: 1,
                estimated_minutes: 60,
                objectives: vec![],
                resources: Default::default(),
            },
        ];
        let curriculum = store.create_curriculum(data).await?;
        assert_eq!(curriculum.topics.len(), 2);
        assert_eq!(curriculum.topics[0].title, "Căn bậc hai");

        let stored = store.get_curriculum_topics(curriculum.id).await?;
        assert_eq!(stored.len(), 2);
        assert!(stored.iter().all(|t| t.curriculum_id == curriculum.id));
        Ok(())
    }
}
