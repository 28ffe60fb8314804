use serde::{Deserialize, Serialize};
use std::fmt;

/// The server entities mirrored into the local store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Survey,
    SurveyResponse,
    CommunitySession,
    Comment,
    Feedback,
    Project,
}

impl EntityType {
    pub const ALL: [EntityType; 6] = [
        EntityType::Survey,
        EntityType::SurveyResponse,
        EntityType::CommunitySession,
        EntityType::Comment,
        EntityType::Feedback,
        EntityType::Project,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Survey => "survey",
            EntityType::SurveyResponse => "survey_response",
            EntityType::CommunitySession => "community_session",
            EntityType::Comment => "comment",
            EntityType::Feedback => "feedback",
            EntityType::Project => "project",
        }
    }

    /// REST collection segment for this entity type.
    pub fn collection(&self) -> &'static str {
        match self {
            EntityType::Survey => "surveys",
            EntityType::SurveyResponse => "survey-responses",
            EntityType::CommunitySession => "community-sessions",
            EntityType::Comment => "comments",
            EntityType::Feedback => "feedback",
            EntityType::Project => "projects",
        }
    }

    pub fn parse(value: &str) -> Result<Self, String> {
        match value {
            "survey" => Ok(EntityType::Survey),
            "survey_response" => Ok(EntityType::SurveyResponse),
            "community_session" => Ok(EntityType::CommunitySession),
            "comment" => Ok(EntityType::Comment),
            "feedback" => Ok(EntityType::Feedback),
            "project" => Ok(EntityType::Project),
            other => Err(format!("Unknown entity type: {other}")),
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
