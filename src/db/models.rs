use crate::error::VisionError;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CREATOR: &str = "Anonymous";
pub const DEFAULT_NETWORK: &str = "Chiliz";
pub const DEFAULT_STATUS: &str = "active";

pub const MAX_ODDS: f64 = 100.0;

/// A stored sports-prediction post.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Vision {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub odds: Option<f64>,
    pub image_url: Option<String>,
    pub image_data: Option<String>,
    pub creator_address: String,
    pub network: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /api/visions`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NewVision {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub odds: Option<f64>,
    pub image_url: Option<String>,
    pub image_data: Option<String>,
    pub creator_address: Option<String>,
    pub network: Option<String>,
    pub status: Option<String>,
}

/// Body of `PUT /api/visions/{id}`. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VisionUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub odds: Option<f64>,
    pub image_url: Option<String>,
    pub status: Option<String>,
}

impl NewVision {
    pub fn new(title: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            category: Some(category.into()),
            ..Self::default()
        }
    }

    /// Blank optional strings count as absent so defaults still apply.
    pub fn normalized(self) -> Self {
        Self {
            title: self.title.map(|t| t.trim().to_string()),
            category: self.category.map(|c| c.trim().to_string()),
            description: non_blank(self.description),
            image_url: non_blank(self.image_url),
            image_data: non_blank(self.image_data),
            creator_address: non_blank(self.creator_address),
            network: non_blank(self.network),
            status: non_blank(self.status),
            odds: self.odds,
        }
    }

    pub fn validate(&self) -> Result<(), VisionError> {
        require_text("title", self.title.as_deref())?;
        require_text("category", self.category.as_deref())?;
        check_odds(self.odds)?;
        check_image_url(self.image_url.as_deref())?;
        check_image_data(self.image_data.as_deref())
    }
}

impl VisionUpdate {
    pub fn normalized(self) -> Self {
        Self {
            title: self.title.map(|t| t.trim().to_string()),
            category: self.category.map(|c| c.trim().to_string()),
            description: self.description,
            image_url: self.image_url.map(|u| u.trim().to_string()),
            status: self.status.map(|s| s.trim().to_string()),
            odds: self.odds,
        }
    }

    /// Same rules as creation, applied only to the fields being replaced.
    pub fn validate(&self) -> Result<(), VisionError> {
        if let Some(title) = self.title.as_deref() {
            require_text("title", Some(title))?;
        }
        if let Some(category) = self.category.as_deref() {
            require_text("category", Some(category))?;
        }
        if let Some(status) = self.status.as_deref() {
            require_text("status", Some(status))?;
        }
        check_odds(self.odds)?;
        check_image_url(self.image_url.as_deref())
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn require_text(field: &str, value: Option<&str>) -> Result<(), VisionError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(()),
        _ => Err(VisionError::Validation(format!("{field} is required"))),
    }
}

fn check_odds(odds: Option<f64>) -> Result<(), VisionError> {
    match odds {
        Some(o) if !(o > 0.0 && o <= MAX_ODDS) => Err(VisionError::Validation(format!(
            "odds must be greater than 0 and at most {MAX_ODDS}, got {o}"
        ))),
        _ => Ok(()),
    }
}

fn check_image_url(url: Option<&str>) -> Result<(), VisionError> {
    match url {
        Some(u) if !u.starts_with("http") => Err(VisionError::Validation(
            "image_url must start with http".to_string(),
        )),
        _ => Ok(()),
    }
}

fn check_image_data(data: Option<&str>) -> Result<(), VisionError> {
    match data {
        Some(d) if !d.starts_with("data:") => Err(VisionError::Validation(
            "image_data must be a data URI".to_string(),
        )),
        _ => Ok(()),
    }
}

/// Fixed-width RFC 3339 so stored text sorts chronologically.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejects(input: NewVision) -> bool {
        matches!(input.normalized().validate(), Err(VisionError::Validation(_)))
    }

    #[test]
    fn create_rules_reject_bad_fields() {
        assert!(rejects(NewVision::new("", "Football")));
        assert!(rejects(NewVision::new("   ", "Football")));
        assert!(rejects(NewVision::new("Team A wins", "")));
        assert!(rejects(NewVision {
            category: None,
            ..NewVision::new("Team A wins", "x")
        }));

        for odds in [0.0, 100.01, -5.0] {
            assert!(rejects(NewVision {
                odds: Some(odds),
                ..NewVision::new("Team A wins", "Football")
            }));
        }

        assert!(rejects(NewVision {
            image_url: Some("ftp://x".into()),
            ..NewVision::new("Team A wins", "Football")
        }));
        assert!(rejects(NewVision {
            image_data: Some("aGVsbG8=".into()),
            ..NewVision::new("Team A wins", "Football")
        }));
    }

    #[test]
    fn odds_bounds_are_inclusive_at_the_top() {
        for odds in [100.0, 0.01] {
            let input = NewVision {
                odds: Some(odds),
                ..NewVision::new("Team A wins", "Football")
            };
            assert!(input.validate().is_ok(), "odds {odds} should be accepted");
        }
    }

    #[test]
    fn blank_optional_fields_are_dropped() {
        let input = NewVision {
            image_url: Some("  ".into()),
            creator_address: Some(String::new()),
            ..NewVision::new(" Team A wins ", "Football")
        }
        .normalized();
        assert_eq!(input.title.as_deref(), Some("Team A wins"));
        assert_eq!(input.image_url, None);
        assert_eq!(input.creator_address, None);
        assert!(input.validate().is_ok());
    }

    #[test]
    fn update_rules_only_touch_supplied_fields() {
        assert!(VisionUpdate::default().validate().is_ok());

        let blank_title = VisionUpdate {
            title: Some(" ".into()),
            ..Default::default()
        };
        assert!(blank_title.normalized().validate().is_err());

        let bad_odds = VisionUpdate {
            odds: Some(0.0),
            ..Default::default()
        };
        assert!(bad_odds.validate().is_err());

        let ok = VisionUpdate {
            status: Some("settled".into()),
            odds: Some(100.0),
            ..Default::default()
        };
        assert!(ok.validate().is_ok());

        let blank_image_url = VisionUpdate {
            image_url: Some("   ".into()),
            ..Default::default()
        };
        assert!(matches!(
            blank_image_url.normalized().validate(),
            Err(VisionError::Validation(_))
        ));
    }

    #[test]
    fn timestamps_have_fixed_width() {
        let a = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(format_timestamp(a), "2024-01-01T00:00:00.000000Z");
    }
}
