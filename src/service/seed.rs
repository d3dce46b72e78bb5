use crate::db::{NewVision, VisionRepository};
use crate::error::VisionError;
use tracing::info;

const SAMPLES: &[(&str, &str, &str, f64, &str, &str)] = &[
    (
        "Argentina Wins Copa América 2024",
        "Lionel Messi leads Argentina to another international triumph",
        "Football",
        2.5,
        "https://images.unsplash.com/photo-1571019613454-1cb2f99b2d8b?w=400&h=300&fit=crop&crop=center",
        "0x1234567890abcdef",
    ),
    (
        "NBA Finals: Lakers vs Celtics",
        "Historic rivalry renewed in the championship series",
        "Basketball",
        3.2,
        "https://images.unsplash.com/photo-1546519638-68e109498ffc?w=400&h=300&fit=crop&crop=center",
        "0xabcdef1234567890",
    ),
    (
        "UFC 300: McGregor Returns",
        "The Notorious makes his comeback in the main event",
        "MMA",
        1.8,
        "https://images.unsplash.com/photo-1544367567-0f2fcb009e0b?w=400&h=300&fit=crop&crop=center",
        "0x9876543210fedcba",
    ),
    (
        "Wimbledon: Djokovic vs Alcaraz",
        "Clash of generations in the grass court final",
        "Tennis",
        2.1,
        "https://images.unsplash.com/photo-1554068865-24cecd4e34b8?w=400&h=300&fit=crop&crop=center",
        "0xfedcba0987654321",
    ),
    (
        "Champions League: Real Madrid vs PSG",
        "European giants face off in quarter-finals",
        "Football",
        2.8,
        "https://images.unsplash.com/photo-1571019613454-1cb2f99b2d8b?w=400&h=300&fit=crop&crop=center",
        "0xabcdef1234567890",
    ),
    (
        "Boxing: Fury vs Usyk Unification",
        "Heavyweight division gets unified champion",
        "Boxing",
        1.9,
        "https://images.unsplash.com/photo-1544367567-0f2fcb009e0b?w=400&h=300&fit=crop&crop=center",
        "0x1234567890abcdef",
    ),
    (
        "F1 Monaco GP: Verstappen Pole",
        "Red Bull driver secures pole position in Monaco",
        "Formula 1",
        1.5,
        "https://images.unsplash.com/photo-1558618666-fcd25c85cd64?w=400&h=300&fit=crop&crop=center",
        "0x9876543210fedcba",
    ),
    (
        "Olympics 100m: American Sweep",
        "USA takes gold, silver, and bronze in sprint",
        "Athletics",
        3.5,
        "https://images.unsplash.com/photo-1571019613454-1cb2f99b2d8b?w=400&h=300&fit=crop&crop=center",
        "0xfedcba0987654321",
    ),
    (
        "Golf Masters: Tiger Woods Comeback",
        "Tiger wins his sixth green jacket",
        "Golf",
        4.2,
        "https://images.unsplash.com/photo-1535131749006-b7f58c99034b?w=400&h=300&fit=crop&crop=center",
        "0xabcdef1234567890",
    ),
];

/// Demo visions used to populate an empty database.
pub fn sample_visions() -> Vec<NewVision> {
    SAMPLES
        .iter()
        .map(
            |(title, description, category, odds, image_url, creator)| NewVision {
                description: Some(description.to_string()),
                odds: Some(*odds),
                image_url: Some(image_url.to_string()),
                creator_address: Some(creator.to_string()),
                network: Some("Chiliz".to_string()),
                ..NewVision::new(*title, *category)
            },
        )
        .collect()
}

/// Insert the samples when the table is empty. Returns how many were written.
pub async fn seed_if_empty(repo: &VisionRepository) -> Result<usize, VisionError> {
    let existing = repo.count().await?;
    if existing > 0 {
        info!(existing, "visions table not empty; skipping seed");
        return Ok(0);
    }

    let mut inserted = 0;
    for vision in sample_visions() {
        let created = repo.create(vision).await?;
        info!(id = created.id, title = %created.title, "seeded vision");
        inserted += 1;
    }
    Ok(inserted)
}
