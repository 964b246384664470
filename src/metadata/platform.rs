use super::MetadataRecord;
use serde::{Deserialize, Serialize};

/// Publishing targets with their own title limits and hashtag conventions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    YouTube,
    TikTok,
    Instagram,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::YouTube, Platform::TikTok, Platform::Instagram];

    pub fn max_title_length(self) -> usize {
        match self {
            Platform::YouTube => 60,
            Platform::TikTok => 150,
            Platform::Instagram => 125,
        }
    }

    fn extra_hashtags(self) -> &'static [&'static str] {
        match self {
            Platform::YouTube => &["#shorts", "#youtube"],
            Platform::TikTok => &["#fyp", "#viral", "#tiktok"],
            Platform::Instagram => &["#reels", "#instagram", "#viral"],
        }
    }
}

/// Copy of `record` adjusted for one platform: the title is cut to the
/// platform limit with a trailing `...`, and the platform's hashtags are
/// appended. The hashtag list comes back without duplicates, in first-seen order.
pub fn optimize_for_platform(record: &MetadataRecord, platform: Platform) -> MetadataRecord {
    let max = platform.max_title_length();
    let title = if record.title.chars().count() > max {
        let mut cut: String = record.title.chars().take(max.saturating_sub(3)).collect();
        cut.push_str("...");
        cut
    } else {
        record.title.clone()
    };

    let mut hashtags: Vec<String> = Vec::with_capacity(record.hashtags.len() + 3);
    let candidates = record
        .hashtags
        .iter()
        .map(String::as_str)
        .chain(platform.extra_hashtags().iter().copied());
    for tag in candidates {
        if !hashtags.iter().any(|existing| existing == tag) {
            hashtags.push(tag.to_string());
        }
    }

    MetadataRecord {
        title,
        hashtags,
        ..record.clone()
    }
}
