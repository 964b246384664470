use super::{
    ContentAnalysis, GeneratedMetadata, MetadataRecord, MetadataSource, PlatformVariant,
    PlatformVariants,
};
use crate::clip::ClipDescriptor;
use crate::error::MetadataParseError;
use crate::llm::LLM;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Generates clip metadata through an LLM, falling back to fixed templates
/// whenever the model's answer is unusable
#[derive(Clone)]
pub struct MetadataGenerator {
    llm: Arc<dyn LLM>,
}

impl MetadataGenerator {
    pub fn new(llm: Arc<dyn LLM>) -> Self {
        Self { llm }
    }

    /// Title, description, hashtags and platform variants for a gaming clip
    pub async fn generate_gaming_metadata(
        &self,
        clip_title: &str,
        game_name: Option<&str>,
        duration_seconds: Option<u32>,
    ) -> MetadataRecord {
        self.generate_with_source(clip_title, game_name, duration_seconds)
            .await
            .record
    }

    /// Same as [`generate_gaming_metadata`](Self::generate_gaming_metadata) but
    /// reports whether the record came from the model or the fallback templates
    pub async fn generate_with_source(
        &self,
        clip_title: &str,
        game_name: Option<&str>,
        duration_seconds: Option<u32>,
    ) -> GeneratedMetadata {
        let game_name = normalize_game(game_name);
        let prompt = gaming_metadata_prompt(clip_title, game_name, duration_seconds);

        let parsed = match self.llm.complete(&prompt, None).await {
            Ok(response) => {
                debug!("LLM metadata response received ({} chars)", response.len());
                parse_metadata_response(&response).map_err(|e| e.to_string())
            }
            Err(e) => Err(e.to_string()),
        };

        match parsed {
            Ok(record) => {
                info!("🤖 Generated metadata with {}: {}", self.llm.default_model(), record.title);
                GeneratedMetadata {
                    record,
                    source: MetadataSource::Model,
                }
            }
            Err(reason) => {
                warn!("⚠️ Unusable AI response ({}), using fallback metadata", reason);
                GeneratedMetadata {
                    record: fallback_metadata(clip_title, game_name),
                    source: MetadataSource::Fallback,
                }
            }
        }
    }

    /// Metadata for a parsed clip, titled from its game and capture date
    pub async fn generate_for_clip(&self, clip: &ClipDescriptor) -> GeneratedMetadata {
        let clip_title = clip_title_for(clip);
        self.generate_with_source(&clip_title, clip.game_name.as_deref(), None)
            .await
    }

    /// Content type, engagement estimate and posting advice for a clip
    pub async fn analyze_content(&self, clip_title: &str, file_path: &str) -> ContentAnalysis {
        let prompt = content_analysis_prompt(clip_title, file_path);

        let parsed = match self.llm.complete(&prompt, None).await {
            Ok(response) => parse_json_response::<ContentAnalysis>(&response).map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };

        parsed.unwrap_or_else(|reason| {
            warn!("⚠️ Unusable AI analysis ({}), using fallback analysis", reason);
            fallback_analysis()
        })
    }
}

fn normalize_game(game_name: Option<&str>) -> Option<&str> {
    game_name.map(str::trim).filter(|game| !game.is_empty())
}

/// Human title derived from a clip descriptor, e.g. `Valorant Epic Moment - July 12, 2025`
pub fn clip_title_for(clip: &ClipDescriptor) -> String {
    let game = normalize_game(clip.game_name.as_deref()).unwrap_or("Gaming");

    match clip.timestamp {
        Some(timestamp) => format!("{} Epic Moment - {}", game, timestamp.format("%B %d, %Y")),
        None => format!("{} Amazing Play", game),
    }
}

fn gaming_metadata_prompt(
    clip_title: &str,
    game_name: Option<&str>,
    duration_seconds: Option<u32>,
) -> String {
    let game_context = game_name
        .map(|game| format!(" for {}", game))
        .unwrap_or_default();
    let duration_context = duration_seconds
        .map(|seconds| format!(" ({}s long)", seconds))
        .unwrap_or_default();

    format!(
        r##"Create engaging social media metadata for a gaming clip titled "{clip_title}"{game_context}{duration_context}.

Generate:
1. A catchy title (max 60 characters) that would get clicks
2. An engaging description (max 200 characters) with emoji
3. 8-12 trending hashtags relevant to gaming
4. Platform-specific optimizations for YouTube, TikTok and Instagram

Focus on gaming keywords, action words, and viral potential.

Respond with only a JSON object in this format:
{{
    "title": "Epic Gaming Moment!",
    "description": "🎮 Insane clutch play that'll blow your mind! Watch till the end! 🔥",
    "hashtags": ["#gaming", "#epic", "#clutch", "#viral", "#fyp", "#gaming2025"],
    "platforms": {{
        "youtube": {{
            "title": "YouTube optimized title",
            "tags": ["gaming", "highlights"]
        }},
        "tiktok": {{
            "title": "TikTok viral title",
            "hashtags": ["#fyp", "#gaming", "#viral"]
        }},
        "instagram": {{
            "title": "Instagram engaging title",
            "hashtags": ["#reels", "#gaming", "#viral"]
        }}
    }}
}}"##
    )
}

fn content_analysis_prompt(clip_title: &str, file_path: &str) -> String {
    let file_context = if file_path.is_empty() {
        String::new()
    } else {
        format!(" (file: {})", file_path)
    };

    format!(
        r#"Analyze this gaming clip: "{clip_title}"{file_context}

Respond with only a JSON object in this format:
{{
    "content_type": "action/strategy/casual/competitive",
    "engagement_potential": "high/medium/low",
    "suggested_improvements": ["tip1", "tip2"],
    "target_audience": "description",
    "best_platforms": ["youtube", "tiktok", "instagram"],
    "optimal_posting_time": "description"
}}"#
    )
}

/// Strip reasoning blocks and any prose or code fences around the JSON object
fn clean_llm_response(content: &str) -> &str {
    let mut content = content.trim();

    if let Some(end) = content.rfind("</think>") {
        content = content[end + "</think>".len()..].trim();
    }

    match (content.find('{'), content.rfind('}')) {
        (Some(start), Some(end)) if end > start => &content[start..=end],
        _ => content,
    }
}

fn parse_json_response<T: DeserializeOwned>(response: &str) -> Result<T, MetadataParseError> {
    if response.trim().is_empty() {
        return Err(MetadataParseError::EmptyResponse);
    }

    Ok(serde_json::from_str(clean_llm_response(response))?)
}

fn parse_metadata_response(response: &str) -> Result<MetadataRecord, MetadataParseError> {
    let record: MetadataRecord = parse_json_response(response)?;

    if record.title.trim().is_empty() {
        return Err(MetadataParseError::MissingTitle);
    }

    Ok(record)
}

/// Template metadata used when the model's answer cannot be used.
/// Depends only on its arguments.
pub fn fallback_metadata(clip_title: &str, game_name: Option<&str>) -> MetadataRecord {
    let game_name = normalize_game(game_name);
    let base_title = if clip_title.trim().is_empty() {
        "Epic Gaming Moment"
    } else {
        clip_title
    };
    let game_tag = game_name
        .map(|game| format!("#{}", game.to_lowercase().replace(' ', "")))
        .unwrap_or_else(|| "#gaming".to_string());

    MetadataRecord {
        title: format!("🎮 {} - You Won't Believe This!", base_title),
        description: format!(
            "🔥 Amazing {} highlight! Watch till the end! 💯",
            game_name.unwrap_or("gaming")
        ),
        hashtags: [
            "#gaming",
            "#highlights",
            "#epic",
            "#viral",
            "#fyp",
            "#gamer",
            "#clutch",
            "#insane",
            game_tag.as_str(),
            "#gaming2025",
        ]
        .iter()
        .map(|tag| tag.to_string())
        .collect(),
        platforms: PlatformVariants {
            youtube: Some(PlatformVariant {
                title: format!("{} - Epic Gaming Highlight!", base_title),
                tags: strings(&["gaming", "highlights", "viral", "epic"]),
                hashtags: Vec::new(),
            }),
            tiktok: Some(PlatformVariant {
                title: format!("🎮 {} 🔥", base_title),
                tags: Vec::new(),
                hashtags: strings(&["#fyp", "#gaming", "#viral", "#epic"]),
            }),
            instagram: Some(PlatformVariant {
                title: format!("🎮 {} 💯", base_title),
                tags: Vec::new(),
                hashtags: strings(&["#reels", "#gaming", "#viral", "#insane"]),
            }),
            additional: Default::default(),
        },
    }
}

pub fn fallback_analysis() -> ContentAnalysis {
    ContentAnalysis {
        content_type: "gaming".to_string(),
        engagement_potential: "medium".to_string(),
        suggested_improvements: strings(&["Add engaging thumbnail", "Include call-to-action"]),
        target_audience: "Gaming enthusiasts".to_string(),
        best_platforms: strings(&["youtube", "tiktok", "instagram"]),
        optimal_posting_time: "Peak gaming hours (6-10 PM)".to_string(),
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::parse_clip_filename;
    use crate::error::LLMError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Returns a canned answer and remembers the prompts it was sent
    struct ScriptedLLM {
        response: Option<String>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedLLM {
        fn answering(response: &str) -> Arc<Self> {
            Arc::new(Self {
                response: Some(response.to_string()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn unreachable() -> Arc<Self> {
            Arc::new(Self {
                response: None,
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl LLM for ScriptedLLM {
        async fn complete(&self, prompt: &str, _model: Option<&str>) -> Result<String, LLMError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            match &self.response {
                Some(response) => Ok(response.clone()),
                None => Err(LLMError::Status {
                    status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
                    body: "offline".to_string(),
                }),
            }
        }

        async fn models(&self) -> Result<Vec<crate::llm::ModelInfo>, LLMError> {
            Ok(Vec::new())
        }

        fn default_model(&self) -> &str {
            "scripted"
        }
    }

    const MODEL_ANSWER: &str = r##"{
        "title": "Valorant 1v4 Clutch!",
        "description": "🎮 No way this worked 🔥",
        "hashtags": ["#valorant", "#clutch", "#fyp"],
        "platforms": {
            "youtube": {"title": "Insane 1v4 Clutch", "tags": ["valorant", "clutch"]},
            "tiktok": {"title": "1v4?? 😱", "hashtags": ["#fyp"]}
        }
    }"##;

    #[tokio::test]
    async fn test_model_answer_is_used() {
        let llm = ScriptedLLM::answering(MODEL_ANSWER);
        let generator = MetadataGenerator::new(llm.clone());

        let generated = generator
            .generate_with_source("Valorant Epic Moment", Some("Valorant"), Some(30))
            .await;

        assert_eq!(generated.source, MetadataSource::Model);
        assert_eq!(generated.record.title, "Valorant 1v4 Clutch!");
        assert_eq!(generated.record.hashtags, vec!["#valorant", "#clutch", "#fyp"]);
        assert_eq!(
            generated.record.platforms.youtube.as_ref().unwrap().tags,
            vec!["valorant", "clutch"]
        );
        assert!(generated.record.platforms.instagram.is_none());

        let prompts = llm.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains(r#"titled "Valorant Epic Moment" for Valorant (30s long)."#));
        assert!(prompts[0].contains("8-12 trending hashtags"));
    }

    #[tokio::test]
    async fn test_prompt_omits_missing_context() {
        let llm = ScriptedLLM::answering(MODEL_ANSWER);
        let generator = MetadataGenerator::new(llm.clone());

        generator.generate_gaming_metadata("Nice shot", None, None).await;

        let prompts = llm.prompts.lock().unwrap();
        assert!(prompts[0].contains(r#"titled "Nice shot"."#));
    }

    #[tokio::test]
    async fn test_reasoning_and_fences_are_stripped() {
        let response = format!(
            "<think>\nThe user wants {{json}}... let me think.\n</think>\n\nSure! Here it is:\n```json\n{}\n```",
            MODEL_ANSWER
        );
        let generator = MetadataGenerator::new(ScriptedLLM::answering(&response));

        let generated = generator.generate_with_source("x", Some("Valorant"), None).await;
        assert_eq!(generated.source, MetadataSource::Model);
        assert_eq!(generated.record.title, "Valorant 1v4 Clutch!");
    }

    #[tokio::test]
    async fn test_stray_platform_notes_keep_model_answer() {
        let response = r##"{"title": "Ace!", "description": "🎯 Four taps", "hashtags": ["#ace", "#valorant"], "platforms": {"youtube": {"title": "Y"}, "notes": "post at 6pm"}}"##;
        let generator = MetadataGenerator::new(ScriptedLLM::answering(response));

        let generated = generator.generate_with_source("Clip", Some("Valorant"), None).await;

        assert_eq!(generated.source, MetadataSource::Model);
        assert_eq!(generated.record.title, "Ace!");
        assert_eq!(generated.record.hashtags, vec!["#ace", "#valorant"]);
        assert_eq!(generated.record.platforms.youtube.as_ref().unwrap().title, "Y");
        assert!(generated.record.platforms.additional.is_empty());
    }

    #[tokio::test]
    async fn test_unusable_answers_fall_back() {
        for response in [
            "",
            "I can't help with that.",
            r#"{"title": "Truncated", "descr"#,
            r#"{"title": "No hashtags", "description": "d"}"#,
            r#"{"title": "  ", "description": "d", "hashtags": []}"#,
            r#"["not", "an", "object"]"#,
        ] {
            let generator = MetadataGenerator::new(ScriptedLLM::answering(response));
            let generated = generator
                .generate_with_source("Apex Amazing Play", Some("Apex Legends"), None)
                .await;

            assert_eq!(generated.source, MetadataSource::Fallback, "{:?}", response);
            assert_eq!(
                generated.record,
                fallback_metadata("Apex Amazing Play", Some("Apex Legends"))
            );
        }
    }

    #[tokio::test]
    async fn test_unreachable_llm_falls_back() {
        let generator = MetadataGenerator::new(ScriptedLLM::unreachable());

        let record = generator
            .generate_gaming_metadata("Clutch", Some("Valorant"), None)
            .await;
        assert_eq!(record, fallback_metadata("Clutch", Some("Valorant")));
    }

    #[test]
    fn test_fallback_metadata_templates() {
        let record = fallback_metadata("Rocket League Amazing Play", Some("Rocket League"));

        assert_eq!(record.title, "🎮 Rocket League Amazing Play - You Won't Believe This!");
        assert_eq!(
            record.description,
            "🔥 Amazing Rocket League highlight! Watch till the end! 💯"
        );
        assert_eq!(record.hashtags.len(), 10);
        assert_eq!(record.hashtags[8], "#rocketleague");
        assert_eq!(record.hashtags[9], "#gaming2025");

        let youtube = record.platforms.youtube.as_ref().unwrap();
        assert_eq!(youtube.title, "Rocket League Amazing Play - Epic Gaming Highlight!");
        assert_eq!(youtube.tags, vec!["gaming", "highlights", "viral", "epic"]);
        assert_eq!(
            record.platforms.tiktok.as_ref().unwrap().title,
            "🎮 Rocket League Amazing Play 🔥"
        );
        assert_eq!(
            record.platforms.instagram.as_ref().unwrap().hashtags,
            vec!["#reels", "#gaming", "#viral", "#insane"]
        );
    }

    #[test]
    fn test_fallback_without_game_or_title() {
        let record = fallback_metadata("", None);

        assert_eq!(record.title, "🎮 Epic Gaming Moment - You Won't Believe This!");
        assert_eq!(record.description, "🔥 Amazing gaming highlight! Watch till the end! 💯");
        assert_eq!(record.hashtags[8], "#gaming");
        assert_eq!(fallback_metadata("", Some("  ")), record);
    }

    #[test]
    fn test_fallback_is_byte_identical_across_calls() {
        let first = serde_json::to_string(&fallback_metadata("Ace", Some("Counter Strike 2"))).unwrap();
        let second = serde_json::to_string(&fallback_metadata("Ace", Some("Counter Strike 2"))).unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_analyze_content() {
        let answer = r#"{
            "content_type": "competitive",
            "engagement_potential": "high",
            "suggested_improvements": ["Cut the first 3 seconds"],
            "target_audience": "Ranked Valorant players",
            "best_platforms": ["tiktok"],
            "optimal_posting_time": "Friday evening"
        }"#;
        let llm = ScriptedLLM::answering(answer);
        let generator = MetadataGenerator::new(llm.clone());

        let analysis = generator.analyze_content("Valorant Ace", "/clips/ace.mp4").await;
        assert_eq!(analysis.content_type, "competitive");
        assert_eq!(analysis.best_platforms, vec!["tiktok"]);
        assert!(llm.prompts.lock().unwrap()[0].contains("/clips/ace.mp4"));
    }

    #[tokio::test]
    async fn test_analyze_content_fallback() {
        let generator = MetadataGenerator::new(ScriptedLLM::answering("no idea"));
        assert_eq!(generator.analyze_content("Valorant Ace", "").await, fallback_analysis());

        let generator = MetadataGenerator::new(ScriptedLLM::unreachable());
        let analysis = generator.analyze_content("Valorant Ace", "").await;
        assert_eq!(analysis.engagement_potential, "medium");
        assert_eq!(analysis.optimal_posting_time, "Peak gaming hours (6-10 PM)");
    }

    #[test]
    fn test_clip_title_for_descriptor() {
        let clip = parse_clip_filename("Valorant_07-12-2025_23-41-33-933.mp4");
        assert_eq!(clip_title_for(&clip), "Valorant Epic Moment - July 12, 2025");

        let clip = parse_clip_filename("Valorant_02-30-2025_23-41-33-933.mp4");
        assert_eq!(clip_title_for(&clip), "Valorant Amazing Play");

        let clip = parse_clip_filename("random.mp4");
        assert_eq!(clip_title_for(&clip), "Gaming Amazing Play");
    }

    #[tokio::test]
    async fn test_generate_for_clip_passes_game() {
        let generator = MetadataGenerator::new(ScriptedLLM::unreachable());
        let clip = parse_clip_filename("Rocket_League_11-30-2024_18-05-59-1.mp4");

        let generated = generator.generate_for_clip(&clip).await;
        assert_eq!(
            generated.record,
            fallback_metadata("Rocket League Epic Moment - November 30, 2024", Some("Rocket League"))
        );
    }
}
