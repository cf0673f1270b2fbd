use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Everything that describes the platform's DOM contract plus the fixed
/// wait intervals. The defaults match the target platform as observed;
/// a JSON file can override individual fields when the frontend changes.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpiderConfig {
    /// Login page opened before anything else; the human completes the
    /// login flow there.
    pub login_url: String,

    /// Selector for the lesson title on the outer page.
    pub title_selector: String,
    /// How long to poll for the title element before giving up on the page.
    pub title_timeout_secs: u64,

    /// Substring identifying the iframe that hosts the lesson viewer.
    pub frame_url_marker: String,

    /// Selector for the top-level tab row inside the content frame.
    pub tab_selector: String,
    /// Label of the slides tab (substring match).
    pub slides_tab_label: String,

    /// Selector for the sub-tab row shown once the slides tab is active.
    pub sub_tab_selector: String,
    /// Label of the exercise sub-tab (exact match after trimming).
    pub exercise_tab_label: String,

    /// Lazy-load attribute carrying the real image URL.
    pub image_attr: String,
    /// Substring that marks an image URL as a slide.
    pub slide_marker: String,

    /// Wait after the lesson page renders, before scanning for the frame.
    pub frame_wait_ms: u64,
    /// Wait after clicking the slides tab.
    pub slides_wait_ms: u64,
    /// Wait after clicking the exercise sub-tab.
    pub exercise_wait_ms: u64,

    /// Per-request timeout for image downloads.
    pub http_timeout_secs: u64,
}

impl Default for SpiderConfig {
    fn default() -> Self {
        Self {
            login_url: "https://changjiang.yuketang.cn/web".into(),
            title_selector: ".lesson-title".into(),
            title_timeout_secs: 60,
            frame_url_marker: "/m/v2/lesson/student/".into(),
            tab_selector: ".tab-item".into(),
            slides_tab_label: "课件".into(),
            sub_tab_selector: ".tab-wrap .tab-item".into(),
            exercise_tab_label: "习题".into(),
            image_attr: "data-src".into(),
            slide_marker: "slide".into(),
            frame_wait_ms: 2000,
            slides_wait_ms: 5000,
            exercise_wait_ms: 2000,
            http_timeout_secs: 30,
        }
    }
}

impl SpiderConfig {
    /// Load from the first config file that exists, falling back to the
    /// built-in defaults when none is found. A file that exists but does
    /// not parse is an error rather than a silent fallback.
    pub fn load() -> Result<Self> {
        let candidates = [
            PathBuf::from("./spider.json"),
            PathBuf::from("./config/spider.json"),
        ];

        for path in &candidates {
            match fs::read_to_string(path) {
                Ok(content) => {
                    return serde_json::from_str(&content).with_context(|| {
                        format!("Invalid config file: {}", path.display())
                    });
                }
                Err(_) => continue,
            }
        }

        Ok(Self::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_the_platform_contract() {
        let cfg = SpiderConfig::default();
        assert_eq!(cfg.frame_url_marker, "/m/v2/lesson/student/");
        assert_eq!(cfg.image_attr, "data-src");
        assert_eq!(cfg.slides_wait_ms, 5000);
        assert_eq!(cfg.http_timeout_secs, 30);
    }

    #[test]
    fn partial_file_overrides_only_named_fields() {
        let cfg: SpiderConfig =
            serde_json::from_str(r#"{"slide_marker": "deck", "frame_wait_ms": 500}"#).unwrap();
        assert_eq!(cfg.slide_marker, "deck");
        assert_eq!(cfg.frame_wait_ms, 500);
        // everything else keeps its default
        assert_eq!(cfg.title_selector, ".lesson-title");
        assert_eq!(cfg.exercise_tab_label, "习题");
    }

    #[test]
    fn garbage_file_is_rejected() {
        let parsed: Result<SpiderConfig, _> = serde_json::from_str("{not json");
        assert!(parsed.is_err());
    }
}
