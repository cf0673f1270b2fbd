use std::collections::HashSet;
use std::time::Duration;

use thirtyfour::{prelude::*, support, By, WebDriver, WebElement};

use crate::config::SpiderConfig;
use crate::error::SpiderError;

/// One processed lesson page: sanitized title plus the ordered set of
/// slide image URLs left after subtracting the exercise tab.
#[derive(Debug)]
pub struct Lesson {
    pub url: String,
    pub title: String,
    pub image_urls: Vec<String>,
}

/// Strip characters that are illegal in file names on common filesystems.
pub fn sanitize_filename(name: &str) -> String {
    name.replace(&['<', '>', ':', '"', '/', '\\', '|', '?', '*'][..], "_")
        .trim()
        .to_string()
}

/// Ordered difference: everything in `all` that does not appear in
/// `exercise`, keeping `all`'s element order. Comparison is exact string
/// equality on the URL.
pub fn subtract_exercises(all: &[String], exercise: &[String]) -> Vec<String> {
    let exercise: HashSet<&str> = exercise.iter().map(String::as_str).collect();
    all.iter()
        .filter(|url| !exercise.contains(url.as_str()))
        .cloned()
        .collect()
}

/// Find the iframe hosting the lesson viewer: first one whose `src`
/// contains the marker. No retry; `None` is fatal for this lesson.
pub async fn find_content_frame(
    driver: &WebDriver,
    marker: &str,
) -> Result<Option<WebElement>, SpiderError> {
    let iframes = driver.find_all(By::Tag("iframe")).await?;
    log::debug!("Found {} iframes on the page", iframes.len());

    for iframe in iframes {
        if let Some(src) = iframe.attr("src").await? {
            if src.contains(marker) {
                log::debug!("Content frame: {src}");
                return Ok(Some(iframe));
            }
        }
    }
    Ok(None)
}

/// Click the slides tab inside the content frame. Matching is by substring
/// on the tab's inner text. A missing tab is a no-op, not an error.
pub async fn activate_slides_tab(
    driver: &WebDriver,
    cfg: &SpiderConfig,
) -> Result<bool, SpiderError> {
    let tabs = driver.find_all(By::Css(cfg.tab_selector.as_str())).await?;
    for tab in tabs {
        if tab.text().await?.contains(&cfg.slides_tab_label) {
            tab.click().await?;
            return Ok(true);
        }
    }
    log::debug!(
        "No '{}' match under selector '{}'",
        cfg.slides_tab_label,
        cfg.tab_selector
    );
    Ok(false)
}

/// Click the exercise sub-tab. The sub-tab row reuses the tab class, so the
/// label must match exactly (after trimming) to avoid hitting the wrong tab.
pub async fn activate_exercise_tab(
    driver: &WebDriver,
    cfg: &SpiderConfig,
) -> Result<bool, SpiderError> {
    let tabs = driver.find_all(By::Css(cfg.sub_tab_selector.as_str())).await?;
    for tab in tabs {
        if tab.text().await?.trim() == cfg.exercise_tab_label {
            tab.click().await?;
            return Ok(true);
        }
    }
    log::debug!(
        "No '{}' match under selector '{}'",
        cfg.exercise_tab_label,
        cfg.sub_tab_selector
    );
    Ok(false)
}

/// Collect slide image URLs from the current frame state: every `img`
/// carrying the lazy-load attribute whose value contains the slide marker,
/// in document order. Must be called after the corresponding fixed wait.
pub async fn collect_slide_images(
    driver: &WebDriver,
    cfg: &SpiderConfig,
) -> Result<Vec<String>, SpiderError> {
    let selector = format!("img[{}]", cfg.image_attr);
    let imgs = driver.find_all(By::Css(selector.as_str())).await?;

    let mut urls = Vec::new();
    for img in imgs {
        if let Some(src) = img.attr(cfg.image_attr.as_str()).await? {
            if src.contains(&cfg.slide_marker) {
                urls.push(src);
            }
        }
    }
    Ok(urls)
}

/// Run the whole per-lesson pipeline: navigate, grab the title, locate the
/// content frame, drive the tabs, and reconcile the two image sets.
pub async fn process_lesson(
    driver: &WebDriver,
    url: &str,
    cfg: &SpiderConfig,
) -> Result<Lesson, SpiderError> {
    println!("\n{}", "=".repeat(60));
    println!("Processing: {url}");
    println!("{}", "=".repeat(60));

    driver.goto(url).await?;

    let title_element = driver
        .query(By::Css(cfg.title_selector.as_str()))
        .wait(
            Duration::from_secs(cfg.title_timeout_secs),
            Duration::from_millis(500),
        )
        .first()
        .await
        .map_err(|_| SpiderError::TitleMissing(cfg.title_selector.clone()))?;
    let raw_title = title_element.text().await?;
    let title = sanitize_filename(raw_title.trim());
    println!("Lesson title: {title}");

    // The viewer frame renders asynchronously after the title shows up.
    support::sleep(Duration::from_millis(cfg.frame_wait_ms)).await;

    let frame = find_content_frame(driver, &cfg.frame_url_marker)
        .await?
        .ok_or(SpiderError::FrameNotFound)?;
    frame.clone().enter_frame().await?;

    let image_urls = collect_lesson_images(driver, cfg).await;

    // Leave the frame even when extraction failed mid-way.
    let _ = driver.enter_default_frame().await;

    Ok(Lesson {
        url: url.to_string(),
        title,
        image_urls: image_urls?,
    })
}

/// Tab choreography inside the content frame. Each click is followed by a
/// fixed wait; the frame gives no load-completion signal to poll on.
async fn collect_lesson_images(
    driver: &WebDriver,
    cfg: &SpiderConfig,
) -> Result<Vec<String>, SpiderError> {
    println!("Opening the slides tab...");
    activate_slides_tab(driver, cfg).await?;
    support::sleep(Duration::from_millis(cfg.slides_wait_ms)).await;

    let all_imgs = collect_slide_images(driver, cfg).await?;
    println!("  All slides: {}", all_imgs.len());

    println!("Switching to the exercise sub-tab...");
    activate_exercise_tab(driver, cfg).await?;
    support::sleep(Duration::from_millis(cfg.exercise_wait_ms)).await;

    let exercise_imgs = collect_slide_images(driver, cfg).await?;
    println!("  Exercise slides: {}", exercise_imgs.len());

    let final_imgs = subtract_exercises(&all_imgs, &exercise_imgs);
    println!("  Non-exercise slides: {}", final_imgs.len());

    Ok(final_imgs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn subtract_removes_exercise_urls() {
        let all = urls(&["a", "b", "c"]);
        let exercise = urls(&["b"]);
        assert_eq!(subtract_exercises(&all, &exercise), urls(&["a", "c"]));
    }

    #[test]
    fn subtract_with_empty_exercise_set_is_identity() {
        let all = urls(&["x", "y", "z"]);
        assert_eq!(subtract_exercises(&all, &[]), all);
    }

    #[test]
    fn subtract_preserves_order_and_never_grows() {
        let all = urls(&["s1", "e1", "s2", "e2", "s3"]);
        let exercise = urls(&["e2", "e1", "unrelated"]);
        let result = subtract_exercises(&all, &exercise);
        assert_eq!(result, urls(&["s1", "s2", "s3"]));
        assert!(result.len() <= all.len());
        for survivor in &result {
            assert!(!exercise.contains(survivor));
        }
    }

    #[test]
    fn subtract_keeps_duplicates_unless_they_are_exercises() {
        let all = urls(&["a", "a", "b", "a"]);
        let exercise = urls(&["b"]);
        assert_eq!(subtract_exercises(&all, &exercise), urls(&["a", "a", "a"]));
    }

    #[test]
    fn sanitize_replaces_every_illegal_character() {
        let cleaned = sanitize_filename(r#"Lec<ture>: "1/2" \ a|b?c*"#);
        for c in ['<', '>', ':', '"', '/', '\\', '|', '?', '*'] {
            assert!(!cleaned.contains(c), "still contains {c:?}");
        }
    }

    #[test]
    fn sanitize_is_idempotent() {
        let once = sanitize_filename("  Week 3: Sorting / Searching  ");
        assert_eq!(sanitize_filename(&once), once);
    }

    #[test]
    fn sanitize_trims_surrounding_whitespace() {
        assert_eq!(sanitize_filename("  Lesson 1  "), "Lesson 1");
    }
}
