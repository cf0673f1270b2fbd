use std::time::Duration;

use anyhow::{Context, Result};
use thirtyfour::{prelude::*, support, By, WebDriver};

use crate::config::SpiderConfig;
use crate::lesson::{activate_slides_tab, collect_slide_images};

/// Selectors worth probing when the platform markup shifts under us.
const CANDIDATE_SELECTORS: &[&str] = &[
    ".tab-item",
    "[class*='tab']",
    "span[class*='tab']",
    "div[class*='tab']",
    ".tabs",
    "[role='tab']",
];

/// Diagnostic walk over a lesson page: dump every frame, show what each
/// candidate tab selector matches, then try the configured slides tab and
/// count the slide images it exposes. Writes nothing to disk.
pub async fn inspect_page(driver: &WebDriver, url: &str, cfg: &SpiderConfig) -> Result<()> {
    println!("\nNavigating to lesson page: {url}");
    driver.goto(url).await?;

    let title_element = driver
        .query(By::Css(cfg.title_selector.as_str()))
        .wait(
            Duration::from_secs(cfg.title_timeout_secs),
            Duration::from_millis(500),
        )
        .first()
        .await
        .with_context(|| format!("Title element '{}' did not appear", cfg.title_selector))?;
    println!("Lesson title: {}", title_element.text().await?.trim());

    support::sleep(Duration::from_millis(cfg.frame_wait_ms)).await;

    let iframes = driver.find_all(By::Tag("iframe")).await?;

    println!("\n{}", "=".repeat(60));
    println!("Tab candidates per frame ({} iframes)", iframes.len());
    println!("{}", "=".repeat(60));

    for (i, iframe) in iframes.iter().enumerate() {
        let src = iframe.attr("src").await?.unwrap_or_default();
        let shown: String = src.chars().take(70).collect();
        println!("\n--- Frame[{i}]: {shown} ---");

        iframe.clone().enter_frame().await?;
        for sel in CANDIDATE_SELECTORS {
            let elements = driver.find_all(By::Css(*sel)).await?;
            if elements.is_empty() {
                continue;
            }
            println!("\n  Selector '{sel}' matched {} elements:", elements.len());
            for (j, element) in elements.iter().enumerate().take(5) {
                let tag = element.tag_name().await?;
                let class = element.attr("class").await?.unwrap_or_default();
                let text = element.text().await?;
                let text: String = text.trim().chars().take(30).collect();
                println!("    [{j}] <{tag}> class=\"{class}\" text=\"{text}\"");
            }
        }
        driver.enter_default_frame().await?;
    }

    println!("\n{}", "=".repeat(60));
    println!("Trying the '{}' tab", cfg.slides_tab_label);
    println!("{}", "=".repeat(60));

    let mut clicked = false;
    for (i, iframe) in iframes.iter().enumerate() {
        iframe.clone().enter_frame().await?;
        if activate_slides_tab(driver, cfg).await? {
            println!("Clicked a '{}' tab in Frame[{i}]", cfg.slides_tab_label);
            clicked = true;
        }
        driver.enter_default_frame().await?;
        if clicked {
            break;
        }
    }
    if !clicked {
        println!(
            "No tab matching '{}' found in any frame",
            cfg.slides_tab_label
        );
    }

    support::sleep(Duration::from_millis(cfg.slides_wait_ms)).await;

    let mut total = 0;
    for (i, iframe) in iframes.iter().enumerate() {
        iframe.clone().enter_frame().await?;
        let imgs = collect_slide_images(driver, cfg).await?;
        if !imgs.is_empty() {
            println!("Frame[{i}] holds {} slide images", imgs.len());
            total += imgs.len();
        }
        driver.enter_default_frame().await?;
    }
    println!("\nTotal slide images found: {total}");

    Ok(())
}
