use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{ArgGroup, Parser};
use slide_spider_rs::config::SpiderConfig;
use slide_spider_rs::downloader;
use slide_spider_rs::inspect;
use slide_spider_rs::lesson::{self, Lesson};
use slide_spider_rs::spider::Spider;
use thirtyfour::DesiredCapabilities;

#[derive(Parser)]
#[command(
    name = "slide-spider",
    about = "Download lecture slide images from authenticated lesson pages",
    group(ArgGroup::new("input").required(true).args(["url", "urls_file"]))
)]
struct Cli {
    /// Lesson page URL to process
    url: Option<String>,

    /// Read lesson URLs from a file, one per line (blank lines and lines
    /// starting with '#' are ignored)
    #[arg(short = 'f', long = "file", value_name = "FILE")]
    urls_file: Option<PathBuf>,

    /// WebDriver server to connect to
    #[arg(long, default_value = "http://localhost:4444")]
    webdriver_url: String,

    /// Run the browser headless. The manual login step still needs a
    /// visible window unless the profile already carries a session.
    #[arg(long)]
    headless: bool,

    /// Concurrent downloads per lesson
    #[arg(long, default_value_t = 8)]
    workers: usize,

    /// Dump the page's frame and tab structure instead of downloading
    #[arg(long)]
    inspect: bool,
}

/// Read the batch URL list, skipping blanks and `#` comment lines.
fn read_url_list(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Could not read URL file: {}", path.display()))?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let cfg = SpiderConfig::load()?;

    let urls = if let Some(file) = &cli.urls_file {
        let urls = read_url_list(file)?;
        println!("Read {} URLs from {}", urls.len(), file.display());
        urls
    } else {
        match cli.url.clone() {
            Some(url) => vec![url],
            None => bail!("A lesson URL is required"),
        }
    };

    if cli.inspect && cli.url.is_none() {
        bail!("--inspect works on a single URL, not a URL file");
    }

    let caps = if cli.headless {
        println!("Running in headless mode");
        let mut caps = DesiredCapabilities::firefox();
        caps.set_headless()?;
        caps
    } else {
        DesiredCapabilities::firefox()
    };

    println!("Opening login page: {}", cfg.login_url);
    let spider = Spider::new(caps, &cli.webdriver_url, &cfg.login_url).await?;
    spider.wait_for_manual_login();

    if cli.inspect {
        let result = inspect::inspect_page(&spider.driver, &urls[0], &cfg).await;
        spider.quit().await?;
        return result;
    }

    // Visit every lesson page with the one logged-in session, keeping the
    // collected image lists around for the download phase.
    let mut collected: Vec<Lesson> = Vec::new();
    for url in &urls {
        match lesson::process_lesson(&spider.driver, url, &cfg).await {
            Ok(lesson) => {
                if lesson.image_urls.is_empty() {
                    println!("  ⚠ No slide images in '{}'", lesson.title);
                    log::debug!("Skipping empty lesson: {}", lesson.url);
                } else {
                    collected.push(lesson);
                }
            }
            Err(e) => eprintln!("  ✗ Failed to process {url}: {e}"),
        }
    }

    // The browser is done; downloads run outside the driven session.
    spider.quit().await?;

    if collected.is_empty() {
        bail!("No slide images were collected");
    }

    println!("\n{}", "=".repeat(60));
    println!("Downloading images for {} lessons", collected.len());
    println!("{}", "=".repeat(60));

    let client = downloader::build_client(Duration::from_secs(cfg.http_timeout_secs));
    let cwd = std::env::current_dir().context("Could not resolve the working directory")?;

    let mut total_success = 0;
    let mut total_fail = 0;

    for lesson in &collected {
        let save_dir = cwd.join(&lesson.title);
        fs::create_dir_all(&save_dir)
            .with_context(|| format!("Could not create directory: {}", save_dir.display()))?;

        println!(
            "\nDownloading: {} ({} images)",
            lesson.title,
            lesson.image_urls.len()
        );
        println!("Saving to: {}", save_dir.display());

        let tasks = downloader::build_tasks(&lesson.title, &lesson.image_urls, &save_dir);
        let (success, fail) = downloader::download_lesson(&client, tasks, cli.workers).await;
        total_success += success;
        total_fail += fail;
    }

    println!("\n{}", "=".repeat(60));
    println!("All done! Succeeded: {total_success}, failed: {total_fail}");
    println!("{}", "=".repeat(60));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn url_file_skips_blanks_and_comments() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# lecture list").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "https://example.invalid/lesson/1").unwrap();
        writeln!(file, "   https://example.invalid/lesson/2   ").unwrap();
        writeln!(file, "#https://example.invalid/lesson/3").unwrap();

        let urls = read_url_list(file.path()).unwrap();
        assert_eq!(
            urls,
            vec![
                "https://example.invalid/lesson/1",
                "https://example.invalid/lesson/2"
            ]
        );
    }

    #[test]
    fn missing_url_file_is_an_error() {
        assert!(read_url_list(Path::new("/no/such/urls.txt")).is_err());
    }

    #[test]
    fn cli_requires_exactly_one_input() {
        use clap::CommandFactory;
        Cli::command().debug_assert();

        assert!(Cli::try_parse_from(["slide-spider"]).is_err());
        assert!(Cli::try_parse_from(["slide-spider", "https://a", "-f", "urls.txt"]).is_err());
        assert!(Cli::try_parse_from(["slide-spider", "https://a"]).is_ok());
        assert!(Cli::try_parse_from(["slide-spider", "-f", "urls.txt"]).is_ok());
    }
}
