use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use futures::{stream, StreamExt};
use reqwest::Client;

/// One image to fetch. Stateless and idempotent: re-running a task
/// overwrites the same destination path.
#[derive(Debug)]
pub struct DownloadTask {
    pub url: String,
    pub dest: PathBuf,
    pub index: usize,
    pub total: usize,
}

/// Per-task result consumed on the coordinating task. Errors are carried
/// as text; the kind (network, status, disk) makes no difference here.
#[derive(Debug)]
pub struct DownloadOutcome {
    pub index: usize,
    pub total: usize,
    pub result: Result<String, String>,
}

pub fn build_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Local file name for a slide: `{title}_{index:03}.jpg`, index 1-based.
pub fn slide_filename(title: &str, index: usize) -> String {
    format!("{title}_{index:03}.jpg")
}

/// Pair every image URL with its destination path under `dir`. The caller
/// must have created `dir` already.
pub fn build_tasks(title: &str, urls: &[String], dir: &Path) -> Vec<DownloadTask> {
    let total = urls.len();
    urls.iter()
        .enumerate()
        .map(|(i, url)| {
            let index = i + 1;
            DownloadTask {
                url: url.clone(),
                dest: dir.join(slide_filename(title, index)),
                index,
                total,
            }
        })
        .collect()
}

/// Fetch one image and write the whole body to the task's destination.
/// Never panics and never aborts siblings; any failure comes back as the
/// stringified error.
pub async fn download_image(client: &Client, task: &DownloadTask) -> DownloadOutcome {
    let result = match fetch_to_disk(client, task).await {
        Ok(name) => Ok(name),
        Err(e) => Err(e.to_string()),
    };
    DownloadOutcome {
        index: task.index,
        total: task.total,
        result,
    }
}

async fn fetch_to_disk(client: &Client, task: &DownloadTask) -> Result<String> {
    let response = client.get(&task.url).send().await?.error_for_status()?;
    let body = response.bytes().await?;
    tokio::fs::write(&task.dest, &body).await?;

    let name = task
        .dest
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| task.dest.display().to_string());
    Ok(name)
}

/// Run all tasks for one lesson through a bounded pool. Completion order is
/// whatever the network gives us; each outcome is reported as it lands and
/// the aggregate (success, fail) counts are returned.
pub async fn download_lesson(
    client: &Client,
    tasks: Vec<DownloadTask>,
    workers: usize,
) -> (usize, usize) {
    let mut success = 0usize;
    let mut fail = 0usize;

    let mut outcomes = stream::iter(tasks.iter())
        .map(|task| download_image(client, task))
        .buffer_unordered(workers.max(1));

    while let Some(outcome) = outcomes.next().await {
        match outcome.result {
            Ok(name) => {
                success += 1;
                println!("  ✓ [{}/{}] {}", outcome.index, outcome.total, name);
            }
            Err(err) => {
                fail += 1;
                println!("  ✗ [{}/{}] failed: {}", outcome.index, outcome.total, err);
            }
        }
    }

    (success, fail)
}
