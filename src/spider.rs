use std::io::{self, Write};

use anyhow::{Context, Result};
use thirtyfour::{Capabilities, WebDriver};

/// Wraps the WebDriver session shared by every navigation step of a run.
pub struct Spider {
    pub driver: WebDriver,
}

impl Spider {
    /// Connect to the WebDriver server and open the platform login page.
    pub async fn new<C>(caps: C, server_url: &str, login_url: &str) -> Result<Self>
    where
        C: Into<Capabilities>,
    {
        let driver = WebDriver::new(server_url, caps)
            .await
            .context("Could not connect to the WebDriver server. Is geckodriver running?")?;

        driver
            .goto(login_url)
            .await
            .with_context(|| format!("Could not open login page: {login_url}"))?;

        Ok(Self { driver })
    }

    /// Block until the user confirms the interactive login is done. There is
    /// no timeout; the platform session lives in the browser profile.
    pub fn wait_for_manual_login(&self) {
        println!("\nComplete the login in the browser window, then press Enter here...");
        print!("> ");
        io::stdout().flush().unwrap();
        let mut input = String::new();
        io::stdin().read_line(&mut input).unwrap();
    }

    /// Tear the browser down. Called once all lesson pages have been
    /// visited, before the download phase starts.
    pub async fn quit(self) -> Result<()> {
        self.driver.quit().await.context("Failed to close the browser session")?;
        Ok(())
    }
}
