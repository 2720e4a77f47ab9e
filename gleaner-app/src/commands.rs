//! Command-line surface of the `gleaner` binary.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gleaner_common::text::{
    DEFAULT_IMPURITIES, UNICODE_ESCAPE_PATTERN, remove_void_texts, texts_cosmetics,
    texts_cosmetics_re,
};
use gleaner_config::GleanerConfig;
use gleaner_drivers::BrowserSession;
use gleaner_http::HttpClient;
use gleaner_web::{PageCapturer, StaticParser, WebDriverCapturer};
use tracing::{info, warn};
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "gleaner", version, about = "Extract text, elements and images from web pages")]
pub struct Cli {
    /// YAML configuration file; missing files are ignored.
    #[arg(long, global = true, env = "GLEANER_CONFIG", default_value = "gleaner.yaml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print all page text fetched over HTTP.
    Text {
        url: String,
        /// Strip control characters and unicode escapes from every line.
        #[arg(long)]
        clean: bool,
    },
    /// Print the elements matching a CSS selector.
    Select {
        url: String,
        #[arg(long)]
        css: String,
        /// Print this attribute instead of the element text.
        #[arg(long)]
        attr: Option<String>,
        /// Trim every text node.
        #[arg(long)]
        strip: bool,
        /// Print a JSON array instead of one value per line.
        #[arg(long)]
        json: bool,
    },
    /// Download every image of a page into the assets directory.
    Images {
        url: String,
        /// Extension given to saved files; defaults to `assets.image_appendix`.
        #[arg(long)]
        appendix: Option<String>,
    },
    /// Open a page in the browser and print its title.
    Browse {
        url: String,
        #[arg(long)]
        screenshot: Option<PathBuf>,
        /// Capture the whole document instead of the viewport.
        #[arg(long, requires = "screenshot")]
        full_page: bool,
        /// Also print the visible text of the page.
        #[arg(long)]
        text: bool,
        /// Save every image of the rendered page.
        #[arg(long)]
        images: bool,
    },
    /// Render a page in the browser, then select from the rendered markup.
    Render {
        url: String,
        #[arg(long)]
        css: String,
        #[arg(long)]
        strip: bool,
    },
}

pub async fn run(command: Command, cfg: GleanerConfig) -> Result<()> {
    let http = HttpClient::with_user_agent(&cfg.http.user_agent)?
        .with_timeout(cfg.http.timeout())
        .with_retries(cfg.http.retries);

    match command {
        Command::Text { url, clean } => {
            let mut parser = StaticParser::new(http, cfg.assets);
            parser.set_url(&url).await?;
            let text = parser.get_all_texts();
            if clean {
                println!("{}", clean_text(&text)?);
            } else {
                println!("{text}");
            }
        }
        Command::Select {
            url,
            css,
            attr,
            strip,
            json,
        } => {
            let mut parser = StaticParser::new(http, cfg.assets);
            parser.set_url(&url).await?;
            let elements = parser.get_elements_by_css(&css)?;
            let values: Vec<String> = match &attr {
                Some(name) => parser
                    .get_attributes_from_elements(&elements, name)
                    .into_iter()
                    .flatten()
                    .collect(),
                None => parser.get_contents_from_elements(&elements, strip),
            };
            info!(selector = %css, matches = elements.len(), "selection done");
            print_values(&values, json)?;
        }
        Command::Images { url, appendix } => {
            let appendix = appendix.unwrap_or_else(|| cfg.assets.image_appendix.clone());
            let mut parser = StaticParser::new(http, cfg.assets);
            parser.set_url(&url).await?;
            for path in parser.get_all_images(&appendix).await? {
                println!("{}", path.display());
            }
        }
        Command::Browse {
            url,
            screenshot,
            full_page,
            text,
            images,
        } => {
            let mut session = BrowserSession::connect(&cfg.browser, http, cfg.assets).await?;
            let result = browse(&mut session, &url, screenshot, full_page, text, images).await;
            if let Err(e) = session.quit().await {
                warn!(error = %e, "failed to close browser session");
            }
            result?;
        }
        Command::Render { url, css, strip } => {
            let url = Url::parse(&url).with_context(|| format!("invalid URL {url}"))?;
            let capturer = WebDriverCapturer::new(cfg.browser, http.clone(), cfg.assets.clone());
            let capture = capturer.capture(&url).await?;

            let mut parser = StaticParser::new(http, cfg.assets);
            capture.load_into(&mut parser)?;
            let elements = parser.get_elements_by_css(&css)?;
            print_values(&parser.get_contents_from_elements(&elements, strip), false)?;
        }
    }
    Ok(())
}

async fn browse(
    session: &mut BrowserSession,
    url: &str,
    screenshot: Option<PathBuf>,
    full_page: bool,
    text: bool,
    images: bool,
) -> Result<()> {
    session.set_url(url).await?;
    println!("{}", session.get_title().await?);

    if text {
        println!("{}", session.get_all_texts().await?);
    }
    if let Some(path) = screenshot {
        if full_page {
            session.get_screenshot_beyond_viewport(&path).await?;
        } else {
            session.get_screenshot(&path).await?;
        }
    }
    if images {
        for path in session.save_all_images().await? {
            println!("{}", path.display());
        }
    }
    Ok(())
}

/// Apply the default cosmetics line by line and drop lines left empty.
fn clean_text(text: &str) -> Result<String> {
    let lines: Vec<&str> = text.lines().collect();
    let unescaped = texts_cosmetics_re(&lines, &[UNICODE_ESCAPE_PATTERN], "")?;
    let cleaned = texts_cosmetics(&unescaped, DEFAULT_IMPURITIES, "");
    Ok(remove_void_texts(cleaned).join("\n"))
}

fn print_values(values: &[String], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(values)?);
    } else {
        for value in values {
            println!("{value}");
        }
    }
    Ok(())
}
