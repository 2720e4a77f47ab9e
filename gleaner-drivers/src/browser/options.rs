use gleaner_config::BrowserSettings;
use serde_json::json;
use webdriver::capabilities::Capabilities;

/// Construct Chrome command-line arguments for a session.
///
/// Headless sessions get `--headless` first; configured arguments follow in
/// order with duplicates dropped.
pub fn chrome_arguments(settings: &BrowserSettings) -> Vec<String> {
    let mut args: Vec<String> = Vec::with_capacity(settings.arguments.len() + 1);
    if settings.headless {
        args.push("--headless".to_string());
    }
    for arg in &settings.arguments {
        if !args.contains(arg) {
            args.push(arg.clone());
        }
    }
    args
}

/// W3C capabilities carrying `goog:chromeOptions` for the session.
pub fn chrome_capabilities(settings: &BrowserSettings) -> Capabilities {
    let mut caps = Capabilities::new();
    caps.insert(
        "goog:chromeOptions".to_string(),
        json!({ "args": chrome_arguments(settings) }),
    );
    caps
}
