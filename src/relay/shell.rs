use std::path::Path;

use log::{info, warn};

/// Served for every non-API path when the static directory has no `index.html`.
const BUILTIN_SHELL: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>Seqera Platform Integration</title>
</head>
<body>
  <div id="root" data-api-base="/api" data-image-base="/image"></div>
  <noscript>This dashboard needs JavaScript enabled.</noscript>
</body>
</html>
"#;

/// Loads the single-page application shell from `<static_dir>/index.html`.
pub fn load(static_dir: &Path) -> String {
    let index = static_dir.join("index.html");
    match std::fs::read_to_string(&index) {
        Ok(html) => {
            info!("Serving application shell from {}", index.display());
            html
        }
        Err(e) => {
            warn!(
                "No application shell at {} ({e}), serving the built-in shell",
                index.display()
            );
            BUILTIN_SHELL.to_string()
        }
    }
}
