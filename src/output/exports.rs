use anyhow::Result;
use serde::Serialize;
use std::io::Write;

use crate::config::OutputFormat;
use crate::dashboard::display::{
    badge_text, format_date, format_timestamp, label_texts, pipeline_name, pipeline_repository,
    run_name, run_project, run_user, time_since, StatusClass,
};
use crate::dashboard::{DashboardView, Resource};
use crate::seqera::{launch_url, relaunch_url, Pipeline, Run};

use super::summary::{render_dashboard, render_init_failure};
use super::RenderOptions;

#[derive(Serialize)]
struct InitFailure {
    initialization: Resource<()>,
}

/// Writes the dashboard in the requested format.
///
/// - Table: the terminal rendering, as printed by `print_dashboard`
/// - JSON: both lists with their load state
/// - HTML: a self-contained page with the same two tables
pub fn export_dashboard(
    view: &DashboardView<'_>,
    options: &RenderOptions,
    format: OutputFormat,
    pretty: bool,
    output: &mut dyn Write,
) -> Result<()> {
    match format {
        OutputFormat::Table => {
            writeln!(output, "{}", render_dashboard(view, options))?;
            Ok(())
        }
        OutputFormat::Json => export_json(view, pretty, output),
        OutputFormat::Html => export_html(view, options, output),
    }
}

fn export_json(view: &DashboardView<'_>, pretty: bool, output: &mut dyn Write) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(view)?
    } else {
        serde_json::to_string(view)?
    };
    writeln!(output, "{json}")?;
    Ok(())
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Writes the loading, error or empty placeholder of a list. Returns the items
/// when there is a table to draw.
fn html_state<'a, T>(
    resource: &'a Resource<Vec<T>>,
    what: &str,
    output: &mut dyn Write,
) -> Result<Option<&'a [T]>> {
    match resource {
        Resource::Loading => {
            writeln!(output, "        <p class=\"muted\">Loading {what}...</p>")?;
            Ok(None)
        }
        Resource::Failed(message) => {
            writeln!(output, "        <div class=\"error\">")?;
            writeln!(output, "            <p>{}</p>", escape_html(message))?;
            writeln!(output, "            <p class=\"muted\">Retry</p>")?;
            writeln!(output, "        </div>")?;
            Ok(None)
        }
        Resource::Loaded(items) if items.is_empty() => {
            writeln!(output, "        <p class=\"muted\">No {what} found</p>")?;
            Ok(None)
        }
        Resource::Loaded(items) => Ok(Some(items.as_slice())),
    }
}

fn html_pipelines(
    pipelines: &[Pipeline],
    options: &RenderOptions,
    output: &mut dyn Write,
) -> Result<()> {
    writeln!(output, "        <table>")?;
    writeln!(output, "            <thead><tr><th></th><th>Pipeline</th><th>Last Updated</th><th></th></tr></thead>")?;
    writeln!(output, "            <tbody>")?;
    for pipeline in pipelines {
        let icon = match options.display.icon_src(pipeline.icon.as_deref()) {
            Some(src) => format!("<img src=\"{}\" alt=\"\" width=\"32\" height=\"32\">", escape_html(src)),
            None => "<span class=\"placeholder\"></span>".to_string(),
        };
        writeln!(output, "                <tr>")?;
        writeln!(output, "                    <td>{icon}</td>")?;
        writeln!(
            output,
            "                    <td><strong>{}</strong><br><span class=\"muted\">{}</span></td>",
            escape_html(pipeline_name(pipeline)),
            escape_html(pipeline_repository(pipeline))
        )?;
        writeln!(output, "                    <td>{}</td>", format_date(pipeline.last_updated))?;
        writeln!(
            output,
            "                    <td><a href=\"{}\" target=\"_blank\" rel=\"noopener\">Launch</a></td>",
            escape_html(&launch_url(&options.web_url, pipeline))
        )?;
        writeln!(output, "                </tr>")?;
    }
    writeln!(output, "            </tbody>")?;
    writeln!(output, "        </table>")?;
    Ok(())
}

fn html_runs(runs: &[Run], options: &RenderOptions, output: &mut dyn Write) -> Result<()> {
    writeln!(output, "        <table>")?;
    writeln!(output, "            <thead><tr><th>Run</th><th>Labels</th><th>User</th><th>Submitted</th><th>Status</th><th></th><th></th></tr></thead>")?;
    writeln!(output, "            <tbody>")?;
    for run in runs {
        let class = run.status().map_or(StatusClass::Other, StatusClass::classify);
        let palette = class.palette();
        let badge = match class.icon() {
            Some(icon) => format!("{icon} {}", badge_text(run.status())),
            None => badge_text(run.status()),
        };
        let labels: Vec<String> = label_texts(run.labels())
            .iter()
            .map(|label| format!("<span class=\"label\">{}</span>", escape_html(label)))
            .collect();

        writeln!(
            output,
            "                <tr class=\"{}\" style=\"border-left: 4px solid {}\">",
            class.row_class(),
            class.accent()
        )?;
        writeln!(
            output,
            "                    <td><strong>{}</strong><br><span class=\"muted\">{}</span></td>",
            escape_html(run_name(run)),
            escape_html(run_project(run))
        )?;
        writeln!(output, "                    <td>{}</td>", labels.join(" "))?;
        writeln!(output, "                    <td>{}</td>", escape_html(run_user(run)))?;
        writeln!(output, "                    <td>{}</td>", format_timestamp(run.submit()))?;
        writeln!(
            output,
            "                    <td><span class=\"badge\" style=\"color: {}; border-color: {}; background: {}\">{}</span> <span class=\"muted\">{}</span></td>",
            palette.text,
            palette.border,
            palette.background,
            escape_html(&badge),
            time_since(run.submit(), options.now)
        )?;
        writeln!(
            output,
            "                    <td>{}</td>",
            if run.starred() { "★" } else { "☆" }
        )?;
        writeln!(
            output,
            "                    <td><a href=\"{}\" target=\"_blank\" rel=\"noopener\">Relaunch</a></td>",
            escape_html(&relaunch_url(&options.web_url, run))
        )?;
        writeln!(output, "                </tr>")?;
    }
    writeln!(output, "            </tbody>")?;
    writeln!(output, "        </table>")?;
    Ok(())
}

fn html_open(title: &str, output: &mut dyn Write) -> Result<()> {
    writeln!(output, "<!DOCTYPE html>")?;
    writeln!(output, "<html lang=\"en\">")?;
    writeln!(output, "<head>")?;
    writeln!(output, "    <meta charset=\"UTF-8\">")?;
    writeln!(output, "    <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">")?;
    writeln!(output, "    <title>{}</title>", escape_html(title))?;
    writeln!(output, "    <style>")?;
    writeln!(output, "        body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; margin: 40px; background: #f5f5f5; }}")?;
    writeln!(output, "        .container {{ max-width: 1200px; margin: 0 auto; background: white; padding: 30px; border-radius: 8px; box-shadow: 0 2px 10px rgba(0,0,0,0.1); }}")?;
    writeln!(output, "        h1 {{ color: #160F26; }}")?;
    writeln!(output, "        h2 {{ color: #374151; margin-top: 30px; }}")?;
    writeln!(output, "        table {{ width: 100%; border-collapse: collapse; margin: 20px 0; }}")?;
    writeln!(output, "        th, td {{ padding: 12px; text-align: left; border-bottom: 1px solid #E5E7EB; vertical-align: top; }}")?;
    writeln!(output, "        .muted {{ color: #6B7280; }}")?;
    writeln!(output, "        .error {{ background: #FEF2F2; border: 1px solid #FCA5A5; color: #DC2626; padding: 12px; border-radius: 5px; }}")?;
    writeln!(output, "        .badge {{ border: 1px solid; border-radius: 4px; padding: 2px 6px; }}")?;
    writeln!(output, "        .label {{ background: #F3F4F6; border-radius: 4px; padding: 2px 6px; font-size: 0.85em; }}")?;
    writeln!(output, "        .placeholder {{ display: inline-block; width: 32px; height: 32px; background: #E5E7EB; border-radius: 4px; }}")?;
    writeln!(output, "    </style>")?;
    writeln!(output, "</head>")?;
    writeln!(output, "<body>")?;
    writeln!(output, "    <div class=\"container\">")?;
    writeln!(output, "        <h1>🧬 Seqera Platform Integration</h1>")?;
    Ok(())
}

fn html_close(options: &RenderOptions, output: &mut dyn Write) -> Result<()> {
    writeln!(output, "        <footer style=\"margin-top: 40px; padding-top: 20px; border-top: 1px solid #ddd; color: #666; text-align: center;\">")?;
    writeln!(
        output,
        "            <p>Generated by SeqDash v{} on {}</p>",
        env!("CARGO_PKG_VERSION"),
        options.now.format("%Y-%m-%d %H:%M UTC")
    )?;
    writeln!(output, "        </footer>")?;
    writeln!(output, "    </div>")?;
    writeln!(output, "</body>")?;
    writeln!(output, "</html>")?;
    Ok(())
}

fn export_html(
    view: &DashboardView<'_>,
    options: &RenderOptions,
    output: &mut dyn Write,
) -> Result<()> {
    html_open(
        &format!("Seqera Platform Integration - workspace {}", view.workspace_id),
        output,
    )?;
    match view.pipelines.data() {
        Some(pipelines) => writeln!(
            output,
            "        <p class=\"muted\">Connected to workspace • {} pipeline(s) available</p>",
            pipelines.len()
        )?,
        None => writeln!(output, "        <p class=\"muted\">Connected to workspace</p>")?,
    }

    writeln!(output, "        <h2>Pipelines</h2>")?;
    if let Some(pipelines) = html_state(view.pipelines, "pipelines", output)? {
        html_pipelines(pipelines, options, output)?;
    }

    writeln!(output, "        <h2>Recent Runs</h2>")?;
    if let Some(runs) = html_state(view.runs, "runs", output)? {
        html_runs(runs, options, output)?;
    }

    html_close(options, output)
}

/// Writes the failed state shown when the dashboard could not be initialized,
/// in the requested format.
pub fn export_init_failure(
    message: &str,
    options: &RenderOptions,
    format: OutputFormat,
    pretty: bool,
    output: &mut dyn Write,
) -> Result<()> {
    match format {
        OutputFormat::Table => {
            writeln!(output, "{}", render_init_failure(message))?;
        }
        OutputFormat::Json => {
            let failure = InitFailure {
                initialization: Resource::Failed(message.to_string()),
            };
            let json = if pretty {
                serde_json::to_string_pretty(&failure)?
            } else {
                serde_json::to_string(&failure)?
            };
            writeln!(output, "{json}")?;
        }
        OutputFormat::Html => {
            html_open("Seqera Platform Integration", output)?;
            html_state(&Resource::<Vec<()>>::Failed(message.to_string()), "", output)?;
            html_close(options, output)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::display::DisplayContext;
    use chrono::{TimeZone, Utc};

    fn options(suppress_icons: bool) -> RenderOptions {
        RenderOptions {
            web_url: "https://cloud.seqera.io".to_string(),
            display: DisplayContext { suppress_icons },
            now: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
        }
    }

    fn pipelines() -> Resource<Vec<Pipeline>> {
        Resource::Loaded(
            serde_json::from_value(serde_json::json!([
                {"pipelineId": 12, "name": "rna<seq>", "icon": "https://cdn.example.com/rnaseq.png",
                 "orgName": "acme", "workspaceName": "prod"}
            ]))
            .unwrap(),
        )
    }

    fn runs() -> Resource<Vec<Run>> {
        Resource::Loaded(
            serde_json::from_value(serde_json::json!([
                {"workflow": {"id": "a1", "runName": "happy_turing", "status": "SUCCEEDED",
                              "submit": "2024-06-01T11:30:00Z"},
                 "organizationName": "acme", "workspaceName": "prod"}
            ]))
            .unwrap(),
        )
    }

    fn export(format: OutputFormat, pretty: bool, suppress_icons: bool) -> String {
        let pipelines = pipelines();
        let runs = runs();
        let view = DashboardView {
            workspace_id: 7,
            api_base: "https://api.cloud.seqera.io",
            pipelines: &pipelines,
            runs: &runs,
        };
        let mut output = Vec::new();
        export_dashboard(&view, &options(suppress_icons), format, pretty, &mut output).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn test_export_json() {
        let json: serde_json::Value =
            serde_json::from_str(&export(OutputFormat::Json, false, false)).unwrap();
        assert_eq!(json["workspaceId"], 7);
        assert_eq!(json["pipelines"]["data"][0]["pipelineId"], 12);
        assert_eq!(json["runs"]["data"][0]["workflow"]["runName"], "happy_turing");
    }

    #[test]
    fn test_export_json_pretty() {
        assert!(export(OutputFormat::Json, true, false).contains("\n  "));
    }

    #[test]
    fn test_export_html_structure() {
        let html = export(OutputFormat::Html, false, false);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("</html>"));
        assert!(html.contains("Connected to workspace • 1 pipeline(s) available"));
        assert!(html.contains("rna&lt;seq&gt;"));
        assert!(html.contains("<img src=\"https://cdn.example.com/rnaseq.png\""));
        assert!(html.contains(
            "https://cloud.seqera.io/orgs/acme/workspaces/prod/launchpad/12/form/new-form"
        ));
        assert!(html.contains("workflowId=a1"));
        assert!(html.contains("class=\"status-succeeded\""));
        assert!(html.contains("✓ succeeded"));
        assert!(html.contains("after 30m"));
    }

    #[test]
    fn test_export_html_suppresses_icons() {
        let html = export(OutputFormat::Html, false, true);
        assert!(!html.contains("<img"));
        assert!(html.contains("class=\"placeholder\""));
    }

    #[test]
    fn test_export_html_error_state() {
        let pipelines = Resource::Failed("API error: <500>".to_string());
        let runs = Resource::Loading;
        let view = DashboardView {
            workspace_id: 7,
            api_base: "https://api.cloud.seqera.io",
            pipelines: &pipelines,
            runs: &runs,
        };
        let mut output = Vec::new();
        export_dashboard(&view, &options(false), OutputFormat::Html, false, &mut output).unwrap();
        let html = String::from_utf8(output).unwrap();

        assert!(html.contains("API error: &lt;500&gt;"));
        assert!(html.contains("Loading runs..."));
    }

    #[test]
    fn test_init_failure_in_every_format() {
        let message = "Failed to resolve workspace: Organization 'Acme' not found";
        let render = |format| {
            let mut output = Vec::new();
            export_init_failure(message, &options(false), format, false, &mut output).unwrap();
            String::from_utf8(output).unwrap()
        };

        let json: serde_json::Value = serde_json::from_str(&render(OutputFormat::Json)).unwrap();
        assert_eq!(json["initialization"]["state"], "failed");
        assert_eq!(json["initialization"]["data"], message);

        let html = render(OutputFormat::Html);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<div class=\"error\">"));
        assert!(html.contains("Organization &#39;Acme&#39; not found"));
        assert!(html.contains("Retry"));
        assert!(html.contains("</html>"));

        let table = render(OutputFormat::Table);
        assert!(table.contains(message));
        assert!(table.contains("Retry"));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a & \"b\" <c>"), "a &amp; &quot;b&quot; &lt;c&gt;");
    }
}
