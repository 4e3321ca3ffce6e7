use std::fmt::Write;

use comfy_table::{Cell, Color as TableColor};

use crate::dashboard::display::{
    format_date, format_timestamp, label_texts, pipeline_name, pipeline_repository, run_name,
    run_project, run_user, time_since,
};
use crate::dashboard::{DashboardView, Resource};
use crate::seqera::{launch_url, relaunch_url, Pipeline, Run};

use super::styling::{bright, bright_red, bright_yellow, cyan, dim};
use super::tables::{create_table, starred_cell, status_cell};
use super::RenderOptions;

/// Prints the dashboard to stdout.
///
/// Shows the connection header, then one section per list. Each list renders
/// its own loading, error or empty state independently of the other.
pub fn print_dashboard(view: &DashboardView<'_>, options: &RenderOptions) {
    println!("{}", render_dashboard(view, options));
}

fn add_section_header(output: &mut String, emoji: &str, title: &str) {
    let _ = writeln!(output, "{} {}", bright(emoji), bright(title).underlined());
}

fn add_error_panel(output: &mut String, message: &str) {
    let _ = writeln!(
        output,
        "  {} {}\n  {}\n",
        bright_red("✗"),
        bright_red(message),
        dim("Retry")
    );
}

fn connection_line(view: &DashboardView<'_>) -> String {
    match view.pipelines.data() {
        Some(pipelines) => format!(
            "Connected to workspace • {} pipeline(s) available",
            pipelines.len()
        ),
        None => "Connected to workspace".to_string(),
    }
}

pub(super) fn render_dashboard(view: &DashboardView<'_>, options: &RenderOptions) -> String {
    let mut output = String::new();

    add_section_header(&mut output, "🧬", "Seqera Platform Integration");
    let _ = writeln!(
        output,
        "  {}\n  {} {}\n  {} {}\n",
        cyan(connection_line(view)),
        dim("Workspace id:"),
        bright_yellow(view.workspace_id),
        dim("API:"),
        dim(view.api_base),
    );

    add_section_header(&mut output, "📦", "Pipelines");
    match view.pipelines {
        Resource::Loading => {
            let _ = writeln!(output, "  {}\n", dim("Loading pipelines..."));
        }
        Resource::Failed(message) => add_error_panel(&mut output, message),
        Resource::Loaded(pipelines) if pipelines.is_empty() => {
            let _ = writeln!(output, "  {}\n", bright_yellow("No pipelines found"));
        }
        Resource::Loaded(pipelines) => {
            let _ = writeln!(output, "{}\n", pipelines_table(pipelines, options));
        }
    }

    add_section_header(&mut output, "🏃", "Recent Runs");
    match view.runs {
        Resource::Loading => {
            let _ = writeln!(output, "  {}\n", dim("Loading runs..."));
        }
        Resource::Failed(message) => add_error_panel(&mut output, message),
        Resource::Loaded(runs) if runs.is_empty() => {
            let _ = writeln!(output, "  {}\n", bright_yellow("No runs found"));
        }
        Resource::Loaded(runs) => {
            let _ = writeln!(output, "{}\n", runs_table(runs, options));
        }
    }

    output
}

/// Prints the failed state shown when the dashboard could not be initialized.
pub fn print_init_failure(message: &str) {
    println!("{}", render_init_failure(message));
}

pub(super) fn render_init_failure(message: &str) -> String {
    let mut output = String::new();
    add_section_header(&mut output, "🧬", "Seqera Platform Integration");
    add_error_panel(&mut output, message);
    output
}

fn pipelines_table(pipelines: &[Pipeline], options: &RenderOptions) -> comfy_table::Table {
    let mut table = create_table(&["", "Pipeline", "Last Updated", "Launch"]);

    for pipeline in pipelines {
        let icon = match options.display.icon_src(pipeline.icon.as_deref()) {
            Some(_) => "🖼",
            None => "▢",
        };

        table.add_row(vec![
            Cell::new(icon),
            Cell::new(format!(
                "{}\n{}",
                pipeline_name(pipeline),
                pipeline_repository(pipeline)
            )),
            Cell::new(format_date(pipeline.last_updated)),
            Cell::new(launch_url(&options.web_url, pipeline)).fg(TableColor::Blue),
        ]);
    }

    table
}

fn runs_table(runs: &[Run], options: &RenderOptions) -> comfy_table::Table {
    let mut table = create_table(&[
        "Run",
        "Labels",
        "User",
        "Submitted",
        "Status",
        "",
        "Relaunch",
    ]);

    for run in runs {
        table.add_row(vec![
            Cell::new(format!("{}\n{}", run_name(run), run_project(run))),
            Cell::new(label_texts(run.labels()).join("\n")),
            Cell::new(run_user(run)),
            Cell::new(format_timestamp(run.submit())),
            status_cell(run.status(), &time_since(run.submit(), options.now)),
            starred_cell(run.starred()),
            Cell::new(relaunch_url(&options.web_url, run)).fg(TableColor::Blue),
        ]);
    }

    table
}
