//! Placeholder renderer producing plain, dependency-free HTML.

use std::fmt::Write as _;

use frtm_runs::{Run, RunStatus};
use time::format_description::well_known::Rfc3339;

use super::{Analysis, RenderError, Renderer};

/// Seconds between automatic reloads of a pending status page.
const STATUS_REFRESH_SECONDS: u32 = 2;

/// Renders minimal HTML pages for runs and analyses.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainHtmlRenderer;

impl Renderer for PlainHtmlRenderer {
    fn render_index(&self, runs: &[Run]) -> Result<String, RenderError> {
        let mut body = String::from("<h1>Runs</h1>\n");
        if runs.is_empty() {
            body.push_str("<p>No runs yet.</p>\n");
        } else {
            body.push_str(
                "<table>\n<tr><th>Package</th><th>Platform</th><th>Status</th>\
                 <th>Created</th></tr>\n",
            );
            for run in runs {
                let created = timestamp(run, "index")?;
                write_fmt(
                    &mut body,
                    "index",
                    format_args!(
                        "<tr><td><a href=\"/runs/{id}\">{name}</a></td><td>{platform}</td>\
                         <td>{status}</td><td>{created}</td></tr>\n",
                        id = run.id(),
                        name = escape(run.original_file_name()),
                        platform = run.platform(),
                        status = run.status(),
                    ),
                )?;
            }
            body.push_str("</table>\n");
        }
        Ok(page("FRTMTools runs", None, &body))
    }

    fn render_status(&self, run: &Run) -> Result<String, RenderError> {
        let created = timestamp(run, "status")?;
        let mut body = String::new();
        write_fmt(
            &mut body,
            "status",
            format_args!(
                "<h1>{name}</h1>\n<p>Platform: {platform}</p>\n<p>Status: \
                 <strong>{status}</strong></p>\n<p>Created: {created}</p>\n",
                name = escape(run.original_file_name()),
                platform = run.platform(),
                status = run.status(),
            ),
        )?;
        if let Some(message) = run.error_message() {
            write_fmt(
                &mut body,
                "status",
                format_args!("<p>Error: {}</p>\n", escape(message)),
            )?;
        }
        body.push_str("<p><a href=\"/\">All runs</a></p>\n");

        let refresh = match run.status() {
            RunStatus::Queued | RunStatus::Running => Some(STATUS_REFRESH_SECONDS),
            RunStatus::Complete | RunStatus::Failed => None,
        };
        Ok(page(run.original_file_name(), refresh, &body))
    }

    fn render_report(&self, run: &Run, analysis: &Analysis) -> Result<String, RenderError> {
        let mut body = String::new();
        write_fmt(
            &mut body,
            "report",
            format_args!(
                "<h1>{name}</h1>\n<p>Platform: {platform}</p>\n<pre>{document}</pre>\n\
                 <p><a href=\"/\">All runs</a></p>\n",
                name = escape(run.original_file_name()),
                platform = run.platform(),
                document = pretty(analysis, "report")?,
            ),
        )?;
        Ok(page(run.original_file_name(), None, &body))
    }

    fn render_comparison(
        &self,
        before: &Run,
        before_analysis: &Analysis,
        after: &Run,
        after_analysis: &Analysis,
    ) -> Result<String, RenderError> {
        let mut body = String::new();
        write_fmt(
            &mut body,
            "comparison",
            format_args!(
                "<h1>{before_name} vs {after_name}</h1>\n<p>Platform: {platform}</p>\n\
                 <table>\n<tr><th>Before</th><th>After</th></tr>\n\
                 <tr><td><pre>{before_document}</pre></td>\
                 <td><pre>{after_document}</pre></td></tr>\n</table>\n\
                 <p><a href=\"/\">All runs</a></p>\n",
                before_name = escape(before.original_file_name()),
                after_name = escape(after.original_file_name()),
                platform = before.platform(),
                before_document = pretty(before_analysis, "comparison")?,
                after_document = pretty(after_analysis, "comparison")?,
            ),
        )?;
        Ok(page("Comparison", None, &body))
    }
}

fn page(title: &str, refresh_seconds: Option<u32>, body: &str) -> String {
    let refresh = refresh_seconds
        .map(|seconds| format!("<meta http-equiv=\"refresh\" content=\"{seconds}\">\n"))
        .unwrap_or_default();
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n{refresh}\
         <title>{title}</title>\n</head>\n<body>\n{body}</body>\n</html>\n",
        title = escape(title),
    )
}

fn timestamp(run: &Run, page: &'static str) -> Result<String, RenderError> {
    run.created_at()
        .format(&Rfc3339)
        .map_err(|error| RenderError::new(page, error.to_string()))
}

fn pretty(analysis: &Analysis, page: &'static str) -> Result<String, RenderError> {
    serde_json::to_string_pretty(analysis)
        .map(|text| escape(&text))
        .map_err(|error| RenderError::new(page, error.to_string()))
}

fn write_fmt(
    buffer: &mut String,
    page: &'static str,
    arguments: std::fmt::Arguments<'_>,
) -> Result<(), RenderError> {
    buffer
        .write_fmt(arguments)
        .map_err(|error| RenderError::new(page, error.to_string()))
}

/// Escapes text for inclusion in HTML element content or attribute values.
fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for character in text.chars() {
        match character {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use frtm_runs::{Platform, RunId};
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    fn run(name: &str, platform: Platform) -> Run {
        Run::queued(RunId::new_v4(), platform, name, "uploads/x.bin")
    }

    #[rstest]
    #[case("<b>&\"'", "&lt;b&gt;&amp;&quot;&#39;")]
    #[case("plain.ipa", "plain.ipa")]
    fn escapes_markup(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(escape(input), expected);
    }

    #[test]
    fn index_links_each_run_and_escapes_names() {
        let runs = vec![run("<App>.ipa", Platform::Ipa), run("b.apk", Platform::Apk)];
        let html = PlainHtmlRenderer.render_index(&runs).expect("render");
        assert!(html.contains(&format!("href=\"/runs/{}\"", runs[0].id())));
        assert!(html.contains("&lt;App&gt;.ipa"));
        assert!(!html.contains("<App>"));
    }

    #[test]
    fn empty_index_says_so() {
        let html = PlainHtmlRenderer.render_index(&[]).expect("render");
        assert!(html.contains("No runs yet."));
    }

    #[test]
    fn pending_status_refreshes_and_failed_status_shows_error() {
        let mut pending = run("a.ipa", Platform::Ipa);
        let html = PlainHtmlRenderer.render_status(&pending).expect("render");
        assert!(html.contains("http-equiv=\"refresh\""));
        assert!(html.contains("queued"));

        pending.mark_running().expect("running");
        pending.mark_failed("bad <header>").expect("failed");
        let html = PlainHtmlRenderer.render_status(&pending).expect("render");
        assert!(!html.contains("http-equiv=\"refresh\""));
        assert!(html.contains("bad &lt;header&gt;"));
    }

    #[test]
    fn report_embeds_escaped_analysis() {
        let analysis = Analysis::new(json!({"note": "<script>"}));
        let html = PlainHtmlRenderer
            .render_report(&run("a.ipa", Platform::Ipa), &analysis)
            .expect("render");
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn comparison_names_both_runs() {
        let before = run("old.apk", Platform::Apk);
        let after = run("new.apk", Platform::Apk);
        let analysis = Analysis::new(json!({"sizeBytes": 1}));
        let html = PlainHtmlRenderer
            .render_comparison(&before, &analysis, &after, &analysis)
            .expect("render");
        assert!(html.contains("old.apk vs new.apk"));
    }
}
