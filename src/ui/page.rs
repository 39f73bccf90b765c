use crate::application::controller::{
    FormDefaults, MIRROR_SUCCESS_MESSAGE, MirrorStatus, StepFailure, SubmissionOutcome,
    WateringReport,
};
use crate::domain::models::{DATE_FORMAT, INTERVAL_OPTIONS, PlantType, REPEAT_OPTIONS};
use hypertext::prelude::*;

pub const PAGE_TITLE: &str = "龍舌蘭澆水預估工具";
const RAIN_CHECKBOX_LABEL: &str = "我想指定『下雨提早澆水』的日期";
const RAIN_DATE_LABEL: &str = "請選擇下雨日（即提早澆水日）";
const PAGE_STYLE: &str = "body { max-width: 40rem; margin: 2rem auto; font-family: sans-serif; }
form label { display: block; margin: 0.5rem 0; }
.success { background: #e6f4ea; padding: 0.5rem; margin: 0.5rem 0; }
.info { background: #e8f0fe; padding: 0.5rem; margin: 0.5rem 0; }
.error { background: #fce8e6; padding: 0.5rem; margin: 0.5rem 0; }";

// The date picker only counts while the box is ticked.
const RAIN_TOGGLE_SCRIPT: &str = "this.form.rain_date.disabled = !this.checked";

/// Text with each newline rendered as a `<br>`.
fn multiline(text: &str) -> impl Renderable + '_ {
    maud! {
        @for (index, line) in text.split('\n').enumerate() {
            @if index > 0 { br; }
            (line)
        }
    }
}

fn number_options(options: &'static [u32], current: u32) -> impl Renderable {
    maud! {
        @for &value in options {
            @if value == current {
                option value=(value) selected { (value) }
            } @else {
                option value=(value) { (value) }
            }
        }
    }
}

fn plant_options(current: PlantType) -> impl Renderable {
    maud! {
        @for plant in PlantType::ALL {
            @if plant == current {
                option value=(plant.as_str()) selected { (plant.label()) }
            } @else {
                option value=(plant.as_str()) { (plant.label()) }
            }
        }
    }
}

fn render_form(defaults: &FormDefaults) -> impl Renderable + '_ {
    maud! {
        form .watering-form method="post" action="/submit" {
            label {
                @if defaults.rain_override {
                    input type="checkbox" name="rain_override" value="on" onchange=(RAIN_TOGGLE_SCRIPT) checked;
                } @else {
                    input type="checkbox" name="rain_override" value="on" onchange=(RAIN_TOGGLE_SCRIPT);
                }
                " " (RAIN_CHECKBOX_LABEL)
            }
            label {
                (RAIN_DATE_LABEL)
                @if defaults.rain_override {
                    input type="date" name="rain_date" value=(defaults.start_date.format(DATE_FORMAT).to_string());
                } @else {
                    input type="date" name="rain_date" value=(defaults.start_date.format(DATE_FORMAT).to_string()) disabled;
                }
            }
            label { "植株類型 " select name="plant_type" { (plant_options(defaults.plant_type)) } }
            label { "澆水週期（天） " select name="interval" { (number_options(&INTERVAL_OPTIONS, defaults.interval)) } }
            label { "預估次數 " select name="repeat" { (number_options(&REPEAT_OPTIONS, defaults.repeat)) } }
            button type="submit" { "開始預估" }
        }
    }
}

fn render_report(report: &WateringReport) -> impl Renderable + '_ {
    maud! {
        div .success { (multiline(&report.header)) }
        @for line in &report.lines {
            p { (line) }
        }
        @if let Some(note_line) = &report.note_line {
            div .info { (note_line) }
        }
    }
}

pub fn render_failure(failure: &StepFailure) -> impl Renderable + '_ {
    maud! {
        div .error { (multiline(&failure.message)) }
        pre { code { (failure.trace) } }
    }
}

fn render_outcome(outcome: &SubmissionOutcome) -> impl Renderable + '_ {
    maud! {
        @match outcome {
            SubmissionOutcome::Displayed { report, mirror, .. } => {
                (render_report(report))
                @match mirror {
                    MirrorStatus::Published => {
                        div .success { (MIRROR_SUCCESS_MESSAGE) }
                    }
                    MirrorStatus::Failed(failure) => {
                        (render_failure(failure))
                    }
                }
            }
            SubmissionOutcome::Failed { failure, report, .. } => {
                @if let Some(report) = report {
                    (render_report(report))
                }
                (render_failure(failure))
            }
        }
    }
}

pub fn render_page(defaults: &FormDefaults, outcome: Option<&SubmissionOutcome>, notice: Option<&str>) -> String {
    maud! {
        !DOCTYPE
        html lang="zh-Hant" {
            head {
                meta charset="utf-8";
                title { (PAGE_TITLE) }
                style { (PAGE_STYLE) }
            }
            body {
                h1 { "🌵 " (PAGE_TITLE) }
                @if let Some(message) = notice {
                    div .error { (message) }
                }
                (render_form(defaults))
                section .result {
                    @if let Some(outcome) = outcome {
                        (render_outcome(outcome))
                    }
                }
            }
        }
    }
    .render()
    .into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::controller::SubmitStep;
    use chrono::NaiveDate;

    fn defaults() -> FormDefaults {
        FormDefaults {
            plant_type: PlantType::Large,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date"),
            interval: 14,
            repeat: 10,
            rain_override: false,
            note: None,
        }
    }

    fn rain_date_input(html: &str) -> &str {
        let start = html.find(r#"name="rain_date""#).expect("rain_date input rendered");
        let tag_start = html[..start].rfind('<').expect("tag start");
        let tag_end = start + html[start..].find('>').expect("tag end");
        &html[tag_start..=tag_end]
    }

    #[test]
    fn form_preselects_defaults() {
        let html = render_page(&defaults(), None, None);
        assert!(html.contains(r#"<option value="large" selected>大植株</option>"#));
        assert!(html.contains(r#"<option value="small">小植株</option>"#));
        assert!(html.contains(r#"<option value="14" selected>14</option>"#));
        assert!(html.contains(r#"<option value="10" selected>10</option>"#));
        assert!(html.contains(r#"value="2024-01-01""#));
        assert!(!html.contains(" checked"));
    }

    #[test]
    fn unticked_override_disables_rain_date_picker() {
        let html = render_page(&defaults(), None, None);
        assert!(rain_date_input(&html).contains("disabled"));
    }

    #[test]
    fn ticked_override_enables_rain_date_picker() {
        let mut defaults = defaults();
        defaults.rain_override = true;
        let html = render_page(&defaults, None, None);
        let input = rain_date_input(&html);
        assert!(input.contains(r#"value="2024-01-01""#));
        assert!(!input.contains("disabled"));
        assert!(html.contains(" checked"));
    }

    #[test]
    fn notice_is_escaped_in_error_block() {
        let html = render_page(&defaults(), None, Some("unknown plant type '<script>'"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn failure_trace_is_escaped_in_code_block() {
        let failure = StepFailure {
            step: SubmitStep::AppendLog,
            message: "❌ 發生錯誤：\n<boom>".to_string(),
            trace: "Io(Custom { kind: Other, error: \"<boom>\" })".to_string(),
        };
        let html = render_failure(&failure).render().into_inner();
        assert!(html.contains("❌ 發生錯誤：<br>&lt;boom&gt;"));
        assert!(html.contains("<pre><code>Io(Custom { kind: Other, error: "));
        assert!(html.contains("&lt;boom&gt;"));
        assert!(html.ends_with("</code></pre>"));
        assert!(!html.contains("<boom>"));
    }
}
