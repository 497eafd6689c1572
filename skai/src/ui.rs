//! UI rendering for the TUI.

use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Cell, Gauge, Paragraph, Row, Table, Wrap},
    Frame,
};
use skai_core::chat::{Sender, QUICK_QUESTION_KEYS};
use skai_core::format::{format_clock, format_count, format_percent};
use skai_core::operations::mock::Severity;
use skai_core::operations::OperationKind;
use skai_core::report::REPORT_FORMATS;
use skai_core::session::OrgAccent;
use skai_core::{ImageRole, Params, Stage, StageStatus};

use crate::app::{App, Focus, LoginField, Screen};

// ========== Palette ==========

/// Brand color for the header and active stage
const BRAND: Color = Color::Rgb(37, 99, 235);
/// Completed stage marker
const DONE: Color = Color::Rgb(34, 197, 94);
/// Pending stage marker
const PENDING: Color = Color::Rgb(120, 120, 120);
/// Label color for key/value rows
const LABEL_COLOR: Color = Color::Rgb(100, 180, 180);
/// Border color for the chat panel
const BORDER_CHAT: Color = Color::Rgb(140, 100, 200);
/// Border color for the stage panel
const BORDER_STAGE: Color = Color::Rgb(80, 160, 80);

/// Render the application UI.
pub fn render(frame: &mut Frame, app: &App) {
    match app.screen {
        Screen::Login => render_login(frame, app),
        Screen::Dashboard => render_dashboard(frame, app),
    }
}

// ========== Login ==========

fn render_login(frame: &mut Frame, app: &App) {
    let area = centered(frame.area(), 60, 16);
    let dashboard = &app.dashboard;

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BRAND))
        .title(" SKAI Response Platform ")
        .title_alignment(Alignment::Center);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::vertical([
        Constraint::Length(2), // Title
        Constraint::Length(3), // Identifier
        Constraint::Length(3), // Secret
        Constraint::Length(2), // Status
        Constraint::Min(1),    // Hints
    ])
    .split(inner);

    let title = Paragraph::new(dashboard.t("signIn"))
        .style(Style::default().fg(Color::Cyan).bold())
        .alignment(Alignment::Center);
    frame.render_widget(title, chunks[0]);

    let masked = "•".repeat(app.login.secret.chars().count());
    render_input(
        frame,
        "Username",
        &app.login.identifier,
        app.login.field == LoginField::Identifier,
        chunks[1],
    );
    render_input(
        frame,
        "Password",
        &masked,
        app.login.field == LoginField::Secret,
        chunks[2],
    );

    let status = if app.login.authenticating {
        Line::styled(dashboard.t("authenticating"), Style::default().fg(Color::Yellow))
    } else if let Some(error) = &app.login.error {
        Line::styled(error.clone(), Style::default().fg(Color::Red))
    } else {
        Line::raw("")
    };
    frame.render_widget(Paragraph::new(status).alignment(Alignment::Center), chunks[3]);

    let language = dashboard
        .localizer()
        .current_language()
        .map(|l| format!("{} {}", l.flag, l.name))
        .unwrap_or_else(|| dashboard.localizer().language().to_string());
    let hints = vec![
        key_hints(&[
            ("Tab", "field"),
            ("Enter", "sign in"),
            ("F2", "demo account"),
            ("F3", "language"),
            ("Esc", "quit"),
        ]),
        Line::styled(language, Style::default().fg(Color::DarkGray)),
    ];
    frame.render_widget(Paragraph::new(hints).alignment(Alignment::Center), chunks[4]);
}

fn render_input(frame: &mut Frame, label: &str, value: &str, focused: bool, area: Rect) {
    let border = if focused { Color::Cyan } else { PENDING };
    let cursor = if focused { "▏" } else { "" };
    let input = Paragraph::new(format!("{value}{cursor}")).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title(format!(" {label} ")),
    );
    frame.render_widget(input, area);
}

// ========== Dashboard ==========

fn render_dashboard(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let chunks = Layout::vertical([
        Constraint::Length(2), // Header
        Constraint::Length(3), // Stage stepper
        Constraint::Min(8),    // Body
        Constraint::Length(1), // Status line
        Constraint::Length(1), // Footer
    ])
    .split(area);

    render_header(frame, app, chunks[0]);
    render_stepper(frame, app, chunks[1]);

    let body = Layout::horizontal([Constraint::Min(40), Constraint::Length(44)]).split(chunks[2]);
    render_stage_panel(frame, app, body[0]);
    render_chat(frame, app, body[1]);

    render_status_line(frame, app, chunks[3]);
    render_footer(frame, app, chunks[4]);
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let dashboard = &app.dashboard;
    let chunks = Layout::horizontal([Constraint::Length(26), Constraint::Min(1)]).split(area);

    let app_name = Paragraph::new(" SKAI Response Platform")
        .style(Style::default().fg(BRAND).bold())
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(app_name, chunks[0]);

    let mut spans = Vec::new();
    if let Some(session) = dashboard.session() {
        spans.push(Span::styled(
            format!("{} ", session.organization),
            Style::default().fg(accent_color(session.accent())).bold(),
        ));
        spans.push(Span::raw(format!("{} · {} · {}", session.name, session.role, session.region)));
    } else {
        spans.push(Span::styled(dashboard.t("notSignedIn"), Style::default().fg(PENDING)));
    }
    if let Some(language) = dashboard.localizer().current_language() {
        spans.push(Span::raw("  │ "));
        spans.push(Span::raw(format!("{} {}", language.flag, language.name)));
    }

    let user = Paragraph::new(Line::from(spans))
        .alignment(Alignment::Right)
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(user, chunks[1]);
}

fn accent_color(accent: OrgAccent) -> Color {
    match accent {
        OrgAccent::Blue => Color::Rgb(37, 99, 235),
        OrgAccent::Red => Color::Rgb(220, 38, 38),
        OrgAccent::Cyan => Color::Rgb(6, 182, 212),
        OrgAccent::Orange => Color::Rgb(234, 88, 12),
        OrgAccent::Gray => Color::Gray,
    }
}

/// One cell per stage with its status marker.
fn render_stepper(frame: &mut Frame, app: &App, area: Rect) {
    let constraints = [Constraint::Ratio(1, Stage::COUNT as u32); Stage::COUNT];
    let cells = Layout::horizontal(constraints).split(area);

    for (i, (stage, status)) in app.dashboard.pipeline().snapshot().into_iter().enumerate() {
        let (marker, color) = match status {
            StageStatus::Completed => ("✓", DONE),
            StageStatus::Active => ("●", BRAND),
            StageStatus::Pending => ("○", PENDING),
        };
        let mut title_style = Style::default().fg(color);
        if status == StageStatus::Active {
            title_style = title_style.add_modifier(Modifier::BOLD);
        }

        let lines = vec![
            Line::from(vec![
                Span::styled(format!("{marker} {} ", i + 1), Style::default().fg(color)),
                Span::styled(stage.title(), title_style),
            ]),
            Line::styled(stage.description(), Style::default().fg(Color::DarkGray)),
        ];
        let block = Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(color));
        frame.render_widget(Paragraph::new(lines).block(block), cells[i]);
    }
}

fn render_stage_panel(frame: &mut Frame, app: &App, area: Rect) {
    let stage = app.dashboard.pipeline().active_stage();
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER_STAGE))
        .title(format!(" {} ", stage_heading(app, stage)));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    // A running operation replaces the panel body with a progress gauge.
    if let Some(kind) = OperationKind::for_stage(stage) {
        if let Some(progress) = app.dashboard.progress(kind) {
            render_progress(frame, app, kind, progress, inner);
            return;
        }
    }

    match stage {
        Stage::Upload => render_upload(frame, app, inner),
        Stage::Enhance => render_enhance(frame, app, inner),
        Stage::Analyze => render_analyze(frame, app, inner),
        Stage::Summarize => render_summary(frame, app, inner),
        Stage::Report => render_report(frame, app, inner),
    }
}

fn stage_heading(app: &App, stage: Stage) -> String {
    let key = match stage {
        Stage::Upload => "uploadImages",
        Stage::Enhance => "ganEnhancement",
        Stage::Analyze => "skaiAnalysis",
        Stage::Summarize => "damageSummary",
        Stage::Report => "downloadReports",
    };
    app.dashboard.t(key)
}

fn render_progress(frame: &mut Frame, app: &App, kind: OperationKind, progress: f64, area: Rect) {
    let chunks = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(3),
        Constraint::Min(0),
    ])
    .split(area);

    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL))
        .gauge_style(Style::default().fg(BRAND))
        .ratio(progress.clamp(0.0, 1.0))
        .label(format!(
            "{} {}",
            app.dashboard.t(kind.progress_key()),
            format_percent(progress)
        ));
    frame.render_widget(gauge, chunks[1]);
}

fn render_upload(frame: &mut Frame, app: &App, area: Rect) {
    let dashboard = &app.dashboard;
    let mut lines = Vec::new();

    if app.focus == Focus::Upload {
        lines.push(Line::styled(
            dashboard.t("selectFiles"),
            Style::default().fg(Color::Cyan).bold(),
        ));
        lines.push(Line::raw(format!("> {}▏", app.upload_input)));
        lines.push(Line::styled(
            "pre-disaster path first, then post-disaster paths",
            Style::default().fg(Color::DarkGray),
        ));
        lines.push(Line::raw(""));
    } else {
        lines.push(Line::raw(dashboard.t("dragDropImages")));
        lines.push(Line::styled(
            dashboard.t("supportedFormats"),
            Style::default().fg(Color::DarkGray),
        ));
        lines.push(Line::raw(""));
    }

    let images = dashboard.assets().images();
    if images.is_empty() {
        lines.push(Line::styled(
            dashboard.t("availableSamples"),
            Style::default().fg(LABEL_COLOR),
        ));
        lines.push(Line::raw(format!("  s  {}", dashboard.t("useSampleData"))));
        lines.push(Line::raw(format!("  u  {}", dashboard.t("selectFiles"))));
    } else {
        for image in images {
            lines.push(image_line(image.role, &image.name, &image.date, &image.location));
        }
    }

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
}

fn image_line(role: ImageRole, name: &str, date: &str, location: &str) -> Line<'static> {
    let color = match role {
        ImageRole::Pre => Color::Cyan,
        ImageRole::Post => Color::Yellow,
    };
    Line::from(vec![
        Span::styled(format!("{:<14}", role.label()), Style::default().fg(color)),
        Span::raw(name.to_string()),
        Span::styled(format!("  {date} · {location}"), Style::default().fg(Color::DarkGray)),
    ])
}

fn render_enhance(frame: &mut Frame, app: &App, area: Rect) {
    let dashboard = &app.dashboard;
    let mut lines = Vec::new();

    match dashboard.images_for(Stage::Enhance) {
        Err(_) => lines.push(Line::styled(
            dashboard.t("uploadImagesFirst"),
            Style::default().fg(Color::Yellow),
        )),
        Ok(images) => {
            for image in images {
                lines.push(image_line(image.role, &image.name, &image.date, &image.location));
            }
            lines.push(Line::raw(""));
            match &dashboard.results().enhancement {
                Some(result) => {
                    lines.push(Line::styled(
                        dashboard.t("enhancementComplete"),
                        Style::default().fg(DONE).bold(),
                    ));
                    let params = Params::new().with("count", result.damage_areas_detected);
                    lines.push(Line::raw(dashboard.t_with("damageAreasDetected", &params)));
                    lines.push(Line::styled(
                        format!("{} · {}x", result.model, result.upscale_factor),
                        Style::default().fg(Color::DarkGray),
                    ));
                }
                None => lines.push(action_line("Enter", &dashboard.t("startEnhancement"))),
            }
        }
    }

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
}

fn render_analyze(frame: &mut Frame, app: &App, area: Rect) {
    let dashboard = &app.dashboard;

    if dashboard.images_for(Stage::Analyze).is_err() {
        let prompt = Paragraph::new(dashboard.t("uploadEnhancedFirst"))
            .style(Style::default().fg(Color::Yellow));
        frame.render_widget(prompt, area);
        return;
    }

    let Some(analysis) = &dashboard.results().analysis else {
        let prompt = Paragraph::new(action_line("Enter", &dashboard.t("startAnalysis")));
        frame.render_widget(prompt, area);
        return;
    };

    let chunks = Layout::vertical([Constraint::Length(2), Constraint::Min(3)]).split(area);

    let params = Params::new()
        .with("count", analysis.areas.len())
        .with("buildings", analysis.total_buildings());
    let headline = Paragraph::new(vec![
        Line::styled(
            dashboard.t_with("analysisComplete", &params),
            Style::default().fg(DONE).bold(),
        ),
        Line::styled(
            format!("mean confidence {}%", analysis.mean_confidence_percent()),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    frame.render_widget(headline, chunks[0]);

    let header = Row::new(vec!["#", "Type", "Severity", "Conf.", "Bldgs"])
        .style(Style::default().fg(LABEL_COLOR).bold());
    let rows: Vec<Row> = analysis
        .areas
        .iter()
        .map(|damage| {
            Row::new(vec![
                Cell::from(damage.id.to_string()),
                Cell::from(damage.kind.clone()),
                Cell::from(dashboard.t(damage.severity.label_key()))
                    .style(Style::default().fg(severity_color(damage.severity))),
                Cell::from(format!("{:.0}%", damage.confidence * 100.0)),
                Cell::from(damage.building_count.to_string()),
            ])
        })
        .collect();
    let table = Table::new(
        rows,
        [
            Constraint::Length(3),
            Constraint::Min(16),
            Constraint::Length(10),
            Constraint::Length(6),
            Constraint::Length(6),
        ],
    )
    .header(header);
    frame.render_widget(table, chunks[1]);
}

fn render_summary(frame: &mut Frame, app: &App, area: Rect) {
    let dashboard = &app.dashboard;

    let Some(summary) = &dashboard.results().summary else {
        let prompt = Paragraph::new(vec![
            Line::raw(dashboard.t("generateSummaryPrompt")),
            Line::raw(""),
            action_line("Enter", &dashboard.t("generateSummary")),
        ]);
        frame.render_widget(prompt, area);
        return;
    };

    let label = |key: &str| {
        Span::styled(
            format!("{}: ", dashboard.t(key)),
            Style::default().fg(LABEL_COLOR),
        )
    };

    let mut lines = vec![
        Line::styled(dashboard.t("overallAssessment"), Style::default().bold()),
        Line::from(vec![
            label("severity"),
            Span::styled(
                dashboard.t(summary.overall_severity.label_key()),
                Style::default().fg(severity_color(summary.overall_severity)),
            ),
            Span::raw("   "),
            label("affectedArea"),
            Span::raw(format!("{:.1} km²", summary.affected_area_km2)),
            Span::raw("   "),
            label("damageLevel"),
            Span::raw(format!("{}%", summary.damage_level_percent)),
        ]),
        Line::raw(""),
        Line::styled(dashboard.t("infrastructurePriority"), Style::default().bold()),
    ];

    for item in &summary.infrastructure {
        lines.push(Line::from(vec![
            Span::styled("● ", Style::default().fg(severity_color(item.priority))),
            Span::raw(format!("{:<24}", item.name)),
            Span::raw(format!(
                "{} {} · {}% {}",
                format_count(item.damaged_units),
                dashboard.t("units"),
                item.damaged_percent,
                dashboard.t("damaged")
            )),
        ]));
    }

    lines.push(Line::raw(""));
    lines.push(Line::styled(dashboard.t("populationImpact"), Style::default().bold()));
    lines.push(Line::from(vec![
        label("affected"),
        Span::raw(format_count(summary.population.affected)),
        Span::raw("   "),
        label("displaced"),
        Span::raw(format_count(summary.population.displaced)),
        Span::raw("   "),
        label("vulnerable"),
        Span::raw(format_count(summary.population.vulnerable)),
    ]));
    lines.push(Line::raw(""));
    lines.push(Line::styled(summary.narrative.clone(), Style::default().fg(Color::DarkGray)));

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
}

fn render_report(frame: &mut Frame, app: &App, area: Rect) {
    let dashboard = &app.dashboard;
    let selection = dashboard.report();

    let mut lines = vec![
        Line::styled(dashboard.t("disasterReport"), Style::default().bold()),
        Line::styled(dashboard.t("downloadHelp"), Style::default().fg(Color::DarkGray)),
        Line::raw(""),
        Line::styled(dashboard.t("selectFormats"), Style::default().fg(LABEL_COLOR)),
    ];

    for (i, format) in REPORT_FORMATS.iter().enumerate() {
        let check = if selection.is_selected(format.id) { "[x]" } else { "[ ]" };
        let mut style = Style::default();
        if i == app.report_cursor {
            style = style.add_modifier(Modifier::REVERSED);
        }
        lines.push(Line::styled(
            format!("{check} {:<18} {:>8}", format.name, format.size),
            style,
        ));
    }

    lines.push(Line::raw(""));
    lines.push(Line::raw(format!(
        "{} {}  ·  {}: {} MB",
        selection.count(),
        dashboard.t("itemsSelected"),
        dashboard.t("totalSize"),
        selection.total_size_label()
    )));

    if let Some(report) = &dashboard.results().report {
        lines.push(Line::raw(""));
        lines.push(Line::styled(
            format!("{} · {}", dashboard.t("completed"), report.sections.join(", ")),
            Style::default().fg(DONE),
        ));
    } else {
        lines.push(Line::raw(""));
        lines.push(action_line("Enter", &dashboard.t("download")));
    }

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
}

fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::High => Color::Red,
        Severity::Medium => Color::Yellow,
        Severity::Low => Color::Green,
    }
}

fn action_line(key: &str, label: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{key} "), Style::default().fg(Color::Yellow)),
        Span::raw(label.to_string()),
    ])
}

// ========== Chat ==========

fn render_chat(frame: &mut Frame, app: &App, area: Rect) {
    let dashboard = &app.dashboard;
    let focused = app.focus == Focus::Chat;

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(if focused { Color::Cyan } else { BORDER_CHAT }))
        .title(format!(" {} ", dashboard.t("aiAssistant")));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::vertical([
        Constraint::Min(3),    // Messages
        Constraint::Length(5), // Quick questions
        Constraint::Length(1), // Input
    ])
    .split(inner);

    let mut lines = Vec::new();
    for message in dashboard.chat().messages() {
        let (who, color) = match message.sender {
            Sender::User => ("you", Color::Cyan),
            Sender::Bot => ("skai", BORDER_CHAT),
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{who} "), Style::default().fg(color).bold()),
            Span::styled(format_clock(message.timestamp), Style::default().fg(Color::DarkGray)),
        ]));
        lines.push(Line::raw(message.text.clone()));
    }
    if dashboard.chat().is_typing() {
        lines.push(Line::styled("…", Style::default().fg(Color::DarkGray)));
    }

    let messages = Paragraph::new(lines).wrap(Wrap { trim: false });
    let skip = bottom_scroll(&messages, chunks[0]);
    frame.render_widget(messages.scroll((skip, 0)), chunks[0]);

    let mut quick = vec![Line::styled(
        dashboard.t("quickQuestions"),
        Style::default().fg(LABEL_COLOR),
    )];
    for (i, key) in QUICK_QUESTION_KEYS.iter().enumerate() {
        quick.push(action_line(&format!("F{}", i + 1), &dashboard.t(key)));
    }
    frame.render_widget(Paragraph::new(quick), chunks[1]);

    let input = if focused {
        Line::raw(format!("> {}▏", app.chat_input))
    } else {
        Line::styled(dashboard.t("typeMessage"), Style::default().fg(Color::DarkGray))
    };
    frame.render_widget(Paragraph::new(input), chunks[2]);
}

/// Scroll offset that keeps the last wrapped row of `paragraph` in view.
fn bottom_scroll(paragraph: &Paragraph, area: Rect) -> u16 {
    let rows = paragraph.line_count(area.width);
    let skip = rows.saturating_sub(area.height as usize);
    u16::try_from(skip).unwrap_or(u16::MAX)
}

// ========== Status and footer ==========

fn render_status_line(frame: &mut Frame, app: &App, area: Rect) {
    let dashboard = &app.dashboard;
    let line = if let Some(error) = dashboard.last_error() {
        Line::styled(format!(" {error}"), Style::default().fg(Color::Red))
    } else if let Some(notice) = dashboard.notice() {
        Line::styled(format!(" {notice}"), Style::default().fg(DONE))
    } else {
        Line::raw("")
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let hints: &[(&str, &str)] = match app.focus {
        Focus::Pipeline => &[
            ("1-5", "stage"),
            ("Enter", "run"),
            ("s", "samples"),
            ("u", "upload"),
            ("Tab", "chat"),
            ("L", "language"),
            ("o", "sign out"),
            ("q", "quit"),
        ],
        Focus::Chat => &[("Enter", "send"), ("F1-F4", "quick"), ("Esc", "back")],
        Focus::Upload => &[("Enter", "upload"), ("Esc", "cancel")],
    };
    frame.render_widget(Paragraph::new(key_hints(hints)), area);
}

fn key_hints(hints: &[(&str, &str)]) -> Line<'static> {
    let mut spans = Vec::new();
    for (key, label) in hints {
        spans.push(Span::styled(format!(" {key}"), Style::default().fg(Color::Yellow)));
        spans.push(Span::raw(format!(" {label} ")));
    }
    Line::from(spans)
}

/// A `width` x `height` rect centered in `area`, clamped to fit.
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
