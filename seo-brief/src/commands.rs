//! Command handlers behind the CLI.

use anyhow::{Context, Result};
use std::io::Write;
use std::sync::Arc;
use tokio::sync::broadcast;

use seo_brief_sdk::{
    log_file_saved, log_found, log_info, log_phase_complete_console, log_phase_start_console,
    log_progress, log_warning, ActivityLog,
};

use crate::analysis::{toggle_star, validate_keywords, AnalysisEngine};
use crate::article::{regenerate_paragraph, splice_paragraph, ArticleEvent, ArticleGenerator};
use crate::autosave::{AutoSaver, DEFAULT_DEBOUNCE};
use crate::brief::{Action, BriefStep, BriefWizard, RegenerateOutcome, View};
use crate::cancel::CancellationToken;
use crate::cli::{AnalyzeArgs, Args, Command, ShowFormat};
use crate::config::Settings;
use crate::database::Database;
use crate::inputs::{parse_keyword_list, validate_url};
use crate::providers::{AnthropicClient, DataForSeoClient};
use crate::services::{GenerationService, SessionStore};
use crate::session::SessionState;
use crate::types::{Keyword, LengthConstraints, MarketSettings, SubjectInputs};

/// Shared handles for one invocation
struct App {
    settings: Settings,
    db: Arc<Database>,
    cancel: CancellationToken,
}

impl App {
    async fn load(&self, id: &str) -> Result<SessionState> {
        self.db
            .load(id)
            .await?
            .with_context(|| format!("No session with id {}", id))
    }

    async fn save(&self, session: &mut SessionState) -> Result<()> {
        session.touch();
        self.db.save(session).await
    }

    fn generator(&self) -> Result<Arc<dyn GenerationService>> {
        let key = self.settings.anthropic_key()?;
        Ok(Arc::new(AnthropicClient::new(key, self.settings.model.clone())))
    }
}

/// Run one CLI invocation
pub async fn run(args: Args) -> Result<()> {
    seo_brief_sdk::set_event_output(args.emit_events);

    let mut settings = Settings::from_env()?;
    if let Some(db) = args.db {
        settings.db_path = db;
    }

    let db = Arc::new(Database::new(settings.db_path.clone())?);
    db.initialize_schema()?;

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        }
    });

    let app = App {
        settings,
        db,
        cancel,
    };

    match args.command {
        Command::Analyze(analyze) => run_analyze(&app, analyze).await,
        Command::Brief { session, autopilot } => run_brief(&app, &session, autopilot).await,
        Command::Regenerate {
            session,
            step,
            feedback,
        } => run_regenerate(&app, &session, step, feedback).await,
        Command::Feedback {
            session,
            step,
            text,
        } => run_feedback(&app, &session, step, text).await,
        Command::Star { session, url } => run_star(&app, &session, &url).await,
        Command::Article { session, output } => run_article(&app, &session, output).await,
        Command::Paragraph {
            session,
            line,
            feedback,
            apply,
        } => run_paragraph(&app, &session, line, &feedback, apply).await,
        Command::Show { session, format } => run_show(&app, &session, format).await,
        Command::Sessions { delete } => run_sessions(&app, delete).await,
    }
}

async fn read_keywords(args: &AnalyzeArgs) -> Result<Vec<Keyword>> {
    let mut keywords = Vec::new();
    if let Some(path) = &args.keywords_file {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        keywords.extend(parse_keyword_list(&text)?);
    }
    if !args.keywords.is_empty() {
        keywords.extend(parse_keyword_list(&args.keywords.join("\n"))?);
    }
    Ok(keywords)
}

async fn read_subject(args: &AnalyzeArgs) -> Result<SubjectInputs> {
    let file_context = match &args.context_file {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => String::new(),
    };
    let template_markdown = match &args.template {
        Some(path) => Some(
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?,
        ),
        None => None,
    };
    let reference_urls = args
        .reference_urls
        .iter()
        .map(|raw| validate_url(raw).map(|u| u.to_string()))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SubjectInputs {
        subject_info: args.subject.clone(),
        brand_info: args.brand.clone(),
        file_context,
        reference_urls,
        template_markdown,
    })
}

async fn run_analyze(app: &App, args: AnalyzeArgs) -> Result<()> {
    args.validate()?;
    let keywords = validate_keywords(&read_keywords(&args).await?)?;
    let subject = read_subject(&args).await?;
    let market = MarketSettings {
        country: args.country.clone(),
        serp_language: args.language.clone(),
        output_language: args.output_language.clone(),
    };

    let mut session = SessionState::new(args.name.clone(), keywords, market, subject);
    session.length_constraints = LengthConstraints {
        global_target: args.word_target,
        section_targets: args.section_target_map()?.into_iter().collect(),
        strict_mode: args.strict,
    };

    let (login, password) = app.settings.dataforseo_credentials()?;
    let client = Arc::new(DataForSeoClient::new(login, password));
    let engine = AnalysisEngine::new(client.clone(), client, app.settings.analysis_config());

    log_phase_start_console!(
        0,
        "Competitor Analysis",
        format!("{} keywords in {}", session.keywords.len(), session.market.country)
    );

    let mut log = ActivityLog::new();
    let mut lines = log.subscribe();
    let printer = tokio::spawn(async move {
        loop {
            match lines.recv().await {
                Ok(line) => eprintln!("{}", line),
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    session.wizard.apply(Action::AnalysisStarted);
    let result = engine
        .run_analysis(&session.keywords, &session.market, &mut log, &app.cancel)
        .await;
    let activity = log.lines().to_vec();
    drop(log);
    let _ = printer.await;

    match result {
        Ok(output) => {
            session.apply_analysis(output);
            session.wizard.apply(Action::AnalysisCompleted);
        }
        Err(err) => {
            session.wizard.apply(Action::AnalysisFailed(err.to_string()));
            app.save(&mut session).await?;
            app.db.append_activity(&session.id, &activity)?;
            return Err(err.into());
        }
    }

    app.save(&mut session).await?;
    app.db.append_activity(&session.id, &activity)?;
    log_found!(session.competitors.len(), "competitors");
    print_competitors(&session);
    log_phase_complete_console!(0);
    log_info!("Session {}", session.id);

    if args.start_brief {
        start_or_next(app, &mut session).await?;
    }
    Ok(())
}

/// Start the wizard if step 1 is missing, otherwise advance it
async fn start_or_next(app: &App, session: &mut SessionState) -> Result<()> {
    let wizard = BriefWizard::new(app.generator()?);
    let needs_start = matches!(session.wizard.view, View::Input | View::Analyzing);
    if needs_start && session.competitors.is_empty() {
        anyhow::bail!("Run the analysis first: the session has no competitors");
    }

    let result = {
        let (state, brief_ctx) = session.split();
        if needs_start {
            wizard.start(state, &brief_ctx).await
        } else {
            wizard.next(state, &brief_ctx).await
        }
    };
    app.save(session).await?;
    result?;

    print_step_status(session);
    Ok(())
}

async fn run_brief(app: &App, id: &str, autopilot: bool) -> Result<()> {
    let mut session = app.load(id).await?;
    if !autopilot {
        return start_or_next(app, &mut session).await;
    }

    if matches!(session.wizard.view, View::Input | View::Analyzing) {
        start_or_next(app, &mut session).await?;
    }

    let wizard = BriefWizard::new(app.generator()?);
    let saver = AutoSaver::spawn(app.db.clone(), DEFAULT_DEBOUNCE);
    let base = session.clone();

    let result = {
        let (state, brief_ctx) = session.split();
        wizard
            .run_autopilot_with(state, &brief_ctx, &app.cancel, |wizard_state| {
                let mut snapshot = base.clone();
                snapshot.wizard = wizard_state.clone();
                snapshot.touch();
                saver.mark_dirty(&snapshot);
                log_progress!(wizard_state.step.min(7), 7, "brief steps");
            })
            .await
    };

    saver.shutdown().await?;
    app.save(&mut session).await?;
    result?;

    print_step_status(&session);
    Ok(())
}

async fn run_regenerate(
    app: &App,
    id: &str,
    step: u8,
    feedback: Option<String>,
) -> Result<()> {
    let mut session = app.load(id).await?;
    let wizard = BriefWizard::new(app.generator()?);
    // Editing a finished brief happens on the dashboard, even after an article run
    session.wizard.apply(Action::OpenDashboard);

    let result = {
        let (state, brief_ctx) = session.split();
        wizard.regenerate(state, &brief_ctx, step, feedback).await
    };
    app.save(&mut session).await?;

    match result? {
        RegenerateOutcome::Regenerated(step) => {
            log_info!("Regenerated {}", step);
            print_step_status(&session);
        }
        RegenerateOutcome::Ignored => log_warning!("No step {}: nothing to regenerate", step),
    }
    Ok(())
}

async fn run_feedback(app: &App, id: &str, step: u8, text: String) -> Result<()> {
    let mut session = app.load(id).await?;
    let step = BriefStep::try_from(step)?;
    session.wizard.apply(Action::SetFeedback { step, text });
    app.save(&mut session).await?;
    log_info!("Feedback saved for {}", step);
    Ok(())
}

async fn run_star(app: &App, id: &str, url: &str) -> Result<()> {
    let mut session = app.load(id).await?;
    let starred = toggle_star(&mut session.competitors, url)
        .with_context(|| format!("{} is not a competitor in this session", url))?;
    app.save(&mut session).await?;
    log_info!("{} {}", if starred { "Starred" } else { "Unstarred" }, url);
    Ok(())
}

async fn run_article(app: &App, id: &str, output: Option<std::path::PathBuf>) -> Result<()> {
    let mut session = app.load(id).await?;
    if !session.wizard.is_done() {
        anyhow::bail!(
            "The brief is not finished (step {} of 7). Run `brief --autopilot` first.",
            session.wizard.step
        );
    }
    session.wizard.apply(Action::OpenArticle);

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let printer = tokio::spawn(async move {
        let mut stdout = std::io::stdout();
        while let Some(event) = rx.recv().await {
            match event {
                ArticleEvent::SectionStarted {
                    index,
                    total,
                    heading,
                } => {
                    eprintln!("[{}/{}] {}", index + 1, total, heading);
                }
                ArticleEvent::Chunk(text) => {
                    let _ = stdout.write_all(text.as_bytes());
                    let _ = stdout.flush();
                }
                ArticleEvent::SectionRewritten { index, words } => {
                    eprintln!("\n[section {} rewritten: {} words]", index + 1, words);
                }
                ArticleEvent::SectionFinished { .. } => {
                    let _ = stdout.write_all(b"\n\n");
                }
            }
        }
    });

    let generator = ArticleGenerator::new(app.generator()?).with_events(tx);
    let result = generator
        .generate_article(
            &session.wizard.brief,
            &session.keywords,
            &session.length_constraints,
            &session.market.output_language,
            &app.cancel,
        )
        .await;
    drop(generator);
    let _ = printer.await;

    let outcome = match result {
        Ok(article) => {
            session.article = Some(article);
            Ok(())
        }
        Err(failure) => {
            log_warning!("Article stopped early, keeping what was written");
            session.article = Some(failure.partial);
            Err(failure.error)
        }
    };
    app.save(&mut session).await?;

    if let (Some(path), Some(article)) = (output, &session.article) {
        tokio::fs::write(&path, &article.content).await?;
        log_file_saved!(path.display());
    }
    outcome?;
    Ok(())
}

async fn run_paragraph(
    app: &App,
    id: &str,
    line: usize,
    feedback: &str,
    apply: bool,
) -> Result<()> {
    let mut session = app.load(id).await?;
    let article = session
        .article
        .as_ref()
        .context("The session has no article yet")?;

    let generator = app.generator()?;
    let replacement = regenerate_paragraph(
        generator.as_ref(),
        &session.wizard.brief,
        &article.content,
        line,
        feedback,
        &session.market.output_language,
    )
    .await?;
    println!("{}", replacement);

    if apply {
        let content = splice_paragraph(&article.content, line, &replacement);
        if let Some(article) = session.article.as_mut() {
            article.content = content;
        }
        app.save(&mut session).await?;
        log_info!("Paragraph {} replaced", line);
    }
    Ok(())
}

async fn run_show(app: &App, id: &str, format: ShowFormat) -> Result<()> {
    let session = app.load(id).await?;
    match format {
        ShowFormat::Yaml => print!("{}", serde_yaml::to_string(&session.wizard.brief)?),
        ShowFormat::Json => println!("{}", serde_json::to_string_pretty(&session)?),
        ShowFormat::Competitors => print_competitors(&session),
        ShowFormat::Article => match &session.article {
            Some(article) => println!("{}", article.content),
            None => log_warning!("No article yet"),
        },
        ShowFormat::Activity => {
            for line in app.db.get_activity(&session.id, None)? {
                println!("{}", line);
            }
        }
    }
    Ok(())
}

async fn run_sessions(app: &App, delete: Option<String>) -> Result<()> {
    if let Some(id) = delete {
        if app.db.delete(&id).await? {
            log_info!("Deleted {}", id);
        } else {
            log_warning!("No session with id {}", id);
        }
        return Ok(());
    }

    let sessions = app.db.list().await?;
    log_found!(sessions.len(), "sessions");
    for s in sessions {
        println!(
            "{}  {:<30} {:<10} step {}  {} competitors  {}",
            s.id,
            s.name,
            format!("{:?}", s.view).to_lowercase(),
            s.step,
            s.competitor_count,
            s.updated_at.format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}

fn print_competitors(session: &SessionState) {
    for (i, c) in session.competitors.iter().enumerate() {
        println!(
            "{:>2}. {:>6}  {}{}  ({} words, {} keywords)",
            i + 1,
            c.weighted_score,
            if c.is_starred { "★ " } else { "" },
            c.url,
            c.word_count,
            c.rankings.len()
        );
    }
}

fn print_step_status(session: &SessionState) {
    let state = &session.wizard;
    for step in BriefStep::ALL {
        let mark = if !step.is_present_in(&state.brief) {
            " "
        } else if state.is_stale(step) {
            "!"
        } else {
            "✓"
        };
        println!("[{}] {}", mark, step);
    }
    if state.is_done() {
        log_info!("Brief complete");
    } else {
        log_info!("At step {} of 7", state.step);
    }
    if let Some(error) = &state.error {
        log_warning!(error);
    }
}
