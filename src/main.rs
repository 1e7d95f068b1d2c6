use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use watch_commander::app::{Account, JsonModel, SAMPLE_FORM};
use watch_commander::utils::{logger, validation::Validate};
use watch_commander::{
    AppConfig, BindError, Binder, CliArgs, ElementId, ElementSnapshot, LogFormat, MemoryDocument,
    Model,
};

#[derive(Debug, Serialize)]
struct Report {
    valid: bool,
    invalid: Vec<String>,
    elements: Vec<ElementSnapshot>,
}

fn main() {
    let args = CliArgs::parse();

    // 初始化日誌
    match args.log_format {
        LogFormat::Compact => logger::init_cli_logger(args.verbose),
        LogFormat::Json => logger::init_json_logger(args.verbose),
    }

    tracing::info!("🚀 Starting watch-commander");
    if args.verbose {
        tracing::debug!("CLI args: {:?}", args);
    }

    match run(&args) {
        Ok(report) => {
            tracing::info!(
                "✅ Bound {} elements ({} invalid)",
                report.elements.len(),
                report.invalid.len()
            );
            match serde_json::to_string_pretty(&report) {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    eprintln!("❌ Failed to serialize report: {}", e);
                    std::process::exit(4);
                }
            }
        }
        Err(e) => {
            let exit_code = match e.downcast_ref::<BindError>() {
                Some(bind_error) => {
                    tracing::error!("❌ {} (Category: {:?})", e, bind_error.category());
                    tracing::error!("💡 Recovery suggestion: {}", bind_error.recovery_suggestion());
                    eprintln!("💡 建議: {}", bind_error.recovery_suggestion());
                    bind_error.exit_code()
                }
                None => 1,
            };
            eprintln!("❌ {:#}", e);
            std::process::exit(exit_code);
        }
    }
}

fn run(args: &CliArgs) -> anyhow::Result<Report> {
    // 載入配置
    let config = match &args.config {
        Some(path) => {
            tracing::info!("📁 Loading configuration from: {}", path);
            AppConfig::from_file(path).with_context(|| format!("reading config {}", path))?
        }
        None => AppConfig::default(),
    };
    config.validate()?;

    let markup = match &args.markup {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("reading markup {}", path))?
        }
        None => SAMPLE_FORM.to_string(),
    };
    let mut document = MemoryDocument::parse(&markup)?;

    match &args.model {
        Some(path) => {
            tracing::info!("📄 Binding JSON model from: {}", path);
            let mut model = JsonModel::from_file(path, config.model.clone())
                .with_context(|| format!("loading model {}", path))?;
            bind(&mut model, &mut document, &config, args)
        }
        None => {
            tracing::info!("📄 Binding sample account");
            bind(&mut Account::new(), &mut document, &config, args)
        }
    }
}

fn bind<M: Model>(
    model: &mut M,
    document: &mut MemoryDocument,
    config: &AppConfig,
    args: &CliArgs,
) -> anyhow::Result<Report> {
    let mut session = Binder::new(config.binder.clone()).attach(model, document, &args.region)?;
    tracing::info!("🔗 Attached {} bindings to #{}", session.bindings().len(), args.region);

    for (name, value) in &args.sets {
        let actual = session.set(name, value.clone())?;
        tracing::debug!("set {} -> {}", name, actual);
    }

    for (id, value) in &args.edits {
        let element = ElementId::new(id.as_str());
        if session.dom_mut().user_edit(&element, value)? {
            session.handle_change(&element)?;
        } else {
            tracing::warn!("⚠️ #{} has no change listener, edit not dispatched", element);
        }
    }

    if args.redraw {
        session.redraw()?;
    }

    let valid = session.is_valid(None);
    let invalid = session.invalid_properties();
    session.detach()?;

    Ok(Report {
        valid,
        invalid,
        elements: document.snapshot(),
    })
}
