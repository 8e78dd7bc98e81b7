//! Module management commands: add, remove, list.

use anyhow::{Context, Result};

use botforge::config::Config;
use botforge::logging::LogRegistry;
use botforge::modules::{
    create_module, discover, register, remove_module, FsUnitSource, RemovalOutcome,
    RemoveOptions, StdinConfirm, TemplateSet,
};
use botforge::routing::Dispatcher;

/// Templates for new modules: built-ins plus overrides from
/// `modules.template_dir`.
fn load_templates(config: &Config) -> Result<TemplateSet> {
    let layout = config.layout();
    let mut templates = TemplateSet::builtin(&layout);
    if let Some(dir) = &config.modules.template_dir {
        let merged = templates
            .merge_from_dir(dir)
            .with_context(|| format!("Failed to load templates from {}", dir.display()))?;
        if merged > 0 {
            println!("Using {} template override(s) from {}", merged, dir.display());
        }
    }
    Ok(templates)
}

pub(crate) fn cmd_add_module(config: &Config, name: &str) -> Result<()> {
    let layout = config.layout();
    let templates = load_templates(config)?;

    println!("Creating module '{}'...", name);
    let report = create_module(&layout, name, &templates)?;

    for path in &report.existing {
        println!("  exists   {}", path.display());
    }
    for path in &report.created {
        println!("  created  {}", path.display());
    }
    println!("Module '{}' is ready.", name);
    Ok(())
}

pub(crate) fn cmd_remove_module(config: &Config, name: &str, yes: bool) -> Result<()> {
    let layout = config.layout();
    let logs = LogRegistry::new(&config.paths.log_dir);
    let opts = RemoveOptions::new(name, &config.paths.log_dir, &config.paths.temp_dir)
        .skip_confirmation(yes);

    match remove_module(&layout, &opts, &logs, &mut StdinConfirm)? {
        RemovalOutcome::NotFound { path } => {
            println!("Module '{}' not found at {}", name, path.display());
        }
        RemovalOutcome::Cancelled => {
            println!("Cancelled.");
        }
        RemovalOutcome::Removed {
            module_dir,
            temp_dir,
            log_dir,
        } => {
            println!("Removed {}", module_dir.display());
            if let Some(dir) = temp_dir {
                println!("Removed {}", dir.display());
            }
            if let Some(dir) = log_dir {
                println!("Removed {}", dir.display());
            }
        }
    }
    Ok(())
}

pub(crate) fn cmd_list_modules(config: &Config) -> Result<()> {
    let layout = config.layout();
    let source = FsUnitSource::new(layout.root_dir());
    let modules = discover(&source, &layout).with_context(|| {
        format!(
            "Failed to discover modules under {}",
            layout.modules_root().display()
        )
    })?;

    if modules.is_empty() {
        println!("No modules found under {}", layout.modules_root().display());
        return Ok(());
    }

    println!("Modules ({}):", modules.len());
    for module in &modules {
        let kind = match &module.parent {
            Some(parent) => format!("child of {}", parent),
            None => "root".to_string(),
        };
        println!("  {:<40} {}", module.package, kind);
    }

    let logs = LogRegistry::console_only();
    let dispatcher = Dispatcher::new(config.bot.service_name.as_str());
    let report = register(&dispatcher, &modules, &logs.get_loggers(&config.bot.log_name));

    println!();
    println!("Router tree:");
    for line in dispatcher.tree() {
        println!("  {}", line);
    }
    if report.skipped_count() > 0 {
        println!();
        println!("Skipped (parent not registered):");
        for package in &report.skipped {
            println!("  {}", package);
        }
    }
    Ok(())
}
