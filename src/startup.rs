//! Bot startup sequence.
//!
//! `setup_bot` discovers modules, registers their routers into a fresh
//! [`Dispatcher`], makes sure the temp and static directories exist and
//! builds the main menu. Discovery errors are fatal; registration problems
//! are only reported.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::{ForgeError, Result};
use crate::logging::LogRegistry;
use crate::menu::MainMenu;
use crate::modules::{discover, register, ModuleDescriptor, RegistrationReport, UnitSource};
use crate::routing::Dispatcher;
use crate::utils::fs::ensure_directories;

/// Everything the chat loop needs after startup.
#[derive(Debug)]
pub struct BotSetup {
    pub dispatcher: Arc<Dispatcher>,
    pub modules: Vec<ModuleDescriptor>,
    pub main_menu: MainMenu,
    pub report: RegistrationReport,
}

pub fn setup_bot(config: &Config, source: &dyn UnitSource, logs: &LogRegistry) -> Result<BotSetup> {
    let bot_logs = logs.get_loggers(&config.bot.log_name);
    let layout = config.layout();

    let modules = discover(source, &layout).map_err(|e| {
        bot_logs.error(&format!("Module discovery failed: {}", e));
        e
    })?;

    let dispatcher = Arc::new(Dispatcher::new(config.bot.service_name.as_str()));
    let report = register(dispatcher.as_ref(), &modules, &bot_logs);

    let mut dirs = vec![config.paths.temp_dir.clone(), config.paths.static_dir.clone()];
    dirs.extend(module_temp_dirs(&modules, &config.paths.temp_dir));
    ensure_directories(&dirs)?;

    let main_menu = MainMenu::from_modules(
        &modules,
        &config.bot.service_name,
        config.bot.menu_columns,
    );

    for line in dispatcher.tree() {
        bot_logs.info(&format!("router: {}", line));
    }
    info!(
        modules = modules.len(),
        routers = dispatcher.router_count(),
        skipped = report.skipped_count(),
        "Bot setup complete"
    );

    Ok(BotSetup {
        dispatcher,
        modules,
        main_menu,
        report,
    })
}

/// Temp folders declared by modules, resolved under `temp_dir`.
///
/// Folders that are absolute or climb out of `temp_dir` are skipped.
fn module_temp_dirs(modules: &[ModuleDescriptor], temp_dir: &Path) -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    for module in modules {
        let settings = match module.settings.settings() {
            Ok(s) => s,
            Err(e) => {
                warn!(package = %module.package, error = %e, "Skipping temp folder of module");
                continue;
            }
        };
        let folder = Path::new(&settings.temp_folder);
        if !is_contained(folder) {
            warn!(
                package = %module.package,
                folder = %settings.temp_folder,
                "Temp folder escapes the temp directory, skipping"
            );
            continue;
        }
        dirs.push(temp_dir.join(folder));
    }
    dirs
}

fn is_contained(path: &Path) -> bool {
    path.components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// Run `f`, turning a panic into `STARTUP FAIL`.
pub fn run_guarded<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => {
            let details = panic_message(payload.as_ref());
            error!(details = %details, "Startup panicked");
            Err(ForgeError::StartupFail {
                message: "unexpected panic during startup".to_string(),
                details: Some(details),
            })
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::{create_module, FsUnitSource, ModuleManifest, TemplateSet};
    use crate::routing::{HandlerDef, RouterDef};
    use serde_json::json;
    use tempfile::TempDir;

    fn config(tmp: &TempDir) -> Config {
        let mut config = Config::default();
        config.paths.root_dir = tmp.path().join("src");
        config.paths.temp_dir = tmp.path().join("temp");
        config.paths.static_dir = tmp.path().join("static");
        config.paths.log_dir = tmp.path().join("logs");
        config
    }

    #[test]
    fn test_setup_from_scaffolded_modules() {
        let tmp = TempDir::new().unwrap();
        let config = config(&tmp);
        let layout = config.layout();
        let templates = TemplateSet::builtin(&layout);
        create_module(&layout, "video.create", &templates).unwrap();
        create_module(&layout, "audio", &templates).unwrap();

        let source = FsUnitSource::new(&config.paths.root_dir);
        let setup = setup_bot(&config, &source, &LogRegistry::console_only()).unwrap();

        assert_eq!(setup.modules.len(), 3);
        assert_eq!(setup.report.roots, vec!["audio", "video"]);
        assert_eq!(setup.dispatcher.router_count(), 3);
        assert_eq!(
            setup.dispatcher.dispatch("video.childes.create").as_deref(),
            Some("Module video.childes.create (root router: video)")
        );
        assert_eq!(
            setup.main_menu.labels().collect::<Vec<_>>(),
            vec!["audio", "video"]
        );

        assert!(config.paths.static_dir.is_dir());
        assert!(config.paths.temp_dir.join("video/childes/create").is_dir());
        assert!(config.paths.temp_dir.join("audio").is_dir());
    }

    #[test]
    fn test_setup_from_manifest() {
        let tmp = TempDir::new().unwrap();
        let config = config(&tmp);
        let mut manifest = ModuleManifest::new();
        manifest.register(
            "app.bot.modules.help",
            json!({
                "SERVICE_NAME": "help",
                "ROOT_PACKAGE": "app.bot.modules.help",
                "NAME_FOR_TEMP_FOLDER": "../../outside",
                "NAME_FOR_LOG_FOLDER": "help",
                "SHOW_IN_MAIN_MENU": true,
                "MENU_REPLY_TEXT": "Help"
            }),
            RouterDef {
                name: "help".to_string(),
                handlers: vec![HandlerDef {
                    command: Some("help".to_string()),
                    text: Some("Help".to_string()),
                    reply: "How can I help?".to_string(),
                }],
            },
        );

        let setup = setup_bot(&config, &manifest, &LogRegistry::console_only()).unwrap();
        assert_eq!(setup.dispatcher.dispatch("/help").as_deref(), Some("How can I help?"));
        assert_eq!(setup.main_menu.labels().collect::<Vec<_>>(), vec!["Help"]);
        assert!(!tmp.path().join("outside").exists());
    }

    #[test]
    fn test_setup_fails_on_missing_package() {
        let tmp = TempDir::new().unwrap();
        let config = config(&tmp);
        let source = FsUnitSource::new(&config.paths.root_dir);

        let err = setup_bot(&config, &source, &LogRegistry::console_only()).unwrap_err();
        assert_eq!(err.code(), "IMPORT ERROR");
    }

    #[test]
    fn test_run_guarded_catches_panic() {
        let err = run_guarded::<(), _>(|| panic!("exploded")).unwrap_err();
        assert_eq!(err.code(), "STARTUP FAIL");
        assert_eq!(err.details(), Some("exploded"));

        let err = run_guarded::<(), _>(|| panic!("code {}", 42)).unwrap_err();
        assert_eq!(err.details(), Some("code 42"));
    }

    #[test]
    fn test_run_guarded_passes_results_through() {
        assert_eq!(run_guarded(|| Ok(5)).unwrap(), 5);
        let err = run_guarded::<(), _>(|| Err(ForgeError::Config("x".into()))).unwrap_err();
        assert_eq!(err.code(), "CONFIG ERROR");
    }

    #[test]
    fn test_is_contained() {
        assert!(is_contained(Path::new("video/childes/create")));
        assert!(!is_contained(Path::new("../x")));
        assert!(!is_contained(Path::new("/abs")));
    }
}
