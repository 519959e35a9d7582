use crate::config::{ConfigStore, RulesConfig};
use crate::editor::{DEFAULT_KEY, EditorKind, InstallType, Mode};
use crate::error::AirulesError;
use crate::fs_utils::Deployed;
use crate::installer::{RemoteInstaller, RuleInstaller};
use crate::interactive::{is_interactive, rule_set_labels, select_rule_set};
use crate::logging;
use crate::remote::{GitHubFetcher, Lookup, RequestContext, RuleSet, lookup, of_kind};
use crate::template::Templates;
use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_GITHUB_TOKEN: &str = "GITHUB_TOKEN";
const REMOTE_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Parser)]
#[command(name = "airules", author, version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Configuration directory for airules (default: ~/.config/airules)
    #[arg(short = 'C', long = "config-dir", global = true)]
    pub config_dir: Option<PathBuf>,

    /// Log resolution steps to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Install or fetch Windsurf rules
    Windsurf(EditorArgs),
    /// Install or fetch Cursor rules
    Cursor(EditorArgs),
    /// Edit the rule-file mapping in config.toml
    #[command(alias = "rule")]
    Rules(RulesArgs),
    /// Manage template files kept in the config directory
    #[command(alias = "templates")]
    Template(TemplateArgs),
    /// Create the default config and starter templates
    Init,
}

#[derive(Args)]
#[command(args_conflicts_with_subcommands = true)]
pub struct EditorArgs {
    #[command(subcommand)]
    pub command: Option<EditorCommands>,

    #[command(flatten)]
    pub install: InstallArgs,
}

#[derive(Subcommand)]
pub enum EditorCommands {
    /// Install configured rules (the default action)
    Install(InstallArgs),
    /// List remote rule sets for this editor
    List,
    /// Install a remote rule set by name or list number
    Fetch {
        name: String,
        #[arg(
            short = 't',
            long = "type",
            value_enum,
            ignore_case = true,
            default_value = "local"
        )]
        install_type: RemoteTypeArg,
    },
    /// Choose a remote rule set interactively
    Pick {
        #[arg(
            short = 't',
            long = "type",
            value_enum,
            ignore_case = true,
            default_value = "local"
        )]
        install_type: RemoteTypeArg,
    },
}

#[derive(Args, Debug, Clone)]
pub struct InstallArgs {
    /// Which destinations to write; both when omitted
    #[arg(
        short = 't',
        long = "type",
        value_enum,
        ignore_case = true,
        default_value = "all"
    )]
    pub install_type: InstallTypeArg,

    /// Rule key from config.toml
    #[arg(short, long, default_value = DEFAULT_KEY)]
    pub key: String,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallTypeArg {
    #[value(alias = "l")]
    Local,
    #[value(alias = "g")]
    Global,
    #[value(alias = "a")]
    All,
}

impl From<InstallTypeArg> for InstallType {
    fn from(value: InstallTypeArg) -> Self {
        match value {
            InstallTypeArg::Local => InstallType::Local,
            InstallTypeArg::Global => InstallType::Global,
            InstallTypeArg::All => InstallType::All,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteTypeArg {
    #[value(alias = "l")]
    Local,
    #[value(alias = "g")]
    Global,
}

impl From<RemoteTypeArg> for InstallType {
    fn from(value: RemoteTypeArg) -> Self {
        match value {
            RemoteTypeArg::Local => InstallType::Local,
            RemoteTypeArg::Global => InstallType::Global,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeArg {
    Local,
    Global,
}

impl From<ModeArg> for Mode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::Local => Mode::Local,
            ModeArg::Global => Mode::Global,
        }
    }
}

#[derive(Args)]
pub struct RulesArgs {
    #[command(subcommand)]
    pub command: RulesCommands,
}

#[derive(Subcommand)]
pub enum RulesCommands {
    /// Show configured keys and their files
    List {
        #[arg(long)]
        editor: Option<String>,
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,
    },
    /// Append files to a key
    Add {
        #[arg(long)]
        editor: String,
        #[arg(long, value_enum)]
        mode: ModeArg,
        #[arg(long)]
        key: String,
        /// Paths relative to the config directory
        #[arg(required = true)]
        files: Vec<String>,
    },
    /// Remove one file from a key, or the whole key
    Rm {
        #[arg(long)]
        editor: String,
        #[arg(long, value_enum)]
        mode: ModeArg,
        #[arg(long)]
        key: String,
        file: Option<String>,
    },
    /// List editors present in the configuration
    Editors,
}

#[derive(Args)]
pub struct TemplateArgs {
    #[command(subcommand)]
    pub command: TemplateCommands,
}

#[derive(Args, Debug, Clone)]
pub struct TemplateTarget {
    #[arg(long)]
    pub editor: String,
    #[arg(long, value_enum)]
    pub mode: ModeArg,
}

#[derive(Subcommand)]
pub enum TemplateCommands {
    /// List template keys
    List {
        #[command(flatten)]
        target: TemplateTarget,
    },
    /// Print what an install of the key would write
    Show {
        #[command(flatten)]
        target: TemplateTarget,
        key: String,
    },
    /// Copy a file in as the key's only template
    Import {
        #[command(flatten)]
        target: TemplateTarget,
        key: String,
        file: PathBuf,
    },
    /// Write the key's combined text to a file
    Export {
        #[command(flatten)]
        target: TemplateTarget,
        key: String,
        out: PathBuf,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("{}", t!("messages.logging_init_failed", error = e));
    }
    execute(&cli)
}

pub fn execute(cli: &Cli) -> Result<()> {
    let store = ConfigStore::with_config_dir(cli.config_dir.as_deref())?;

    match &cli.command {
        Commands::Windsurf(args) => handle_editor_command(EditorKind::Windsurf, args, store),
        Commands::Cursor(args) => handle_editor_command(EditorKind::Cursor, args, store),
        Commands::Rules(args) => handle_rules_command(args, &store),
        Commands::Template(args) => handle_template_command(args, &store),
        Commands::Init => handle_init(&store),
    }
}

fn handle_editor_command(editor: EditorKind, args: &EditorArgs, store: ConfigStore) -> Result<()> {
    match &args.command {
        None => install_configured(editor, &args.install, store),
        Some(EditorCommands::Install(install)) => install_configured(editor, install, store),
        Some(EditorCommands::List) => list_remote(editor),
        Some(EditorCommands::Fetch { name, install_type }) => {
            fetch_remote(editor, name, (*install_type).into())
        }
        Some(EditorCommands::Pick { install_type }) => pick_remote(editor, (*install_type).into()),
    }
}

fn install_configured(editor: EditorKind, args: &InstallArgs, store: ConfigStore) -> Result<()> {
    let installer = RuleInstaller::new(editor, Box::new(store))?;
    let deployed = installer.install_with_key(args.install_type.into(), &args.key)?;
    for written in &deployed {
        report_deployed(written);
    }
    Ok(())
}

fn report_deployed(written: &Deployed) {
    if let Some(backup) = &written.backup {
        println!("{}", t!("install.backed_up", path = backup.display()));
    }
    println!(
        "{}",
        t!("install.installed", path = written.destination.display())
    );
}

fn remote_installer() -> Result<RemoteInstaller> {
    let token = env::var(ENV_GITHUB_TOKEN).ok();
    let fetcher = GitHubFetcher::new()?.token(token);
    Ok(RemoteInstaller::new(Box::new(fetcher))?)
}

fn remote_rule_sets(
    installer: &RemoteInstaller,
    ctx: &RequestContext,
    editor: EditorKind,
) -> Result<Vec<RuleSet>> {
    let rule_sets = installer.list_rule_sets(ctx)?;
    Ok(of_kind(rule_sets, editor.into()))
}

fn list_remote(editor: EditorKind) -> Result<()> {
    let installer = remote_installer()?;
    let ctx = RequestContext::with_timeout(REMOTE_TIMEOUT);
    let rule_sets = remote_rule_sets(&installer, &ctx, editor)?;

    if rule_sets.is_empty() {
        println!("{}", t!("remote.none_found", editor = editor));
        return Ok(());
    }
    println!(
        "{}",
        t!("remote.available", editor = editor, count = rule_sets.len())
    );
    for label in rule_set_labels(&rule_sets) {
        println!("  {label}");
    }
    Ok(())
}

fn fetch_remote(editor: EditorKind, name: &str, install_type: InstallType) -> Result<()> {
    let installer = remote_installer()?;
    let ctx = RequestContext::with_timeout(REMOTE_TIMEOUT);
    let rule_sets = remote_rule_sets(&installer, &ctx, editor)?;

    let rule_set = match lookup(rule_sets, name)? {
        Lookup::Found(rule_set) => rule_set,
        Lookup::Ambiguous(matches) if is_interactive() => {
            select_rule_set(&t!("remote.select_ambiguous", name = name), matches)?
        }
        ambiguous => ambiguous.into_unique(name)?,
    };
    install_remote(&installer, &ctx, &rule_set, install_type)
}

fn pick_remote(editor: EditorKind, install_type: InstallType) -> Result<()> {
    let installer = remote_installer()?;
    let ctx = RequestContext::with_timeout(REMOTE_TIMEOUT);
    let rule_sets = remote_rule_sets(&installer, &ctx, editor)?;

    let rule_set = select_rule_set(&t!("remote.select", editor = editor), rule_sets)?;
    install_remote(&installer, &ctx, &rule_set, install_type)
}

fn install_remote(
    installer: &RemoteInstaller,
    ctx: &RequestContext,
    rule_set: &RuleSet,
    install_type: InstallType,
) -> Result<()> {
    println!("{}", t!("remote.installing", name = rule_set.name));
    let deployed = installer.install_rule_set(ctx, rule_set, install_type)?;
    report_deployed(&deployed);
    Ok(())
}

fn parse_editor(editor: &str) -> Result<EditorKind, AirulesError> {
    editor.parse()
}

fn handle_rules_command(args: &RulesArgs, store: &ConfigStore) -> Result<()> {
    match &args.command {
        RulesCommands::List { editor, mode } => {
            let config = store.load()?;
            let editors = match editor {
                Some(editor) => vec![parse_editor(editor)?.as_str().to_string()],
                None => config.editors.keys().cloned().collect(),
            };
            let modes = match mode {
                Some(mode) => vec![Mode::from(*mode)],
                None => Mode::ALL.to_vec(),
            };
            print_rules(&config, &editors, &modes);
        }
        RulesCommands::Add {
            editor,
            mode,
            key,
            files,
        } => {
            let editor = parse_editor(editor)?;
            let mode = Mode::from(*mode);
            let mut config = store.load()?;
            for file in files {
                if config.add_rule_file(editor.as_str(), mode, key, file) {
                    println!("{}", t!("rules.added", file = file, key = key));
                } else {
                    println!("{}", t!("rules.already_present", file = file, key = key));
                }
            }
            store.save(&config)?;
        }
        RulesCommands::Rm {
            editor,
            mode,
            key,
            file,
        } => {
            let editor = parse_editor(editor)?;
            let mode = Mode::from(*mode);
            let mut config = store.load()?;
            match file {
                Some(file) => {
                    config.remove_rule_file(editor.as_str(), mode, key, file)?;
                    println!("{}", t!("rules.removed_file", file = file, key = key));
                }
                None => {
                    config.remove_key(editor.as_str(), mode, key)?;
                    println!("{}", t!("rules.removed_key", key = key));
                }
            }
            store.save(&config)?;
        }
        RulesCommands::Editors => {
            for editor in store.supported_editors() {
                println!("{editor}");
            }
        }
    }
    Ok(())
}

fn print_rules(config: &RulesConfig, editors: &[String], modes: &[Mode]) {
    for editor in editors {
        for mode in modes {
            let keys = config.keys(editor, *mode);
            println!("{}", t!("rules.heading", editor = editor, mode = mode));
            if keys.is_empty() {
                println!("  {}", t!("rules.no_keys"));
                continue;
            }
            for key in keys {
                let files = config
                    .rule_files(editor, *mode, &key)
                    .map(|files| files.join(", "))
                    .unwrap_or_default();
                println!("  {key}: {files}");
            }
        }
    }
}

fn handle_template_command(args: &TemplateArgs, store: &ConfigStore) -> Result<()> {
    let templates = Templates::new(store);
    match &args.command {
        TemplateCommands::List { target } => {
            let keys = templates.list(parse_editor(&target.editor)?, target.mode.into())?;
            if keys.is_empty() {
                println!("{}", t!("rules.no_keys"));
            }
            for key in keys {
                println!("{key}");
            }
        }
        TemplateCommands::Show { target, key } => {
            let text = templates.show(parse_editor(&target.editor)?, target.mode.into(), key)?;
            println!("{text}");
        }
        TemplateCommands::Import { target, key, file } => {
            let path =
                templates.import(parse_editor(&target.editor)?, target.mode.into(), key, file)?;
            println!(
                "{}",
                t!("template.imported", key = key, path = path.display())
            );
        }
        TemplateCommands::Export { target, key, out } => {
            let deployed =
                templates.export(parse_editor(&target.editor)?, target.mode.into(), key, out)?;
            report_deployed(&deployed);
        }
    }
    Ok(())
}

fn handle_init(store: &ConfigStore) -> Result<()> {
    let created = Templates::new(store).seed_defaults()?;
    if created.is_empty() {
        println!(
            "{}",
            t!("init.already_initialized", path = store.config_dir().display())
        );
        return Ok(());
    }
    for path in created {
        println!("{}", t!("init.created", path = path.display()));
    }
    Ok(())
}
