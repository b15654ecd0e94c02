mod render;

#[cfg(test)]
#[path = "main_test.rs"]
mod main_test;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand, ValueEnum};
use cvalign::config::{ClientConfig, ConfigError};
use cvalign::nav::shell::{self, NavShell};
use cvalign::net::api::HttpApi;
use cvalign::net::types::{ApiError, JobRolePatch, Role};
use cvalign::routes::guard::home_for;
use cvalign::services::cancel::CancelToken;
use cvalign::services::session::{AuthError, AuthTimeouts, SessionService};
use cvalign::state::auth::AuthState;
use cvalign::store::token::FileTokenStore;
use cvalign::views::cv_filters::{CvColumn, CvFilters, CvRow, CvStatus, ScoreRange, filter_cvs};
use cvalign::views::forms::{CompanyForm, JobRoleForm, SignInForm, SignUpForm, parse_skills};
use cvalign::views::table::{SortConfig, sort_rows};
use cvalign::views::user_filters::{StatusFilter, UserFilters, UserRow};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("not signed in; run `cvalign login` first")]
    NotSignedIn,
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("{}", .0.user_message())]
    Auth(#[from] AuthError),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("nothing to update; pass at least one field")]
    EmptyPatch,
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "cvalign", about = "CV Align recruitment client")]
struct Cli {
    #[arg(long, env = "CVALIGN_API_URL")]
    base_url: Option<String>,

    #[arg(long, env = "CVALIGN_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[arg(long, env = "CVALIGN_REQUEST_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and persist the session token.
    Login {
        #[arg(long, env = "CVALIGN_EMAIL")]
        email: String,
        #[arg(long, env = "CVALIGN_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the persisted session.
    Logout,
    /// Print the signed-in user.
    Whoami,
    /// Create an account under a company code.
    Signup(SignupArgs),
    /// Show the route guard's decision for a page path.
    Guard { path: String },
    /// Show the navigation bar for the signed-in role.
    Nav {
        #[arg(long, default_value = "/")]
        current: String,
    },
    Company(CompanyCommand),
    JobRoles(JobRolesCommand),
    Recruiters(RecruitersCommand),
    Candidates(CandidatesCommand),
    Cv(CvCommand),
}

#[derive(Args, Debug)]
struct SignupArgs {
    #[arg(long)]
    email: String,
    #[arg(long)]
    name: String,
    #[arg(long)]
    company_code: String,
    /// `recruiter`, `hiring_manager` or `admin`.
    #[arg(long)]
    role: String,
    #[arg(long, env = "CVALIGN_PASSWORD", hide_env_values = true)]
    password: String,
}

#[derive(Args, Debug)]
struct CompanyCommand {
    #[command(subcommand)]
    command: CompanySubcommand,
}

#[derive(Subcommand, Debug)]
enum CompanySubcommand {
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        website: String,
    },
}

#[derive(Args, Debug)]
struct JobRolesCommand {
    #[command(subcommand)]
    command: JobRolesSubcommand,
}

#[derive(Subcommand, Debug)]
enum JobRolesSubcommand {
    List,
    Top,
    Show { id: String },
    Create(JobRoleArgs),
    Update {
        id: String,
        #[command(flatten)]
        fields: JobRolePatchArgs,
    },
    Delete { id: String },
}

#[derive(Args, Debug)]
struct JobRoleArgs {
    #[arg(long)]
    title: String,
    #[arg(long)]
    description: String,
    #[arg(long = "type", default_value = "Full-time")]
    kind: String,
    #[arg(long)]
    department: String,
    #[arg(long)]
    location: String,
    #[arg(long)]
    education: String,
    /// Comma-separated.
    #[arg(long)]
    skills: String,
    #[arg(long)]
    experience: String,
    #[arg(long)]
    deadline: String,
    #[arg(long, default_value = "")]
    requirements: String,
}

#[derive(Args, Debug)]
struct JobRolePatchArgs {
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long = "type")]
    kind: Option<String>,
    #[arg(long)]
    department: Option<String>,
    #[arg(long)]
    location: Option<String>,
    #[arg(long)]
    education: Option<String>,
    #[arg(long)]
    skills: Option<String>,
    #[arg(long)]
    experience: Option<String>,
    #[arg(long)]
    deadline: Option<String>,
    #[arg(long)]
    requirements: Option<String>,
    #[arg(long)]
    status: Option<String>,
}

impl From<JobRolePatchArgs> for JobRolePatch {
    fn from(args: JobRolePatchArgs) -> Self {
        Self {
            title: args.title,
            description: args.description,
            kind: args.kind,
            department: args.department,
            location: args.location,
            education: args.education,
            skills: args.skills.as_deref().map(parse_skills),
            experience: args.experience,
            deadline: args.deadline,
            requirements: args.requirements,
            status: args.status,
        }
    }
}

#[derive(Args, Debug)]
struct RecruitersCommand {
    #[command(subcommand)]
    command: RecruitersSubcommand,
}

#[derive(Subcommand, Debug)]
enum RecruitersSubcommand {
    List {
        #[arg(long, default_value = "")]
        name: String,
        /// `enabled` or `disabled`.
        #[arg(long, default_value = "")]
        status: String,
    },
    Top,
}

#[derive(Args, Debug)]
struct CandidatesCommand {
    #[command(subcommand)]
    command: CandidatesSubcommand,
}

#[derive(Subcommand, Debug)]
enum CandidatesSubcommand {
    /// Candidates uploaded by the signed-in recruiter.
    Mine,
    /// Candidates across the signed-in user's company.
    Company,
    Show { id: String },
}

#[derive(Args, Debug)]
struct CvCommand {
    #[command(subcommand)]
    command: CvSubcommand,
}

#[derive(Subcommand, Debug)]
enum CvSubcommand {
    /// Upload a PDF/DOC/DOCX CV for scoring.
    Upload {
        #[arg(long)]
        job_role_id: String,
        #[arg(long)]
        job_description: String,
        file: PathBuf,
    },
    /// Filter and sort scored CVs.
    List(CvListArgs),
}

#[derive(Args, Debug)]
struct CvListArgs {
    /// List only CVs uploaded by the signed-in recruiter.
    #[arg(long)]
    mine: bool,
    #[arg(long, default_value = "")]
    recruiter: String,
    #[arg(long, default_value = "")]
    file_name: String,
    /// Inclusive `min-max`, e.g. `70-89`.
    #[arg(long)]
    score_range: Option<ScoreRange>,
    #[arg(long)]
    status: Option<CvStatusArg>,
    #[arg(long)]
    sort: Option<CvSortArg>,
    #[arg(long)]
    desc: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CvStatusArg {
    Active,
    Deleted,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CvSortArg {
    Score,
    File,
    Recruiter,
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

// =============================================================================
// COMPOSITION ROOT
// =============================================================================

struct App {
    api: Arc<HttpApi>,
    session: SessionService,
    cancel: CancelToken,
}

impl App {
    async fn bootstrap(cli: &Cli) -> Result<Self, CliError> {
        let config = layered_config(cli)?;
        let api = Arc::new(HttpApi::from_config(&config)?);
        let store = Arc::new(FileTokenStore::in_dir(&config.data_dir));
        let session = SessionService::new(api.clone(), store, AuthTimeouts::from(config.timeouts));

        let cancel = CancelToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                trigger.cancel();
            }
        });

        tolerate_store_failure(session.init(&cancel).await)?;
        Ok(Self { api, session, cancel })
    }

    fn token(&self) -> Result<String, CliError> {
        self.session.token().ok_or(CliError::NotSignedIn)
    }
}

/// An unusable token file leaves the session Anonymous; commands that need
/// no credential (or that clear it) still run.
fn tolerate_store_failure(outcome: Result<AuthState, AuthError>) -> Result<(), AuthError> {
    match outcome {
        Ok(_) => Ok(()),
        Err(AuthError::Store(e)) => {
            tracing::warn!(error = %e, "token store unusable, continuing signed out");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

fn layered_config(cli: &Cli) -> Result<ClientConfig, CliError> {
    let mut config = ClientConfig::from_env()?;
    if let Some(url) = &cli.base_url {
        config.api_url = url.trim_end_matches('/').to_owned();
    }
    if let Some(dir) = &cli.data_dir {
        config.data_dir.clone_from(dir);
    }
    if let Some(secs) = cli.timeout_secs {
        if secs == 0 {
            return Err(ConfigError::ZeroTimeout { var: "--timeout-secs" }.into());
        }
        config.timeouts.request_secs = secs;
    }
    Ok(config)
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let app = App::bootstrap(&cli).await?;
    match cli.command {
        Command::Login { email, password } => run_login(&app, email, password).await,
        Command::Logout => {
            let home = shell::sign_out(&app.session)?;
            println!("signed out; home: {home}");
            Ok(())
        }
        Command::Whoami => match app.session.user() {
            Some(user) => print_json(&user),
            None => Err(CliError::NotSignedIn),
        },
        Command::Signup(args) => run_signup(&app, args).await,
        Command::Guard { path } => {
            println!("{}", render::decision(&path, app.session.authorize_path(&path)));
            Ok(())
        }
        Command::Nav { current } => {
            let role = app.session.snapshot().role().ok_or(CliError::NotSignedIn)?;
            print!("{}", render::nav(&NavShell::for_role(role), &current));
            Ok(())
        }
        Command::Company(company) => run_company(&app, company).await,
        Command::JobRoles(job_roles) => run_job_roles(&app, job_roles).await,
        Command::Recruiters(recruiters) => run_recruiters(&app, recruiters).await,
        Command::Candidates(candidates) => run_candidates(&app, candidates).await,
        Command::Cv(cv) => run_cv(&app, cv).await,
    }
}

// =============================================================================
// AUTH
// =============================================================================

async fn run_login(app: &App, email: String, password: String) -> Result<(), CliError> {
    let form = SignInForm { email, password };
    form.validate().map_err(|errors| CliError::InvalidInput(render::field_errors(&errors)))?;
    let user = app.session.login(&form.email, &form.password, &app.cancel).await?;
    println!("signed in as {} <{}> ({})", user.full_name, user.email, user.role.label());
    println!("home: {}", home_for(user.role));
    Ok(())
}

async fn run_signup(app: &App, args: SignupArgs) -> Result<(), CliError> {
    let form = SignUpForm {
        name: args.name,
        email: args.email,
        password: args.password,
        company_code: args.company_code,
        role: args.role,
    };
    let request = form
        .into_request()
        .map_err(|errors| CliError::InvalidInput(render::field_errors(&errors)))?;
    let response = app.session.signup(&request, &app.cancel).await?;
    println!("{}", response.message);
    Ok(())
}

// =============================================================================
// RESOURCES
// =============================================================================

async fn run_company(app: &App, company: CompanyCommand) -> Result<(), CliError> {
    match company.command {
        CompanySubcommand::Register { name, description, website } => {
            let draft = CompanyForm { name, description, website }
                .into_draft()
                .map_err(|errors| CliError::InvalidInput(render::field_errors(&errors)))?;
            let company = app.api.register_company(&draft).await?;
            print_json(&company)
        }
    }
}

async fn run_job_roles(app: &App, job_roles: JobRolesCommand) -> Result<(), CliError> {
    let token = app.token()?;
    match job_roles.command {
        JobRolesSubcommand::List => print_json(&app.api.list_job_roles(&token).await?),
        JobRolesSubcommand::Top => print_json(&app.api.top_job_roles(&token).await?),
        JobRolesSubcommand::Show { id } => print_json(&app.api.job_role(&token, &id).await?),
        JobRolesSubcommand::Create(args) => {
            let form = JobRoleForm {
                title: args.title,
                description: args.description,
                kind: args.kind,
                department: args.department,
                location: args.location,
                education: args.education,
                skills: args.skills,
                experience: args.experience,
                deadline: args.deadline,
                requirements: args.requirements,
            };
            let draft = form
                .into_draft()
                .map_err(|errors| CliError::InvalidInput(render::field_errors(&errors)))?;
            print_json(&app.api.create_job_role(&token, &draft).await?)
        }
        JobRolesSubcommand::Update { id, fields } => {
            let patch = JobRolePatch::from(fields);
            if patch.is_empty() {
                return Err(CliError::EmptyPatch);
            }
            print_json(&app.api.update_job_role(&token, &id, &patch).await?)
        }
        JobRolesSubcommand::Delete { id } => {
            app.api.delete_job_role(&token, &id).await?;
            println!("deleted {id}");
            Ok(())
        }
    }
}

async fn run_recruiters(app: &App, recruiters: RecruitersCommand) -> Result<(), CliError> {
    let token = app.token()?;
    match recruiters.command {
        RecruitersSubcommand::List { name, status } => {
            let company = app.session.user().map(|u| u.company_code).unwrap_or_default();
            let filters = UserFilters {
                name,
                role: Some(Role::Recruiter),
                status: status.parse::<StatusFilter>().unwrap_or_default(),
                ..UserFilters::default()
            };
            let recruiters = app.api.list_recruiters(&token).await?;
            let matching: Vec<_> = recruiters
                .iter()
                .filter(|r| filters.matches(&UserRow::from_recruiter(r, &company)))
                .collect();
            print_json(&matching)
        }
        RecruitersSubcommand::Top => print_json(&app.api.top_recruiters(&token).await?),
    }
}

async fn run_candidates(app: &App, candidates: CandidatesCommand) -> Result<(), CliError> {
    let token = app.token()?;
    match candidates.command {
        CandidatesSubcommand::Mine => print_json(&app.api.recruiter_candidates(&token).await?),
        CandidatesSubcommand::Company => print_json(&app.api.company_candidates(&token).await?),
        CandidatesSubcommand::Show { id } => print_json(&app.api.candidate(&token, &id).await?),
    }
}

async fn run_cv(app: &App, cv: CvCommand) -> Result<(), CliError> {
    let token = app.token()?;
    match cv.command {
        CvSubcommand::Upload { job_role_id, job_description, file } => {
            let bytes = std::fs::read(&file).map_err(|source| CliError::Read { path: file.clone(), source })?;
            let file_name = file
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            let candidate = app
                .api
                .upload_cv(&token, &job_role_id, &job_description, &file_name, bytes)
                .await?;
            print_json(&candidate)
        }
        CvSubcommand::List(args) => run_cv_list(app, &token, args).await,
    }
}

async fn run_cv_list(app: &App, token: &str, args: CvListArgs) -> Result<(), CliError> {
    let candidates = if args.mine {
        app.api.recruiter_candidates(token).await?
    } else {
        app.api.company_candidates(token).await?
    };
    // Recruiter names are only visible to hiring managers; fall back to ids.
    let recruiters = app.api.list_recruiters(token).await.unwrap_or_default();
    let name_of = |id: &str| {
        recruiters
            .iter()
            .find(|r| r.id == id)
            .map_or_else(|| id.to_owned(), |r| r.full_name.clone())
    };
    let mut rows: Vec<CvRow> = candidates
        .iter()
        .map(|c| CvRow::from_candidate(c, &name_of(&c.recruiter_id)))
        .collect();

    if let Some(key) = args.sort {
        let mut config = SortConfig::default();
        let column = match key {
            CvSortArg::Score => CvColumn::Score,
            CvSortArg::File => CvColumn::FileName,
            CvSortArg::Recruiter => CvColumn::UploadedBy,
        };
        config.toggle(column);
        if args.desc {
            config.toggle(column);
        }
        sort_rows(&mut rows, &config);
    }

    let filters = CvFilters {
        recruiter: args.recruiter,
        file_name: args.file_name,
        score_range: args.score_range,
        status: args.status.map(|s| match s {
            CvStatusArg::Active => CvStatus::Active,
            CvStatusArg::Deleted => CvStatus::Deleted,
        }),
    };
    print!("{}", render::cv_table(&filter_cvs(&rows, &filters)));
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
